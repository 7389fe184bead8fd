use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::evaluation::{initial_offer, EvaluationEngine, EvaluationError, EvaluationResult};
use crate::sources::{PayloadKind, Provider, ProviderPayload, Snapshot, SnapshotMerger, SourceError};

use super::buyers::{Buyer, BuyerSubmission};
use super::domain::{
    Lead, LeadEvent, LeadId, LeadQuery, LeadStatus, LeadSubmission, LeadValidationError,
};
use super::repository::{BuyerRepository, LeadRepository, RepositoryError};

const DEFAULT_LIST_LIMIT: usize = 200;
/// Webhook keys that may carry the sender's phone number, in lookup order.
const SMS_PHONE_KEYS: &[&str] = &["msisdn", "from", "sender"];
const VOICE_PHONE_KEYS: &[&str] = &["from", "caller", "msisdn"];
const PHONE_KEYS: &[&str] = &["msisdn", "from", "sender", "caller"];

static LEAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static BUYER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Service composing the repositories with the evaluation engine and snapshot merger.
pub struct LeadService<R, B> {
    leads: Arc<R>,
    buyers: Arc<B>,
    engine: Arc<EvaluationEngine>,
    merger: Arc<SnapshotMerger>,
}

impl<R, B> LeadService<R, B>
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    pub fn new(
        leads: Arc<R>,
        buyers: Arc<B>,
        engine: EvaluationEngine,
        merger: SnapshotMerger,
    ) -> Self {
        Self {
            leads,
            buyers,
            engine: Arc::new(engine),
            merger: Arc::new(merger),
        }
    }

    /// Validate and store a new lead, deriving an initial offer when an ARV is known.
    pub fn create_lead(&self, submission: LeadSubmission) -> Result<Lead, LeadServiceError> {
        let raw = serde_json::to_value(&submission)
            .map_err(|err| LeadValidationError::Malformed(err.to_string()))?;
        self.store_lead(submission, raw)
    }

    /// Like [`create_lead`](Self::create_lead), keeping the request body verbatim in the audit event.
    pub fn create_lead_from_json(&self, payload: Value) -> Result<Lead, LeadServiceError> {
        let submission = LeadSubmission::deserialize(&payload)
            .map_err(|err| LeadValidationError::Malformed(err.to_string()))?;
        self.store_lead(submission, payload)
    }

    fn store_lead(&self, submission: LeadSubmission, raw: Value) -> Result<Lead, LeadServiceError> {
        let validated = submission.validate()?;
        let id = LeadId(LEAD_SEQUENCE.fetch_add(1, Ordering::Relaxed));

        let offer = validated
            .arv
            .and_then(|arv| initial_offer(arv, validated.condition));

        let lead = Lead {
            id,
            first_name: validated.first_name,
            last_name: validated.last_name,
            phone: validated.phone,
            email: validated.email,
            address: validated.address,
            condition: validated.condition,
            asking_price: validated.asking_price,
            occupancy_status: validated.occupancy_status,
            timeline: validated.timeline,
            reason: validated.reason,
            lead_source: validated.lead_source,
            status: validated.status,
            notes: validated.notes,
            arv: validated.arv,
            initial_offer: offer,
            created_at: Utc::now(),
        };

        let stored = self.leads.insert(lead)?;
        let event = LeadEvent {
            id: EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            lead_id: Some(stored.id),
            kind: "api_create".to_string(),
            payload: raw,
            received_at: stored.created_at,
        };

        // A lead without its intake event is not kept.
        if let Err(err) = self.leads.append_event(event) {
            if let Err(cleanup) = self.leads.delete(stored.id) {
                warn!(lead_id = %stored.id, error = %cleanup, "failed to roll back lead");
            }
            return Err(err.into());
        }

        info!(lead_id = %stored.id, source = %stored.lead_source, "lead created");
        Ok(stored)
    }

    pub fn get_lead(&self, id: LeadId) -> Result<Lead, LeadServiceError> {
        let lead = self.leads.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(lead)
    }

    pub fn list_leads(&self, query: &LeadQuery) -> Result<Vec<Lead>, LeadServiceError> {
        let status = match query.status.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(raw.parse::<LeadStatus>()?),
            _ => None,
        };
        let needle = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);

        Ok(self
            .leads
            .list()?
            .into_iter()
            .filter(|lead| status.map_or(true, |wanted| lead.status == wanted))
            .filter(|lead| needle.map_or(true, |needle| lead.matches(needle)))
            .take(limit)
            .collect())
    }

    /// Move a lead to another pipeline stage.
    pub fn update_status(&self, id: LeadId, status: &str) -> Result<Lead, LeadServiceError> {
        let status = status.parse::<LeadStatus>()?;
        let mut lead = self.get_lead(id)?;
        let previous = lead.status;
        lead.status = status;
        self.leads.update(lead.clone())?;

        info!(
            lead_id = %id,
            from = previous.label(),
            to = status.label(),
            "lead status updated"
        );
        Ok(lead)
    }

    pub fn delete_lead(&self, id: LeadId) -> Result<(), LeadServiceError> {
        self.leads.delete(id)?;
        info!(lead_id = %id, "lead deleted");
        Ok(())
    }

    pub fn create_buyer(&self, submission: BuyerSubmission) -> Result<Buyer, LeadServiceError> {
        let id = BUYER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let buyer = submission.into_buyer(id, Utc::now())?;
        let stored = self.buyers.insert(buyer)?;
        info!(buyer_id = stored.id, "buyer saved");
        Ok(stored)
    }

    /// Store a batch of buyers, stopping at the first invalid row.
    pub fn import_buyers(
        &self,
        submissions: Vec<BuyerSubmission>,
    ) -> Result<usize, LeadServiceError> {
        let mut imported = 0;
        for submission in submissions {
            self.create_buyer(submission)?;
            imported += 1;
        }
        Ok(imported)
    }

    pub fn get_buyer(&self, id: u64) -> Result<Buyer, LeadServiceError> {
        let buyer = self.buyers.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(buyer)
    }

    pub fn delete_buyer(&self, id: u64) -> Result<(), LeadServiceError> {
        self.buyers.delete(id)?;
        info!(buyer_id = id, "buyer deleted");
        Ok(())
    }

    pub fn list_buyers(&self, query: Option<&str>) -> Result<Vec<Buyer>, LeadServiceError> {
        let needle = query.map(str::trim).filter(|q| !q.is_empty());
        Ok(self
            .buyers
            .list()?
            .into_iter()
            .filter(|buyer| needle.map_or(true, |needle| buyer.matches(needle)))
            .collect())
    }

    pub fn evaluate(&self, facts: &Value) -> Result<EvaluationResult, LeadServiceError> {
        let result = self.engine.evaluate_json(facts)?;
        info!(mao = result.base.mao, arv = result.base.arv, "deal evaluated");
        Ok(result)
    }

    /// Attach a raw provider response to a lead.
    pub fn record_payload(
        &self,
        lead_id: LeadId,
        source: Provider,
        subtype: PayloadKind,
        body: Value,
        captured_at: DateTime<Utc>,
    ) -> Result<ProviderPayload, LeadServiceError> {
        self.get_lead(lead_id)?;
        let payload = ProviderPayload::new(source, subtype, captured_at, body)?;
        self.leads.store_payload(lead_id, payload.clone())?;

        info!(
            lead_id = %lead_id,
            provider = source.key(),
            subtype = subtype.key(),
            "provider payload stored"
        );
        Ok(payload)
    }

    pub fn snapshot(&self, lead_id: LeadId) -> Result<Snapshot, LeadServiceError> {
        self.get_lead(lead_id)?;
        let payloads = self.leads.payloads(lead_id)?;
        Ok(self.merger.merge(&payloads))
    }

    /// Log an inbound webhook, linking it to the newest lead with the sender's phone.
    pub fn record_webhook(&self, kind: &str, payload: Value) -> Result<LeadEvent, LeadServiceError> {
        let phone = phone_keys(kind)
            .iter()
            .filter_map(|key| payload.get(*key))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|phone| !phone.is_empty());

        let lead_id = match phone {
            Some(phone) => self.leads.latest_by_phone(phone)?.map(|lead| lead.id),
            None => None,
        };
        if phone.is_some() && lead_id.is_none() {
            warn!(kind, "webhook phone did not match any lead");
        }

        let event = LeadEvent {
            id: EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            lead_id,
            kind: kind.to_string(),
            payload,
            received_at: Utc::now(),
        };
        self.leads.append_event(event.clone())?;
        Ok(event)
    }
}

fn phone_keys(kind: &str) -> &'static [&'static str] {
    match kind {
        "vonage_sms" | "vonage-sms" => SMS_PHONE_KEYS,
        "vonage_voice" | "vonage-voice" => VOICE_PHONE_KEYS,
        _ => PHONE_KEYS,
    }
}

/// Error raised by the lead service.
#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error(transparent)]
    Validation(#[from] LeadValidationError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
