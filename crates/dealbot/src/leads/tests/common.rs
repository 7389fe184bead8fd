use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::{json, Value};

use crate::evaluation::EvaluationEngine;
use crate::leads::buyers::{Buyer, BuyerSubmission};
use crate::leads::domain::{Lead, LeadEvent, LeadId, LeadSubmission};
use crate::leads::repository::{BuyerRepository, LeadRepository, RepositoryError};
use crate::leads::{lead_router, LeadService};
use crate::sources::{ProviderPayload, SnapshotMerger};

pub(super) const API_KEY: &str = "secret-key";

pub(super) fn submission() -> LeadSubmission {
    LeadSubmission {
        first_name: Some("Dana".to_string()),
        last_name: Some("Reyes".to_string()),
        phone: Some("+15155550100".to_string()),
        email: Some("dana@example.com".to_string()),
        address: Some("812 Maple St, Des Moines, IA".to_string()),
        lead_source: Some("Facebook".to_string()),
        ..LeadSubmission::default()
    }
}

pub(super) fn buyer_submission() -> BuyerSubmission {
    BuyerSubmission {
        first_name: "Marcus".to_string(),
        last_name: Some("Hale".to_string()),
        email: "marcus@hale-capital.test".to_string(),
        phone: "515-555-0199".to_string(),
        city_focus: Some("Des Moines".to_string()),
        zip_codes: Some("50310, 50311".to_string()),
        property_types: Some("SFR".to_string()),
        ..BuyerSubmission::default()
    }
}

pub(super) fn melissa_property() -> Value {
    json!({ "Records": [{
        "PrimaryOwner": { "Name1Full": "REYES DANA" },
        "IntRoomInfo": { "BedroomsCount": "3", "BathCount": "2" },
        "PropertySize": { "AreaBuilding": "1,420" }
    }]})
}

pub(super) fn zillow_details() -> Value {
    json!({ "zpid": 44012345, "bedrooms": 4, "rentZestimate": 1650 })
}

pub(super) type TestService = LeadService<MemoryLeads, MemoryBuyers>;

pub(super) fn build_service() -> (TestService, Arc<MemoryLeads>, Arc<MemoryBuyers>) {
    let leads = Arc::new(MemoryLeads::default());
    let buyers = Arc::new(MemoryBuyers::default());
    let service = LeadService::new(
        leads.clone(),
        buyers.clone(),
        EvaluationEngine::default(),
        SnapshotMerger::default(),
    );
    (service, leads, buyers)
}

pub(super) fn router_with_key(api_key: Option<&str>) -> (axum::Router, Arc<MemoryLeads>) {
    let (service, leads, _) = build_service();
    let router = lead_router(Arc::new(service), api_key.map(str::to_string));
    (router, leads)
}

pub(super) fn form_request(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request builds")
}

pub(super) fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request builds")
}

pub(super) fn keyed_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    let mut request = json_request(method, uri, body);
    request.headers_mut().insert(
        "x-api-key",
        header::HeaderValue::from_static(API_KEY),
    );
    request
}

pub(super) fn get_request(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default)]
struct LeadTables {
    leads: HashMap<LeadId, Lead>,
    payloads: HashMap<LeadId, Vec<ProviderPayload>>,
    events: Vec<LeadEvent>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryLeads {
    tables: Arc<Mutex<LeadTables>>,
}

impl MemoryLeads {
    pub(super) fn events(&self) -> Vec<LeadEvent> {
        self.tables
            .lock()
            .expect("repository mutex poisoned")
            .events
            .clone()
    }

    pub(super) fn lead_count(&self) -> usize {
        self.tables.lock().expect("repository mutex poisoned").leads.len()
    }
}

impl LeadRepository for MemoryLeads {
    fn insert(&self, lead: Lead) -> Result<Lead, RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        if guard.leads.contains_key(&lead.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    fn fetch(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.leads.get(&id).cloned())
    }

    fn update(&self, lead: Lead) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        match guard.leads.get_mut(&lead.id) {
            Some(existing) => {
                *existing = lead;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn list(&self) -> Result<Vec<Lead>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        let mut leads: Vec<Lead> = guard.leads.values().cloned().collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(leads)
    }

    fn delete(&self, id: LeadId) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        guard.payloads.remove(&id);
        guard
            .leads
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn latest_by_phone(&self, phone: &str) -> Result<Option<Lead>, RepositoryError> {
        Ok(self.list()?.into_iter().find(|lead| lead.phone == phone))
    }

    fn store_payload(&self, lead: LeadId, payload: ProviderPayload) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        guard.payloads.entry(lead).or_default().push(payload);
        Ok(())
    }

    fn payloads(&self, lead: LeadId) -> Result<Vec<ProviderPayload>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.payloads.get(&lead).cloned().unwrap_or_default())
    }

    fn append_event(&self, event: LeadEvent) -> Result<(), RepositoryError> {
        self.tables
            .lock()
            .expect("repository mutex poisoned")
            .events
            .push(event);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryBuyers {
    buyers: Arc<Mutex<Vec<Buyer>>>,
}

impl BuyerRepository for MemoryBuyers {
    fn insert(&self, buyer: Buyer) -> Result<Buyer, RepositoryError> {
        self.buyers
            .lock()
            .expect("buyer mutex poisoned")
            .push(buyer.clone());
        Ok(buyer)
    }

    fn fetch(&self, id: u64) -> Result<Option<Buyer>, RepositoryError> {
        let guard = self.buyers.lock().expect("buyer mutex poisoned");
        Ok(guard.iter().find(|buyer| buyer.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<Buyer>, RepositoryError> {
        let mut buyers = self.buyers.lock().expect("buyer mutex poisoned").clone();
        buyers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(buyers)
    }

    fn delete(&self, id: u64) -> Result<(), RepositoryError> {
        let mut guard = self.buyers.lock().expect("buyer mutex poisoned");
        let before = guard.len();
        guard.retain(|buyer| buyer.id != id);
        if guard.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Stores leads normally but cannot write the event log.
#[derive(Default)]
pub(super) struct EventlessLeads {
    pub(super) inner: MemoryLeads,
}

impl LeadRepository for EventlessLeads {
    fn insert(&self, lead: Lead) -> Result<Lead, RepositoryError> {
        self.inner.insert(lead)
    }

    fn fetch(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update(&self, lead: Lead) -> Result<(), RepositoryError> {
        self.inner.update(lead)
    }

    fn list(&self) -> Result<Vec<Lead>, RepositoryError> {
        self.inner.list()
    }

    fn delete(&self, id: LeadId) -> Result<(), RepositoryError> {
        self.inner.delete(id)
    }

    fn latest_by_phone(&self, phone: &str) -> Result<Option<Lead>, RepositoryError> {
        self.inner.latest_by_phone(phone)
    }

    fn store_payload(&self, lead: LeadId, payload: ProviderPayload) -> Result<(), RepositoryError> {
        self.inner.store_payload(lead, payload)
    }

    fn payloads(&self, lead: LeadId) -> Result<Vec<ProviderPayload>, RepositoryError> {
        self.inner.payloads(lead)
    }

    fn append_event(&self, _event: LeadEvent) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("event log offline".to_string()))
    }
}

pub(super) struct UnavailableLeads;

impl LeadRepository for UnavailableLeads {
    fn insert(&self, _lead: Lead) -> Result<Lead, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _lead: Lead) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<Lead>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: LeadId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_by_phone(&self, _phone: &str) -> Result<Option<Lead>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn store_payload(&self, _lead: LeadId, _payload: ProviderPayload) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn payloads(&self, _lead: LeadId) -> Result<Vec<ProviderPayload>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn append_event(&self, _event: LeadEvent) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
