use super::common::*;
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::evaluation::{EvaluationEngine, EvaluationError};
use crate::leads::domain::{LeadId, LeadQuery, LeadStatus, LeadValidationError};
use crate::leads::repository::RepositoryError;
use crate::leads::{LeadService, LeadServiceError};
use crate::sources::{PayloadKind, Provider, SnapshotField, SnapshotMerger, SourceError};

#[test]
fn create_lead_records_event_and_derives_offer() {
    let (service, leads, _) = build_service();
    let mut payload = submission();
    payload.arv = Some(200_000.0);
    payload.condition = Some(7);
    payload.notes = Some("Inherited, wants to close before winter".to_string());

    let lead = service.create_lead(payload).expect("lead created");

    assert_eq!(lead.status, LeadStatus::NewLead);
    assert_eq!(lead.lead_source, "Facebook");
    let offer = lead.initial_offer.expect("offer derived");
    assert_eq!(offer.repairs, 27_000.0);
    assert_eq!(offer.cash_offer, 173_000.0);

    let events = leads.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "api_create");
    assert_eq!(events[0].lead_id, Some(lead.id));
    assert_eq!(events[0].payload["email"], "dana@example.com");
    assert_eq!(
        events[0].payload["notes"],
        "Inherited, wants to close before winter"
    );
    assert_eq!(events[0].payload["address"], "812 Maple St, Des Moines, IA");
}

#[test]
fn create_lead_from_json_keeps_unknown_fields_in_event() {
    let (service, leads, _) = build_service();
    let body = json!({
        "name": "Dana",
        "phone": "+15155550100",
        "email": "dana@example.com",
        "utm_campaign": "spring-mailer"
    });

    let lead = service
        .create_lead_from_json(body.clone())
        .expect("lead created");

    assert_eq!(lead.email.as_deref(), Some("dana@example.com"));
    assert_eq!(leads.events()[0].payload, body);
}

#[test]
fn create_lead_rolls_back_when_event_log_fails() {
    let leads = Arc::new(EventlessLeads::default());
    let service = LeadService::new(
        leads.clone(),
        Arc::new(MemoryBuyers::default()),
        EvaluationEngine::default(),
        SnapshotMerger::default(),
    );

    assert!(matches!(
        service.create_lead(submission()),
        Err(LeadServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
    assert_eq!(leads.inner.lead_count(), 0);
    assert!(service
        .list_leads(&LeadQuery::default())
        .expect("list")
        .is_empty());
}

#[test]
fn create_lead_without_arv_skips_offer() {
    let (service, _, _) = build_service();
    let lead = service.create_lead(submission()).expect("lead created");
    assert!(lead.initial_offer.is_none());
}

#[test]
fn create_lead_rejects_missing_phone() {
    let (service, leads, _) = build_service();
    let mut payload = submission();
    payload.phone = None;

    match service.create_lead(payload) {
        Err(LeadServiceError::Validation(LeadValidationError::MissingField("phone"))) => {}
        other => panic!("expected missing phone, got {other:?}"),
    }
    assert!(leads.events().is_empty());
}

#[test]
fn list_filters_by_status_and_search() {
    let (service, _, _) = build_service();
    service.create_lead(submission()).expect("first lead");

    let mut contacted = submission();
    contacted.first_name = Some("Priya".to_string());
    contacted.phone = Some("+15155550111".to_string());
    contacted.status = Some("Contacted".to_string());
    service.create_lead(contacted).expect("second lead");

    let all = service.list_leads(&LeadQuery::default()).expect("list");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].first_name, "Priya");

    let filtered = service
        .list_leads(&LeadQuery {
            status: Some("contacted".to_string()),
            ..LeadQuery::default()
        })
        .expect("status filter");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].status, LeadStatus::Contacted);

    let searched = service
        .list_leads(&LeadQuery {
            q: Some("DANA".to_string()),
            ..LeadQuery::default()
        })
        .expect("search");
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].first_name, "Dana");

    let limited = service
        .list_leads(&LeadQuery {
            limit: Some(1),
            ..LeadQuery::default()
        })
        .expect("limit");
    assert_eq!(limited.len(), 1);
}

#[test]
fn list_rejects_unknown_status() {
    let (service, _, _) = build_service();
    let query = LeadQuery {
        status: Some("Archived".to_string()),
        ..LeadQuery::default()
    };

    assert!(matches!(
        service.list_leads(&query),
        Err(LeadServiceError::Validation(LeadValidationError::UnknownStatus(_)))
    ));
}

#[test]
fn update_status_moves_lead_through_pipeline() {
    let (service, _, _) = build_service();
    let lead = service.create_lead(submission()).expect("lead");

    let moved = service
        .update_status(lead.id, "appointment_set")
        .expect("status updated");
    assert_eq!(moved.status, LeadStatus::AppointmentSet);
    assert_eq!(
        service.get_lead(lead.id).expect("stored").status,
        LeadStatus::AppointmentSet
    );

    let moved = service.update_status(lead.id, "Offer Made").expect("label form");
    assert_eq!(moved.status, LeadStatus::OfferMade);
}

#[test]
fn update_status_rejects_unknown_status_and_missing_lead() {
    let (service, _, _) = build_service();
    let lead = service.create_lead(submission()).expect("lead");

    assert!(matches!(
        service.update_status(lead.id, "archived"),
        Err(LeadServiceError::Validation(LeadValidationError::UnknownStatus(_)))
    ));
    assert_eq!(
        service.get_lead(lead.id).expect("stored").status,
        LeadStatus::NewLead
    );
    assert!(matches!(
        service.update_status(LeadId(u64::MAX), "dead"),
        Err(LeadServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn missing_lead_is_not_found() {
    let (service, _, _) = build_service();
    assert!(matches!(
        service.get_lead(LeadId(u64::MAX)),
        Err(LeadServiceError::Repository(RepositoryError::NotFound))
    ));
    assert!(matches!(
        service.delete_lead(LeadId(u64::MAX)),
        Err(LeadServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn buyers_are_searchable() {
    let (service, _, _) = build_service();
    service.create_buyer(buyer_submission()).expect("buyer saved");

    let mut other = buyer_submission();
    other.first_name = "Lena".to_string();
    other.email = "lena@example.test".to_string();
    other.city_focus = Some("Ames".to_string());
    other.zip_codes = Some("50010".to_string());
    service.create_buyer(other).expect("second buyer");

    assert_eq!(service.list_buyers(None).expect("all").len(), 2);
    let by_zip = service.list_buyers(Some("50311")).expect("zip search");
    assert_eq!(by_zip.len(), 1);
    assert_eq!(by_zip[0].first_name, "Marcus");
}

#[test]
fn buyer_can_be_fetched_and_deleted() {
    let (service, _, _) = build_service();
    let buyer = service.create_buyer(buyer_submission()).expect("buyer");

    let fetched = service.get_buyer(buyer.id).expect("buyer found");
    assert_eq!(fetched.email, "marcus@hale-capital.test");

    service.delete_buyer(buyer.id).expect("buyer deleted");
    assert!(matches!(
        service.get_buyer(buyer.id),
        Err(LeadServiceError::Repository(RepositoryError::NotFound))
    ));
    assert!(matches!(
        service.delete_buyer(buyer.id),
        Err(LeadServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn import_stops_at_invalid_buyer() {
    let (service, _, buyers) = build_service();
    let mut broken = buyer_submission();
    broken.email = "not-an-email".to_string();

    let result = service.import_buyers(vec![buyer_submission(), broken, buyer_submission()]);

    assert!(matches!(
        result,
        Err(LeadServiceError::Validation(LeadValidationError::InvalidEmail(_)))
    ));
    assert_eq!(
        crate::leads::BuyerRepository::list(buyers.as_ref())
            .expect("list")
            .len(),
        1
    );
}

#[test]
fn evaluate_propagates_validation_errors() {
    let (service, _, _) = build_service();

    let result = service
        .evaluate(&json!({ "arv": 218_000, "repairs": 9_810 }))
        .expect("evaluation");
    assert_eq!(result.base.mao, 142_790.0);

    match service.evaluate(&json!({ "arv": -5, "repairs": 0 })) {
        Err(LeadServiceError::Evaluation(EvaluationError::Validation(err))) => {
            assert_eq!(err.field, "arv");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn snapshot_merges_stored_payloads() {
    let (service, _, _) = build_service();
    let lead = service.create_lead(submission()).expect("lead");
    let now = Utc::now();

    service
        .record_payload(
            lead.id,
            Provider::Zillow,
            PayloadKind::PropertyDetails,
            zillow_details(),
            now,
        )
        .expect("zillow stored");
    service
        .record_payload(
            lead.id,
            Provider::Melissa,
            PayloadKind::LookupProperty,
            melissa_property(),
            now - Duration::minutes(5),
        )
        .expect("melissa stored");

    let snapshot = service.snapshot(lead.id).expect("snapshot");
    assert_eq!(snapshot.value(SnapshotField::Beds), Some(&json!(3)));
    assert_eq!(
        snapshot.get(SnapshotField::Beds).map(|entry| entry.provider),
        Some(Provider::Melissa)
    );
    assert_eq!(snapshot.value(SnapshotField::Zpid), Some(&json!("44012345")));
}

#[test]
fn record_payload_rejects_mismatched_subtype() {
    let (service, _, _) = build_service();
    let lead = service.create_lead(submission()).expect("lead");

    let result = service.record_payload(
        lead.id,
        Provider::Zillow,
        PayloadKind::LookupDeeds,
        json!({}),
        Utc::now(),
    );

    assert!(matches!(
        result,
        Err(LeadServiceError::Source(SourceError::SubtypeMismatch { .. }))
    ));
}

#[test]
fn webhook_links_newest_lead_with_matching_phone() {
    let (service, leads, _) = build_service();
    let lead = service.create_lead(submission()).expect("lead");

    let event = service
        .record_webhook("vonage_sms", json!({ "msisdn": "+15155550100", "text": "yes" }))
        .expect("event recorded");
    assert_eq!(event.lead_id, Some(lead.id));

    let orphan = service
        .record_webhook("google_ads", json!({ "caller": "+19995550000" }))
        .expect("event recorded");
    assert_eq!(orphan.lead_id, None);

    assert_eq!(leads.events().len(), 3);
}

#[test]
fn voice_webhook_prefers_from_over_msisdn() {
    let (service, _, _) = build_service();
    let lead = service.create_lead(submission()).expect("lead");

    let event = service
        .record_webhook(
            "vonage_voice",
            json!({ "msisdn": "+19995550000", "from": "+15155550100" }),
        )
        .expect("event recorded");
    assert_eq!(event.lead_id, Some(lead.id));

    let event = service
        .record_webhook(
            "vonage_sms",
            json!({ "msisdn": "+19995550000", "from": "+15155550100" }),
        )
        .expect("event recorded");
    assert_eq!(event.lead_id, None);
}

#[test]
fn repository_outage_surfaces_as_error() {
    let service = LeadService::new(
        Arc::new(UnavailableLeads),
        Arc::new(MemoryBuyers::default()),
        EvaluationEngine::default(),
        SnapshotMerger::default(),
    );

    assert!(matches!(
        service.create_lead(submission()),
        Err(LeadServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}
