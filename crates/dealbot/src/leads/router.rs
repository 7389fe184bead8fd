use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Form, FromRequest, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::evaluation::EvaluationError;
use crate::sources::{PayloadKind, Provider};

use super::buyers::BuyerSubmission;
use super::domain::{LeadId, LeadQuery, LeadStatusUpdate};
use super::repository::{BuyerRepository, LeadRepository, RepositoryError};
use super::service::{LeadService, LeadServiceError};

const API_KEY_HEADER: &str = "x-api-key";
/// Carrier callbacks that cannot send the API key header.
const CARRIER_CALLBACKS: &[&str] = &["vonage_sms", "vonage-sms", "vonage_voice", "vonage-voice"];

/// Router state: the service plus the key guarding write endpoints.
pub struct LeadApi<R, B> {
    service: Arc<LeadService<R, B>>,
    api_key: Option<Arc<str>>,
}

impl<R, B> LeadApi<R, B> {
    pub(crate) fn new(service: Arc<LeadService<R, B>>, api_key: Option<String>) -> Self {
        Self {
            service,
            api_key: api_key.map(Arc::from),
        }
    }
}

impl<R, B> Clone for LeadApi<R, B> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            api_key: self.api_key.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiKeyParam {
    #[serde(default)]
    pub(crate) api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BuyerQuery {
    #[serde(default)]
    pub(crate) q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluationRequest {
    pub(crate) facts: Value,
}

/// Router builder exposing lead intake, buyers, evaluations, and provider ingestion.
pub fn lead_router<R, B>(service: Arc<LeadService<R, B>>, api_key: Option<String>) -> Router
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    let state = LeadApi::new(service, api_key);

    Router::new()
        .route(
            "/api/v1/leads",
            post(create_lead_handler::<R, B>).get(list_leads_handler::<R, B>),
        )
        .route(
            "/api/v1/leads/:lead_id",
            get(get_lead_handler::<R, B>)
                .patch(update_status_handler::<R, B>)
                .delete(delete_lead_handler::<R, B>),
        )
        .route(
            "/api/v1/leads/:lead_id/sources/:source/:subtype",
            put(store_payload_handler::<R, B>),
        )
        .route(
            "/api/v1/leads/:lead_id/snapshot",
            get(snapshot_handler::<R, B>),
        )
        .route(
            "/api/v1/buyers",
            post(create_buyer_handler::<R, B>).get(list_buyers_handler::<R, B>),
        )
        .route(
            "/api/v1/buyers/:buyer_id",
            get(get_buyer_handler::<R, B>).delete(delete_buyer_handler::<R, B>),
        )
        .route("/api/v1/evaluations", post(evaluate_handler::<R, B>))
        .route("/api/v1/webhooks/:kind", post(webhook_handler::<R, B>))
        .with_state(state)
}

pub(crate) async fn create_lead_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    headers: HeaderMap,
    Query(param): Query<ApiKeyParam>,
    Json(payload): Json<Value>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    if let Err(rejection) = authorize(api.api_key.as_deref(), &headers, &param) {
        return rejection;
    }

    match api.service.create_lead_from_json(payload) {
        Ok(lead) => (StatusCode::CREATED, Json(lead)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_leads_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    Query(query): Query<LeadQuery>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    match api.service.list_leads(&query) {
        Ok(leads) => (StatusCode::OK, Json(leads)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_lead_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    Path(lead_id): Path<u64>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    match api.service.get_lead(LeadId(lead_id)) {
        Ok(lead) => (StatusCode::OK, Json(lead)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_status_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    headers: HeaderMap,
    Query(param): Query<ApiKeyParam>,
    Path(lead_id): Path<u64>,
    Json(update): Json<LeadStatusUpdate>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    if let Err(rejection) = authorize(api.api_key.as_deref(), &headers, &param) {
        return rejection;
    }

    match api.service.update_status(LeadId(lead_id), &update.status) {
        Ok(lead) => (StatusCode::OK, Json(lead)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_lead_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    headers: HeaderMap,
    Query(param): Query<ApiKeyParam>,
    Path(lead_id): Path<u64>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    if let Err(rejection) = authorize(api.api_key.as_deref(), &headers, &param) {
        return rejection;
    }

    match api.service.delete_lead(LeadId(lead_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn store_payload_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    headers: HeaderMap,
    Query(param): Query<ApiKeyParam>,
    Path((lead_id, source, subtype)): Path<(u64, String, String)>,
    Json(body): Json<Value>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    if let Err(rejection) = authorize(api.api_key.as_deref(), &headers, &param) {
        return rejection;
    }

    let parsed = source
        .parse::<Provider>()
        .and_then(|provider| subtype.parse::<PayloadKind>().map(|kind| (provider, kind)));
    let (provider, kind) = match parsed {
        Ok(pair) => pair,
        Err(err) => return error_response(err.into()),
    };

    match api
        .service
        .record_payload(LeadId(lead_id), provider, kind, body, Utc::now())
    {
        Ok(payload) => {
            let receipt = json!({
                "lead_id": lead_id,
                "source": payload.source,
                "subtype": payload.subtype,
                "captured_at": payload.captured_at,
            });
            (StatusCode::CREATED, Json(receipt)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn snapshot_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    Path(lead_id): Path<u64>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    match api.service.snapshot(LeadId(lead_id)) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_buyer_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    headers: HeaderMap,
    Query(param): Query<ApiKeyParam>,
    Json(submission): Json<BuyerSubmission>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    if let Err(rejection) = authorize(api.api_key.as_deref(), &headers, &param) {
        return rejection;
    }

    match api.service.create_buyer(submission) {
        Ok(buyer) => (StatusCode::CREATED, Json(buyer)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_buyers_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    Query(query): Query<BuyerQuery>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    match api.service.list_buyers(query.q.as_deref()) {
        Ok(buyers) => (StatusCode::OK, Json(buyers)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_buyer_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    Path(buyer_id): Path<u64>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    match api.service.get_buyer(buyer_id) {
        Ok(buyer) => (StatusCode::OK, Json(buyer)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_buyer_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    headers: HeaderMap,
    Query(param): Query<ApiKeyParam>,
    Path(buyer_id): Path<u64>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    if let Err(rejection) = authorize(api.api_key.as_deref(), &headers, &param) {
        return rejection;
    }

    match api.service.delete_buyer(buyer_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn evaluate_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    Json(request): Json<EvaluationRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    match api.service.evaluate(&request.facts) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn webhook_handler<R, B>(
    State(api): State<LeadApi<R, B>>,
    Query(param): Query<ApiKeyParam>,
    Path(kind): Path<String>,
    request: Request,
) -> Response
where
    R: LeadRepository + 'static,
    B: BuyerRepository + 'static,
{
    if !CARRIER_CALLBACKS.contains(&kind.as_str()) {
        if let Err(rejection) = authorize(api.api_key.as_deref(), request.headers(), &param) {
            return rejection;
        }
    }

    let payload = match webhook_payload(request).await {
        Ok(payload) => payload,
        Err(rejection) => return rejection,
    };

    match api.service.record_webhook(&kind, payload) {
        Ok(event) => {
            let receipt = json!({
                "received": true,
                "event_id": event.id,
                "lead_id": event.lead_id,
            });
            (StatusCode::OK, Json(receipt)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Reads a webhook body as form fields or JSON, depending on its content type.
async fn webhook_payload(request: Request) -> Result<Value, Response> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(IntoResponse::into_response)?;
        return Ok(fields
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect());
    }

    let body = Bytes::from_request(request, &())
        .await
        .map_err(IntoResponse::into_response)?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(&body).map_err(|err| {
        let payload = json!({ "error": format!("webhook body is not valid JSON: {err}") });
        (StatusCode::BAD_REQUEST, Json(payload)).into_response()
    })
}

fn authorize(
    expected: Option<&str>,
    headers: &HeaderMap,
    param: &ApiKeyParam,
) -> Result<(), Response> {
    let Some(expected) = expected else {
        warn!("API key not configured; allowing request");
        return Ok(());
    };

    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .or(param.api_key.as_deref());

    if provided == Some(expected) {
        Ok(())
    } else {
        let payload = json!({ "error": "invalid or missing API key" });
        Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response())
    }
}

/// HTTP status a service failure is reported with.
pub(crate) fn status_for(err: &LeadServiceError) -> StatusCode {
    match err {
        LeadServiceError::Validation(_)
        | LeadServiceError::Evaluation(EvaluationError::Validation(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LeadServiceError::Source(_) => StatusCode::BAD_REQUEST,
        LeadServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        LeadServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        LeadServiceError::Evaluation(EvaluationError::Configuration(_))
        | LeadServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: LeadServiceError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "lead request failed");
    }

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
