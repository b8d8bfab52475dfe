//! HTTP surface for the proposal engine.
//!
//! Three endpoints under `/api/v1`, all keyed by the deal id in the path:
//! price (optionally preview-only), read the current document link, and
//! trigger document rendering. Failures come back as a uniform
//! `{ "error": { code, message, correlation_id } }` payload; record-store
//! failures map to 502 because the upstream dependency, not this service,
//! broke.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use proforma_core::{DealId, ErrorBody, FailureCode, ProposalError, ProposalOutcome};
use proforma_crm::{CrmGateway, ProposalService, RenderClient, RenderError, RenderPayload};

#[derive(Clone)]
pub struct ApiState {
    proposals: ProposalService<dyn CrmGateway>,
    render: Arc<RenderClient>,
}

impl ApiState {
    pub fn new(gateway: Arc<dyn CrmGateway>, render: Arc<RenderClient>) -> Self {
        Self { proposals: ProposalService::new(gateway), render }
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

type ApiError = (StatusCode, Json<ErrorEnvelope>);

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/deals/{deal_id}/proposal", post(create_proposal))
        .route("/api/v1/deals/{deal_id}/proposal/link", get(read_link))
        .route("/api/v1/deals/{deal_id}/proposal/document", post(trigger_document))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ProposalQuery {
    #[serde(default)]
    preview: bool,
}

async fn create_proposal(
    Path(deal_id): Path<String>,
    Query(query): Query<ProposalQuery>,
    State(state): State<ApiState>,
) -> Result<Json<ProposalOutcome>, ApiError> {
    let correlation_id = new_correlation_id();
    let deal_id = parse_deal_id(&deal_id, &correlation_id)?;

    info!(
        event_name = "api.proposal.request",
        deal_id = %deal_id,
        correlation_id = %correlation_id,
        preview = query.preview,
        "proposal requested"
    );

    let result = if query.preview {
        state.proposals.preview(&deal_id).await
    } else {
        state.proposals.generate(&deal_id).await
    };

    let outcome = result.map_err(|error| proposal_failure(error, &deal_id, &correlation_id))?;
    if outcome.is_enterprise() {
        info!(
            event_name = "api.proposal.enterprise",
            deal_id = %deal_id,
            correlation_id = %correlation_id,
            "volume at or above the enterprise cutoff, no records written"
        );
    }

    Ok(Json(outcome))
}

async fn read_link(
    Path(deal_id): Path<String>,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ApiError> {
    let correlation_id = new_correlation_id();
    let deal_id = parse_deal_id(&deal_id, &correlation_id)?;

    let link = state
        .proposals
        .check_link(&deal_id)
        .await
        .map_err(|error| proposal_failure(error, &deal_id, &correlation_id))?;

    Ok(Json(json!({ "link": link })))
}

async fn trigger_document(
    Path(deal_id): Path<String>,
    State(state): State<ApiState>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let correlation_id = new_correlation_id();
    let deal_id = parse_deal_id(&deal_id, &correlation_id)?;

    info!(
        event_name = "api.document.request",
        deal_id = %deal_id,
        correlation_id = %correlation_id,
        "document render requested"
    );

    // Pricing here is read-only; quote persistence belongs to the proposal
    // endpoint and a render trigger must not repeat it.
    let outcome = state
        .proposals
        .preview(&deal_id)
        .await
        .map_err(|error| proposal_failure(error, &deal_id, &correlation_id))?;

    let proposal = match outcome {
        ProposalOutcome::Priced(proposal) => proposal,
        enterprise @ ProposalOutcome::EnterpriseVolume { .. } => {
            info!(
                event_name = "api.document.enterprise",
                deal_id = %deal_id,
                correlation_id = %correlation_id,
                "volume at or above the enterprise cutoff, render not triggered"
            );
            let body = serde_json::to_value(enterprise).unwrap_or_else(|_| json!({}));
            return Ok((StatusCode::OK, Json(body)));
        }
    };

    let payload = RenderPayload::from_proposal(&proposal);
    state
        .render
        .trigger(&payload)
        .await
        .map_err(|error| render_failure(error, &deal_id, &correlation_id))?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "accepted": true }))))
}

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Deal ids travel into record-store URLs, so only a conservative character
/// set is accepted. Anything else is a caller mistake, not a CRM failure.
fn parse_deal_id(raw: &str, correlation_id: &str) -> Result<DealId, ApiError> {
    let trimmed = raw.trim();
    let valid = !trimmed.is_empty()
        && trimmed.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');

    if !valid {
        warn!(
            event_name = "api.request.invalid_deal_id",
            correlation_id = %correlation_id,
            "rejected malformed deal id"
        );
        let body = ErrorBody::new(
            FailureCode::InvalidRequest,
            "deal id must be non-empty and contain only letters, digits, `-`, or `_`",
            correlation_id,
        );
        return Err((StatusCode::BAD_REQUEST, Json(ErrorEnvelope { error: body })));
    }

    Ok(DealId::new(trimmed))
}

fn proposal_failure(error: ProposalError, deal_id: &DealId, correlation_id: &str) -> ApiError {
    let code = error.code();
    let status = match code {
        FailureCode::InternalError => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(
        event_name = "api.proposal.failed",
        deal_id = %deal_id,
        correlation_id = %correlation_id,
        code = code.as_str(),
        error = %error,
        "proposal request failed"
    );
    (status, Json(ErrorEnvelope { error: error.into_body(correlation_id) }))
}

fn render_failure(error: RenderError, deal_id: &DealId, correlation_id: &str) -> ApiError {
    warn!(
        event_name = "api.document.failed",
        deal_id = %deal_id,
        correlation_id = %correlation_id,
        error = %error,
        "document trigger failed"
    );
    let body = ErrorBody::new(FailureCode::WebhookError, error.to_string(), correlation_id);
    (StatusCode::BAD_GATEWAY, Json(ErrorEnvelope { error: body }))
}
