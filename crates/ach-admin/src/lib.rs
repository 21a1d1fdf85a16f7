//! The admin HTTP facade spec.md §6 names: `PUT /files/flush/incoming`,
//! `PUT /files/flush/outgoing`, `PUT /files/flush`, `PUT
//! /depositories/:id`, and `PUT /depositories/:id/micro-deposits/confirm`.
//! Every handler does nothing but translate an HTTP request into a
//! [`ach_pipeline::PipelineHandles`] channel message (or a direct
//! repository call for the depository endpoints, which spec.md §5
//! explicitly allows the REST layer to perform since neither is a
//! pipeline-driven status transition) and report back the result as JSON.
//!
//! Grounded on the `Bitsage-Network-obelysk` example repo's axum-router-
//! plus-`AppState` shape, since the teacher itself never runs an HTTP
//! server.

use ach_pipeline::PipelineHandles;
use ach_store::{ConfirmationError, DepositoryRepo, MicroDepositRepo};
use ach_types::{DepositoryId, DepositoryStatus, Money};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::put;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Bound on how long an HTTP handler waits for the controller's oneshot
/// reply before answering `504` (spec.md's expansion §6: "or `504` on
/// timeout").
const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AdminState {
    pipeline: PipelineHandles,
    depositories: DepositoryRepo,
    micro_deposits: MicroDepositRepo,
}

impl AdminState {
    pub fn new(pipeline: PipelineHandles, depositories: DepositoryRepo, micro_deposits: MicroDepositRepo) -> Self {
        Self { pipeline, depositories, micro_deposits }
    }
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/files/flush/incoming", put(flush_incoming))
        .route("/files/flush/outgoing", put(flush_outgoing))
        .route("/files/flush", put(flush_all))
        .route("/depositories/{id}", put(override_depository_status))
        .route("/depositories/{id}/micro-deposits/confirm", put(confirm_micro_deposits))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_body(message: impl Into<String>) -> Json<ErrorBody> {
    Json(ErrorBody { error: message.into() })
}

async fn flush_incoming(State(state): State<AdminState>) -> (StatusCode, Json<ErrorBody>) {
    match tokio::time::timeout(REPLY_TIMEOUT, state.pipeline.flush_incoming()).await {
        Ok(Ok(())) => (StatusCode::ACCEPTED, error_body("")),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "flush incoming failed");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
        }
        Err(_) => (StatusCode::GATEWAY_TIMEOUT, error_body("timed out waiting for pipeline controller")),
    }
}

#[derive(Debug, Deserialize, Default)]
struct FlushOutgoingBody {
    #[serde(default)]
    skip_upload: bool,
}

async fn flush_outgoing(State(state): State<AdminState>, body: Option<Json<FlushOutgoingBody>>) -> (StatusCode, Json<ErrorBody>) {
    let skip_upload = body.map(|Json(b)| b.skip_upload).unwrap_or_default();
    match tokio::time::timeout(REPLY_TIMEOUT, state.pipeline.flush_outgoing(skip_upload)).await {
        Ok(Ok(())) => (StatusCode::ACCEPTED, error_body("")),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "flush outgoing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
        }
        Err(_) => (StatusCode::GATEWAY_TIMEOUT, error_body("timed out waiting for pipeline controller")),
    }
}

/// `PUT /files/flush` runs both passes: incoming first (so anything an
/// inbound file just returned is reflected before outgoing decides what's
/// eligible), then outgoing with uploads enabled.
async fn flush_all(State(state): State<AdminState>) -> (StatusCode, Json<ErrorBody>) {
    let run = async {
        state.pipeline.flush_incoming().await?;
        state.pipeline.flush_outgoing(false).await
    };
    match tokio::time::timeout(REPLY_TIMEOUT, run).await {
        Ok(Ok(())) => (StatusCode::ACCEPTED, error_body("")),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "combined flush failed");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
        }
        Err(_) => (StatusCode::GATEWAY_TIMEOUT, error_body("timed out waiting for pipeline controller")),
    }
}

#[derive(Debug, Deserialize)]
struct DepositoryStatusBody {
    status: String,
}

/// Administrative override of a depository's status (spec.md §6, §9 Open
/// Question — does not cascade to outstanding transfers; see DESIGN.md).
async fn override_depository_status(
    State(state): State<AdminState>,
    Path(id): Path<uuid::Uuid>,
    Json(body): Json<DepositoryStatusBody>,
) -> (StatusCode, Json<serde_json::Value>) {
    let status = match body.status.to_ascii_lowercase().as_str() {
        "unverified" => DepositoryStatus::Unverified,
        "verified" => DepositoryStatus::Verified,
        "rejected" => DepositoryStatus::Rejected,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("unknown depository status {other:?}") })),
            );
        }
    };

    let depository_id = DepositoryId::from_uuid(id);
    match state.depositories.admin_override(depository_id, status) {
        Ok(updated) => (StatusCode::OK, Json(serde_json::to_value(DepositoryView::from(&updated)).unwrap())),
        Err(ach_store::StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("no depository with id {id}") })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "admin depository override failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() })))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfirmMicroDepositsBody {
    amounts_cents: Vec<i64>,
}

/// Confirms the micro-deposit amounts a receiver reported back and, on a
/// match, transitions the depository to verified in the same call — a
/// confirmation that matched but never flipped the depository would leave
/// the account stuck unverified forever.
async fn confirm_micro_deposits(
    State(state): State<AdminState>,
    Path(id): Path<uuid::Uuid>,
    Json(body): Json<ConfirmMicroDepositsBody>,
) -> (StatusCode, Json<serde_json::Value>) {
    let depository_id = DepositoryId::from_uuid(id);

    let mut reported = Vec::with_capacity(body.amounts_cents.len());
    for cents in body.amounts_cents {
        match Money::usd_cents(cents) {
            Ok(amount) => reported.push(amount),
            Err(e) => return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": e.to_string() }))),
        }
    }

    if let Err(e) = state.micro_deposits.confirm(depository_id, &reported) {
        let status = match e {
            ConfirmationError::NoneOutstanding => StatusCode::NOT_FOUND,
            ConfirmationError::AmountMismatch => StatusCode::UNPROCESSABLE_ENTITY,
        };
        return (status, Json(serde_json::json!({ "error": e.to_string() })));
    }

    match state.depositories.verify(depository_id) {
        Ok(updated) => (StatusCode::OK, Json(serde_json::to_value(DepositoryView::from(&updated)).unwrap())),
        Err(ach_store::StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("no depository with id {id}") })),
        ),
        Err(ach_store::StoreError::IllegalDepository(e)) => {
            (StatusCode::CONFLICT, Json(serde_json::json!({ "error": e.to_string() })))
        }
        Err(e) => {
            tracing::error!(error = %e, "micro-deposit confirmation verify failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() })))
        }
    }
}

#[derive(Debug, Serialize)]
struct DepositoryView {
    id: String,
    status: &'static str,
}

impl From<&ach_types::Depository> for DepositoryView {
    fn from(d: &ach_types::Depository) -> Self {
        let status = match d.status {
            DepositoryStatus::Unverified => "unverified",
            DepositoryStatus::Verified => "verified",
            DepositoryStatus::Rejected => "rejected",
        };
        Self { id: d.id.to_string(), status }
    }
}
