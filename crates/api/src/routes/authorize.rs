//! Authorization endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use policy::{BatchDecision, Decision, Principal, Resource};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub principal: Principal,
    pub action: String,
    pub resource: Resource,
}

#[derive(Debug, Deserialize)]
pub struct BatchAuthorizeRequest {
    pub principal: Principal,
    pub action: String,
    pub resources: Vec<Resource>,
}

/// POST /authorize: 200 with the decision when allowed, 403 when denied.
///
/// Bodies that do not describe a principal, action and typed resource are
/// answered with 400 and the usual JSON error body.
#[tracing::instrument(skip_all)]
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AuthorizeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Decision>), ApiError> {
    let Json(req) = body?;
    require_action(&req.action)?;
    let decision = state
        .engine
        .authorize(&req.principal, &req.action, &req.resource)?;

    Ok((status_for(decision.allowed), Json(decision)))
}

/// POST /authorize/batch: one action over many resources; 403 unless all
/// are allowed.
#[tracing::instrument(skip_all)]
pub async fn authorize_batch(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BatchAuthorizeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BatchDecision>), ApiError> {
    let Json(req) = body?;
    require_action(&req.action)?;
    let batch = state
        .engine
        .authorize_all(&req.principal, &req.action, &req.resources)?;

    Ok((status_for(batch.allowed), Json(batch)))
}

fn require_action(action: &str) -> Result<(), ApiError> {
    if action.trim().is_empty() {
        return Err(ApiError::BadRequest("action is required".to_string()));
    }
    Ok(())
}

fn status_for(allowed: bool) -> StatusCode {
    if allowed {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    }
}
