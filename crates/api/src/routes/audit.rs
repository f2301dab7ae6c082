//! Audit log listing.

use std::sync::Arc;

use audit::AuditQuery;
use axum::Json;
use axum::extract::{Query, State};
use common::PrincipalId;
use policy::AuditRecord;
use serde::Deserialize;

use crate::AppState;

/// Records returned when the caller gives no limit.
pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct AuditParams {
    pub principal_id: Option<String>,
    pub resource_type: Option<String>,
    pub action: Option<String>,
    pub allowed: Option<bool>,
    pub limit: Option<usize>,
}

impl From<AuditParams> for AuditQuery {
    fn from(params: AuditParams) -> Self {
        AuditQuery {
            principal_id: params.principal_id.map(PrincipalId::new),
            resource_type: params.resource_type,
            action: params.action,
            allowed: params.allowed,
            limit: Some(params.limit.unwrap_or(DEFAULT_LIMIT)),
            ..Default::default()
        }
    }
}

/// GET /audit: recorded decisions, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditParams>,
) -> Json<Vec<AuditRecord>> {
    let query = AuditQuery::from(params);
    Json(state.audit_log.query(&query).await)
}
