//! Decision audit seam.
//!
//! The engine hands every decision to an optional [`DecisionAudit`]. Recording
//! is best-effort: implementations must return immediately and the engine
//! ignores their errors after logging them.

use chrono::{DateTime, Utc};
use common::{AuditId, PrincipalId, ResourceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decision::Decision;

/// One audited authorization decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_id: AuditId,
    pub principal_id: PrincipalId,
    pub action: String,
    pub resource_type: String,
    pub resource_id: ResourceId,
    pub allowed: bool,
    pub reason: String,
    pub matched_rule: Option<usize>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Builds a record for a decision made now.
    pub fn new(principal_id: PrincipalId, resource_id: ResourceId, decision: &Decision) -> Self {
        Self {
            audit_id: AuditId::new(),
            principal_id,
            action: decision.action.clone(),
            resource_type: decision.resource_type.clone(),
            resource_id,
            allowed: decision.allowed,
            reason: decision.reason.clone(),
            matched_rule: decision.matched_rule,
            recorded_at: Utc::now(),
        }
    }
}

/// Errors an audit implementation may report. Never surfaced to callers of
/// `authorize`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    /// The audit queue is full and the record was dropped.
    #[error("Audit queue full (capacity {capacity}), record dropped")]
    Dropped { capacity: usize },

    /// The audit writer has shut down.
    #[error("Audit writer closed")]
    Closed,
}

/// Receives decisions as they are made.
///
/// `record` is called on the authorization path and must not block.
pub trait DecisionAudit: Send + Sync {
    fn record(&self, record: AuditRecord) -> Result<(), AuditError>;
}
