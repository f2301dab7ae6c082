//! Audit sink trait and the tracing sink.

use std::sync::Arc;

use async_trait::async_trait;
use policy::AuditRecord;

use crate::Result;

/// Destination for audit records, driven by the dispatcher's writer task.
///
/// Sinks may be slow; the dispatcher never waits on them from the
/// authorization path.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Returns the name of this sink, used in logs.
    fn name(&self) -> &'static str;

    /// Persists one record.
    async fn write(&self, record: &AuditRecord) -> Result<()>;
}

#[async_trait]
impl<T: AuditSink + ?Sized> AuditSink for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn write(&self, record: &AuditRecord) -> Result<()> {
        (**self).write(record).await
    }
}

/// Emits each record as a structured `tracing` event on the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn write(&self, record: &AuditRecord) -> Result<()> {
        tracing::info!(
            target: "audit",
            audit_id = %record.audit_id,
            principal = %record.principal_id,
            action = %record.action,
            resource_type = %record.resource_type,
            resource_id = %record.resource_id,
            allowed = record.allowed,
            reason = %record.reason,
            "authorization decision"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{PrincipalId, ResourceId};
    use policy::Decision;

    #[tokio::test]
    async fn tracing_sink_accepts_records() {
        let record = AuditRecord::new(
            PrincipalId::new("1"),
            ResourceId::new("2"),
            &Decision::deny("Order", "view"),
        );
        assert!(TracingSink::new().write(&record).await.is_ok());
    }

    #[tokio::test]
    async fn arc_sink_delegates() {
        let sink: Arc<dyn AuditSink> = Arc::new(TracingSink);
        assert_eq!(sink.name(), "tracing");
    }
}
