//! Bounded, non-blocking audit dispatch.

use policy::{AuditError, AuditRecord, DecisionAudit};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::AuditSink;

/// Queue capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Queues decision records for a background writer.
///
/// `record` never waits: when the queue is full the record is dropped and
/// counted in `audit_records_dropped_total`. A slow or failing sink therefore
/// loses records instead of delaying authorization.
#[derive(Debug, Clone)]
pub struct AuditDispatcher {
    sender: mpsc::Sender<AuditRecord>,
    capacity: usize,
}

/// Handle to the writer task started by [`AuditDispatcher::spawn`].
#[derive(Debug)]
pub struct AuditWorker {
    handle: JoinHandle<u64>,
}

impl AuditDispatcher {
    /// Starts a writer task draining into `sink` and returns the dispatcher
    /// feeding it. Must be called from within a Tokio runtime.
    ///
    /// A capacity of zero is raised to one.
    pub fn spawn<S>(sink: S, capacity: usize) -> (Self, AuditWorker)
    where
        S: AuditSink + 'static,
    {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let handle = tokio::spawn(run_writer(sink, receiver));

        tracing::debug!(capacity, "audit dispatcher started");
        (Self { sender, capacity }, AuditWorker { handle })
    }

    /// Returns the queue capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl DecisionAudit for AuditDispatcher {
    fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.sender.try_send(record).map_err(|err| match err {
            TrySendError::Full(_) => {
                metrics::counter!("audit_records_dropped_total").increment(1);
                AuditError::Dropped {
                    capacity: self.capacity,
                }
            }
            TrySendError::Closed(_) => AuditError::Closed,
        })
    }
}

impl AuditWorker {
    /// Waits for the writer to drain the queue and stop.
    ///
    /// The writer stops once every dispatcher clone has been dropped.
    /// Returns the number of records written successfully.
    pub async fn finish(self) -> u64 {
        match self.handle.await {
            Ok(written) => written,
            Err(err) => {
                tracing::warn!(error = %err, "audit writer task failed");
                0
            }
        }
    }

    /// Stops the writer without draining the queue.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

async fn run_writer<S: AuditSink>(sink: S, mut receiver: mpsc::Receiver<AuditRecord>) -> u64 {
    let mut written = 0;
    while let Some(record) = receiver.recv().await {
        match sink.write(&record).await {
            Ok(()) => {
                written += 1;
                metrics::counter!("audit_records_written_total").increment(1);
            }
            Err(err) => {
                metrics::counter!("audit_sink_failures_total").increment(1);
                tracing::warn!(
                    sink = sink.name(),
                    audit_id = %record.audit_id,
                    error = %err,
                    "audit sink failed, record discarded"
                );
            }
        }
    }
    tracing::debug!(sink = sink.name(), written, "audit writer stopped");
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryAuditLog;
    use common::{PrincipalId, ResourceId};
    use policy::Decision;

    fn create_record(action: &str) -> AuditRecord {
        AuditRecord::new(
            PrincipalId::new("1"),
            ResourceId::new("1"),
            &Decision::deny("Order", action),
        )
    }

    #[tokio::test]
    async fn records_reach_sink() {
        let log = InMemoryAuditLog::new();
        let (dispatcher, worker) = AuditDispatcher::spawn(log.clone(), 8);

        dispatcher.record(create_record("view")).unwrap();
        dispatcher.record(create_record("update")).unwrap();
        drop(dispatcher);

        assert_eq!(worker.finish().await, 2);
        assert_eq!(log.len().await, 2);
    }

    #[tokio::test]
    async fn full_queue_drops_without_waiting() {
        let log = InMemoryAuditLog::new();
        let (dispatcher, worker) = AuditDispatcher::spawn(log.clone(), 1);

        // The current-thread test runtime does not run the writer until this
        // task yields, so the second record finds the queue full.
        dispatcher.record(create_record("view")).unwrap();
        assert_eq!(
            dispatcher.record(create_record("update")),
            Err(AuditError::Dropped { capacity: 1 })
        );
        drop(dispatcher);

        assert_eq!(worker.finish().await, 1);
    }

    #[tokio::test]
    async fn zero_capacity_is_raised() {
        let (dispatcher, worker) = AuditDispatcher::spawn(InMemoryAuditLog::new(), 0);
        assert_eq!(dispatcher.capacity(), 1);
        drop(dispatcher);
        worker.finish().await;
    }

    #[tokio::test]
    async fn aborted_writer_reports_closed() {
        let (dispatcher, worker) = AuditDispatcher::spawn(InMemoryAuditLog::new(), 4);
        worker.abort();
        assert_eq!(worker.finish().await, 0);

        assert_eq!(
            dispatcher.record(create_record("view")),
            Err(AuditError::Closed)
        );
    }
}
