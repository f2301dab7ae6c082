use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use policy::AuditRecord;
use tokio::sync::RwLock;

use crate::{AuditQuery, AuditSink, Result};

/// In-memory audit log.
///
/// Clones share the same storage, so one handle can be given to the
/// dispatcher as its sink while another serves queries. With a retention
/// limit the oldest records are evicted first.
#[derive(Clone, Default)]
pub struct InMemoryAuditLog {
    records: Arc<RwLock<VecDeque<AuditRecord>>>,
    retention: Option<usize>,
}

impl InMemoryAuditLog {
    /// Creates an unbounded log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log that keeps at most `max_records` records.
    pub fn with_retention(max_records: usize) -> Self {
        Self {
            records: Arc::default(),
            retention: Some(max_records),
        }
    }

    /// Returns the number of records held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no records are held.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Appends a record, evicting the oldest one when over retention.
    pub async fn append(&self, record: AuditRecord) {
        let mut records = self.records.write().await;
        records.push_back(record);
        if let Some(max) = self.retention {
            while records.len() > max {
                records.pop_front();
            }
        }
    }

    /// Returns matching records, oldest first.
    pub async fn query(&self, query: &AuditQuery) -> Vec<AuditRecord> {
        let records = self.records.read().await;
        let matching = records
            .iter()
            .filter(|record| query.matches(record))
            .skip(query.offset.unwrap_or(0));

        match query.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        }
    }

    /// Removes all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn write(&self, record: &AuditRecord) -> Result<()> {
        self.append(record.clone()).await;
        Ok(())
    }
}
