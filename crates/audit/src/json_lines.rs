//! Newline-delimited JSON audit sink.

use std::path::Path;

use async_trait::async_trait;
use policy::AuditRecord;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::{AuditSink, Result};

/// Writes one JSON object per record, one record per line.
///
/// Each write is flushed before the next record is taken, so a line is
/// either complete or absent.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesSink<W> {
    /// Wraps any async writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesSink<File> {
    /// Opens `path` for appending, creating it if missing.
    pub async fn append(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await?;
        tracing::info!(path = %path.as_ref().display(), "audit file opened");
        Ok(Self::new(file))
    }
}

#[async_trait]
impl<W> AuditSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &'static str {
        "json_lines"
    }

    async fn write(&self, record: &AuditRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}
