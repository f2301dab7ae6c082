//! Decision audit for the policy engine.
//!
//! This crate provides:
//! - [`AuditDispatcher`], a [`policy::DecisionAudit`] that queues records on a
//!   bounded channel and drops them when the queue is full
//! - [`AuditSink`] trait for the writer side, with [`InMemoryAuditLog`],
//!   [`JsonLinesSink`] and [`TracingSink`] implementations
//! - [`AuditQuery`] for filtering the in-memory log

pub mod dispatcher;
pub mod error;
pub mod json_lines;
pub mod memory;
pub mod query;
pub mod sink;

pub use dispatcher::{AuditDispatcher, AuditWorker, DEFAULT_CAPACITY};
pub use error::{Result, SinkError};
pub use json_lines::JsonLinesSink;
pub use memory::InMemoryAuditLog;
pub use query::AuditQuery;
pub use sink::{AuditSink, TracingSink};
