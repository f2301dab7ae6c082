//! Identifier types shared across the policy engine crates.

pub mod types;

pub use types::{AuditId, PrincipalId, ResourceId};
