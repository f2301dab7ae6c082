//! Authorization policy engine for the commerce back office.
//!
//! This crate provides the decision core:
//! - [`PermissionSet`] and [`Principal`] describing who is asking
//! - [`Resource`] describing what is being acted upon
//! - [`Rule`] conditions and the [`RuleRegistry`] mapping (resource type, action) to rules
//! - [`OwnershipResolver`] strategies answering "does this principal own it"
//! - [`PolicyEngine`] evaluating first-match-allow rule lists into a [`Decision`]
//! - [`DecisionAudit`] seam for best-effort decision logging

pub mod audit;
pub mod decision;
pub mod engine;
pub mod error;
pub mod ownership;
pub mod permission;
pub mod registry;
pub mod resource;
pub mod rule;

pub use audit::{AuditError, AuditRecord, DecisionAudit};
pub use common::{AuditId, PrincipalId, ResourceId};
pub use decision::{Decision, NO_MATCHING_RULE};
pub use engine::{BatchDecision, PolicyEngine};
pub use error::{PolicyError, Result};
pub use ownership::{AttributeOwner, DirectOwner, OwnershipResolver, ParentOwner};
pub use permission::{PermissionSet, Principal};
pub use registry::{RuleRegistry, RuleRegistryBuilder};
pub use resource::{ParentRef, Resource};
pub use rule::Rule;
