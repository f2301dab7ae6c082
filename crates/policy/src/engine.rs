//! Policy evaluation.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::audit::{AuditError, AuditRecord, DecisionAudit};
use crate::decision::Decision;
use crate::error::{PolicyError, Result};
use crate::permission::Principal;
use crate::registry::RuleRegistry;
use crate::resource::Resource;
use crate::rule::EvalContext;

/// Outcome of authorizing one action over several resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchDecision {
    /// True when every resource was allowed (vacuously true for no resources).
    pub allowed: bool,
    /// Per-resource decisions, in input order.
    pub decisions: Vec<Decision>,
}

impl BatchDecision {
    /// Decisions that denied access.
    pub fn denied(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(|d| !d.allowed)
    }
}

/// Evaluates registered rule lists for authorization requests.
///
/// The engine holds only the immutable registry and an optional audit
/// handle, so it can be cloned freely and shared across request handlers.
///
/// # Example
///
/// ```
/// use policy::{PolicyEngine, Principal, Resource, Rule, RuleRegistry};
///
/// let mut builder = RuleRegistry::builder();
/// builder.register("Order", "view", Rule::scoped("order", "view")).unwrap();
/// let engine = PolicyEngine::new(builder.build().unwrap());
///
/// let customer = Principal::new(42u64).with_permission("order.view.own");
/// let order = Resource::new("Order", 1u64).owned_by(42u64);
///
/// assert!(engine.authorize(&customer, "view", &order).unwrap().allowed);
/// ```
#[derive(Clone)]
pub struct PolicyEngine {
    registry: Arc<RuleRegistry>,
    audit: Option<Arc<dyn DecisionAudit>>,
}

impl PolicyEngine {
    /// Creates an engine over a built registry, without auditing.
    pub fn new(registry: impl Into<Arc<RuleRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            audit: None,
        }
    }

    /// Attaches a decision audit.
    pub fn with_audit(mut self, audit: Arc<dyn DecisionAudit>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Returns the registry this engine evaluates.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Decides whether `principal` may perform `action` on `resource`.
    ///
    /// Rules are evaluated in registration order and the first rule that holds
    /// grants access. When none holds the decision is a deny, which is not an
    /// error. Errors are reserved for malformed resources and
    /// (resource type, action) pairs that have no registered policy.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(principal = %principal.id, resource_type = %resource.resource_type, action = %action)
    )]
    pub fn authorize(
        &self,
        principal: &Principal,
        action: &str,
        resource: &Resource,
    ) -> Result<Decision> {
        let started = Instant::now();
        let decision = self.evaluate(principal, action, resource)?;
        metrics::histogram!("policy_authorize_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        let allowed = if decision.allowed { "true" } else { "false" };
        metrics::counter!("policy_decisions_total", "allowed" => allowed).increment(1);
        tracing::debug!(
            allowed = decision.allowed,
            reason = %decision.reason,
            resource_id = %resource.id,
            "authorization decision"
        );

        self.emit(principal, resource, &decision);
        Ok(decision)
    }

    /// Shorthand for `authorize(..)?.allowed`.
    pub fn can(&self, principal: &Principal, action: &str, resource: &Resource) -> Result<bool> {
        Ok(self.authorize(principal, action, resource)?.allowed)
    }

    /// Authorizes one action over many resources, as bulk actions require.
    ///
    /// Every resource is evaluated (and audited) so callers can report which
    /// ones were refused. The first error aborts the batch.
    pub fn authorize_all(
        &self,
        principal: &Principal,
        action: &str,
        resources: &[Resource],
    ) -> Result<BatchDecision> {
        let decisions = resources
            .iter()
            .map(|resource| self.authorize(principal, action, resource))
            .collect::<Result<Vec<_>>>()?;

        Ok(BatchDecision {
            allowed: decisions.iter().all(|d| d.allowed),
            decisions,
        })
    }

    fn evaluate(
        &self,
        principal: &Principal,
        action: &str,
        resource: &Resource,
    ) -> Result<Decision> {
        principal.validate()?;
        resource.validate()?;

        let resource_type = resource.resource_type.as_str();
        let rules = self
            .registry
            .lookup(resource_type, action)
            .inspect_err(|err| {
                if let PolicyError::PolicyNotConfigured { .. } = err {
                    metrics::counter!("policy_not_configured_total").increment(1);
                    tracing::error!(resource_type, action, "no policy configured");
                }
            })?;

        let ctx = EvalContext {
            principal,
            resource,
            ownership: self.registry.ownership(resource_type),
        };

        let decision = rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.evaluate(&ctx))
            .map(|(index, rule)| Decision::allow(resource_type, action, index, rule))
            .unwrap_or_else(|| Decision::deny(resource_type, action));

        Ok(decision)
    }

    fn emit(&self, principal: &Principal, resource: &Resource, decision: &Decision) {
        let Some(audit) = &self.audit else {
            return;
        };

        let record = AuditRecord::new(principal.id.clone(), resource.id.clone(), decision);
        match audit.record(record) {
            Ok(()) => {}
            Err(AuditError::Dropped { capacity }) => {
                tracing::debug!(capacity, "audit queue full, decision record dropped");
            }
            Err(err) => {
                tracing::warn!(error = %err, "decision audit failed");
            }
        }
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("policies", &self.registry.policy_count())
            .field("audited", &self.audit.is_some())
            .finish()
    }
}
