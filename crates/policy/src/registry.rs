//! Rule registry mapping (resource type, action) to ordered rule lists.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PolicyError, Result};
use crate::ownership::{DirectOwner, OwnershipResolver};
use crate::rule::Rule;

static DIRECT_OWNER: DirectOwner = DirectOwner;

/// Policies for a single resource type.
#[derive(Debug, Default)]
struct ResourcePolicies {
    actions: HashMap<String, Vec<Rule>>,
    ownership: Option<Arc<dyn OwnershipResolver>>,
}

/// Collects policies during startup and validates them into a [`RuleRegistry`].
///
/// Registration errors that can be detected locally (empty names, duplicate
/// pairs, empty permission tokens) are returned by [`register`](Self::register);
/// cross-references between resource types are checked by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RuleRegistryBuilder {
    resources: HashMap<String, ResourcePolicies>,
}

impl RuleRegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the rule list for a (resource type, action) pair.
    pub fn register(
        &mut self,
        resource_type: impl Into<String>,
        action: impl Into<String>,
        rules: Vec<Rule>,
    ) -> Result<&mut Self> {
        let resource_type = resource_type.into();
        let action = action.into();

        if resource_type.trim().is_empty() {
            return Err(PolicyError::composition(
                &resource_type,
                &action,
                "resource type must not be empty",
            ));
        }
        if action.trim().is_empty() {
            return Err(PolicyError::composition(
                &resource_type,
                &action,
                "action must not be empty",
            ));
        }
        check_rules(&resource_type, &action, &rules)?;

        let policies = self.resources.entry(resource_type.clone()).or_default();
        if policies.actions.contains_key(&action) {
            return Err(PolicyError::DuplicatePolicy {
                resource_type,
                action,
            });
        }
        policies.actions.insert(action, rules);
        Ok(self)
    }

    /// Sets the ownership resolver for a resource type. Resource types without
    /// one use [`DirectOwner`].
    pub fn ownership(
        &mut self,
        resource_type: impl Into<String>,
        resolver: impl OwnershipResolver + 'static,
    ) -> &mut Self {
        self.resources
            .entry(resource_type.into())
            .or_default()
            .ownership = Some(Arc::new(resolver));
        self
    }

    /// Validates cross-references and freezes the registry.
    pub fn build(self) -> Result<RuleRegistry> {
        for (resource_type, policies) in &self.resources {
            if policies.actions.is_empty() {
                return Err(PolicyError::composition(
                    resource_type,
                    "*",
                    "ownership resolver declared for a resource type with no policies",
                ));
            }

            let Some(parent_type) = policies
                .ownership
                .as_deref()
                .and_then(|resolver| resolver.parent_type())
            else {
                continue;
            };

            for (action, rules) in &policies.actions {
                if !rules.iter().any(Rule::requires_ownership) {
                    continue;
                }
                if parent_type == resource_type {
                    return Err(PolicyError::composition(
                        resource_type,
                        action,
                        "ownership cannot be inherited from the resource type itself",
                    ));
                }
                if !self.resources.contains_key(parent_type) {
                    return Err(PolicyError::composition(
                        resource_type,
                        action,
                        format!("is_owner resolves through unregistered parent type '{parent_type}'"),
                    ));
                }
            }
        }

        let registry = RuleRegistry {
            resources: self.resources,
        };
        tracing::info!(
            resource_types = registry.resources.len(),
            policies = registry.policy_count(),
            "rule registry built"
        );
        Ok(registry)
    }
}

fn check_rules(resource_type: &str, action: &str, rules: &[Rule]) -> Result<()> {
    let mut problem = None;
    for rule in rules {
        rule.walk(&mut |rule| match rule {
            Rule::HasPermission { permission } if permission.trim().is_empty() => {
                problem.get_or_insert("has_permission with an empty token");
            }
            Rule::AttributeEquals { key, .. } | Rule::AttributeNotEquals { key, .. }
                if key.trim().is_empty() =>
            {
                problem.get_or_insert("attribute rule with an empty key");
            }
            Rule::All { rules } if rules.is_empty() => {
                tracing::warn!(
                    resource_type,
                    action,
                    "empty all() always matches; check the rule table"
                );
            }
            _ => {}
        });
    }

    match problem {
        Some(reason) => Err(PolicyError::composition(resource_type, action, reason)),
        None => Ok(()),
    }
}

/// Immutable lookup table consulted by the engine.
///
/// Built once at startup and shared read-only across threads.
#[derive(Debug)]
pub struct RuleRegistry {
    resources: HashMap<String, ResourcePolicies>,
}

impl RuleRegistry {
    /// Starts a new registry builder.
    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::new()
    }

    /// Returns the rule list for a pair, or `PolicyNotConfigured`.
    pub fn lookup(&self, resource_type: &str, action: &str) -> Result<&[Rule]> {
        self.resources
            .get(resource_type)
            .and_then(|policies| policies.actions.get(action))
            .map(Vec::as_slice)
            .ok_or_else(|| PolicyError::PolicyNotConfigured {
                resource_type: resource_type.to_string(),
                action: action.to_string(),
            })
    }

    /// Returns the ownership resolver for a resource type.
    pub fn ownership(&self, resource_type: &str) -> &dyn OwnershipResolver {
        self.resources
            .get(resource_type)
            .and_then(|policies| policies.ownership.as_deref())
            .unwrap_or(&DIRECT_OWNER)
    }

    /// Returns true if rules are registered for the pair.
    pub fn contains(&self, resource_type: &str, action: &str) -> bool {
        self.lookup(resource_type, action).is_ok()
    }

    /// Registered resource types, sorted.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut types: Vec<_> = self.resources.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Registered actions for a resource type, sorted.
    pub fn actions(&self, resource_type: &str) -> Vec<&str> {
        let mut actions: Vec<_> = self
            .resources
            .get(resource_type)
            .map(|policies| policies.actions.keys().map(String::as_str).collect())
            .unwrap_or_default();
        actions.sort_unstable();
        actions
    }

    /// Total number of registered (resource type, action) pairs.
    pub fn policy_count(&self) -> usize {
        self.resources
            .values()
            .map(|policies| policies.actions.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ownership::ParentOwner;
    use crate::resource::{ParentRef, Resource};

    #[test]
    fn lookup_returns_registered_rules() {
        let mut builder = RuleRegistry::builder();
        builder
            .register("Order", "view", Rule::scoped("order", "view"))
            .unwrap();
        let registry = builder.build().unwrap();

        let rules = registry.lookup("Order", "view").unwrap();
        assert_eq!(rules.len(), 2);
        assert!(registry.contains("Order", "view"));
    }

    #[test]
    fn lookup_unknown_pair_is_not_configured() {
        let mut builder = RuleRegistry::builder();
        builder
            .register("Order", "view", vec![Rule::permission("order.view.any")])
            .unwrap();
        let registry = builder.build().unwrap();

        assert_eq!(
            registry.lookup("Order", "archive"),
            Err(PolicyError::PolicyNotConfigured {
                resource_type: "Order".into(),
                action: "archive".into(),
            })
        );
        assert!(registry.lookup("Widget", "view").is_err());
    }

    #[test]
    fn registered_empty_rule_list_is_not_missing() {
        let mut builder = RuleRegistry::builder();
        builder.register("AuditLog", "delete", vec![]).unwrap();
        let registry = builder.build().unwrap();

        assert_eq!(registry.lookup("AuditLog", "delete").unwrap().len(), 0);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut builder = RuleRegistry::builder();
        builder
            .register("Order", "view", vec![Rule::permission("order.view.any")])
            .unwrap();
        let err = builder
            .register("Order", "view", vec![Rule::role("admin")])
            .unwrap_err();
        assert!(matches!(err, PolicyError::DuplicatePolicy { .. }));
    }

    #[test]
    fn empty_names_and_tokens_are_rejected() {
        let mut builder = RuleRegistry::builder();
        assert!(builder.register("", "view", vec![]).is_err());
        assert!(builder.register("Order", " ", vec![]).is_err());
        assert!(matches!(
            builder.register(
                "Order",
                "view",
                vec![Rule::any(vec![Rule::permission("")])]
            ),
            Err(PolicyError::InvalidRuleComposition { .. })
        ));
        assert!(
            builder
                .register("Order", "update", vec![Rule::attr_eq("", 1)])
                .is_err()
        );
    }

    #[test]
    fn parent_ownership_requires_registered_parent() {
        let mut builder = RuleRegistry::builder();
        builder
            .register("OrderItem", "view", Rule::scoped("order_item", "view"))
            .unwrap();
        builder.ownership("OrderItem", ParentOwner::new("Order"));

        let err = builder.build().unwrap_err();
        assert!(matches!(err, PolicyError::InvalidRuleComposition { .. }));
    }

    #[test]
    fn parent_ownership_unused_by_rules_is_accepted() {
        let mut builder = RuleRegistry::builder();
        builder
            .register("OrderItem", "view", vec![Rule::permission("order_item.view.any")])
            .unwrap();
        builder.ownership("OrderItem", ParentOwner::new("Order"));

        assert!(builder.build().is_ok());
    }

    #[test]
    fn self_referencing_parent_is_rejected() {
        let mut builder = RuleRegistry::builder();
        builder
            .register("Order", "view", Rule::scoped("order", "view"))
            .unwrap();
        builder.ownership("Order", ParentOwner::new("Order"));

        assert!(builder.build().is_err());
    }

    #[test]
    fn ownership_without_policies_is_rejected() {
        let mut builder = RuleRegistry::builder();
        builder.ownership("Ghost", ParentOwner::new("Order"));
        assert!(builder.build().is_err());
    }

    #[test]
    fn ownership_defaults_to_direct_owner() {
        let mut builder = RuleRegistry::builder();
        builder
            .register("Order", "view", Rule::scoped("order", "view"))
            .unwrap();
        builder
            .register("OrderItem", "view", Rule::scoped("order_item", "view"))
            .unwrap();
        builder.ownership("OrderItem", ParentOwner::new("Order"));
        let registry = builder.build().unwrap();

        let item = Resource::new("OrderItem", 1u64)
            .owned_by(1u64)
            .with_parent(ParentRef::new("Order", 2u64, Some(42u64.into())));
        assert_eq!(
            registry.ownership("OrderItem").resolve(&item),
            Some(42u64.into())
        );
        assert_eq!(
            registry.ownership("Order").resolve(&Resource::new("Order", 2u64).owned_by(5u64)),
            Some(5u64.into())
        );
        assert!(registry.ownership("Unknown").parent_type().is_none());
    }

    #[test]
    fn introspection_is_sorted() {
        let mut builder = RuleRegistry::builder();
        builder.register("Product", "view", vec![]).unwrap();
        builder.register("Order", "view", vec![]).unwrap();
        builder.register("Order", "archive", vec![]).unwrap();
        let registry = builder.build().unwrap();

        assert_eq!(registry.resource_types(), vec!["Order", "Product"]);
        assert_eq!(registry.actions("Order"), vec!["archive", "view"]);
        assert_eq!(registry.policy_count(), 3);
    }
}
