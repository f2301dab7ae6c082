//! Authorization decisions.

use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// Reason attached to every deny: no rule in the list evaluated true.
pub const NO_MATCHING_RULE: &str = "no matching rule";

/// The engine's verdict for one (principal, action, resource) request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    /// Description of the granting rule, or [`NO_MATCHING_RULE`].
    pub reason: String,
    pub resource_type: String,
    pub action: String,
    /// Index of the granting rule within the policy's rule list.
    pub matched_rule: Option<usize>,
}

impl Decision {
    /// An allow granted by the rule at `index`.
    pub fn allow(resource_type: &str, action: &str, index: usize, rule: &Rule) -> Self {
        Self {
            allowed: true,
            reason: rule.to_string(),
            resource_type: resource_type.to_string(),
            action: action.to_string(),
            matched_rule: Some(index),
        }
    }

    /// A deny because nothing matched.
    pub fn deny(resource_type: &str, action: &str) -> Self {
        Self {
            allowed: false,
            reason: NO_MATCHING_RULE.to_string(),
            resource_type: resource_type.to_string(),
            action: action.to_string(),
            matched_rule: None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn is_denied(&self) -> bool {
        !self.allowed
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verdict = if self.allowed { "allow" } else { "deny" };
        write!(
            f,
            "{verdict} {}.{}: {}",
            self.resource_type, self.action, self.reason
        )
    }
}
