//! Policy engine error types.

use thiserror::Error;

/// Errors raised while building a registry or authorizing a request.
///
/// An ordinary deny is not an error; it is returned as a [`crate::Decision`]
/// with `allowed == false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// No rules are registered for the requested (resource type, action) pair.
    #[error("No policy configured for action '{action}' on resource type '{resource_type}'")]
    PolicyNotConfigured {
        resource_type: String,
        action: String,
    },

    /// A rule set cannot be evaluated as written. Raised at registry build time.
    #[error("Invalid rule composition for {resource_type}.{action}: {reason}")]
    InvalidRuleComposition {
        resource_type: String,
        action: String,
        reason: String,
    },

    /// The same (resource type, action) pair was registered twice.
    #[error("Policy already registered for action '{action}' on resource type '{resource_type}'")]
    DuplicatePolicy {
        resource_type: String,
        action: String,
    },

    /// The principal handed to `authorize` has no usable identity.
    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    /// The resource snapshot handed to `authorize` is malformed.
    #[error("Invalid resource: {0}")]
    InvalidResource(String),
}

impl PolicyError {
    pub(crate) fn composition(
        resource_type: &str,
        action: &str,
        reason: impl Into<String>,
    ) -> Self {
        PolicyError::InvalidRuleComposition {
            resource_type: resource_type.to_string(),
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
