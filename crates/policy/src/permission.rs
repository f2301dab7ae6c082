//! Principal capabilities.

use std::collections::HashSet;

use common::PrincipalId;
use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, Result};

/// The permissions and roles granted to a principal.
///
/// Permission tokens are matched exactly: holding `"order.view.own"` says
/// nothing about `"order.view.any"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    #[serde(default)]
    permissions: HashSet<String>,
    #[serde(default)]
    roles: HashSet<String>,
}

impl PermissionSet {
    /// Creates an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a permission token.
    pub fn with_permission(mut self, token: impl Into<String>) -> Self {
        self.permissions.insert(token.into());
        self
    }

    /// Adds several permission tokens.
    pub fn with_permissions<I, T>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.permissions.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Adds a role name.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Adds several role names.
    pub fn with_roles<I, T>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Returns true if the exact permission token was granted.
    pub fn has(&self, token: &str) -> bool {
        self.permissions.contains(token)
    }

    /// Returns true if at least one of the given roles was granted.
    ///
    /// An empty list never matches.
    pub fn has_any_role<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().any(|name| self.roles.contains(name.as_ref()))
    }

    /// Iterates the granted permission tokens (unordered).
    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// Iterates the granted role names (unordered).
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }
}

/// The authenticated actor of one authorization call.
///
/// Built per request by the identity provider and never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    #[serde(flatten)]
    pub capabilities: PermissionSet,
}

impl Principal {
    /// Creates a principal with no permissions or roles.
    pub fn new(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
            capabilities: PermissionSet::new(),
        }
    }

    /// Creates a principal with the given capabilities.
    pub fn with_capabilities(id: impl Into<PrincipalId>, capabilities: PermissionSet) -> Self {
        Self {
            id: id.into(),
            capabilities,
        }
    }

    /// Adds a permission token.
    pub fn with_permission(mut self, token: impl Into<String>) -> Self {
        self.capabilities = self.capabilities.with_permission(token);
        self
    }

    /// Adds a role name.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.capabilities = self.capabilities.with_role(role);
        self
    }

    /// Rejects principals with an empty id.
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(PolicyError::InvalidPrincipal(
                "principal id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Shorthand for [`PermissionSet::has`].
    pub fn has(&self, token: &str) -> bool {
        self.capabilities.has(token)
    }

    /// Shorthand for [`PermissionSet::has_any_role`].
    pub fn has_any_role<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.capabilities.has_any_role(names)
    }
}
