//! Ownership resolution strategies.
//!
//! Each resource type has one resolver; [`DirectOwner`] is used when none is
//! registered. Resolvers look at most one level up, through
//! [`crate::ParentRef`], and never perform I/O.

use common::PrincipalId;
use serde_json::Value;

use crate::resource::Resource;

/// Answers "who owns this resource instance".
pub trait OwnershipResolver: Send + Sync + std::fmt::Debug {
    /// Returns the owning principal, or `None` when nobody owns the resource.
    fn resolve(&self, resource: &Resource) -> Option<PrincipalId>;

    /// Resource type this resolver reads ownership from, when it is not the
    /// resource itself. Checked against the registry at build time.
    fn parent_type(&self) -> Option<&str> {
        None
    }
}

/// Ownership is the resource's own `owner_id`. An empty id means unowned.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectOwner;

impl OwnershipResolver for DirectOwner {
    fn resolve(&self, resource: &Resource) -> Option<PrincipalId> {
        resource.owner_id.clone().filter(|owner| !owner.is_empty())
    }
}

/// Ownership is inherited from a parent of the given type,
/// e.g. an order item is owned by whoever owns its order.
#[derive(Debug, Clone)]
pub struct ParentOwner {
    parent_type: String,
}

impl ParentOwner {
    pub fn new(parent_type: impl Into<String>) -> Self {
        Self {
            parent_type: parent_type.into(),
        }
    }
}

impl OwnershipResolver for ParentOwner {
    fn resolve(&self, resource: &Resource) -> Option<PrincipalId> {
        resource
            .parent
            .as_ref()
            .filter(|parent| parent.resource_type == self.parent_type)
            .and_then(|parent| parent.owner_id.clone())
            .filter(|owner| !owner.is_empty())
    }

    fn parent_type(&self) -> Option<&str> {
        Some(&self.parent_type)
    }
}

/// Ownership is stored in a resource attribute, such as `author_id` on a note,
/// instead of the canonical `owner_id`.
///
/// Numeric attributes are read in their string form, so both `"42"` and `42`
/// resolve to principal `42`. Null, boolean and empty values resolve to nobody.
#[derive(Debug, Clone)]
pub struct AttributeOwner {
    key: String,
}

impl AttributeOwner {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl OwnershipResolver for AttributeOwner {
    fn resolve(&self, resource: &Resource) -> Option<PrincipalId> {
        match resource.attribute(&self.key)? {
            Value::String(s) if !s.is_empty() => Some(PrincipalId::new(s.as_str())),
            Value::Number(n) => Some(PrincipalId::new(n.to_string())),
            _ => None,
        }
    }
}
