//! Read-only resource snapshots handed to the engine.

use std::collections::BTreeMap;

use common::{PrincipalId, ResourceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PolicyError, Result};

/// Reference to the parent of a resource, one level deep.
///
/// Used when ownership is indirect, e.g. an order item belongs to whoever
/// owns the order. A parent carries no parent of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentRef {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: ResourceId,
    #[serde(default)]
    pub owner_id: Option<PrincipalId>,
}

impl ParentRef {
    /// Creates a parent reference.
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<ResourceId>,
        owner_id: Option<PrincipalId>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            owner_id,
        }
    }
}

/// A projection of a domain entity (order, product, note...) for policy checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub id: ResourceId,
    #[serde(default)]
    pub owner_id: Option<PrincipalId>,
    #[serde(default)]
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Resource {
    /// Creates a resource with no owner, parent or attributes.
    pub fn new(resource_type: impl Into<String>, id: impl Into<ResourceId>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            owner_id: None,
            parent: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Creates a type-level resource with an empty id, for actions such as
    /// `create`, `viewAny` or `bulkDelete` that target no single instance.
    pub fn of_type(resource_type: impl Into<String>) -> Self {
        Self::new(resource_type, ResourceId::default())
    }

    /// Returns true if this resource names no instance.
    pub fn is_type_level(&self) -> bool {
        self.id.is_empty()
    }

    /// Sets the owning principal.
    pub fn owned_by(mut self, owner: impl Into<PrincipalId>) -> Self {
        self.owner_id = Some(owner.into());
        self
    }

    /// Sets the parent reference.
    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets an attribute used by attribute rules.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Looks up an attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Rejects snapshots that cannot be routed to a policy.
    pub fn validate(&self) -> Result<()> {
        if self.resource_type.trim().is_empty() {
            return Err(PolicyError::InvalidResource(
                "resource type must not be empty".to_string(),
            ));
        }
        if let Some(parent) = &self.parent
            && parent.resource_type.trim().is_empty()
        {
            return Err(PolicyError::InvalidResource(format!(
                "parent of {} {} has no type",
                self.resource_type, self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let resource = Resource::new("Order", 10u64)
            .owned_by(42u64)
            .with_attribute("status", "pending");

        assert_eq!(resource.owner_id, Some(PrincipalId::new("42")));
        assert_eq!(
            resource.attribute("status"),
            Some(&Value::String("pending".into()))
        );
        assert!(resource.attribute("missing").is_none());
    }

    #[test]
    fn validate_rejects_empty_type() {
        let resource = Resource::new("", 1u64);
        assert!(matches!(
            resource.validate(),
            Err(PolicyError::InvalidResource(_))
        ));
    }

    #[test]
    fn validate_accepts_type_level_resource() {
        let resource = Resource::of_type("Order");
        assert!(resource.is_type_level());
        assert!(resource.validate().is_ok());
    }

    #[test]
    fn validate_rejects_untyped_parent() {
        let resource = Resource::new("OrderItem", 1u64).with_parent(ParentRef::new("", 2u64, None));
        assert!(resource.validate().is_err());
    }

    #[test]
    fn deserializes_from_wire_shape() {
        let json = serde_json::json!({
            "type": "OrderItem",
            "id": "5",
            "parent": { "type": "Order", "id": "9", "owner_id": "42" },
            "attributes": { "quantity": 3 }
        });
        let resource: Resource = serde_json::from_value(json).unwrap();
        assert_eq!(resource.resource_type, "OrderItem");
        assert!(resource.owner_id.is_none());
        let parent = resource.parent.unwrap();
        assert_eq!(parent.owner_id, Some(PrincipalId::new("42")));
        assert_eq!(resource.attributes["quantity"], serde_json::json!(3));
    }
}
