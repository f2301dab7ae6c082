//! Serializable policy tables.

use std::collections::BTreeMap;
use std::path::Path;

use policy::{AttributeOwner, ParentOwner, Rule, RuleRegistry};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// How ownership is resolved for a resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OwnershipConfig {
    /// The resource's own `owner_id`.
    #[default]
    Direct,
    /// The `owner_id` of a parent of the given type.
    Parent { resource_type: String },
    /// A resource attribute holding the owner's id.
    Attribute { key: String },
}

impl OwnershipConfig {
    fn is_direct(&self) -> bool {
        matches!(self, OwnershipConfig::Direct)
    }
}

/// Policies for one resource type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTable {
    #[serde(default, skip_serializing_if = "OwnershipConfig::is_direct")]
    pub ownership: OwnershipConfig,
    #[serde(default)]
    pub actions: BTreeMap<String, Vec<Rule>>,
}

impl ResourceTable {
    /// Sets the rule list for an action, replacing any previous one.
    pub fn action(&mut self, action: impl Into<String>, rules: Vec<Rule>) -> &mut Self {
        self.actions.insert(action.into(), rules);
        self
    }

    /// Sets the ownership strategy.
    pub fn ownership(&mut self, ownership: OwnershipConfig) -> &mut Self {
        self.ownership = ownership;
        self
    }
}

/// A complete policy table: resource type → ownership + action rules.
///
/// ```json
/// {
///   "resources": {
///     "OrderItem": {
///       "ownership": {"kind": "parent", "resource_type": "Order"},
///       "actions": {
///         "view": [{"kind": "has_permission", "permission": "order_item.view.any"}]
///       }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyTable {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceTable>,
}

impl PolicyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a table from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            resource_types = table.resources.len(),
            "policy table loaded"
        );
        Ok(table)
    }

    /// Serializes the table as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the entry for a resource type, creating it if missing.
    pub fn resource(&mut self, resource_type: impl Into<String>) -> &mut ResourceTable {
        self.resources.entry(resource_type.into()).or_default()
    }

    /// Overlays another table: its actions replace same-named ones here and
    /// a non-direct ownership setting replaces this table's.
    pub fn merge(&mut self, other: PolicyTable) {
        for (resource_type, incoming) in other.resources {
            let entry = self.resource(resource_type);
            if !incoming.ownership.is_direct() {
                entry.ownership = incoming.ownership;
            }
            entry.actions.extend(incoming.actions);
        }
    }

    /// Total number of (resource type, action) entries.
    pub fn policy_count(&self) -> usize {
        self.resources.values().map(|r| r.actions.len()).sum()
    }

    /// Validates the table and builds an immutable registry.
    pub fn into_registry(self) -> Result<RuleRegistry> {
        let mut builder = RuleRegistry::builder();
        for (resource_type, table) in self.resources {
            match table.ownership {
                OwnershipConfig::Direct => {}
                OwnershipConfig::Parent {
                    resource_type: parent,
                } => {
                    builder.ownership(resource_type.as_str(), ParentOwner::new(parent));
                }
                OwnershipConfig::Attribute { key } => {
                    builder.ownership(resource_type.as_str(), AttributeOwner::new(key));
                }
            }
            for (action, rules) in table.actions {
                builder.register(resource_type.as_str(), action, rules)?;
            }
        }
        Ok(builder.build()?)
    }
}
