//! Rule conditions and their evaluation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ownership::OwnershipResolver;
use crate::permission::Principal;
use crate::resource::Resource;

/// One condition in a policy's ordered rule list.
///
/// Rules serialize with a `kind` tag so rule tables can be loaded from JSON:
///
/// ```json
/// {"kind": "all", "rules": [
///     {"kind": "has_permission", "permission": "order.view.own"},
///     {"kind": "is_owner"}
/// ]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    /// The principal holds this exact permission token.
    HasPermission { permission: String },

    /// The principal holds at least one of these roles.
    HasRole { roles: Vec<String> },

    /// The principal owns the resource, as answered by the resource type's
    /// ownership resolver.
    IsOwner,

    /// The resource attribute exists and equals the value.
    AttributeEquals { key: String, value: Value },

    /// The resource attribute is absent or differs from the value.
    AttributeNotEquals { key: String, value: Value },

    /// Every nested rule holds. Empty is vacuously true.
    All { rules: Vec<Rule> },

    /// At least one nested rule holds. Empty is false.
    Any { rules: Vec<Rule> },
}

impl Rule {
    pub fn permission(token: impl Into<String>) -> Self {
        Rule::HasPermission {
            permission: token.into(),
        }
    }

    pub fn role(role: impl Into<String>) -> Self {
        Rule::HasRole {
            roles: vec![role.into()],
        }
    }

    pub fn any_role<I, T>(roles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Rule::HasRole {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn owner() -> Self {
        Rule::IsOwner
    }

    pub fn attr_eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Rule::AttributeEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn attr_ne(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Rule::AttributeNotEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn all(rules: Vec<Rule>) -> Self {
        Rule::All { rules }
    }

    pub fn any(rules: Vec<Rule>) -> Self {
        Rule::Any { rules }
    }

    /// `any` scope, or `own` scope combined with ownership.
    ///
    /// Expands `("order", "view")` into
    /// `[has_permission(order.view.any), all(has_permission(order.view.own), is_owner)]`,
    /// the pair of checks nearly every resource action starts with.
    pub fn scoped(prefix: &str, action: &str) -> Vec<Rule> {
        vec![
            Rule::permission(format!("{prefix}.{action}.any")),
            Rule::all(vec![
                Rule::permission(format!("{prefix}.{action}.own")),
                Rule::IsOwner,
            ]),
        ]
    }

    /// Returns true if this rule, or any rule nested in it, is `IsOwner`.
    pub fn requires_ownership(&self) -> bool {
        match self {
            Rule::IsOwner => true,
            Rule::All { rules } | Rule::Any { rules } => {
                rules.iter().any(Rule::requires_ownership)
            }
            _ => false,
        }
    }

    /// Visits this rule and every nested rule, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Rule)) {
        visit(self);
        if let Rule::All { rules } | Rule::Any { rules } = self {
            for rule in rules {
                rule.walk(visit);
            }
        }
    }

    pub(crate) fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        match self {
            Rule::HasPermission { permission } => ctx.principal.has(permission),
            Rule::HasRole { roles } => ctx.principal.has_any_role(roles.as_slice()),
            Rule::IsOwner => ctx
                .ownership
                .resolve(ctx.resource)
                .is_some_and(|owner| owner == ctx.principal.id),
            Rule::AttributeEquals { key, value } => ctx.resource.attribute(key) == Some(value),
            Rule::AttributeNotEquals { key, value } => ctx.resource.attribute(key) != Some(value),
            Rule::All { rules } => rules.iter().all(|rule| rule.evaluate(ctx)),
            Rule::Any { rules } => rules.iter().any(|rule| rule.evaluate(ctx)),
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::HasPermission { permission } => write!(f, "has_permission({permission})"),
            Rule::HasRole { roles } => write!(f, "has_role({})", roles.join(" | ")),
            Rule::IsOwner => write!(f, "is_owner"),
            Rule::AttributeEquals { key, value } => write!(f, "{key} == {value}"),
            Rule::AttributeNotEquals { key, value } => write!(f, "{key} != {value}"),
            Rule::All { rules } => write_list(f, "all", rules),
            Rule::Any { rules } => write_list(f, "any", rules),
        }
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, name: &str, rules: &[Rule]) -> std::fmt::Result {
    write!(f, "{name}(")?;
    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{rule}")?;
    }
    write!(f, ")")
}

/// Inputs available to a rule while it is evaluated.
pub(crate) struct EvalContext<'a> {
    pub principal: &'a Principal,
    pub resource: &'a Resource,
    pub ownership: &'a dyn OwnershipResolver,
}
