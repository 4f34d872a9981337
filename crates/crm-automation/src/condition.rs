//! Condition types
//!
//! Conditions are field/operator/value predicates evaluated against the facts
//! of a trigger occurrence. The flat condition list of an automation is an
//! implicit AND; [`ConditionGroup`] expresses nested AND/OR trees.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a [`RuleCondition`]
///
/// Serialized as its wire name. Names that are not recognised are kept as
/// [`ConditionOperator::Other`] so an imported rule still loads; such a
/// condition never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    /// `eq` / `equals`
    Equals,
    /// `ne` / `not_equals`
    NotEquals,
    /// `gt`
    GreaterThan,
    /// `gte`
    GreaterThanOrEqual,
    /// `lt`
    LessThan,
    /// `lte`
    LessThanOrEqual,
    /// `contains` (prefix-or-equal string match)
    Contains,
    /// `in` (membership in a value list)
    In,
    /// Unrecognised operator name
    Other(String),
}

impl ConditionOperator {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionOperator::Equals => "eq",
            ConditionOperator::NotEquals => "ne",
            ConditionOperator::GreaterThan => "gt",
            ConditionOperator::GreaterThanOrEqual => "gte",
            ConditionOperator::LessThan => "lt",
            ConditionOperator::LessThanOrEqual => "lte",
            ConditionOperator::Contains => "contains",
            ConditionOperator::In => "in",
            ConditionOperator::Other(name) => name,
        }
    }
}

impl From<&str> for ConditionOperator {
    fn from(s: &str) -> Self {
        match s {
            "eq" | "equals" => ConditionOperator::Equals,
            "ne" | "not_equals" => ConditionOperator::NotEquals,
            "gt" => ConditionOperator::GreaterThan,
            "gte" => ConditionOperator::GreaterThanOrEqual,
            "lt" => ConditionOperator::LessThan,
            "lte" => ConditionOperator::LessThanOrEqual,
            "contains" => ConditionOperator::Contains,
            "in" => ConditionOperator::In,
            other => ConditionOperator::Other(other.to_string()),
        }
    }
}

impl From<String> for ConditionOperator {
    fn from(s: String) -> Self {
        ConditionOperator::from(s.as_str())
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field/operator/value predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Key looked up in the evaluation context
    pub field: String,

    /// Comparison to apply
    pub operator: ConditionOperator,

    /// Value compared against the context fact
    #[serde(default)]
    pub value: serde_json::Value,
}

impl RuleCondition {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<ConditionOperator>,
        value: serde_json::Value,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value,
        }
    }
}

/// Boolean combinator of a [`ConditionGroup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionLogic {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

/// Recursive AND/OR group of conditions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionGroup {
    /// How the results of members are combined
    #[serde(default)]
    pub logic: ConditionLogic,

    /// Leaf conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<RuleCondition>,

    /// Nested groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ConditionGroup>,
}

impl ConditionGroup {
    /// Create an AND group
    pub fn all(conditions: Vec<RuleCondition>) -> Self {
        Self {
            logic: ConditionLogic::And,
            conditions,
            groups: Vec::new(),
        }
    }

    /// Create an OR group
    pub fn any(conditions: Vec<RuleCondition>) -> Self {
        Self {
            logic: ConditionLogic::Or,
            conditions,
            groups: Vec::new(),
        }
    }

    /// Add a nested group
    pub fn with_group(mut self, group: ConditionGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Whether the group has neither conditions nor subgroups
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }
}
