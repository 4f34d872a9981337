//! Condition evaluation logic
//!
//! Conditions are evaluated against an [`EvalContext`], the map of facts
//! describing the trigger occurrence (message count, session duration, new
//! status, ...). Evaluation never fails: a missing field, a type mismatch or
//! an unknown operator makes the condition false without affecting sibling
//! conditions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::trace;

use crate::condition::{ConditionGroup, ConditionLogic, ConditionOperator, RuleCondition};

/// Facts a rule's conditions are matched against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvalContext {
    facts: HashMap<String, Value>,
}

impl EvalContext {
    /// Create a new empty evaluation context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fact to the context
    pub fn with_fact(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.facts.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a fact
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.facts.insert(key.into(), value.into());
    }

    /// Look up a fact
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.facts.get(key)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Iterate over all facts
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.facts.iter()
    }
}

impl From<HashMap<String, Value>> for EvalContext {
    fn from(facts: HashMap<String, Value>) -> Self {
        Self { facts }
    }
}

impl FromIterator<(String, Value)> for EvalContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}

/// Evaluate a single condition
///
/// Returns `false` when the field is absent from the context, whatever the
/// operator. This includes `ne`: a fact that does not exist is not "not
/// equal" to anything.
pub fn evaluate(condition: &RuleCondition, ctx: &EvalContext) -> bool {
    let Some(actual) = ctx.get(&condition.field) else {
        trace!(field = %condition.field, "Field missing from context");
        return false;
    };

    let expected = &condition.value;
    let result = match &condition.operator {
        ConditionOperator::Equals => actual == expected,
        ConditionOperator::NotEquals => actual != expected,
        ConditionOperator::GreaterThan => compare_numbers(actual, expected, |a, b| a > b),
        ConditionOperator::GreaterThanOrEqual => compare_numbers(actual, expected, |a, b| a >= b),
        ConditionOperator::LessThan => compare_numbers(actual, expected, |a, b| a < b),
        ConditionOperator::LessThanOrEqual => compare_numbers(actual, expected, |a, b| a <= b),
        ConditionOperator::Contains => starts_with_or_equals(actual, expected),
        ConditionOperator::In => is_member(actual, expected),
        ConditionOperator::Other(name) => {
            trace!(operator = %name, "Unknown operator");
            false
        }
    };

    trace!(
        field = %condition.field,
        operator = %condition.operator,
        result,
        "Condition evaluated"
    );
    result
}

/// Evaluate a flat condition list (implicit AND, empty list passes)
pub fn evaluate_all(conditions: &[RuleCondition], ctx: &EvalContext) -> bool {
    conditions.iter().all(|c| evaluate(c, ctx))
}

/// Evaluate a nested condition group
///
/// An empty group passes. Otherwise every leaf condition and every subgroup
/// is evaluated and the results are combined with the group's logic.
pub fn evaluate_group(group: &ConditionGroup, ctx: &EvalContext) -> bool {
    if group.is_empty() {
        return true;
    }

    let results: Vec<bool> = group
        .conditions
        .iter()
        .map(|c| evaluate(c, ctx))
        .chain(group.groups.iter().map(|g| evaluate_group(g, ctx)))
        .collect();

    match group.logic {
        ConditionLogic::And => results.iter().all(|r| *r),
        ConditionLogic::Or => results.iter().any(|r| *r),
    }
}

/// Coerce a JSON value to `f64`
///
/// Only JSON numbers coerce; numeric strings and booleans do not.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn compare_numbers(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (to_number(actual), to_number(expected)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

// Matches when the expected string is a prefix of (or equal to) the actual
// string; this is not a general substring search.
fn starts_with_or_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::String(haystack), Value::String(needle)) => {
            haystack == needle || haystack.starts_with(needle.as_str())
        }
        _ => false,
    }
}

fn is_member(actual: &Value, expected: &Value) -> bool {
    match expected {
        Value::Array(items) => items.iter().any(|item| item == actual),
        _ => false,
    }
}
