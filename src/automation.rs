//! Automation rule evaluation.
//!
//! `fire_matching` is the whole evaluator: a single in-order pass over the
//! rule collection. Every enabled rule whose trigger and conditions match
//! fires; there is no short-circuit, priority or conflict resolution.
//! Action execution is the caller's concern; this layer only bumps the
//! counters.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::fields::Trigger;
use crate::rule::AutomationRule;
use crate::task::Task;

/// Evaluate one condition object against a task snapshot.
///
/// Each entry names a task field (wire spelling) and an expected value: a
/// scalar means equality, an array means set membership. When the task
/// field is itself an array, a scalar expectation checks containment
/// (e.g. `{"tags": "legal"}`). Anything malformed — a non-object
/// condition, an unknown field, a shape mismatch — is a non-match; this
/// function never fails open.
pub fn condition_matches(condition: &Value, snapshot: &Value) -> bool {
    let Some(entries) = condition.as_object() else {
        return false;
    };
    let Some(fields) = snapshot.as_object() else {
        return false;
    };
    entries.iter().all(|(key, expected)| {
        let Some(actual) = fields.get(key) else {
            return false;
        };
        match expected {
            Value::Array(options) => options.iter().any(|v| v == actual),
            _ => match actual {
                Value::Array(items) => items.iter().any(|v| v == expected),
                _ => actual == expected,
            },
        }
    })
}

/// True when the rule should fire for this task and trigger.
pub fn rule_matches(rule: &AutomationRule, trigger: Trigger, snapshot: &Value) -> bool {
    rule.enabled
        && rule.trigger == trigger
        && rule
            .conditions
            .iter()
            .all(|c| condition_matches(c, snapshot))
}

/// Fire every matching rule in storage order, incrementing its counter and
/// stamping `last_triggered`. Returns the ids of the rules that fired.
///
/// The counter bump leaves `updated_at` alone: a trigger is not an edit.
pub fn fire_matching(
    rules: &mut [AutomationRule],
    task: &Task,
    trigger: Trigger,
    now: DateTime<Utc>,
) -> Vec<String> {
    // Serialization of a well-formed task cannot fail; fall back to a
    // snapshot that matches nothing rather than propagating.
    let snapshot = serde_json::to_value(task).unwrap_or(Value::Null);
    let mut fired = Vec::new();
    for rule in rules.iter_mut() {
        if rule_matches(rule, trigger, &snapshot) {
            rule.trigger_count += 1;
            rule.last_triggered = Some(now);
            fired.push(rule.id.clone());
        }
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_scalar_equality() {
        let snapshot = json!({"status": "todo", "priority": "high"});
        assert!(condition_matches(&json!({"priority": "high"}), &snapshot));
        assert!(!condition_matches(&json!({"priority": "low"}), &snapshot));
    }

    #[test]
    fn test_condition_set_membership() {
        let snapshot = json!({"priority": "high"});
        assert!(condition_matches(
            &json!({"priority": ["high", "urgent"]}),
            &snapshot
        ));
        assert!(!condition_matches(
            &json!({"priority": ["low", "medium"]}),
            &snapshot
        ));
    }

    #[test]
    fn test_condition_array_field_containment() {
        let snapshot = json!({"tags": ["legal", "urgent"]});
        assert!(condition_matches(&json!({"tags": "legal"}), &snapshot));
        assert!(!condition_matches(&json!({"tags": "survey"}), &snapshot));
    }

    #[test]
    fn test_condition_fails_closed() {
        let snapshot = json!({"status": "todo"});
        // Unknown field.
        assert!(!condition_matches(&json!({"nonsense": "x"}), &snapshot));
        // Condition is not an object.
        assert!(!condition_matches(&json!("status"), &snapshot));
        assert!(!condition_matches(&json!(["status", "todo"]), &snapshot));
        // Snapshot is not an object.
        assert!(!condition_matches(&json!({"status": "todo"}), &Value::Null));
    }

    #[test]
    fn test_empty_conditions_always_match() {
        let snapshot = json!({"status": "todo"});
        assert!(condition_matches(&json!({}), &snapshot));
    }
}
