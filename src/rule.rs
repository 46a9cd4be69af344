//! Automation rule entity and its create/update payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::Trigger;

/// A trigger + condition pair with a monotone fire counter.
///
/// `conditions` is a list of JSON objects mapping a task field to an
/// expected value (scalar for equality, array for set membership); a rule
/// matches when every object matches. `actions` are opaque effect
/// descriptors carried through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub trigger: Trigger,
    #[serde(default)]
    pub conditions: Vec<Value>,
    #[serde(default)]
    pub actions: Vec<Value>,
    #[serde(default)]
    pub trigger_count: u64,
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

/// Payload for creating a rule. The counter always starts at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub trigger: Trigger,
    #[serde(default)]
    pub conditions: Vec<Value>,
    #[serde(default)]
    pub actions: Vec<Value>,
}

/// Partial update for a rule.
///
/// Deliberately has no counter or last-triggered fields: `trigger_count`
/// only moves through the evaluator, never through an edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Value>>,
}

impl NewRule {
    pub fn into_rule(self, id: String, now: DateTime<Utc>) -> AutomationRule {
        AutomationRule {
            id,
            name: self.name,
            description: self.description,
            enabled: self.enabled,
            trigger: self.trigger,
            conditions: self.conditions,
            actions: self.actions,
            trigger_count: 0,
            last_triggered: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl RulePatch {
    /// Shallow merge of present fields; refreshes `updated_at`.
    pub fn apply(self, rule: &mut AutomationRule, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            rule.name = name;
        }
        if let Some(description) = self.description {
            rule.description = description;
        }
        if let Some(enabled) = self.enabled {
            rule.enabled = enabled;
        }
        if let Some(trigger) = self.trigger {
            rule.trigger = trigger;
        }
        if let Some(conditions) = self.conditions {
            rule.conditions = conditions;
        }
        if let Some(actions) = self.actions {
            rule.actions = actions;
        }
        rule.updated_at = now;
    }
}
