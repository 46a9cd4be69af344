use std::env;
use std::fs;

use serde_json::json;

use avenstudio::error::StoreError;
use avenstudio::fields::{Priority, Trigger};
use avenstudio::rule::{NewRule, RulePatch};
use avenstudio::store::{LocalStore, MemoryStore, Store};
use avenstudio::task::NewTask;

fn rule(name: &str, trigger: Trigger, conditions: Vec<serde_json::Value>) -> NewRule {
    NewRule {
        name: name.into(),
        description: String::new(),
        enabled: true,
        trigger,
        conditions,
        actions: vec![json!({"type": "notify"})],
    }
}

fn high_priority_task(store: &dyn Store) -> String {
    let new = NewTask {
        priority: Some(Priority::High),
        ..NewTask::titled("hot task")
    };
    store.create_task(new).unwrap().id
}

#[test]
fn test_matching_rule_fires_once_others_untouched() {
    let store = MemoryStore::new();
    let matching = store
        .create_rule(rule(
            "high created",
            Trigger::Created,
            vec![json!({"priority": "high"})],
        ))
        .unwrap();
    let wrong_condition = store
        .create_rule(rule(
            "low created",
            Trigger::Created,
            vec![json!({"priority": "low"})],
        ))
        .unwrap();
    let wrong_trigger = store
        .create_rule(rule(
            "high completed",
            Trigger::Completed,
            vec![json!({"priority": "high"})],
        ))
        .unwrap();

    let task_id = high_priority_task(&store);
    let fired = store.execute_automation(&task_id, Trigger::Created).unwrap();
    assert_eq!(fired, vec![matching.id.clone()]);

    let rules = store.list_rules().unwrap();
    let by_id = |id: &str| rules.iter().find(|r| r.id == id).unwrap();
    assert_eq!(by_id(&matching.id).trigger_count, 1);
    assert!(by_id(&matching.id).last_triggered.is_some());
    assert_eq!(by_id(&wrong_condition.id).trigger_count, 0);
    assert_eq!(by_id(&wrong_trigger.id).trigger_count, 0);
}

#[test]
fn test_all_matching_rules_fire_in_order() {
    let store = MemoryStore::new();
    let first = store
        .create_rule(rule("first", Trigger::Created, vec![]))
        .unwrap();
    let second = store
        .create_rule(rule(
            "second",
            Trigger::Created,
            vec![json!({"status": "todo"})],
        ))
        .unwrap();

    let task_id = high_priority_task(&store);
    let fired = store.execute_automation(&task_id, Trigger::Created).unwrap();
    // No short-circuit: both fire, storage order preserved.
    assert_eq!(fired, vec![first.id, second.id]);
}

#[test]
fn test_disabled_rule_never_fires() {
    let store = MemoryStore::new();
    let mut disabled = rule("disabled", Trigger::Created, vec![]);
    disabled.enabled = false;
    let created = store.create_rule(disabled).unwrap();

    let task_id = high_priority_task(&store);
    let fired = store.execute_automation(&task_id, Trigger::Created).unwrap();
    assert!(fired.is_empty());
    assert_eq!(store.list_rules().unwrap()[0].trigger_count, 0);
    assert_eq!(store.list_rules().unwrap()[0].id, created.id);
}

#[test]
fn test_malformed_condition_fails_closed() {
    let store = MemoryStore::new();
    store
        .create_rule(rule(
            "broken",
            Trigger::Created,
            // A condition on a field tasks don't have, plus a non-object.
            vec![json!({"no_such_field": 1}), json!("garbage")],
        ))
        .unwrap();

    let task_id = high_priority_task(&store);
    let fired = store.execute_automation(&task_id, Trigger::Created).unwrap();
    assert!(fired.is_empty());
}

#[test]
fn test_execute_for_missing_task_is_not_found() {
    let store = MemoryStore::new();
    let err = store
        .execute_automation("nope", Trigger::Created)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn test_rule_edit_cannot_touch_counter() {
    let store = MemoryStore::new();
    let created = store
        .create_rule(rule("counted", Trigger::Created, vec![]))
        .unwrap();
    let task_id = high_priority_task(&store);
    store.execute_automation(&task_id, Trigger::Created).unwrap();

    let patch = RulePatch {
        name: Some("renamed".into()),
        ..RulePatch::default()
    };
    let updated = store.update_rule(&created.id, patch).unwrap();
    assert_eq!(updated.name, "renamed");
    // The counter only moves through the evaluator.
    assert_eq!(updated.trigger_count, 1);
}

#[test]
fn test_counter_persists_in_local_store() {
    let mut dir = env::temp_dir();
    dir.push("avenstudio_test_counter_persists");
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }

    let created = {
        let store = LocalStore::open(dir.clone()).unwrap();
        let created = store
            .create_rule(rule("persisted", Trigger::Created, vec![]))
            .unwrap();
        let task_id = high_priority_task(&store);
        store.execute_automation(&task_id, Trigger::Created).unwrap();
        store.execute_automation(&task_id, Trigger::Created).unwrap();
        created
    };

    let reopened = LocalStore::open(dir.clone()).unwrap();
    let rules = reopened.list_rules().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, created.id);
    assert_eq!(rules[0].trigger_count, 2);

    fs::remove_dir_all(&dir).ok();
}
