use std::env;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use avenstudio::error::StoreError;
use avenstudio::fields::{Priority, Status};
use avenstudio::store::{LocalStore, MemoryStore, Store, TaskFilter};
use avenstudio::task::{NewTask, TaskPatch};

fn with_local_store<F>(test_name: &str, f: F)
where
    F: FnOnce(&LocalStore, PathBuf),
{
    let mut dir = env::temp_dir();
    dir.push(format!("avenstudio_test_{}", test_name));
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    let store = LocalStore::open(dir.clone()).unwrap();
    f(&store, dir.clone());
    fs::remove_dir_all(&dir).ok();
}

fn high_priority_task(title: &str) -> NewTask {
    NewTask {
        priority: Some(Priority::High),
        ..NewTask::titled(title)
    }
}

#[test]
fn test_create_then_list_preserves_fields() {
    with_local_store("create_list", |store, _| {
        let new = NewTask {
            description: "submit to council".into(),
            priority: Some(Priority::High),
            category: Some("planning".into()),
            tags: vec!["legal".into(), "urgent".into()],
            ..NewTask::titled("Submit planning application")
        };
        let created = store.create_task(new).unwrap();

        let tasks = store.list_tasks(&TaskFilter::default()).unwrap();
        assert_eq!(tasks.len(), 1);
        let listed = &tasks[0];
        assert_eq!(listed.id, created.id);
        assert_eq!(listed.title, "Submit planning application");
        assert_eq!(listed.description, "submit to council");
        assert_eq!(listed.status, Status::Todo);
        assert_eq!(listed.priority, Priority::High);
        assert_eq!(listed.category, "planning");
        assert_eq!(listed.tags, vec!["legal", "urgent"]);
        assert_eq!(listed.completion_percentage, 0);
        assert_eq!(listed.created_at, listed.updated_at);
    });
}

#[test]
fn test_create_without_title_is_rejected() {
    with_local_store("no_title", |store, _| {
        let err = store.create_task(NewTask::titled("  ")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.list_tasks(&TaskFilter::default()).unwrap().is_empty());
    });
}

#[test]
fn test_unknown_category_falls_back_to_other() {
    with_local_store("fallback_category", |store, _| {
        let new = NewTask {
            category: Some("no-such-category".into()),
            ..NewTask::titled("t")
        };
        let task = store.create_task(new).unwrap();
        assert_eq!(task.category, "other");
    });
}

#[test]
fn test_get_returns_created_fields() {
    with_local_store("roundtrip", |store, _| {
        let created = store.create_task(high_priority_task("roundtrip")).unwrap();
        let fetched = store.get_task(&created.id).unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.priority, created.priority);
        assert_eq!(fetched.created_at, created.created_at);
    });
}

#[test]
fn test_update_refreshes_updated_at_only() {
    with_local_store("update_timestamps", |store, _| {
        let created = store.create_task(NewTask::titled("t")).unwrap();
        thread::sleep(Duration::from_millis(5));

        let patch = TaskPatch {
            status: Some(Status::Done),
            ..TaskPatch::default()
        };
        let updated = store.update_task(&created.id, patch).unwrap();

        assert_eq!(updated.status, Status::Done);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    });
}

#[test]
fn test_update_is_shallow_merge() {
    with_local_store("shallow_merge", |store, _| {
        let new = NewTask {
            description: "keep me".into(),
            tags: vec!["keep".into()],
            ..NewTask::titled("original")
        };
        let created = store.create_task(new).unwrap();

        let patch = TaskPatch {
            title: Some("renamed".into()),
            ..TaskPatch::default()
        };
        let updated = store.update_task(&created.id, patch).unwrap();

        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description, "keep me");
        assert_eq!(updated.tags, vec!["keep"]);
    });
}

#[test]
fn test_update_missing_task_is_not_found() {
    with_local_store("update_missing", |store, _| {
        let err = store
            .update_task("nope", TaskPatch::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    });
}

#[test]
fn test_delete_is_idempotent() {
    with_local_store("delete_idempotent", |store, _| {
        let created = store.create_task(NewTask::titled("t")).unwrap();
        store.delete_task(&created.id).unwrap();
        // Second delete of the same id is a silent no-op.
        store.delete_task(&created.id).unwrap();
        assert!(store.list_tasks(&TaskFilter::default()).unwrap().is_empty());
    });
}

#[test]
fn test_list_filters_are_exact_match_and_anded() {
    with_local_store("filters", |store, _| {
        store.create_task(high_priority_task("a")).unwrap();
        store.create_task(NewTask::titled("b")).unwrap();
        let done = store.create_task(high_priority_task("c")).unwrap();
        store
            .update_task(
                &done.id,
                TaskPatch {
                    status: Some(Status::Done),
                    ..TaskPatch::default()
                },
            )
            .unwrap();

        let by_priority = store
            .list_tasks(&TaskFilter {
                priority: Some(Priority::High),
                ..TaskFilter::default()
            })
            .unwrap();
        assert_eq!(by_priority.len(), 2);

        let both = store
            .list_tasks(&TaskFilter {
                priority: Some(Priority::High),
                status: Some(Status::Done),
                ..TaskFilter::default()
            })
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].title, "c");
    });
}

#[test]
fn test_category_delete_cascades_to_other() {
    with_local_store("category_delete", |store, _| {
        store.create_category("work").unwrap();
        let new = NewTask {
            category: Some("work".into()),
            ..NewTask::titled("t")
        };
        let task = store.create_task(new).unwrap();
        assert_eq!(task.category, "work");

        store.delete_category("work").unwrap();

        let cats = store.list_categories().unwrap();
        assert!(!cats.iter().any(|c| c == "work"));
        assert_eq!(store.get_task(&task.id).unwrap().category, "other");
    });
}

#[test]
fn test_category_rename_cascades() {
    with_local_store("category_rename", |store, _| {
        store.create_category("work").unwrap();
        let new = NewTask {
            category: Some("work".into()),
            ..NewTask::titled("t")
        };
        let task = store.create_task(new).unwrap();

        store.rename_category("work", "office").unwrap();

        let cats = store.list_categories().unwrap();
        assert!(cats.iter().any(|c| c == "office"));
        assert!(!cats.iter().any(|c| c == "work"));
        assert_eq!(store.get_task(&task.id).unwrap().category, "office");
    });
}

#[test]
fn test_fallback_category_cannot_be_deleted() {
    with_local_store("delete_other", |store, _| {
        let err = store.delete_category("other").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.list_categories().unwrap().iter().any(|c| c == "other"));
    });
}

#[test]
fn test_duplicate_category_is_rejected() {
    with_local_store("duplicate_category", |store, _| {
        store.create_category("work").unwrap();
        let err = store.create_category("work").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    });
}

#[test]
fn test_stats_on_empty_collection() {
    with_local_store("empty_stats", |store, _| {
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.overdue, 0);
        assert_eq!(stats.due_soon, 0);
    });
}

#[test]
fn test_stats_counts_by_field() {
    with_local_store("stats_counts", |store, _| {
        store.create_task(high_priority_task("a")).unwrap();
        let done = store.create_task(NewTask::titled("b")).unwrap();
        store
            .update_task(
                &done.id,
                TaskPatch {
                    status: Some(Status::Done),
                    ..TaskPatch::default()
                },
            )
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.completion_rate, 50);
        assert_eq!(stats.by_status.get("done"), Some(&1));
        assert_eq!(stats.by_priority.get("high"), Some(&1));
        assert_eq!(stats.by_category.get("other"), Some(&2));
    });
}

#[test]
fn test_corrupt_collection_reads_as_empty() {
    with_local_store("corrupt", |store, dir| {
        store.create_task(NewTask::titled("t")).unwrap();
        fs::write(dir.join("tasks.json"), "{not json").unwrap();
        assert!(store.list_tasks(&TaskFilter::default()).unwrap().is_empty());
    });
}

#[test]
fn test_tasks_persist_across_reopen() {
    with_local_store("reopen", |store, dir| {
        let created = store.create_task(NewTask::titled("persisted")).unwrap();
        let reopened = LocalStore::open(dir).unwrap();
        let fetched = reopened.get_task(&created.id).unwrap();
        assert_eq!(fetched.title, "persisted");
    });
}

// The memory adapter honors the same contract; spot-check the parts the
// test suite substitutes it for.
#[test]
fn test_memory_store_matches_contract() {
    let store = MemoryStore::new();
    let created = store.create_task(high_priority_task("m")).unwrap();
    assert_eq!(store.list_tasks(&TaskFilter::default()).unwrap().len(), 1);

    store.create_category("work").unwrap();
    store
        .update_task(
            &created.id,
            TaskPatch {
                category: Some("work".into()),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    store.delete_category("work").unwrap();
    assert_eq!(store.get_task(&created.id).unwrap().category, "other");

    store.delete_task(&created.id).unwrap();
    store.delete_task(&created.id).unwrap();
    let err = store.get_task(&created.id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}
