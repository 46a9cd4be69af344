//! In-memory store, the substitutable third adapter.
//!
//! Same semantics as [`LocalStore`](super::LocalStore) without touching
//! disk; used by tests and available to embedders.

use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::automation::fire_matching;
use crate::error::{Result, StoreError};
use crate::fields::Trigger;
use crate::rule::{AutomationRule, NewRule, RulePatch};
use crate::stats::{self, Stats};
use crate::task::{NewTask, Task, TaskPatch, FALLBACK_CATEGORY};

use super::{Health, Store, TaskFilter, DEFAULT_CATEGORIES};

#[derive(Debug, Default)]
struct Collections {
    tasks: Vec<Task>,
    categories: Vec<String>,
    rules: Vec<AutomationRule>,
}

/// Mutex-guarded in-memory collections.
pub struct MemoryStore {
    state: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            state: Mutex::new(Collections {
                tasks: Vec::new(),
                categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
                rules: Vec::new(),
            }),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Collections) -> Result<T>) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Storage("store mutex poisoned".into()))?;
        f(&mut state)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

fn normalize_category(categories: &[String], name: Option<String>) -> Option<String> {
    name.map(|n| {
        if categories.iter().any(|c| c == &n) {
            n
        } else {
            FALLBACK_CATEGORY.to_string()
        }
    })
}

impl Store for MemoryStore {
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.with(|s| {
            Ok(s.tasks
                .iter()
                .filter(|t| filter.matches(t))
                .cloned()
                .collect())
        })
    }

    fn get_task(&self, id: &str) -> Result<Task> {
        self.with(|s| {
            s.tasks
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("Task '{id}' not found")))
        })
    }

    fn create_task(&self, mut new: NewTask) -> Result<Task> {
        if new.title.trim().is_empty() {
            return Err(StoreError::Validation("Task title is required".into()));
        }
        self.with(|s| {
            new.category = normalize_category(&s.categories, new.category.take());
            let task = new.into_task(Uuid::new_v4().to_string(), Utc::now());
            s.tasks.push(task.clone());
            Ok(task)
        })
    }

    fn update_task(&self, id: &str, mut patch: TaskPatch) -> Result<Task> {
        self.with(|s| {
            patch.category = normalize_category(&s.categories, patch.category.take());
            let task = s
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("Task '{id}' not found")))?;
            patch.apply(task, Utc::now());
            Ok(task.clone())
        })
    }

    fn delete_task(&self, id: &str) -> Result<()> {
        self.with(|s| {
            s.tasks.retain(|t| t.id != id);
            Ok(())
        })
    }

    fn list_categories(&self) -> Result<Vec<String>> {
        self.with(|s| Ok(s.categories.clone()))
    }

    fn create_category(&self, name: &str) -> Result<String> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::Validation("Category name is required".into()));
        }
        self.with(|s| {
            if s.categories.iter().any(|c| *c == name) {
                return Err(StoreError::Validation(format!(
                    "Category '{name}' already exists"
                )));
            }
            s.categories.push(name.clone());
            Ok(name)
        })
    }

    fn rename_category(&self, old: &str, new: &str) -> Result<String> {
        let new = new.trim().to_string();
        if new.is_empty() {
            return Err(StoreError::Validation("Category name is required".into()));
        }
        self.with(|s| {
            let idx = s
                .categories
                .iter()
                .position(|c| c == old)
                .ok_or_else(|| StoreError::NotFound(format!("Category '{old}' not found")))?;
            if s.categories.iter().any(|c| *c == new) {
                return Err(StoreError::Validation(format!(
                    "Category '{new}' already exists"
                )));
            }
            s.categories[idx] = new.clone();
            for task in s.tasks.iter_mut() {
                if task.category == old {
                    task.category = new.clone();
                }
            }
            Ok(new)
        })
    }

    fn delete_category(&self, name: &str) -> Result<()> {
        if name == FALLBACK_CATEGORY {
            return Err(StoreError::Validation(
                "Cannot delete default category".into(),
            ));
        }
        self.with(|s| {
            s.categories.retain(|c| c != name);
            for task in s.tasks.iter_mut() {
                if task.category == name {
                    task.category = FALLBACK_CATEGORY.to_string();
                }
            }
            Ok(())
        })
    }

    fn list_rules(&self) -> Result<Vec<AutomationRule>> {
        self.with(|s| Ok(s.rules.clone()))
    }

    fn create_rule(&self, new: NewRule) -> Result<AutomationRule> {
        if new.name.trim().is_empty() {
            return Err(StoreError::Validation("Rule name is required".into()));
        }
        self.with(|s| {
            let rule = new.into_rule(Uuid::new_v4().to_string(), Utc::now());
            s.rules.push(rule.clone());
            Ok(rule)
        })
    }

    fn update_rule(&self, id: &str, patch: RulePatch) -> Result<AutomationRule> {
        self.with(|s| {
            let rule = s
                .rules
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("Rule '{id}' not found")))?;
            patch.apply(rule, Utc::now());
            Ok(rule.clone())
        })
    }

    fn delete_rule(&self, id: &str) -> Result<()> {
        self.with(|s| {
            s.rules.retain(|r| r.id != id);
            Ok(())
        })
    }

    fn stats(&self) -> Result<Stats> {
        self.with(|s| Ok(stats::compute(&s.tasks, Utc::now().date_naive())))
    }

    fn execute_automation(&self, task_id: &str, trigger: Trigger) -> Result<Vec<String>> {
        self.with(|s| {
            let task = s
                .tasks
                .iter()
                .find(|t| t.id == task_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("Task '{task_id}' not found")))?;
            Ok(fire_matching(&mut s.rules, &task, trigger, Utc::now()))
        })
    }

    fn health(&self) -> Result<Health> {
        Ok(Health {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        })
    }
}
