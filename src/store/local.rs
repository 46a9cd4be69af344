//! File-backed store: one JSON file per collection.
//!
//! `tasks.json`, `categories.json` and `automation_rules.json` live under a
//! single data directory. Every read deserializes the whole collection and
//! every write rewrites it via temp file + rename. Unreadable or corrupt
//! files are treated as empty collections rather than hard failures.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::automation::fire_matching;
use crate::error::{Result, StoreError};
use crate::fields::Trigger;
use crate::rule::{AutomationRule, NewRule, RulePatch};
use crate::stats::{self, Stats};
use crate::task::{NewTask, Task, TaskPatch, FALLBACK_CATEGORY};

use super::{Health, Store, TaskFilter, DEFAULT_CATEGORIES};

const TASKS_FILE: &str = "tasks.json";
const CATEGORIES_FILE: &str = "categories.json";
const RULES_FILE: &str = "automation_rules.json";

/// JSON-file persistence rooted at a data directory.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open (and create) the data directory, seeding the default category
    /// set on first use.
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        let store = LocalStore { dir };
        if !store.path(CATEGORIES_FILE).exists() {
            let seed: Vec<String> = DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect();
            store.write_collection(CATEGORIES_FILE, &seed)?;
        }
        Ok(store)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Lenient read: a missing, unreadable or corrupt file is an empty
    /// collection.
    fn read_collection<T: DeserializeOwned>(&self, file: &str) -> Vec<T> {
        let path = self.path(file);
        if !path.exists() {
            return Vec::new();
        }
        let mut buf = String::new();
        match File::open(&path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => serde_json::from_str(&buf).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// Overwrite the whole collection via temp file + rename.
    fn write_collection<T: Serialize>(&self, file: &str, items: &[T]) -> Result<()> {
        let path = self.path(file);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(items)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn categories(&self) -> Vec<String> {
        let cats: Vec<String> = self.read_collection(CATEGORIES_FILE);
        if cats.is_empty() {
            DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
        } else {
            cats
        }
    }

    /// A task may only reference a known category; anything else falls
    /// back to `"other"`.
    fn normalize_category(&self, name: Option<String>) -> Option<String> {
        name.map(|n| {
            if self.categories().iter().any(|c| c == &n) {
                n
            } else {
                FALLBACK_CATEGORY.to_string()
            }
        })
    }
}

impl Store for LocalStore {
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let tasks: Vec<Task> = self.read_collection(TASKS_FILE);
        if filter.is_empty() {
            return Ok(tasks);
        }
        Ok(tasks.into_iter().filter(|t| filter.matches(t)).collect())
    }

    fn get_task(&self, id: &str) -> Result<Task> {
        self.read_collection::<Task>(TASKS_FILE)
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Task '{id}' not found")))
    }

    fn create_task(&self, mut new: NewTask) -> Result<Task> {
        if new.title.trim().is_empty() {
            return Err(StoreError::Validation("Task title is required".into()));
        }
        new.category = self.normalize_category(new.category);
        let task = new.into_task(Uuid::new_v4().to_string(), Utc::now());
        let mut tasks: Vec<Task> = self.read_collection(TASKS_FILE);
        tasks.push(task.clone());
        self.write_collection(TASKS_FILE, &tasks)?;
        Ok(task)
    }

    fn update_task(&self, id: &str, mut patch: TaskPatch) -> Result<Task> {
        patch.category = self.normalize_category(patch.category);
        let mut tasks: Vec<Task> = self.read_collection(TASKS_FILE);
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Task '{id}' not found")))?;
        patch.apply(task, Utc::now());
        let updated = task.clone();
        self.write_collection(TASKS_FILE, &tasks)?;
        Ok(updated)
    }

    fn delete_task(&self, id: &str) -> Result<()> {
        let mut tasks: Vec<Task> = self.read_collection(TASKS_FILE);
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() != before {
            self.write_collection(TASKS_FILE, &tasks)?;
        }
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<String>> {
        Ok(self.categories())
    }

    fn create_category(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("Category name is required".into()));
        }
        let mut cats = self.categories();
        if cats.iter().any(|c| c == name) {
            return Err(StoreError::Validation(format!(
                "Category '{name}' already exists"
            )));
        }
        cats.push(name.to_string());
        self.write_collection(CATEGORIES_FILE, &cats)?;
        Ok(name.to_string())
    }

    fn rename_category(&self, old: &str, new: &str) -> Result<String> {
        let new = new.trim();
        if new.is_empty() {
            return Err(StoreError::Validation("Category name is required".into()));
        }
        let mut cats = self.categories();
        let idx = cats
            .iter()
            .position(|c| c == old)
            .ok_or_else(|| StoreError::NotFound(format!("Category '{old}' not found")))?;
        if cats.iter().any(|c| c == new) {
            return Err(StoreError::Validation(format!(
                "Category '{new}' already exists"
            )));
        }
        cats[idx] = new.to_string();
        self.write_collection(CATEGORIES_FILE, &cats)?;

        // Cascade the rename into member tasks.
        let mut tasks: Vec<Task> = self.read_collection(TASKS_FILE);
        let mut touched = false;
        for task in tasks.iter_mut() {
            if task.category == old {
                task.category = new.to_string();
                touched = true;
            }
        }
        if touched {
            self.write_collection(TASKS_FILE, &tasks)?;
        }
        Ok(new.to_string())
    }

    fn delete_category(&self, name: &str) -> Result<()> {
        if name == FALLBACK_CATEGORY {
            return Err(StoreError::Validation(
                "Cannot delete default category".into(),
            ));
        }
        let mut cats = self.categories();
        let before = cats.len();
        cats.retain(|c| c != name);
        if cats.len() != before {
            self.write_collection(CATEGORIES_FILE, &cats)?;
        }

        // Reassign member tasks to the fallback category.
        let mut tasks: Vec<Task> = self.read_collection(TASKS_FILE);
        let mut touched = false;
        for task in tasks.iter_mut() {
            if task.category == name {
                task.category = FALLBACK_CATEGORY.to_string();
                touched = true;
            }
        }
        if touched {
            self.write_collection(TASKS_FILE, &tasks)?;
        }
        Ok(())
    }

    fn list_rules(&self) -> Result<Vec<AutomationRule>> {
        Ok(self.read_collection(RULES_FILE))
    }

    fn create_rule(&self, new: NewRule) -> Result<AutomationRule> {
        if new.name.trim().is_empty() {
            return Err(StoreError::Validation("Rule name is required".into()));
        }
        let rule = new.into_rule(Uuid::new_v4().to_string(), Utc::now());
        let mut rules: Vec<AutomationRule> = self.read_collection(RULES_FILE);
        rules.push(rule.clone());
        self.write_collection(RULES_FILE, &rules)?;
        Ok(rule)
    }

    fn update_rule(&self, id: &str, patch: RulePatch) -> Result<AutomationRule> {
        let mut rules: Vec<AutomationRule> = self.read_collection(RULES_FILE);
        let rule = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Rule '{id}' not found")))?;
        patch.apply(rule, Utc::now());
        let updated = rule.clone();
        self.write_collection(RULES_FILE, &rules)?;
        Ok(updated)
    }

    fn delete_rule(&self, id: &str) -> Result<()> {
        let mut rules: Vec<AutomationRule> = self.read_collection(RULES_FILE);
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() != before {
            self.write_collection(RULES_FILE, &rules)?;
        }
        Ok(())
    }

    fn stats(&self) -> Result<Stats> {
        let tasks: Vec<Task> = self.read_collection(TASKS_FILE);
        Ok(stats::compute(&tasks, Utc::now().date_naive()))
    }

    fn execute_automation(&self, task_id: &str, trigger: Trigger) -> Result<Vec<String>> {
        let task = self.get_task(task_id)?;
        let mut rules: Vec<AutomationRule> = self.read_collection(RULES_FILE);
        let fired = fire_matching(&mut rules, &task, trigger, Utc::now());
        if !fired.is_empty() {
            self.write_collection(RULES_FILE, &rules)?;
        }
        Ok(fired)
    }

    fn health(&self) -> Result<Health> {
        Ok(Health {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        })
    }
}
