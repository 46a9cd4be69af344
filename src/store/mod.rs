//! The uniform persistence contract and its adapters.
//!
//! One [`Store`] trait, three implementations: [`LocalStore`] (JSON files),
//! [`RemoteStore`] (AvenStudio REST backend) and [`MemoryStore`] (tests and
//! embedders). The adapter is chosen once at startup and injected as a
//! `Box<dyn Store>`; callers never learn which one is active.

pub mod local;
pub mod memory;
pub mod remote;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

use crate::error::Result;
use crate::fields::{Priority, Status, Trigger};
use crate::rule::{AutomationRule, NewRule, RulePatch};
use crate::stats::Stats;
use crate::task::{NewTask, Task, TaskPatch};

/// Categories seeded into a fresh store. `"other"` is the fallback.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "planning",
    "design",
    "finance",
    "building",
    "compliance",
    "other",
];

/// Exact-match task list filter. Absent fields impose no restriction.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
            && self
                .category
                .as_deref()
                .map_or(true, |c| task.category == c)
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.category.is_none()
    }
}

/// Backend health report (`GET /` on the remote).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

/// Uniform contract over the backing medium.
///
/// Every mutating call persists immediately; every read re-reads the
/// medium. Tasks come back in storage order.
pub trait Store {
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>>;
    fn get_task(&self, id: &str) -> Result<Task>;
    fn create_task(&self, new: NewTask) -> Result<Task>;
    fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task>;
    /// Idempotent on the local adapters: deleting a missing id is a no-op.
    fn delete_task(&self, id: &str) -> Result<()>;

    fn list_categories(&self) -> Result<Vec<String>>;
    fn create_category(&self, name: &str) -> Result<String>;
    /// Renames the category and cascades the new name into member tasks.
    fn rename_category(&self, old: &str, new: &str) -> Result<String>;
    /// Removes the category and reassigns member tasks to `"other"`.
    fn delete_category(&self, name: &str) -> Result<()>;

    fn list_rules(&self) -> Result<Vec<AutomationRule>>;
    fn create_rule(&self, new: NewRule) -> Result<AutomationRule>;
    fn update_rule(&self, id: &str, patch: RulePatch) -> Result<AutomationRule>;
    fn delete_rule(&self, id: &str) -> Result<()>;

    fn stats(&self) -> Result<Stats>;

    /// Run the automation evaluator for one task event. Returns the ids of
    /// the rules that fired.
    fn execute_automation(&self, task_id: &str, trigger: Trigger) -> Result<Vec<String>>;

    fn health(&self) -> Result<Health>;
}

/// Select the adapter: remote when a base URL is configured, local
/// otherwise. This is the only place the choice is made.
pub fn open(remote_url: Option<String>, data_dir: Option<PathBuf>) -> Result<Box<dyn Store>> {
    match remote_url {
        Some(url) => Ok(Box::new(RemoteStore::new(&url)?)),
        None => Ok(Box::new(LocalStore::open(resolve_data_dir(data_dir))?)),
    }
}

/// Data directory resolution order: explicit flag, `AVEN_DATA_DIR`,
/// `<data_local_dir>/avenstudio`, then the current directory.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = flag {
        return dir;
    }
    if let Ok(dir) = std::env::var("AVEN_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let mut dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("avenstudio");
    dir
}
