//! Enumerations shared across tasks, filters and automation rules.
//!
//! All enums serialize with the wire spelling the AvenStudio backend uses
//! (`in-progress`, `status_changed`, ...) and double as clap value enums so
//! the CLI accepts the same spellings.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task workflow status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Todo,
    InProgress,
    Review,
    Blocked,
    Done,
}

/// Task priority level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Events an automation rule can subscribe to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Trigger {
    Created,
    StatusChanged,
    Completed,
    DueSoon,
}

impl Status {
    /// Wire spelling, also used as map keys in stats output.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Review => "review",
            Status::Blocked => "blocked",
            Status::Done => "done",
        }
    }

    pub const ALL: [Status; 5] = [
        Status::Todo,
        Status::InProgress,
        Status::Review,
        Status::Blocked,
        Status::Done,
    ];
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Created => "created",
            Trigger::StatusChanged => "status_changed",
            Trigger::Completed => "completed",
            Trigger::DueSoon => "due_soon",
        }
    }
}
