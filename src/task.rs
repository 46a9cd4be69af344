//! Task entity and its create/update payloads.
//!
//! Field names follow the AvenStudio wire format (camelCase), so the same
//! structs serialize to the local JSON files and to the remote REST bodies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields::{Priority, Status};

/// Category every orphaned task falls back to. Cannot be deleted.
pub const FALLBACK_CATEGORY: &str = "other";

/// A unit of trackable work.
///
/// `comments`, `attachments`, `checklist`, `subtasks` and `custom_fields`
/// are opaque to this layer: they are persisted and round-tripped verbatim
/// but never interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub completion_percentage: u8,
    #[serde(default)]
    pub blocked_by: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Value>,
    #[serde(default)]
    pub attachments: Vec<Value>,
    #[serde(default)]
    pub checklist: Vec<Value>,
    #[serde(default)]
    pub subtasks: Vec<Value>,
    #[serde(default)]
    pub custom_fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a task. Everything but the title is optional;
/// absent fields are left out of the wire body so the backend applies its
/// own defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_percentage: Option<u8>,
    #[serde(default)]
    pub blocked_by: Vec<String>,
}

/// Partial update for a task. Absent fields leave the record untouched.
///
/// Sent as-is over the wire (`PUT /api/tasks/{id}`); the local adapters
/// apply it with [`TaskPatch::apply`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_percentage: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Map<String, Value>>,
}

impl NewTask {
    /// Minimal payload with just a title; used by tests and the CLI.
    pub fn titled(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            ..NewTask::default()
        }
    }

    /// Materialize a full task record: fresh id, defaults filled in,
    /// both timestamps stamped to `now`.
    pub fn into_task(self, id: String, now: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            status: self.status.unwrap_or(Status::Todo),
            priority: self.priority.unwrap_or(Priority::Medium),
            category: self
                .category
                .unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
            tags: self.tags,
            due_date: self.due_date,
            start_date: self.start_date,
            assigned_to: self.assigned_to,
            estimated_hours: self.estimated_hours,
            completion_percentage: self.completion_percentage.unwrap_or(0).min(100),
            blocked_by: self.blocked_by,
            comments: Vec::new(),
            attachments: Vec::new(),
            checklist: Vec::new(),
            subtasks: Vec::new(),
            custom_fields: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl TaskPatch {
    /// Shallow field-by-field merge: present fields replace, absent fields
    /// keep the current value. Refreshes `updated_at`, never `created_at`.
    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(due) = self.due_date {
            task.due_date = Some(due);
        }
        if let Some(start) = self.start_date {
            task.start_date = Some(start);
        }
        if let Some(assignee) = self.assigned_to {
            task.assigned_to = Some(assignee);
        }
        if let Some(hours) = self.estimated_hours {
            task.estimated_hours = Some(hours);
        }
        if let Some(pct) = self.completion_percentage {
            task.completion_percentage = pct.min(100);
        }
        if let Some(blocked_by) = self.blocked_by {
            task.blocked_by = blocked_by;
        }
        if let Some(comments) = self.comments {
            task.comments = comments;
        }
        if let Some(attachments) = self.attachments {
            task.attachments = attachments;
        }
        if let Some(checklist) = self.checklist {
            task.checklist = checklist;
        }
        if let Some(subtasks) = self.subtasks {
            task.subtasks = subtasks;
        }
        if let Some(custom_fields) = self.custom_fields {
            task.custom_fields = custom_fields;
        }
        task.updated_at = now;
    }
}
