//! Dashboard statistics derived from the task collection.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::fields::{Priority, Status};
use crate::task::Task;

/// Read-only aggregate over the current tasks, matching the shape of the
/// backend's `/api/stats` response (snake_case field names).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_tasks: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub blocked: usize,
    /// `round(100 * done / total)`, 0 for an empty collection.
    pub completion_rate: u32,
    #[serde(default)]
    pub by_status: BTreeMap<String, usize>,
    #[serde(default)]
    pub by_priority: BTreeMap<String, usize>,
    #[serde(default)]
    pub by_category: BTreeMap<String, usize>,
    pub overdue: usize,
    pub due_soon: usize,
}

/// Compute stats from a task snapshot. `today` is the reference date for
/// the overdue / due-soon windows (due within the next 7 days).
pub fn compute(tasks: &[Task], today: NaiveDate) -> Stats {
    let total = tasks.len();
    let done = tasks.iter().filter(|t| t.status == Status::Done).count();

    let mut by_status = BTreeMap::new();
    for status in Status::ALL {
        let n = tasks.iter().filter(|t| t.status == status).count();
        by_status.insert(status.as_str().to_string(), n);
    }

    let mut by_priority = BTreeMap::new();
    for priority in Priority::ALL {
        let n = tasks.iter().filter(|t| t.priority == priority).count();
        by_priority.insert(priority.as_str().to_string(), n);
    }

    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    for task in tasks {
        *by_category.entry(task.category.clone()).or_default() += 1;
    }

    let week_later = today + Duration::days(7);
    let mut overdue = 0;
    let mut due_soon = 0;
    for task in tasks {
        if task.status == Status::Done {
            continue;
        }
        if let Some(due) = task.due_date {
            if due < today {
                overdue += 1;
            } else if due <= week_later {
                due_soon += 1;
            }
        }
    }

    Stats {
        total_tasks: total,
        in_progress: by_status.get(Status::InProgress.as_str()).copied().unwrap_or(0),
        completed: done,
        blocked: by_status.get(Status::Blocked.as_str()).copied().unwrap_or(0),
        completion_rate: if total > 0 {
            ((done as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        },
        by_status,
        by_priority,
        by_category,
        overdue,
        due_soon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::Utc;

    fn task(status: Status, due: Option<NaiveDate>) -> Task {
        let mut t = NewTask::titled("t").into_task("id".into(), Utc::now());
        t.status = status;
        t.due_date = due;
        t
    }

    #[test]
    fn test_empty_collection_has_zero_completion_rate() {
        let stats = compute(&[], NaiveDate::from_ymd_opt(2025, 11, 24).unwrap());
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.completion_rate, 0);
    }

    #[test]
    fn test_completion_rate_rounds() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 24).unwrap();
        let tasks = vec![
            task(Status::Done, None),
            task(Status::Todo, None),
            task(Status::Todo, None),
        ];
        // 1/3 -> 33
        assert_eq!(compute(&tasks, today).completion_rate, 33);
    }

    #[test]
    fn test_overdue_and_due_soon_windows() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 24).unwrap();
        let tasks = vec![
            task(Status::Todo, Some(today - Duration::days(1))),
            task(Status::Todo, Some(today)),
            task(Status::Todo, Some(today + Duration::days(7))),
            task(Status::Todo, Some(today + Duration::days(8))),
            // Done tasks never count, even when past due.
            task(Status::Done, Some(today - Duration::days(5))),
        ];
        let stats = compute(&tasks, today);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.due_soon, 2);
    }
}
