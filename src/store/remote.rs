//! REST client for the AvenStudio backend.
//!
//! One request per operation, no retries, no batching. The client carries a
//! fixed 10-second timeout; a non-2xx response is translated into a
//! [`StoreError`] carrying the server's `detail` message when the body
//! parses, or a generic status-code message otherwise.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, StoreError};
use crate::fields::Trigger;
use crate::rule::{AutomationRule, NewRule, RulePatch};
use crate::stats::Stats;
use crate::task::{NewTask, Task, TaskPatch};

use super::{Health, Store, TaskFilter};

const TIMEOUT: Duration = Duration::from_secs(10);

/// FastAPI error body.
#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// HTTP adapter for a remote AvenStudio backend.
pub struct RemoteStore {
    client: Client,
    base_url: String,
}

impl RemoteStore {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(RemoteStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-2xx response onto the error kinds: 404 is `NotFound`,
    /// 400/422 is `Validation`, everything else is `Transport`.
    fn check(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp
            .json::<ErrorBody>()
            .map(|b| b.detail)
            .unwrap_or_else(|_| format!("HTTP {status}"));
        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                StoreError::Validation(message)
            }
            _ => StoreError::Transport(message),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.client.get(self.url(path)).send()?;
        Ok(Self::check(resp)?.json()?)
    }
}

#[derive(Deserialize)]
struct CategoryBody {
    name: String,
}

impl Store for RemoteStore {
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(status) = filter.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = filter.priority {
            query.push(("priority", priority.as_str().to_string()));
        }
        if let Some(category) = &filter.category {
            query.push(("category", category.clone()));
        }
        let resp = self
            .client
            .get(self.url("/api/tasks"))
            .query(&query)
            .send()?;
        Ok(Self::check(resp)?.json()?)
    }

    fn get_task(&self, id: &str) -> Result<Task> {
        self.get_json(&format!("/api/tasks/{id}"))
    }

    fn create_task(&self, new: NewTask) -> Result<Task> {
        let resp = self
            .client
            .post(self.url("/api/tasks"))
            .json(&new)
            .send()?;
        Ok(Self::check(resp)?.json()?)
    }

    fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        let resp = self
            .client
            .put(self.url(&format!("/api/tasks/{id}")))
            .json(&patch)
            .send()?;
        Ok(Self::check(resp)?.json()?)
    }

    fn delete_task(&self, id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/api/tasks/{id}")))
            .send()?;
        Self::check(resp)?;
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<String>> {
        self.get_json("/api/categories")
    }

    fn create_category(&self, name: &str) -> Result<String> {
        let resp = self
            .client
            .post(self.url("/api/categories"))
            .json(&json!({ "name": name }))
            .send()?;
        let body: CategoryBody = Self::check(resp)?.json()?;
        Ok(body.name)
    }

    fn rename_category(&self, old: &str, new: &str) -> Result<String> {
        let resp = self
            .client
            .put(self.url(&format!("/api/categories/{old}")))
            .json(&json!({ "name": new }))
            .send()?;
        let body: CategoryBody = Self::check(resp)?.json()?;
        Ok(body.name)
    }

    fn delete_category(&self, name: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/api/categories/{name}")))
            .send()?;
        Self::check(resp)?;
        Ok(())
    }

    fn list_rules(&self) -> Result<Vec<AutomationRule>> {
        self.get_json("/api/automation/rules")
    }

    fn create_rule(&self, new: NewRule) -> Result<AutomationRule> {
        let resp = self
            .client
            .post(self.url("/api/automation/rules"))
            .json(&new)
            .send()?;
        Ok(Self::check(resp)?.json()?)
    }

    fn update_rule(&self, id: &str, patch: RulePatch) -> Result<AutomationRule> {
        let resp = self
            .client
            .put(self.url(&format!("/api/automation/rules/{id}")))
            .json(&patch)
            .send()?;
        Ok(Self::check(resp)?.json()?)
    }

    fn delete_rule(&self, id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/api/automation/rules/{id}")))
            .send()?;
        Self::check(resp)?;
        Ok(())
    }

    fn stats(&self) -> Result<Stats> {
        self.get_json("/api/stats")
    }

    fn execute_automation(&self, task_id: &str, trigger: Trigger) -> Result<Vec<String>> {
        let resp = self
            .client
            .post(self.url("/api/automation/execute"))
            .json(&json!({ "taskId": task_id, "trigger": trigger }))
            .send()?;
        // The backend answers with the fired rule ids; older versions
        // answer with nothing. Both are acceptable.
        let body: serde_json::Value = Self::check(resp)?.json().unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    fn health(&self) -> Result<Health> {
        self.get_json("/")
    }
}
