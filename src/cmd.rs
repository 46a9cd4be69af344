//! Command implementations for the CLI interface.
//!
//! Each subcommand maps onto the [`Store`] contract; the handlers never
//! know which adapter is active. Mutating task commands fire the matching
//! automation trigger after persisting, the way the original dashboard did
//! after each task mutation.

use std::io;

use chrono::{Duration, Local, NaiveDate};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use serde_json::Value;

use crate::cli::Cli;
use crate::error::{Result, StoreError};
use crate::fields::{Priority, Status, Trigger};
use crate::rule::{AutomationRule, NewRule, RulePatch};
use crate::store::{Store, TaskFilter};
use crate::task::{NewTask, Task, TaskPatch};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Status: todo | in-progress | review | blocked | done.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Priority: low | medium | high | urgent.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Category name. Unknown names fall back to "other".
        #[arg(long)]
        category: Option<String>,
        /// Tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,
        /// Assignee.
        #[arg(long)]
        assignee: Option<String>,
        /// Estimated hours.
        #[arg(long)]
        estimated_hours: Option<f64>,
        /// Completion percentage (0-100).
        #[arg(long)]
        completion: Option<u8>,
    },

    /// List tasks with optional filters.
    List {
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Filter by category.
        #[arg(long)]
        category: Option<String>,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task by id.
    View {
        /// Task id.
        id: String,
    },

    /// Update fields on a task.
    Update {
        /// Task id.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
        /// Replace the tag set. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Completion percentage (0-100).
        #[arg(long)]
        completion: Option<u8>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        estimated_hours: Option<f64>,
    },

    /// Mark a task done (status done, completion 100).
    Complete {
        /// Task id.
        id: String,
    },

    /// Delete a task by id.
    Delete {
        /// Task id.
        id: String,
    },

    /// Manage categories.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Manage automation rules.
    Rule {
        #[command(subcommand)]
        action: RuleAction,
    },

    /// Fire automation rules for a task event.
    Trigger {
        /// Task id.
        id: String,
        /// Event: created | status_changed | completed | due_soon.
        #[arg(value_enum)]
        trigger: Trigger,
    },

    /// Show dashboard statistics.
    Stats,

    /// Check backend health.
    Health,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List all categories.
    List,
    /// Create a category.
    Add {
        /// Category name.
        name: String,
    },
    /// Rename a category; member tasks follow.
    Rename {
        /// Current name.
        old: String,
        /// New name.
        new: String,
    },
    /// Delete a category; member tasks move to "other".
    Delete {
        /// Category name.
        name: String,
    },
}

#[derive(Subcommand)]
pub enum RuleAction {
    /// List all automation rules.
    List,
    /// Create an automation rule.
    Add {
        /// Rule name.
        #[arg(long)]
        name: String,
        /// Optional description.
        #[arg(long)]
        desc: Option<String>,
        /// Event that fires the rule.
        #[arg(long, value_enum)]
        trigger: Trigger,
        /// Condition object as JSON, e.g. '{"priority": "high"}'.
        /// May be repeated; all must match.
        #[arg(long = "condition")]
        conditions: Vec<String>,
        /// Action descriptor as JSON (opaque). May be repeated.
        #[arg(long = "action")]
        actions: Vec<String>,
        /// Create the rule disabled.
        #[arg(long)]
        disabled: bool,
    },
    /// Update fields on a rule.
    Update {
        /// Rule id.
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        trigger: Option<Trigger>,
        /// Replace the condition list. May be repeated.
        #[arg(long = "condition")]
        conditions: Vec<String>,
        /// Replace the action list. May be repeated.
        #[arg(long = "action")]
        actions: Vec<String>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },
    /// Delete a rule by id.
    Delete {
        /// Rule id.
        id: String,
    },
}

/// Route a parsed command to its handler.
pub fn dispatch(store: &dyn Store, command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            title,
            desc,
            status,
            priority,
            category,
            tags,
            due,
            start,
            assignee,
            estimated_hours,
            completion,
        } => cmd_add(
            store,
            title,
            desc,
            status,
            priority,
            category,
            tags,
            due,
            start,
            assignee,
            estimated_hours,
            completion,
        ),
        Commands::List {
            status,
            priority,
            category,
            limit,
        } => cmd_list(store, status, priority, category, limit),
        Commands::View { id } => cmd_view(store, &id),
        Commands::Update {
            id,
            title,
            desc,
            status,
            priority,
            category,
            tags,
            due,
            completion,
            assignee,
            estimated_hours,
        } => cmd_update(
            store,
            &id,
            title,
            desc,
            status,
            priority,
            category,
            tags,
            due,
            completion,
            assignee,
            estimated_hours,
        ),
        Commands::Complete { id } => cmd_complete(store, &id),
        Commands::Delete { id } => cmd_delete(store, &id),
        Commands::Category { action } => cmd_category(store, action),
        Commands::Rule { action } => cmd_rule(store, action),
        Commands::Trigger { id, trigger } => cmd_trigger(store, &id, trigger),
        Commands::Stats => cmd_stats(store),
        Commands::Health => cmd_health(store),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    store: &dyn Store,
    title: String,
    desc: Option<String>,
    status: Option<Status>,
    priority: Option<Priority>,
    category: Option<String>,
    tags: Vec<String>,
    due: Option<String>,
    start: Option<String>,
    assignee: Option<String>,
    estimated_hours: Option<f64>,
    completion: Option<u8>,
) -> Result<()> {
    let new = NewTask {
        title,
        description: desc.unwrap_or_default(),
        status,
        priority,
        category,
        tags,
        due_date: due.as_deref().map(parse_due_input).transpose()?,
        start_date: start.as_deref().map(parse_due_input).transpose()?,
        assigned_to: assignee,
        estimated_hours,
        completion_percentage: completion,
        blocked_by: Vec::new(),
    };
    let task = store.create_task(new)?;
    println!("Added task {} '{}'", task.id, task.title);
    let fired = store.execute_automation(&task.id, Trigger::Created)?;
    report_fired(&fired);
    Ok(())
}

pub fn cmd_list(
    store: &dyn Store,
    status: Option<Status>,
    priority: Option<Priority>,
    category: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let filter = TaskFilter {
        status,
        priority,
        category,
    };
    let mut tasks = store.list_tasks(&filter)?;
    if let Some(n) = limit {
        tasks.truncate(n);
    }
    let refs: Vec<&Task> = tasks.iter().collect();
    print_table(&refs);
    Ok(())
}

pub fn cmd_view(store: &dyn Store, id: &str) -> Result<()> {
    let task = store.get_task(id)?;
    let today = Local::now().date_naive();
    println!("ID:        {}", task.id);
    println!("Title:     {}", task.title);
    if !task.description.is_empty() {
        println!("Desc:      {}", task.description);
    }
    println!("Status:    {}", task.status.as_str());
    println!("Priority:  {}", task.priority.as_str());
    println!("Category:  {}", task.category);
    if !task.tags.is_empty() {
        println!("Tags:      {}", task.tags.join(","));
    }
    println!("Due:       {}", format_due_relative(task.due_date, today));
    if let Some(assignee) = &task.assigned_to {
        println!("Assignee:  {}", assignee);
    }
    if let Some(hours) = task.estimated_hours {
        println!("Est hours: {}", hours);
    }
    println!("Complete:  {}%", task.completion_percentage);
    println!("Created:   {}", task.created_at.to_rfc3339());
    println!("Updated:   {}", task.updated_at.to_rfc3339());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    store: &dyn Store,
    id: &str,
    title: Option<String>,
    desc: Option<String>,
    status: Option<Status>,
    priority: Option<Priority>,
    category: Option<String>,
    tags: Vec<String>,
    due: Option<String>,
    completion: Option<u8>,
    assignee: Option<String>,
    estimated_hours: Option<f64>,
) -> Result<()> {
    // Fetch the old status so we know whether to fire status_changed.
    let old_status = if status.is_some() {
        Some(store.get_task(id)?.status)
    } else {
        None
    };

    let patch = TaskPatch {
        title,
        description: desc,
        status,
        priority,
        category,
        tags: if tags.is_empty() { None } else { Some(tags) },
        due_date: due.as_deref().map(parse_due_input).transpose()?,
        completion_percentage: completion,
        assigned_to: assignee,
        estimated_hours,
        ..TaskPatch::default()
    };
    let task = store.update_task(id, patch)?;
    println!("Updated task {}", task.id);
    fire_status_triggers(store, &task, old_status)?;
    Ok(())
}

pub fn cmd_complete(store: &dyn Store, id: &str) -> Result<()> {
    let old_status = store.get_task(id)?.status;
    let patch = TaskPatch {
        status: Some(Status::Done),
        completion_percentage: Some(100),
        ..TaskPatch::default()
    };
    let task = store.update_task(id, patch)?;
    println!("Completed task {} '{}'", task.id, task.title);
    fire_status_triggers(store, &task, Some(old_status))?;
    Ok(())
}

pub fn cmd_delete(store: &dyn Store, id: &str) -> Result<()> {
    store.delete_task(id)?;
    println!("Deleted task {id}");
    Ok(())
}

pub fn cmd_category(store: &dyn Store, action: CategoryAction) -> Result<()> {
    match action {
        CategoryAction::List => {
            for name in store.list_categories()? {
                println!("{name}");
            }
        }
        CategoryAction::Add { name } => {
            let name = store.create_category(&name)?;
            println!("Added category '{name}'");
        }
        CategoryAction::Rename { old, new } => {
            let name = store.rename_category(&old, &new)?;
            println!("Renamed category '{old}' to '{name}'");
        }
        CategoryAction::Delete { name } => {
            store.delete_category(&name)?;
            println!("Deleted category '{name}' (member tasks moved to 'other')");
        }
    }
    Ok(())
}

pub fn cmd_rule(store: &dyn Store, action: RuleAction) -> Result<()> {
    match action {
        RuleAction::List => {
            let rules = store.list_rules()?;
            print_rules(&rules);
        }
        RuleAction::Add {
            name,
            desc,
            trigger,
            conditions,
            actions,
            disabled,
        } => {
            let new = NewRule {
                name,
                description: desc.unwrap_or_default(),
                enabled: !disabled,
                trigger,
                conditions: parse_json_args(&conditions)?,
                actions: parse_json_args(&actions)?,
            };
            let rule = store.create_rule(new)?;
            println!("Added rule {} '{}'", rule.id, rule.name);
        }
        RuleAction::Update {
            id,
            name,
            desc,
            trigger,
            conditions,
            actions,
            enable,
            disable,
        } => {
            let patch = RulePatch {
                name,
                description: desc,
                enabled: if enable {
                    Some(true)
                } else if disable {
                    Some(false)
                } else {
                    None
                },
                trigger,
                conditions: if conditions.is_empty() {
                    None
                } else {
                    Some(parse_json_args(&conditions)?)
                },
                actions: if actions.is_empty() {
                    None
                } else {
                    Some(parse_json_args(&actions)?)
                },
            };
            let rule = store.update_rule(&id, patch)?;
            println!("Updated rule {}", rule.id);
        }
        RuleAction::Delete { id } => {
            store.delete_rule(&id)?;
            println!("Deleted rule {id}");
        }
    }
    Ok(())
}

pub fn cmd_trigger(store: &dyn Store, id: &str, trigger: Trigger) -> Result<()> {
    let fired = store.execute_automation(id, trigger)?;
    if fired.is_empty() {
        println!("No rules fired for '{}'", trigger.as_str());
    } else {
        for rule_id in &fired {
            println!("Fired rule {rule_id}");
        }
    }
    Ok(())
}

pub fn cmd_stats(store: &dyn Store) -> Result<()> {
    let stats = store.stats()?;
    println!("Tasks:           {}", stats.total_tasks);
    println!("Completion rate: {}%", stats.completion_rate);
    println!("Overdue:         {}", stats.overdue);
    println!("Due soon (7d):   {}", stats.due_soon);
    if !stats.by_status.is_empty() {
        println!("By status:");
        for (status, n) in &stats.by_status {
            println!("  {:<12} {}", status, n);
        }
    }
    if !stats.by_priority.is_empty() {
        println!("By priority:");
        for (priority, n) in &stats.by_priority {
            println!("  {:<12} {}", priority, n);
        }
    }
    if !stats.by_category.is_empty() {
        println!("By category:");
        for (category, n) in &stats.by_category {
            println!("  {:<12} {}", category, n);
        }
    }
    Ok(())
}

pub fn cmd_health(store: &dyn Store) -> Result<()> {
    let health = store.health()?;
    println!("{} (version {})", health.status, health.version);
    Ok(())
}

/// Generate shell completion scripts to stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "aven", &mut io::stdout());
}

/// Fire status_changed (and completed, when the task just became done)
/// after a status-bearing update.
fn fire_status_triggers(store: &dyn Store, task: &Task, old_status: Option<Status>) -> Result<()> {
    let Some(old) = old_status else {
        return Ok(());
    };
    if old == task.status {
        return Ok(());
    }
    let mut fired = store.execute_automation(&task.id, Trigger::StatusChanged)?;
    if task.status == Status::Done {
        fired.extend(store.execute_automation(&task.id, Trigger::Completed)?);
    }
    report_fired(&fired);
    Ok(())
}

fn report_fired(fired: &[String]) {
    if !fired.is_empty() {
        println!("{} automation rule(s) fired", fired.len());
    }
}

/// Parse repeated JSON arguments (rule conditions/actions).
fn parse_json_args(args: &[String]) -> Result<Vec<Value>> {
    args.iter()
        .map(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| StoreError::Validation(format!("Invalid JSON '{raw}': {e}")))
        })
        .collect()
}

/// Parse due date input: ISO date, "today", "tomorrow", or "in Nd".
pub fn parse_due_input(s: &str) -> Result<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();
    match s.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        _ => {}
    }
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Ok(today + Duration::days(days));
            }
        }
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .map_err(|_| StoreError::Validation(format!("Invalid date '{s}'")))
}

/// Format a due date relative to today ("today", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            if days == 0 {
                "today".into()
            } else if days == 1 {
                "tomorrow".into()
            } else if days > 1 {
                format!("in {days}d")
            } else {
                format!("{}d late", -days)
            }
        }
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print tasks in a formatted table.
fn print_table(tasks: &[&Task]) {
    println!(
        "{:<36} {:<11} {:<7} {:<10} {:<12} {:<4} Title [tags]",
        "ID", "Status", "Pri", "Due", "Category", "%"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        println!(
            "{:<36} {:<11} {:<7} {:<10} {:<12} {:<4} {}{}",
            t.id,
            t.status.as_str(),
            t.priority.as_str(),
            format_due_relative(t.due_date, today),
            truncate(&t.category, 12),
            t.completion_percentage,
            t.title,
            tags
        );
    }
}

/// Print automation rules in a formatted table.
fn print_rules(rules: &[AutomationRule]) {
    println!(
        "{:<36} {:<20} {:<14} {:<8} {:<6} Last triggered",
        "ID", "Name", "Trigger", "Enabled", "Count"
    );
    for r in rules {
        println!(
            "{:<36} {:<20} {:<14} {:<8} {:<6} {}",
            r.id,
            truncate(&r.name, 20),
            r.trigger.as_str(),
            if r.enabled { "yes" } else { "no" },
            r.trigger_count,
            r.last_triggered
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".into())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_due_input() {
        let today = Local::now().date_naive();
        assert_eq!(parse_due_input("today").unwrap(), today);
        assert_eq!(parse_due_input("tomorrow").unwrap(), today + Duration::days(1));
        assert_eq!(parse_due_input("in 3d").unwrap(), today + Duration::days(3));
        assert_eq!(
            parse_due_input("2025-12-01").unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()
        );
        assert!(parse_due_input("not a date").is_err());
    }

    #[test]
    fn test_format_due_relative() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 24).unwrap();
        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(today), today), "today");
        assert_eq!(
            format_due_relative(Some(today + Duration::days(3)), today),
            "in 3d"
        );
        assert_eq!(
            format_due_relative(Some(today - Duration::days(2)), today),
            "2d late"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a rather long name", 8), "a rathe…");
    }
}
