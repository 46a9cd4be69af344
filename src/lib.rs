//! # AvenStudio task tracker
//!
//! A command-line task tracker with categories, dashboard statistics and
//! simple automation rules (trigger + condition pairs with a fire counter).
//!
//! Persistence goes through one [`store::Store`] contract with two shipped
//! backends, chosen once at startup:
//!
//! - **Local**: JSON files under a data directory (the default).
//! - **Remote**: an AvenStudio REST backend, via `--remote <url>` or the
//!   `AVEN_REMOTE_URL` environment variable.
//!
//! A third in-memory backend backs the test suite. The command layer only
//! ever sees the trait, so every command behaves identically against any
//! backend.
//!
//! ```bash
//! # Add a task and list what's open
//! aven add "Submit planning application" --category planning --priority high --due "in 3d"
//! aven list --status todo
//!
//! # Wire up an automation rule and watch it fire
//! aven rule add --name "flag hot work" --trigger created --condition '{"priority": "high"}'
//! aven stats
//! ```
//!
//! Data lives in `<data_local_dir>/avenstudio` (override with
//! `--data-dir` or `AVEN_DATA_DIR`): `tasks.json`, `categories.json` and
//! `automation_rules.json`, one JSON array each.

pub mod automation;
pub mod cli;
pub mod cmd;
pub mod error;
pub mod fields;
pub mod rule;
pub mod stats;
pub mod store;
pub mod task;
