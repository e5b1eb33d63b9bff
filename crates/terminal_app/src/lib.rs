//! Interactive terminal front end for `project_terminal`.
//!
//! ## Provider bootstrap
//!
//! The backend is chosen with `--provider`:
//!
//! - `anthropic` (default) calls the Messages API; requires `ANTHROPIC_API_KEY`
//!   or `backend.api_key` in the config file.
//! - `mock` answers from a deterministic scripted backend, for offline runs.
//!
//! Web search augmentation is enabled when `TAVILY_API_KEY` or
//! `search.api_key` is set.
//!
//! ## Config file
//!
//! `--config <path>` (or `PROJECT_TERMINAL_CONFIG`) points at a JSON file;
//! every field is optional and unknown fields are rejected:
//!
//! ```json
//! {
//!   "backend": { "model": "claude-3-5-sonnet-20241022", "max_tokens": 8000, "timeout_sec": 120 },
//!   "retry": { "max_retries": 5, "initial_delay_secs": 1.0 },
//!   "workspace_dir": "."
//! }
//! ```

pub mod app;
pub mod commands;
pub mod providers;
