//! Fatal error taxonomy for the comparison run.
//!
//! Every variant here aborts the run with no Verdict. Failures of the
//! best-effort structural diff are deliberately *not* represented: they are
//! carried as `DiffReport::tool_error` and never propagate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EquivError {
    /// An input module is missing or unreadable. Raised before any external
    /// tool is invoked.
    #[error("input not found or unreadable: {path}: {source}")]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required tool could not be resolved at startup.
    #[error("required tool not found: {0}")]
    ToolNotFound(String),

    /// The canonicalization subprocess failed to launch or exited non-zero.
    #[error("tool invocation failed: {command}: {message}")]
    ToolInvocation { command: String, message: String },

    /// A tool exceeded the configured timeout and was killed.
    #[error("tool timed out after {seconds}s: {command}")]
    Timeout { command: String, seconds: u64 },
}
