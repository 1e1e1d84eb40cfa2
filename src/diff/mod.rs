//! Best-effort structural diff between the two *original* inputs.
//!
//! This is a debugging aid for a human, invoked only on a
//! `PotentiallyDifferent` verdict with diagnostics enabled. It intentionally
//! runs over the raw, non-canonicalized modules: structural differences in
//! the raw form are usually more legible than in the heavily optimized
//! canonical form, even though they may not map directly to the semantic
//! difference that was detected.

use crate::loader::ModuleFile;
use crate::toolchain::ToolchainConfig;
use std::ffi::OsString;

/// Outcome of the diagnostic pass.
///
/// Caller contract: `tool_error` is intentionally ignored when deciding the
/// run's outcome, not forgotten. The diff tool failing (or being absent)
/// never changes the already-computed Verdict or the exit status; `text`
/// holds whatever the tool managed to emit before failing.
#[derive(Debug, Clone)]
pub struct DiffReport {
    /// Combined stdout and stderr of the diff tool, kept even on non-zero
    /// exit since the tool reports differences that way.
    pub text: String,
    /// Why the diagnostic pass fell short, if it did.
    pub tool_error: Option<String>,
}

/// Run the structural-diff tool over the two raw inputs.
pub fn report_diff(
    module_a: &ModuleFile,
    module_b: &ModuleFile,
    toolchain: &ToolchainConfig,
) -> DiffReport {
    let Some(diff_tool) = toolchain.llvm_diff() else {
        return DiffReport {
            text: String::new(),
            tool_error: Some(format!("{} not found", crate::toolchain::DIFF_TOOL)),
        };
    };

    let args = diff_args(module_a, module_b);

    match toolchain.run(diff_tool, &args) {
        Ok(record) => {
            let mut text = String::from_utf8_lossy(&record.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&record.stderr));
            // The tool may exit non-zero precisely because the modules
            // differ; already-emitted output stands as the report.
            DiffReport {
                text,
                tool_error: None,
            }
        }
        Err(e) => DiffReport {
            text: String::new(),
            tool_error: Some(e.to_string()),
        },
    }
}

fn diff_args(module_a: &ModuleFile, module_b: &ModuleFile) -> Vec<OsString> {
    vec![
        module_a.path().as_os_str().to_os_string(),
        module_b.path().as_os_str().to_os_string(),
    ]
}
