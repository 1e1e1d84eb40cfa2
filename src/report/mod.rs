//! Map the Verdict to a process-visible outcome and user-facing message.
//!
//! Exit-code namespaces are strictly disjoint so that automated callers can
//! never mistake "could not run the comparison" for "compared and found
//! different": 0 = identical, 1 = potentially different, 2 = fatal error.

use crate::compare::Verdict;
use crate::diff::DiffReport;

pub const EXIT_IDENTICAL: i32 = 0;
pub const EXIT_DIFFERENT: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

pub fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Identical => EXIT_IDENTICAL,
        Verdict::PotentiallyDifferent => EXIT_DIFFERENT,
    }
}

pub fn verdict_message(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Identical => "Versions are semantically identical",
        Verdict::PotentiallyDifferent => "Versions are potentially different",
    }
}

/// Print the verdict line and, when one was produced, the diff report.
///
/// The verdict goes to stdout; a failed diagnostic pass is at most a note on
/// stderr and never affects the outcome.
pub fn print_outcome(verdict: Verdict, diff: Option<&DiffReport>) {
    println!("{}", verdict_message(verdict));

    if let Some(report) = diff {
        if !report.text.is_empty() {
            println!();
            println!("Differences remaining (verbose):");
            print!("{}", report.text);
            if !report.text.ends_with('\n') {
                println!();
            }
        }
        if let Some(note) = &report.tool_error {
            eprintln!("note: structural diff unavailable: {}", note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_disjoint() {
        assert_eq!(exit_code(Verdict::Identical), 0);
        assert_eq!(exit_code(Verdict::PotentiallyDifferent), 1);
        assert_ne!(EXIT_FATAL, EXIT_IDENTICAL);
        assert_ne!(EXIT_FATAL, EXIT_DIFFERENT);
    }

    #[test]
    fn test_verdict_messages() {
        assert_eq!(
            verdict_message(Verdict::Identical),
            "Versions are semantically identical"
        );
        assert_eq!(
            verdict_message(Verdict::PotentiallyDifferent),
            "Versions are potentially different"
        );
    }
}
