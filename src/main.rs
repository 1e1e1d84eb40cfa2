use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

mod canonicalize;
mod compare;
mod diff;
mod error;
mod loader;
mod report;
mod toolchain;

use canonicalize::{canonicalize_pair, CanonicalizationConfig};
use compare::{compare, Verdict};
use diff::report_diff;
use error::EquivError;
use toolchain::ToolchainConfig;

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "ir-equiv")]
#[command(about = "Decide whether two LLVM IR modules are semantically equivalent (modulo UB)")]
#[command(version)]
#[command(
    long_about = "Decide whether two LLVM IR modules can be shown semantically equivalent \
(modulo undefined behavior) by canonicalizing both through a fixed opt pipeline and \
comparing the results exactly. A common use case is checking that IR from two different \
versions of the same program did not change meaning. \"Identical\" is a strong \
equivalence signal; \"potentially different\" only means equivalence could not be shown \
by this method. If either module contains undefined behavior, the result is unreliable."
)]
struct Args {
    /// Path to the first IR module
    module_a: PathBuf,

    /// Path to the second IR module
    module_b: PathBuf,

    /// Be verbose about differences in the input files (runs llvm-diff on
    /// the original inputs when the verdict is "potentially different")
    #[arg(long, short)]
    verbose: bool,

    /// LLVM installation root containing bin/opt and bin/llvm-diff
    /// (defaults to $LLVM_BASE_DIR, then to PATH lookup)
    #[arg(long)]
    llvm_base: Option<PathBuf>,

    /// Timeout in seconds for each external tool invocation
    #[arg(long)]
    timeout: Option<u64>,
}

// --- Comparison Pipeline ---

fn run(args: &Args) -> Result<i32, EquivError> {
    // Tool locations are resolved exactly once, here, and passed down
    // explicitly; components never consult the environment themselves.
    let base = args
        .llvm_base
        .clone()
        .or_else(|| env::var_os("LLVM_BASE_DIR").map(PathBuf::from));
    let timeout = args.timeout.map(Duration::from_secs);
    let toolchain = ToolchainConfig::discover(base.as_deref(), timeout)?;

    let module_a = loader::load(&args.module_a)?;
    let module_b = loader::load(&args.module_b)?;

    // Early exit: byte-identical inputs need no canonicalization.
    if module_a.data() == module_b.data() {
        report::print_outcome(Verdict::Identical, None);
        return Ok(report::EXIT_IDENTICAL);
    }

    let config = CanonicalizationConfig::default();
    let (output_a, output_b) = canonicalize_pair(&module_a, &module_b, &config, &toolchain)?;

    if args.verbose {
        eprintln!(
            "canonical {}: {} bytes, sha256 {}",
            module_a.path().display(),
            output_a.len(),
            output_a.digest()
        );
        eprintln!(
            "canonical {}: {} bytes, sha256 {}",
            module_b.path().display(),
            output_b.len(),
            output_b.digest()
        );
    }

    let verdict = compare(&output_a, &output_b);

    // The diff pass runs over the original inputs, after the verdict is
    // final; whatever happens in it cannot change the outcome.
    let diff = (verdict == Verdict::PotentiallyDifferent && args.verbose)
        .then(|| report_diff(&module_a, &module_b, &toolchain));

    report::print_outcome(verdict, diff.as_ref());
    Ok(report::exit_code(verdict))
}

// --- Main Function ---

fn main() {
    let args = Args::parse();

    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(report::EXIT_FATAL);
        }
    }
}
