//! Canonicalization: drive one module through a fixed normalization and
//! optimization pipeline, producing a byte representation suitable for exact
//! comparison.
//!
//! Debug metadata and symbol names are semantically irrelevant but create
//! spurious textual differences, so they are stripped first. A single
//! aggressive optimization pass bundle then drives equivalent modules toward
//! a shared normal form: the optimizer inlines a single-use internal function
//! at nearly any cost, which collapses source-level outlining back to the
//! same shape on both sides.
//!
//! Known limitation: stripping debug metadata can enable optimizations that a
//! build carrying debug info would not perform, so the canonical form may
//! differ from a real debug build's output. This is accepted as a controlled
//! risk, not a correctness bug, unless it masks UB-dependent behavior.
//!
//! Determinism is the load-bearing assumption: identical input plus identical
//! configuration must yield byte-identical output across runs.

use crate::error::EquivError;
use crate::loader::ModuleFile;
use crate::toolchain::ToolchainConfig;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::Path;
use std::thread;

/// Version of the canonicalization step sequence. Bump whenever the pass
/// list or optimization level changes, so stored digests are never compared
/// across incompatible pipelines.
pub const CONFIG_VERSION: u32 = 1;

/// Immutable, versioned normalization sequence.
///
/// Exactly one config exists per comparison and is applied to both inputs;
/// per-input divergence would make the comparison meaningless.
///
/// When adding passes here, be careful not to remove optimization hints:
/// doing so would limit how well the pipeline canonicalizes.
#[derive(Debug, Clone)]
pub struct CanonicalizationConfig {
    pub version: u32,
    /// Ordered normalization flags, applied before optimization.
    pub passes: Vec<String>,
    /// The fixed aggressive optimization level.
    pub opt_level: String,
}

impl Default for CanonicalizationConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            passes: vec!["-strip-debug".to_string(), "-strip".to_string()],
            opt_level: "-O3".to_string(),
        }
    }
}

impl CanonicalizationConfig {
    /// The exact argument vector handed to `opt` for one input module.
    pub fn tool_args(&self, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.passes.iter().map(OsString::from).collect();
        args.push(OsString::from(&self.opt_level));
        args.push(OsString::from("-S"));
        args.push(OsString::from("-o"));
        args.push(OsString::from("-"));
        args.push(input.as_os_str().to_os_string());
        args
    }
}

/// The byte result of canonicalizing one input under a fixed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalOutput {
    bytes: Vec<u8>,
}

impl CanonicalOutput {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-256 content digest, hex-encoded. Diagnostic only; the Verdict is
    /// always computed from the full byte sequences.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// Canonicalize one module by running the optimizing pipeline tool over it.
///
/// Any invocation failure (launch error, non-zero exit, timeout) aborts the
/// whole comparison; no partial Verdict is ever produced from one side.
pub fn canonicalize(
    module: &ModuleFile,
    config: &CanonicalizationConfig,
    toolchain: &ToolchainConfig,
) -> Result<CanonicalOutput, EquivError> {
    let args = config.tool_args(module.path());
    let record = toolchain.run(toolchain.opt(), &args)?;

    if !record.success() {
        let message = match record.status {
            Some(code) => {
                let stderr = record.stderr_excerpt();
                if stderr.is_empty() {
                    format!("exited with code {}", code)
                } else {
                    format!("exited with code {}: {}", code, stderr)
                }
            }
            None => "killed by signal".to_string(),
        };
        return Err(EquivError::ToolInvocation {
            command: record.command,
            message,
        });
    }

    Ok(CanonicalOutput {
        bytes: record.stdout,
    })
}

/// Canonicalize both inputs under the same configuration.
///
/// The two invocations are mutually independent (no shared mutable state,
/// isolated subprocesses), so they run on scoped worker threads. Correctness
/// does not depend on ordering between them; both must complete before the
/// comparator sees either output.
pub fn canonicalize_pair(
    module_a: &ModuleFile,
    module_b: &ModuleFile,
    config: &CanonicalizationConfig,
    toolchain: &ToolchainConfig,
) -> Result<(CanonicalOutput, CanonicalOutput), EquivError> {
    thread::scope(|scope| {
        let worker_a = scope.spawn(|| canonicalize(module_a, config, toolchain));
        let worker_b = scope.spawn(|| canonicalize(module_b, config, toolchain));

        let output_a = join_worker(worker_a)?;
        let output_b = join_worker(worker_b)?;
        Ok((output_a, output_b))
    })
}

fn join_worker(
    handle: thread::ScopedJoinHandle<'_, Result<CanonicalOutput, EquivError>>,
) -> Result<CanonicalOutput, EquivError> {
    handle.join().map_err(|_| EquivError::ToolInvocation {
        command: "canonicalization worker".to_string(),
        message: "worker thread panicked".to_string(),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn install_opt(base: &Path, script: &str) {
        let bin = base.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let tool = bin.join(crate::toolchain::OPT_TOOL);
        fs::write(&tool, format!("#!/bin/sh\n{}\n", script)).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn write_module(dir: &Path, name: &str, content: &str) -> ModuleFile {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        loader::load(&path).unwrap()
    }

    /// Fake canonicalizer: emit the input file with IR comment lines removed.
    /// The last argument of the vector is the input path.
    const STRIP_COMMENTS: &str =
        r#"for a in "$@"; do f="$a"; done; grep -v "^;" "$f"; exit 0"#;

    #[test]
    fn test_tool_args_order_is_fixed() {
        let config = CanonicalizationConfig::default();
        let args = config.tool_args(Path::new("in.ll"));
        let rendered: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        // Normalization passes strictly before the optimization level.
        assert_eq!(
            rendered,
            vec!["-strip-debug", "-strip", "-O3", "-S", "-o", "-", "in.ll"]
        );
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_canonicalize_captures_tool_output() {
        let dir = TempDir::new().unwrap();
        install_opt(dir.path(), STRIP_COMMENTS);
        let toolchain = ToolchainConfig::discover(Some(dir.path()), None).unwrap();
        let module = write_module(dir.path(), "a.ll", "; !dbg line info\nret i32 0\n");

        let output =
            canonicalize(&module, &CanonicalizationConfig::default(), &toolchain).unwrap();
        assert_eq!(output.as_bytes(), b"ret i32 0\n");
        assert_eq!(output.len(), 10);
    }

    #[test]
    fn test_canonicalize_nonzero_exit_is_fatal() {
        let dir = TempDir::new().unwrap();
        install_opt(dir.path(), "echo 'broken module' >&2; exit 1");
        let toolchain = ToolchainConfig::discover(Some(dir.path()), None).unwrap();
        let module = write_module(dir.path(), "a.ll", "not ir\n");

        let err = canonicalize(&module, &CanonicalizationConfig::default(), &toolchain)
            .unwrap_err();
        match err {
            EquivError::ToolInvocation { message, .. } => {
                assert!(message.contains("exited with code 1"));
                assert!(message.contains("broken module"));
            }
            other => panic!("expected ToolInvocation, got {:?}", other),
        }
    }

    #[test]
    fn test_canonicalize_pair_is_deterministic() {
        let dir = TempDir::new().unwrap();
        install_opt(dir.path(), STRIP_COMMENTS);
        let toolchain = ToolchainConfig::discover(Some(dir.path()), None).unwrap();
        let config = CanonicalizationConfig::default();

        // Same semantics, different comment noise.
        let module_a = write_module(dir.path(), "a.ll", "; v1\nret i32 0\n");
        let module_b = write_module(dir.path(), "b.ll", "; v2 rebuilt\nret i32 0\n");

        let (out_a, out_b) = canonicalize_pair(&module_a, &module_b, &config, &toolchain).unwrap();
        assert_eq!(out_a, out_b);
        assert_eq!(out_a.digest(), out_b.digest());

        // Repeated runs of the same input yield byte-identical output.
        let again = canonicalize(&module_a, &config, &toolchain).unwrap();
        assert_eq!(again, out_a);
    }

    #[test]
    fn test_digest_is_stable_hex_sha256() {
        let output = CanonicalOutput { bytes: Vec::new() };
        assert!(output.is_empty());
        // SHA-256 of the empty string.
        assert_eq!(
            output.digest(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
