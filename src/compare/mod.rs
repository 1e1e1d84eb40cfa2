//! Exact comparison of two canonical outputs.

use crate::canonicalize::CanonicalOutput;

/// Binary outcome of one comparison.
///
/// The interpretation is asymmetric: `Identical` is a strong equivalence
/// signal under this tool's approximation, while `PotentiallyDifferent` only
/// means "not proven equivalent by this method" and may be a false alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Identical,
    PotentiallyDifferent,
}

/// Compare two fully-produced canonical outputs byte for byte.
///
/// Precondition: both canonicalizations completed; this function never sees
/// partial state. No secondary normalization happens here.
pub fn compare(output_a: &CanonicalOutput, output_b: &CanonicalOutput) -> Verdict {
    if output_a.as_bytes() == output_b.as_bytes() {
        Verdict::Identical
    } else {
        Verdict::PotentiallyDifferent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalize::{canonicalize, CanonicalOutput, CanonicalizationConfig};
    use crate::loader;
    use crate::toolchain::ToolchainConfig;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn fake_toolchain(dir: &Path, script: &str) -> ToolchainConfig {
        let bin = dir.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let tool = bin.join(crate::toolchain::OPT_TOOL);
        fs::write(&tool, format!("#!/bin/sh\n{}\n", script)).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        ToolchainConfig::discover(Some(dir), None).unwrap()
    }

    fn canonical(
        dir: &Path,
        toolchain: &ToolchainConfig,
        name: &str,
        content: &str,
    ) -> CanonicalOutput {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        let module = loader::load(&path).unwrap();
        canonicalize(&module, &CanonicalizationConfig::default(), toolchain).unwrap()
    }

    const CAT_INPUT: &str = r#"for a in "$@"; do f="$a"; done; cat "$f""#;

    #[test]
    fn test_equal_bytes_are_identical() {
        let dir = TempDir::new().unwrap();
        let toolchain = fake_toolchain(dir.path(), CAT_INPUT);
        let a = canonical(dir.path(), &toolchain, "a.ll", "ret i32 0\n");
        let b = canonical(dir.path(), &toolchain, "b.ll", "ret i32 0\n");
        assert_eq!(compare(&a, &b), Verdict::Identical);
    }

    #[test]
    fn test_any_difference_is_potentially_different() {
        let dir = TempDir::new().unwrap();
        let toolchain = fake_toolchain(dir.path(), CAT_INPUT);
        let a = canonical(dir.path(), &toolchain, "a.ll", "ret i32 0\n");
        let b = canonical(dir.path(), &toolchain, "b.ll", "ret i32 1\n");
        assert_eq!(compare(&a, &b), Verdict::PotentiallyDifferent);
    }

    #[test]
    fn test_comparison_is_symmetric() {
        let dir = TempDir::new().unwrap();
        let toolchain = fake_toolchain(dir.path(), CAT_INPUT);
        let a = canonical(dir.path(), &toolchain, "a.ll", "ret i32 0\n");
        let b = canonical(dir.path(), &toolchain, "b.ll", "ret i32 1\n");
        assert_eq!(compare(&a, &b), compare(&b, &a));
        assert_eq!(compare(&a, &a), Verdict::Identical);
    }
}
