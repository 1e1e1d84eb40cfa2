//! Module loading: resolve and read the two input handles.
//!
//! No content validation happens here; a malformed module surfaces later as
//! a canonicalization failure, not a load failure.

use crate::error::EquivError;
use std::fs;
use std::path::{Path, PathBuf};

/// A loaded, read-only handle to an on-disk module representation.
#[derive(Debug, Clone)]
pub struct ModuleFile {
    path: PathBuf,
    data: Vec<u8>,
}

impl ModuleFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Load one input module, failing if the path is missing or unreadable.
pub fn load(path: &Path) -> Result<ModuleFile, EquivError> {
    let data = fs::read(path).map_err(|source| EquivError::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ModuleFile {
        path: path.to_path_buf(),
        data,
    })
}
