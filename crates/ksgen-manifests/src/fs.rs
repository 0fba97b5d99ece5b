//! File writer seam
//!
//! The manifest tree never touches the filesystem itself. It hands
//! `(relative path, bytes)` pairs to a [`FileWriter`], which the CLI backs
//! with the disk and tests back with [`MemoryWriter`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::Result;

/// Persists generated files
pub trait FileWriter {
    /// Write `contents` to `path`, relative to the output directory.
    /// Parent directories are created as needed.
    fn write_file(&mut self, path: &Path, contents: &[u8]) -> Result<()>;
}

/// In-memory file writer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryWriter {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents written to `path`, if valid UTF-8
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files
            .get(path.as_ref())
            .and_then(|b| std::str::from_utf8(b).ok())
    }
}

impl FileWriter for MemoryWriter {
    fn write_file(&mut self, path: &Path, contents: &[u8]) -> Result<()> {
        self.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}
