//! Disk-backed file writer

use std::path::{Path, PathBuf};

use ksgen_manifests::FileWriter;

/// Writes generated files below an output directory
#[derive(Debug, Clone)]
pub struct DiskWriter {
    out_dir: PathBuf,
}

impl DiskWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl FileWriter for DiskWriter {
    fn write_file(&mut self, path: &Path, contents: &[u8]) -> ksgen_manifests::Result<()> {
        let full = self.out_dir.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ksgen_manifests::Error::io(parent, e))?;
        }
        std::fs::write(&full, contents).map_err(|e| ksgen_manifests::Error::io(&full, e))
    }
}
