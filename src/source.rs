use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::Result;

/// A report file as listed by a source. `id` is whatever the source needs to
/// fetch the content again (a Drive file ID, a local path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub id: String,
    pub name: String,
}

/// Collection of CSV exports to consolidate.
pub trait ReportSource {
    /// CSV files in a stable order.
    fn list(&self) -> Result<Vec<SourceFile>>;
    fn fetch(&self, file: &SourceFile) -> Result<String>;
}

/// Exports sitting in a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalFolder {
    root: PathBuf,
}

impl LocalFolder {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ReportSource for LocalFolder {
    fn list(&self) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("cannot read {}", self.root.display()))?
        {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !path.is_file() || !is_csv {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(SourceFile {
                    id: path.to_string_lossy().to_string(),
                    name: name.to_string(),
                });
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn fetch(&self, file: &SourceFile) -> Result<String> {
        fs::read_to_string(&file.id).with_context(|| format!("cannot read {}", file.id))
    }
}
