//! Choosing which files take part in an import.

use crate::ImportError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of source documents picked up from directories.
pub const SOURCE_EXTENSION: &str = "rdg";

/// Provider of the files an import works on.
pub trait SourceSelection {
    /// Source documents to import, in import order. Empty aborts the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection cannot be resolved
    fn select_source_files(&mut self) -> Result<Vec<PathBuf>, ImportError>;

    /// Directory holding the destination document.
    fn select_destination_location(&mut self) -> PathBuf;
}

/// Selection given up front, e.g. from command-line arguments.
///
/// Directories among the sources expand to the `.rdg` files directly inside them,
/// sorted by file name.
#[derive(Debug, Clone)]
pub struct PathSelection {
    sources: Vec<PathBuf>,
    destination_dir: PathBuf,
}

impl PathSelection {
    pub fn new(sources: Vec<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self { sources, destination_dir: destination_dir.into() }
    }
}

impl SourceSelection for PathSelection {
    fn select_source_files(&mut self) -> Result<Vec<PathBuf>, ImportError> {
        let mut selected = Vec::new();
        for path in &self.sources {
            if path.is_dir() {
                selected.extend(source_files_in(path)?);
            } else {
                selected.push(path.clone());
            }
        }
        Ok(selected)
    }

    fn select_destination_location(&mut self) -> PathBuf {
        self.destination_dir.clone()
    }
}

fn source_files_in(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let read_error = |source| ImportError::Read { path: dir.to_path_buf(), source };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        let is_source = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION));
        if path.is_file() && is_source {
            files.push(path);
        }
    }
    files.sort();

    debug!("Found {} source file(s) in {}", files.len(), dir.display());
    Ok(files)
}
