#![allow(missing_docs)]

pub mod app_config;
pub mod cli;
pub mod destination;
pub mod document;
pub mod import;
pub mod logging;
pub mod merge;
pub mod selection;
pub mod source;

pub use destination::{CustomView, InsertionPoint, ItemKind};
pub use import::{run_import, ImportOptions, ImportSummary};
pub use merge::{import_tree, merge, NameMatching};
pub use source::{Group, GroupContent, Host, SourceTree};

use document::XmlError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("{origin}: invalid format: {reason}")]
    InvalidFormat { origin: String, reason: String },

    #[error("{origin}: malformed XML: {source}")]
    Malformed {
        origin: String,
        #[source]
        source: XmlError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no source files were selected")]
    NoSourcesSelected,

    #[error("none of the {0} selected source file(s) is a valid connection group document")]
    NoValidSources(usize),

    #[error("every valid source collides with an existing top-level group")]
    NoUniqueSources,

    #[error("failed to back up {} to {}: {source}", path.display(), backup.display())]
    BackupFailed {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to save {}: {source}", path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: XmlError,
    },
}

impl ImportError {
    /// Whether the error only disqualifies a single source file.
    pub const fn is_per_file(&self) -> bool {
        matches!(self, Self::InvalidFormat { .. } | Self::Malformed { .. } | Self::Read { .. })
    }
}
