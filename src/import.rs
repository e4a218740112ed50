//! One import run: validate sources, filter collisions, merge, persist.

use crate::destination::CustomView;
use crate::logging::LogSink;
use crate::merge::{import_tree, NameMatching};
use crate::selection::SourceSelection;
use crate::source::{load_source, SourceTree};
use crate::ImportError;
use chrono::Local;
use std::path::PathBuf;
use tracing::debug;

/// File name of the destination document inside the destination directory.
pub const DEFAULT_DESTINATION_FILE: &str = "CustomView.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub destination_file: String,
    pub matching: NameMatching,
    /// Merge in memory and return the resulting document instead of writing it.
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            destination_file: DEFAULT_DESTINATION_FILE.to_string(),
            matching: NameMatching::default(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub destination: PathBuf,
    /// Root names merged into the destination, in import order.
    pub imported: Vec<String>,
    /// Source files that failed validation.
    pub rejected: Vec<PathBuf>,
    /// Root names skipped because the name was already taken.
    pub collisions: Vec<String>,
    pub backup: Option<PathBuf>,
    /// The merged document, for dry runs.
    pub preview: Option<String>,
}

/// Run a complete import.
///
/// Every outcome is reported to `sink`: a failed run ends with an error event,
/// and every run, failed or not, ends with a closing info event.
///
/// # Errors
///
/// Returns an error if:
/// - No source files were selected
/// - None of the sources is valid, or every valid source collides
/// - The destination exists but is not a valid `CustomView` document
/// - The destination cannot be backed up or saved
pub fn run_import(
    selection: &mut dyn SourceSelection,
    options: &ImportOptions,
    sink: &mut dyn LogSink,
) -> Result<ImportSummary, ImportError> {
    let result = import_sources(selection, options, sink);

    match &result {
        Ok(summary) if summary.preview.is_some() => {
            sink.info(format!("Dry run: {} group(s) would be imported", summary.imported.len()));
        },
        Ok(summary) => sink.info(format!(
            "Imported {} group(s) into {}",
            summary.imported.len(),
            summary.destination.display()
        )),
        Err(e) => sink.error(format!("Import aborted: {e}")),
    }
    sink.info("Import finished".to_string());

    result
}

fn import_sources(
    selection: &mut dyn SourceSelection,
    options: &ImportOptions,
    sink: &mut dyn LogSink,
) -> Result<ImportSummary, ImportError> {
    let sources = selection.select_source_files()?;
    if sources.is_empty() {
        return Err(ImportError::NoSourcesSelected);
    }
    sink.info(format!("Importing {} source file(s)", sources.len()));

    let mut summary = ImportSummary::default();
    let trees = load_valid_sources(&sources, &mut summary, sink);
    if trees.is_empty() {
        return Err(ImportError::NoValidSources(sources.len()));
    }

    summary.destination = selection.select_destination_location().join(&options.destination_file);
    let mut view = CustomView::load_or_create(&summary.destination)?;
    if summary.destination.exists() {
        sink.info(format!("Merging into existing {}", summary.destination.display()));
    } else {
        sink.info(format!("Creating new {}", summary.destination.display()));
    }

    let unique = filter_collisions(&view, trees, options.matching, &mut summary, sink);
    if unique.is_empty() {
        return Err(ImportError::NoUniqueSources);
    }

    for tree in &unique {
        let (groups, hosts) = tree.root_group.counts();
        import_tree(&mut view, tree);
        sink.info(format!("Imported '{}' ({groups} group(s), {hosts} host(s))", tree.root_name));
        summary.imported.push(tree.root_name.clone());
    }

    if options.dry_run {
        let xml = view.to_xml().map_err(|source| ImportError::SaveFailed {
            path: summary.destination.clone(),
            source,
        })?;
        summary.preview = Some(xml);
        return Ok(summary);
    }

    summary.backup = view.persist(&summary.destination, Local::now())?;
    if let Some(backup) = &summary.backup {
        sink.info(format!("Backed up previous destination to {}", backup.display()));
    }

    Ok(summary)
}

fn load_valid_sources(
    sources: &[PathBuf],
    summary: &mut ImportSummary,
    sink: &mut dyn LogSink,
) -> Vec<SourceTree> {
    let mut trees = Vec::new();

    for path in sources {
        match load_source(path) {
            Ok(tree) => {
                debug!("Validated {} as '{}'", path.display(), tree.root_name);
                if tree.dropped_hosts > 0 {
                    sink.warning(format!(
                        "{}: ignored {} server(s) placed next to sub-groups",
                        path.display(),
                        tree.dropped_hosts
                    ));
                }
                trees.push(tree);
            },
            Err(e) => {
                sink.warning(format!("Skipping {e}"));
                summary.rejected.push(path.clone());
            },
        }
    }

    trees
}

/// Drop trees whose root name is already taken, either by a top-level container
/// of the destination or by an earlier tree of the same batch.
fn filter_collisions(
    view: &CustomView,
    trees: Vec<SourceTree>,
    matching: NameMatching,
    summary: &mut ImportSummary,
    sink: &mut dyn LogSink,
) -> Vec<SourceTree> {
    let mut unique: Vec<SourceTree> = Vec::new();

    for tree in trees {
        let name = tree.root_name.as_str();
        if view.has_collision(name, matching) {
            sink.warning(format!(
                "Skipping '{name}': a top-level group with that name already exists in the destination"
            ));
        } else if unique.iter().any(|accepted| matching.matches(&accepted.root_name, name)) {
            sink.warning(format!(
                "Skipping '{name}': another source in this run already uses that name"
            ));
        } else {
            unique.push(tree);
            continue;
        }
        summary.collisions.push(tree.root_name);
    }

    unique
}
