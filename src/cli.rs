use crate::merge::NameMatching;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rdgmerge",
    about = "Merge Remote Desktop Connection Manager groups into a CustomView tree",
    long_about = "rdgmerge copies the group/server hierarchy of Remote Desktop Connection Manager \
(.rdg) files into a CustomView document without touching what is already there.

Each source file becomes one top-level group named after the file's root group.
A source is skipped when the destination already has a top-level group with the same name.
An existing destination is copied to <file>.bak__<MM-dd-yyyy_HHmmss> before it is overwritten.

Configuration is read from:
  • $XDG_CONFIG_HOME/rdgmerge/config.toml (or the platform config directory)",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug output (shows INFO and DEBUG messages)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Enable trace output (shows all log messages including TRACE)
    #[arg(short = 't', long, global = true)]
    pub trace: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import source files into the destination CustomView
    #[command(long_about = "Import source files into the destination CustomView.

Directories expand to the .rdg files they contain, sorted by name.
Invalid sources are skipped with a warning; the run aborts when no source is left.

Examples:
  # Import two files into ./CustomView.xml
  rdgmerge import servers.rdg lab.rdg

  # Import every .rdg file of a directory into another view directory
  rdgmerge import ./exports --destination-dir ~/views

  # Show the merged document without writing it
  rdgmerge import servers.rdg --dry-run")]
    Import(ImportArgs),

    /// Print the group/server tree of a source file
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Source .rdg files or directories containing them
    #[arg(value_name = "SOURCE", value_hint = clap::ValueHint::AnyPath)]
    pub sources: Vec<PathBuf>,

    /// Directory holding the destination document
    #[arg(short = 'd', long, env = "RDGMERGE_DESTINATION_DIR", value_hint = clap::ValueHint::DirPath)]
    pub destination_dir: Option<PathBuf>,

    /// File name of the destination document
    #[arg(short = 'f', long, env = "RDGMERGE_DESTINATION_FILE")]
    pub destination_file: Option<String>,

    /// How source names are compared with existing top-level groups
    #[arg(short = 'm', long, value_enum)]
    pub collision_match: Option<NameMatching>,

    /// Print the merged document instead of writing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Source .rdg file
    #[arg(value_name = "SOURCE", value_hint = clap::ValueHint::FilePath)]
    pub source: PathBuf,
}
