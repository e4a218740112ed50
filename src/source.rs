//! Source connection-group documents (Remote Desktop Connection Manager `.rdg`).
//!
//! A document is accepted only when its root element is `RDCMan`. The `file`
//! element below the root becomes the root group of the [`SourceTree`]; its
//! `group` and `server` children become [`Group`]s and [`Host`]s.

use crate::document::{reader::parse_document, Element};
use crate::ImportError;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// Root element marker of a supported source document.
pub const SOURCE_ROOT_MARKER: &str = "RDCMan";

const FILE: &str = "file";
const GROUP: &str = "group";
const SERVER: &str = "server";
const PROPERTIES: &str = "properties";
const NAME: &str = "name";
const DISPLAY_NAME: &str = "displayName";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    /// Name of the imported collection, used as the top-level import name.
    pub root_name: String,
    pub root_group: Group,
    /// Hosts discarded because they shared a group with sub-groups.
    pub dropped_hosts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub content: GroupContent,
}

/// What a group holds. A group holds sub-groups or hosts, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupContent {
    Groups(Vec<Group>),
    Hosts(Vec<Host>),
}

impl Default for GroupContent {
    fn default() -> Self {
        Self::Groups(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub display_name: Option<String>,
}

impl Host {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), display_name: None }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// The display name, or the host name when the display name is absent or empty.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().filter(|d| !d.is_empty()).unwrap_or(self.name.as_str())
    }
}

impl Group {
    pub fn with_groups(name: impl Into<String>, groups: Vec<Self>) -> Self {
        Self { name: name.into(), content: GroupContent::Groups(groups) }
    }

    pub fn with_hosts(name: impl Into<String>, hosts: Vec<Host>) -> Self {
        Self { name: name.into(), content: GroupContent::Hosts(hosts) }
    }

    /// Number of groups and hosts below this group (the group itself excluded).
    pub fn counts(&self) -> (usize, usize) {
        match &self.content {
            GroupContent::Groups(groups) => groups.iter().fold((0, 0), |(g, h), group| {
                let (sub_groups, sub_hosts) = group.counts();
                (g + 1 + sub_groups, h + sub_hosts)
            }),
            GroupContent::Hosts(hosts) => (0, hosts.len()),
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{}/", "", self.name, indent = depth * 2)?;
        match &self.content {
            GroupContent::Groups(groups) => {
                for group in groups {
                    group.fmt_indented(f, depth + 1)?;
                }
            },
            GroupContent::Hosts(hosts) => {
                for host in hosts {
                    if host.label() == host.name {
                        writeln!(f, "{:indent$}{}", "", host.name, indent = (depth + 1) * 2)?;
                    } else {
                        writeln!(
                            f,
                            "{:indent$}{} ({})",
                            "",
                            host.name,
                            host.label(),
                            indent = (depth + 1) * 2
                        )?;
                    }
                }
            },
        }
        Ok(())
    }
}

impl fmt::Display for SourceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root_group.fmt_indented(f, 0)
    }
}

impl SourceTree {
    pub fn new(root_group: Group) -> Self {
        Self { root_name: root_group.name.clone(), root_group, dropped_hosts: 0 }
    }
}

/// Read and validate a source document from disk
///
/// # Errors
///
/// Returns an error if:
/// - Unable to read the file
/// - The file is not well-formed XML
/// - The document lacks the `RDCMan` root marker or a named `file` element
pub fn load_source<P: AsRef<Path>>(path: P) -> Result<SourceTree, ImportError> {
    let path_ref = path.as_ref();
    debug!("Loading source document {}", path_ref.display());

    let content = fs::read_to_string(path_ref)
        .map_err(|source| ImportError::Read { path: path_ref.to_path_buf(), source })?;

    parse_source_named(&content, &path_ref.display().to_string())
}

/// Parse and validate a source document from text.
///
/// # Errors
///
/// Same as [`load_source`], minus the read failure.
pub fn parse_source(text: &str) -> Result<SourceTree, ImportError> {
    parse_source_named(text, "source document")
}

fn parse_source_named(text: &str, origin: &str) -> Result<SourceTree, ImportError> {
    let root = parse_document(text)
        .map_err(|source| ImportError::Malformed { origin: origin.to_string(), source })?;

    if root.name != SOURCE_ROOT_MARKER {
        return Err(invalid(
            origin,
            format!("expected <{SOURCE_ROOT_MARKER}> root element, found <{}>", root.name),
        ));
    }

    let file = root.child(FILE).ok_or_else(|| invalid(origin, "missing <file> element".into()))?;

    let mut dropped_hosts = 0;
    let root_group = convert_group(file, origin, &mut dropped_hosts)?;
    trace!("Parsed source tree '{}' from {origin}", root_group.name);

    Ok(SourceTree { root_name: root_group.name.clone(), root_group, dropped_hosts })
}

fn convert_group(
    element: &Element,
    origin: &str,
    dropped_hosts: &mut usize,
) -> Result<Group, ImportError> {
    let name = property(element, NAME)
        .ok_or_else(|| invalid(origin, format!("<{}> element without a name", element.name)))?;

    let groups = element
        .children_named(GROUP)
        .map(|group| convert_group(group, origin, dropped_hosts))
        .collect::<Result<Vec<_>, _>>()?;
    let hosts = element
        .children_named(SERVER)
        .map(|server| convert_host(server, origin))
        .collect::<Result<Vec<_>, _>>()?;

    let content = if groups.is_empty() {
        GroupContent::Hosts(hosts)
    } else {
        *dropped_hosts += hosts.len();
        GroupContent::Groups(groups)
    };

    Ok(Group { name, content })
}

fn convert_host(element: &Element, origin: &str) -> Result<Host, ImportError> {
    let name =
        property(element, NAME).ok_or_else(|| invalid(origin, "<server> without a name".into()))?;
    let display_name = property(element, DISPLAY_NAME);
    Ok(Host { name, display_name })
}

/// Look a property up in `<properties>` (schema v2 and later), falling back to a
/// direct child element (schema v1).
fn property(element: &Element, key: &str) -> Option<String> {
    element
        .child(PROPERTIES)
        .and_then(|properties| properties.child(key))
        .or_else(|| element.child(key))
        .map(Element::text)
        .filter(|value| !value.is_empty())
}

fn invalid(origin: &str, reason: String) -> ImportError {
    ImportError::InvalidFormat { origin: origin.to_string(), reason }
}
