//! The destination `CustomView` document.
//!
//! ```xml
//! <CustomView>
//!   <item name="Root" text="Root" imageindex="1">
//!     <item name="Servers" text="Servers" imageindex="0">
//!       <item name="dc1.local" text="dc1.local" imageindex="2" />
//!     </item>
//!   </item>
//! </CustomView>
//! ```
//!
//! Everything already in the document is kept as is. New items can only be added
//! through an [`InsertionPoint`] handed out by [`CustomView::create_top_level_import`].
//! A view loaded from text is written back as that text with the new items inserted
//! before the closing tag of `Root`, so existing items keep their exact bytes.

mod splice;

use crate::document::{reader::parse_document, writer, Element, XmlError};
use crate::merge::NameMatching;
use crate::ImportError;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root element marker of a destination document.
pub const DESTINATION_ROOT_MARKER: &str = "CustomView";
/// Name and text of the single root item.
pub const ROOT_ITEM_NAME: &str = "Root";

const ITEM: &str = "item";
const NAME: &str = "name";
const TEXT: &str = "text";
const IMAGE_INDEX: &str = "imageindex";

/// Kind of an `item`, encoded in its `imageindex` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Container,
    Root,
    Leaf,
}

impl ItemKind {
    pub const fn image_index(self) -> &'static str {
        match self {
            Self::Container => "0",
            Self::Root => "1",
            Self::Leaf => "2",
        }
    }

    pub fn from_image_index(value: &str) -> Option<Self> {
        match value.trim() {
            "0" => Some(Self::Container),
            "1" => Some(Self::Root),
            "2" => Some(Self::Leaf),
            _ => None,
        }
    }

    pub fn of(item: &Element) -> Option<Self> {
        item.attribute(IMAGE_INDEX).and_then(Self::from_image_index)
    }
}

fn new_item(name: &str, text: &str, kind: ItemKind) -> Element {
    Element::new(ITEM)
        .with_attribute(NAME, name)
        .with_attribute(TEXT, text)
        .with_attribute(IMAGE_INDEX, kind.image_index())
}

fn is_root_item(element: &Element) -> bool {
    element.name == ITEM && element.attribute(NAME) == Some(ROOT_ITEM_NAME)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomView {
    document: Element,
    loaded: Option<LoadedText>,
}

/// Text a view was parsed from and how many items `Root` held at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadedText {
    text: String,
    root_items: usize,
}

impl Default for CustomView {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomView {
    /// An empty view holding only the root item.
    pub fn new() -> Self {
        let mut document = Element::new(DESTINATION_ROOT_MARKER);
        document.push_element(new_item(ROOT_ITEM_NAME, ROOT_ITEM_NAME, ItemKind::Root));
        Self { document, loaded: None }
    }

    /// Parse an existing destination document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The text is not well-formed XML
    /// - The root element is not `CustomView`, or it has no `Root` item
    pub fn parse(text: &str, origin: &str) -> Result<Self, ImportError> {
        let document = parse_document(text)
            .map_err(|source| ImportError::Malformed { origin: origin.to_string(), source })?;

        let invalid = |reason: String| ImportError::InvalidFormat { origin: origin.to_string(), reason };

        if document.name != DESTINATION_ROOT_MARKER {
            return Err(invalid(format!(
                "expected <{DESTINATION_ROOT_MARKER}> root element, found <{}>",
                document.name
            )));
        }
        let Some(root) = document.elements().find(|e| is_root_item(e)) else {
            return Err(invalid(format!("missing <{ITEM} {NAME}=\"{ROOT_ITEM_NAME}\"> element")));
        };
        let loaded = LoadedText { text: text.to_string(), root_items: root.elements().count() };

        Ok(Self { document, loaded: Some(loaded) })
    }

    /// Load the destination at `path`, or start an empty one if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file content is not a valid `CustomView` document
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            debug!("No destination at {}, starting an empty view", path_ref.display());
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path_ref)
            .map_err(|source| ImportError::Read { path: path_ref.to_path_buf(), source })?;
        Self::parse(&content, &path_ref.display().to_string())
    }

    pub const fn document(&self) -> &Element {
        &self.document
    }

    fn root_item(&self) -> Option<&Element> {
        self.document.elements().find(|e| is_root_item(e))
    }

    fn root_item_mut(&mut self) -> &mut Element {
        match self.document.elements_mut().find(|e| is_root_item(e)) {
            Some(root) => root,
            None => unreachable!("every CustomView holds a Root item"),
        }
    }

    /// Names of the container items directly under the root item.
    pub fn top_level_names(&self) -> Vec<&str> {
        self.root_item()
            .into_iter()
            .flat_map(|root| root.elements())
            .filter(|item| item.name == ITEM && ItemKind::of(item) == Some(ItemKind::Container))
            .filter_map(|item| item.attribute(NAME))
            .collect()
    }

    /// Whether a container item directly under the root already matches `name`.
    pub fn has_collision(&self, name: &str, matching: NameMatching) -> bool {
        self.top_level_names().into_iter().any(|existing| matching.matches(existing, name))
    }

    /// Append a new container item named `name` under the root item.
    ///
    /// Does not check for collisions; callers filter with [`Self::has_collision`] first.
    pub fn create_top_level_import(&mut self, name: &str) -> InsertionPoint<'_> {
        let item = self.root_item_mut().push_element(new_item(name, name, ItemKind::Container));
        InsertionPoint { item }
    }

    /// Serialize the view, XML declaration included.
    ///
    /// A parsed view keeps its original text and only gains the items added since.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML writer fails
    pub fn to_xml(&self) -> Result<String, XmlError> {
        if let Some(loaded) = &self.loaded {
            let added: Vec<&Element> =
                self.root_item().into_iter().flat_map(|root| root.elements()).skip(loaded.root_items).collect();
            if let Some(xml) = splice::append_to_root(&loaded.text, &added)? {
                if parse_document(&xml).is_ok_and(|parsed| parsed == self.document) {
                    return Ok(xml);
                }
            }
            debug!("Cannot append to the loaded text, rewriting the whole view");
        }
        writer::to_xml_string(&self.document)
    }

    /// Write the view to `path`, first copying any existing file to
    /// `<path>.bak__<MM-dd-yyyy_HHmmss>`.
    ///
    /// Returns the backup path when a backup was taken.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The existing file cannot be copied (nothing is written in that case)
    /// - The new document cannot be written
    pub fn persist<P: AsRef<Path>>(
        &self,
        path: P,
        now: DateTime<Local>,
    ) -> Result<Option<PathBuf>, ImportError> {
        let path_ref = path.as_ref();

        let backup = writer::backup_file(path_ref, now).map_err(|source| {
            ImportError::BackupFailed {
                path: path_ref.to_path_buf(),
                backup: writer::backup_path(path_ref, now),
                source,
            }
        })?;
        if let Some(backup_path) = &backup {
            debug!("Backup created: {}", backup_path.display());
        }

        self.to_xml()
            .and_then(|xml| writer::write_xml(path_ref, &xml))
            .map_err(|source| ImportError::SaveFailed { path: path_ref.to_path_buf(), source })?;

        Ok(backup)
    }
}

/// Mutable handle on a container item of a [`CustomView`].
#[derive(Debug)]
pub struct InsertionPoint<'a> {
    item: &'a mut Element,
}

impl InsertionPoint<'_> {
    pub fn name(&self) -> &str {
        self.item.attribute(NAME).unwrap_or_default()
    }

    /// Number of items directly below this one.
    pub fn len(&self) -> usize {
        self.item.elements().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a container item and return a handle on it.
    pub fn add_container(&mut self, name: &str) -> InsertionPoint<'_> {
        let item = self.item.push_element(new_item(name, name, ItemKind::Container));
        InsertionPoint { item }
    }

    /// Append a leaf item.
    pub fn add_leaf(&mut self, name: &str, label: &str) {
        self.item.push_element(new_item(name, label, ItemKind::Leaf));
    }
}
