//! Appending items under `Root` while keeping the loaded text as is.

use super::is_root_item;
use crate::document::{reader::element_from, writer, Element, XmlError};
use quick_xml::events::Event;
use quick_xml::Reader;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
const DEFAULT_INDENT: &str = "  ";

/// Insert `items` right before the closing tag of the `Root` item of `text`.
///
/// Returns `None` when `text` has no `Root` start/end tag pair to insert into,
/// e.g. when `Root` is written as an empty element.
pub(super) fn append_to_root(text: &str, items: &[&Element]) -> Result<Option<String>, XmlError> {
    let Some(offset) = root_close_offset(text)? else {
        return Ok(None);
    };
    let Some((head, tail)) = text.get(..offset).zip(text.get(offset..)) else {
        return Ok(None);
    };

    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let line_start = head.rfind('\n').map_or(0, |i| i + 1);
    let root_indent = &head[line_start..];
    let own_line = line_start > 0 && root_indent.chars().all(char::is_whitespace);

    let mut inserted = String::new();
    for item in items {
        if own_line {
            let unit = if root_indent.is_empty() { DEFAULT_INDENT } else { root_indent };
            let fragment = writer::to_xml_fragment(item, true)?;
            for line in fragment.lines().filter(|line| !line.trim().is_empty()) {
                inserted.push_str(unit);
                inserted.push_str(line);
                inserted.push_str(newline);
                inserted.push_str(root_indent);
            }
        } else {
            inserted.push_str(&writer::to_xml_fragment(item, false)?);
        }
    }

    let mut xml = String::with_capacity(text.len() + inserted.len() + DECLARATION.len());
    if !text.trim_start().starts_with("<?xml") {
        xml.push_str(DECLARATION);
        xml.push_str(newline);
    }
    xml.push_str(head);
    xml.push_str(&inserted);
    xml.push_str(tail);

    Ok(Some(xml))
}

/// Byte offset of the `</item>` closing the `Root` item directly under the document root.
fn root_close_offset(text: &str) -> Result<Option<usize>, XmlError> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0_usize;
    let mut root_depth = None;

    loop {
        let before = usize::try_from(reader.buffer_position()).ok();
        match reader.read_event()? {
            Event::Start(start) => {
                depth += 1;
                if root_depth.is_none() && depth == 2 && is_root_item(&element_from(&start)?) {
                    root_depth = Some(depth);
                }
            },
            Event::End(_) => {
                if root_depth == Some(depth) {
                    return Ok(before);
                }
                depth = depth.saturating_sub(1);
            },
            Event::Eof => return Ok(None),
            _ => {},
        }
    }
}
