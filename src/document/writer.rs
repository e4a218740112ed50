use super::{Element, XmlError, XmlNode};
use chrono::{DateTime, Local};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Timestamp suffix used for backups (`MM-dd-yyyy_HHmmss`).
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%m-%d-%Y_%H%M%S";

const INDENT_WIDTH: usize = 2;
const MAX_BACKUPS_PER_SECOND: u32 = 1000;

/// Serialize a document, starting with a UTF-8 XML declaration.
///
/// # Errors
///
/// Returns an error if the XML writer fails
pub fn to_xml_string(root: &Element) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Serialize a single element without an XML declaration or trailing newline.
///
/// # Errors
///
/// Returns an error if the XML writer fails
pub fn to_xml_fragment(element: &Element, indent: bool) -> Result<String, XmlError> {
    let mut writer = if indent {
        Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH)
    } else {
        Writer::new(Vec::new())
    };
    write_element(&mut writer, element)?;

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(nested) => write_element(writer, nested)?,
            XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            XmlNode::CData(data) => {
                writer.write_event(Event::CData(BytesCData::new(data.as_str())))?;
            },
            XmlNode::Comment(comment) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
            },
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;

    Ok(())
}

/// Write already serialized XML to `path`.
///
/// The content is written to a temporary file next to `path` and renamed over it,
/// so a failed write leaves any existing file untouched.
///
/// # Errors
///
/// Returns an error if:
/// - Unable to create parent directories
/// - Unable to write or rename the temporary file
pub fn write_xml<P: AsRef<Path>>(path: P, xml: &str) -> Result<(), XmlError> {
    let path_ref = path.as_ref();

    let dir = match path_ref.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(xml.as_bytes())?;
    temp.flush()?;
    temp.persist(path_ref).map_err(|e| e.error)?;

    Ok(())
}

/// Path of the backup taken for `path` at `now`: `<path>.bak__<MM-dd-yyyy_HHmmss>`.
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".bak__{}", now.format(BACKUP_TIMESTAMP_FORMAT)));
    PathBuf::from(name)
}

/// Create a backup of a file with timestamp
///
/// An existing backup is never overwritten. When `backup_path` is already taken,
/// the copy goes to the first free `<backup>.N`.
///
/// # Errors
///
/// Returns an error if unable to copy the file
pub fn backup_file<P: AsRef<Path>>(path: P, now: DateTime<Local>) -> io::Result<Option<PathBuf>> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        return Ok(None);
    }

    let base = backup_path(path_ref, now);
    let backup = reserve_backup(&base)?;
    if let Err(e) = fs::copy(path_ref, &backup) {
        let _ = fs::remove_file(&backup);
        return Err(e);
    }

    Ok(Some(backup))
}

fn reserve_backup(base: &Path) -> io::Result<PathBuf> {
    for attempt in 0..MAX_BACKUPS_PER_SECOND {
        let candidate = if attempt == 0 {
            base.to_path_buf()
        } else {
            let mut name = OsString::from(base.as_os_str());
            name.push(format!(".{attempt}"));
            PathBuf::from(name)
        };

        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {},
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free backup name left for {}", base.display()),
    ))
}
