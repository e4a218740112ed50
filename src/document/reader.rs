use super::{Element, XmlError, XmlNode};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse an XML document into its root element.
///
/// Whitespace-only text is dropped; the XML declaration, processing instructions
/// and anything outside the root element are discarded.
///
/// # Errors
///
/// Returns an error if:
/// - The text is not well-formed XML
/// - There is no root element, or more than one
pub fn parse_document(text: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element)?;
            },
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| {
                    XmlError::UnexpectedEnd(String::from_utf8_lossy(end.name().as_ref()).into_owned())
                })?;
                attach(&mut stack, &mut root, element)?;
            },
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let value = text.unescape().map_err(|e| XmlError::Escape(e.to_string()))?;
                    parent.children.push(XmlNode::Text(value.into_owned()));
                }
            },
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::CData(String::from_utf8_lossy(&data).into_owned()));
                }
            },
            Event::Comment(comment) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(XmlNode::Comment(String::from_utf8_lossy(&comment).into_owned()));
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }

    root.ok_or(XmlError::NoRoot)
}

pub(crate) fn element_from(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| XmlError::Attribute(e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|e| XmlError::Escape(e.to_string()))?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        Ok(())
    } else if root.is_some() {
        Err(XmlError::MultipleRoots)
    } else {
        *root = Some(element);
        Ok(())
    }
}
