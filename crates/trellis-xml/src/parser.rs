//! XML reader that builds XmlWithSourceInfo trees.

use crate::{Error, Result, XmlAttribute, XmlChild, XmlChildren, XmlElement, XmlWithSourceInfo};
use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use std::ops::Range;
use trellis_source_map::{FileId, SourceInfo};

/// Parse XML from a string, producing an XmlWithSourceInfo tree.
///
/// Spans point into [`FileId(0)`](FileId); use [`parse_with_file_id`] when
/// the content is registered in a [`SourceContext`](trellis_source_map::SourceContext).
///
/// # Example
///
/// ```rust
/// use trellis_xml::parse;
///
/// let xml = parse("<template><label/></template>").unwrap();
/// assert_eq!(xml.root.name, "template");
/// ```
pub fn parse(content: &str) -> Result<XmlWithSourceInfo> {
    parse_with_file_id(content, FileId(0))
}

/// Parse XML from a string with an associated file ID.
pub fn parse_with_file_id(content: &str, file_id: FileId) -> Result<XmlWithSourceInfo> {
    XmlParser::new(content, file_id).parse()
}

struct XmlParser<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    file_id: FileId,
    /// Elements whose end tag has not been seen yet.
    stack: Vec<OpenElement>,
    root: Option<XmlElement>,
}

/// An element whose start tag has been read.
struct OpenElement {
    name: String,
    name_source: SourceInfo,
    prefix: Option<String>,
    attributes: Vec<XmlAttribute>,
    /// Byte offset of the `<` of the start tag.
    start_offset: usize,
    children: Vec<XmlChild>,
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str, file_id: FileId) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            source,
            reader,
            file_id,
            stack: Vec::new(),
            root: None,
        }
    }

    fn parse(mut self) -> Result<XmlWithSourceInfo> {
        loop {
            let event_start = self.reader.buffer_position() as usize;

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let open = self.open_element(&e, event_start)?;
                    self.stack.push(open);
                }
                Ok(Event::Empty(e)) => {
                    let open = self.open_element(&e, event_start)?;
                    let end_offset = self.reader.buffer_position() as usize;
                    let element = self.close_element(open, end_offset);
                    self.attach(element)?;
                }
                Ok(Event::End(e)) => {
                    let element = self.handle_end(&e, event_start)?;
                    self.attach(element)?;
                }
                Ok(Event::Text(e)) => {
                    let content = e.unescape().map_err(|err| Error::XmlSyntax {
                        message: format!("invalid text content: {}", err),
                        location: Some(self.make_source_info(event_start, event_start)),
                    })?;
                    let end_offset = self.reader.buffer_position() as usize;
                    self.push_text(content.into_owned(), event_start, end_offset)?;
                }
                Ok(Event::CData(e)) => {
                    let content = String::from_utf8_lossy(e.as_ref()).into_owned();
                    let end_offset = self.reader.buffer_position() as usize;
                    self.push_text(content, event_start, end_offset)?;
                }
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    let position = self.reader.error_position() as usize;
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        location: Some(self.make_source_info(position, position)),
                    });
                }
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", open.name),
                location: Some(open.name_source.clone()),
            });
        }

        let root = self.root.take().ok_or(Error::EmptyDocument)?;
        let source_info = self.make_source_info(0, self.source.len());
        Ok(XmlWithSourceInfo::new(root, source_info))
    }

    fn open_element(&self, e: &BytesStart<'_>, tag_start: usize) -> Result<OpenElement> {
        let full_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let name_start = tag_start + 1;
        let name_source = self.make_source_info(name_start, name_start + full_name.len());
        let attributes = self.parse_attributes(e, tag_start)?;
        let (name, prefix) = split_prefix(&full_name);

        Ok(OpenElement {
            name,
            name_source,
            prefix,
            attributes,
            start_offset: tag_start,
            children: Vec::new(),
        })
    }

    fn handle_end(&mut self, e: &BytesEnd<'_>, tag_start: usize) -> Result<XmlElement> {
        let full_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let (local_name, _) = split_prefix(&full_name);
        let end_offset = self.reader.buffer_position() as usize;

        let open = self.stack.pop().ok_or_else(|| Error::InvalidStructure {
            message: format!("unexpected closing tag </{}>", full_name),
            location: Some(self.make_source_info(tag_start, end_offset)),
        })?;

        if open.name != local_name {
            return Err(Error::MismatchedEndTag {
                expected: open.name,
                found: local_name,
                location: Some(self.make_source_info(tag_start, end_offset)),
            });
        }

        Ok(self.close_element(open, end_offset))
    }

    fn close_element(&self, open: OpenElement, end_offset: usize) -> XmlElement {
        XmlElement {
            source_info: self.make_source_info(open.start_offset, end_offset),
            name: open.name,
            name_source: open.name_source,
            prefix: open.prefix,
            attributes: open.attributes,
            children: finalize_children(open.children),
        }
    }

    /// Link a finished element to its parent, or make it the root.
    fn attach(&mut self, element: XmlElement) -> Result<()> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(XmlChild::Element(element));
            return Ok(());
        }
        if self.root.is_some() {
            return Err(Error::MultipleRoots {
                location: Some(element.source_info),
            });
        }
        self.root = Some(element);
        Ok(())
    }

    fn push_text(&mut self, content: String, start: usize, end: usize) -> Result<()> {
        let source_info = self.make_source_info(start, end);
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(XmlChild::Text {
                    content,
                    source_info,
                });
                Ok(())
            }
            None if content.trim().is_empty() => Ok(()),
            None => Err(Error::InvalidStructure {
                message: "text outside the root element".to_string(),
                location: Some(source_info),
            }),
        }
    }

    fn parse_attributes(&self, e: &BytesStart<'_>, tag_start: usize) -> Result<Vec<XmlAttribute>> {
        let raw = String::from_utf8_lossy(e.as_ref());
        let base = tag_start + 1;
        let mut cursor = e.name().as_ref().len();
        let mut attributes = Vec::new();

        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::XmlSyntax {
                message: format!("attribute error: {}", err),
                location: Some(self.make_source_info(tag_start, tag_start + 1)),
            })?;

            let full_name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| Error::XmlSyntax {
                    message: format!("invalid value for attribute `{}`: {}", full_name, err),
                    location: Some(self.make_source_info(tag_start, tag_start + 1)),
                })?
                .into_owned();

            // Attributes come back in source order, so each search starts
            // where the previous value ended.
            let (name_range, value_range) = locate_attribute(&raw, cursor, &full_name);
            cursor = value_range.end;

            let (name, prefix) = split_prefix(&full_name);
            attributes.push(XmlAttribute {
                name,
                name_source: self.make_source_info(base + name_range.start, base + name_range.end),
                prefix,
                value,
                value_source: self
                    .make_source_info(base + value_range.start, base + value_range.end),
            });
        }

        Ok(attributes)
    }

    fn make_source_info(&self, start: usize, end: usize) -> SourceInfo {
        SourceInfo::original(self.file_id, start, end)
    }
}

fn split_prefix(full_name: &str) -> (String, Option<String>) {
    match full_name.split_once(':') {
        Some((prefix, local)) => (local.to_string(), Some(prefix.to_string())),
        None => (full_name.to_string(), None),
    }
}

/// Find the spans of `key` and of its (quoted) value inside the raw tag
/// text, searching from `from`. Offsets are relative to the raw tag text.
fn locate_attribute(raw: &str, from: usize, key: &str) -> (Range<usize>, Range<usize>) {
    let mut search = from;

    while let Some(rel) = raw.get(search..).and_then(|rest| rest.find(key)) {
        let start = search + rel;
        let end = start + key.len();
        search = end;

        let preceded_by_space = raw[..start].chars().next_back().is_some_and(char::is_whitespace);
        let after_key = &raw[end..];
        let after_space = after_key.trim_start();
        if !preceded_by_space || !after_space.starts_with('=') {
            continue;
        }

        let equals = end + (after_key.len() - after_space.len());
        let after_equals = &raw[equals + 1..];
        let value_start = equals + 1 + (after_equals.len() - after_equals.trim_start().len());
        let value_end = match raw[value_start..].chars().next() {
            Some(quote @ ('"' | '\'')) => raw[value_start + 1..]
                .find(quote)
                .map_or(raw.len(), |p| value_start + 1 + p + 1),
            _ => raw[value_start..]
                .find(char::is_whitespace)
                .map_or(raw.len(), |p| value_start + p),
        };

        return (start..end, value_start..value_end);
    }

    (from..from, from..from)
}

/// Collapse accumulated children into the most specific [`XmlChildren`] shape.
///
/// Whitespace-only text is layout when the element also has child elements,
/// so it is dropped in that case.
fn finalize_children(children: Vec<XmlChild>) -> XmlChildren {
    let has_elements = children.iter().any(|c| matches!(c, XmlChild::Element(_)));

    let mut children: Vec<XmlChild> = if has_elements {
        children
            .into_iter()
            .filter(|c| match c {
                XmlChild::Text { content, .. } => !content.trim().is_empty(),
                XmlChild::Element(_) => true,
            })
            .collect()
    } else {
        children
    };

    if children.is_empty() {
        return XmlChildren::Empty;
    }

    if children.iter().all(|c| matches!(c, XmlChild::Element(_))) {
        let elements = children
            .into_iter()
            .filter_map(|c| match c {
                XmlChild::Element(e) => Some(e),
                XmlChild::Text { .. } => None,
            })
            .collect();
        return XmlChildren::Elements(elements);
    }

    if children.len() == 1 {
        if let Some(XmlChild::Text {
            content,
            source_info,
        }) = children.pop()
        {
            return XmlChildren::Text {
                content,
                source_info,
            };
        }
        return XmlChildren::Empty;
    }

    if !has_elements {
        // Adjacent text and CDATA runs merge into one text node.
        let mut merged = String::new();
        let mut span: Option<SourceInfo> = None;
        for child in children {
            if let XmlChild::Text {
                content,
                source_info,
            } = child
            {
                merged.push_str(&content);
                span = Some(match span {
                    Some(span) => span.join(&source_info),
                    None => source_info,
                });
            }
        }
        return XmlChildren::Text {
            content: merged,
            source_info: span.unwrap_or_default(),
        };
    }

    XmlChildren::Mixed(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_element() {
        let xml = parse("<template/>").unwrap();
        assert_eq!(xml.root.name, "template");
        assert!(xml.root.is_empty());
    }

    #[test]
    fn test_parse_nested_elements_drops_layout_whitespace() {
        let xml = parse("<template>\n  <label/>\n  <button/>\n</template>").unwrap();

        match &xml.root.children {
            XmlChildren::Elements(elements) => {
                let names: Vec<&str> = elements.iter().map(|e| e.name.as_str()).collect();
                assert_eq!(names, vec!["label", "button"]);
            }
            other => panic!("expected element children, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_text_content() {
        let xml = parse("<label>Hello &amp; welcome</label>").unwrap();
        assert_eq!(xml.root.text(), Some("Hello & welcome"));
    }

    #[test]
    fn test_parse_mixed_content() {
        let xml = parse("<label>Hello <b/> world</label>").unwrap();
        assert!(matches!(xml.root.children, XmlChildren::Mixed(ref c) if c.len() == 3));
        assert_eq!(xml.root.all_children().len(), 1);
    }

    #[test]
    fn test_parse_cdata_merges_with_text() {
        let xml = parse("<script>a <![CDATA[<b>]]></script>").unwrap();
        assert_eq!(xml.root.text(), Some("a <b>"));
    }

    #[test]
    fn test_parse_attributes_and_prefix() {
        let xml = parse(r#"<ui:label xmlns:ui="urn:trellis" text="a &lt; b"/>"#).unwrap();
        assert_eq!(xml.root.name, "label");
        assert_eq!(xml.root.prefix.as_deref(), Some("ui"));
        assert_eq!(xml.root.get_attribute("text"), Some("a < b"));
    }

    #[test]
    fn test_comments_and_declarations_are_skipped() {
        let xml = parse("<?xml version=\"1.0\"?>\n<!-- menu -->\n<template><!-- x --><label/></template>")
            .unwrap();
        assert_eq!(xml.root.all_children().len(), 1);
    }

    #[test]
    fn test_source_info_tracking() {
        let content = "<template><label/></template>";
        let xml = parse_with_file_id(content, FileId(4)).unwrap();

        assert_eq!(xml.root.source_info, SourceInfo::original(FileId(4), 0, content.len()));
        assert_eq!(xml.root.name_source, SourceInfo::original(FileId(4), 1, 9));

        let label = xml.root.all_children()[0];
        assert_eq!(label.source_info, SourceInfo::original(FileId(4), 10, 18));
    }

    #[test]
    fn test_attribute_position_tracking() {
        //          0         1         2         3
        //          0123456789012345678901234567890123456789
        let xml = r#"<root attr="value" other='test'/>"#;
        let parsed = parse(xml).unwrap();

        let attr = &parsed.root.attributes[0];
        assert_eq!((attr.name_source.start, attr.name_source.end), (6, 10));
        assert_eq!((attr.value_source.start, attr.value_source.end), (11, 18));

        let other = &parsed.root.attributes[1];
        assert_eq!((other.name_source.start, other.name_source.end), (19, 24));
        assert_eq!((other.value_source.start, other.value_source.end), (25, 31));
    }

    #[test]
    fn test_attribute_name_inside_earlier_value() {
        //          0         1         2         3
        //          0123456789012345678901234567890123456789
        let xml = r#"<label text="id=3" id="main"/>"#;
        let parsed = parse(xml).unwrap();

        let id = parsed.root.get_attribute_full("id").unwrap();
        assert_eq!(id.value, "main");
        assert_eq!((id.name_source.start, id.name_source.end), (19, 21));
        assert_eq!((id.value_source.start, id.value_source.end), (22, 28));
    }

    #[test]
    fn test_empty_document_error() {
        assert_eq!(parse("").unwrap_err(), Error::EmptyDocument);
        assert_eq!(parse("  \n ").unwrap_err(), Error::EmptyDocument);
    }

    #[test]
    fn test_unclosed_element_error() {
        let err = parse("<template>").unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }), "{:?}", err);
        assert_eq!(err.to_diagnostic().code.as_deref(), Some("T-1-2"));
        assert_eq!(err.location(), Some(&SourceInfo::original(FileId(0), 1, 9)));
    }

    #[test]
    fn test_multiple_roots_error() {
        let err = parse("<template/><another/>").unwrap_err();
        assert_eq!(
            err,
            Error::MultipleRoots {
                location: Some(SourceInfo::original(FileId(0), 11, 21)),
            }
        );
    }

    #[test]
    fn test_mismatched_tags_error() {
        // quick-xml checks end names itself and reports a syntax error;
        // either form is acceptable.
        let result = parse("<template></label>");
        assert!(
            matches!(
                result,
                Err(Error::MismatchedEndTag { .. } | Error::XmlSyntax { .. })
            ),
            "Expected MismatchedEndTag or XmlSyntax error, got: {:?}",
            result
        );
    }

    #[test]
    fn test_syntax_error_diagnostic() {
        let err = parse("<template attr=unquoted/>").unwrap_err();
        let diag = err.to_diagnostic();
        assert_eq!(diag.code.as_deref(), Some("T-1-1"));
        assert_eq!(diag.title, "XML Syntax Error");
    }

    #[test]
    fn test_text_outside_root_error() {
        let err = parse("<template/> trailing").unwrap_err();
        assert!(matches!(err, Error::InvalidStructure { .. }), "{:?}", err);
    }
}
