//! Core types for source-tracked XML.

use trellis_source_map::SourceInfo;

/// A parsed XML document with source location tracking.
#[derive(Debug, Clone)]
pub struct XmlWithSourceInfo {
    /// The root element of the document.
    pub root: XmlElement,

    /// Source location of the entire document.
    pub source_info: SourceInfo,
}

/// An XML element with source location tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// The local name of the element (without namespace prefix).
    pub name: String,

    /// Source location of the element name.
    pub name_source: SourceInfo,

    /// Namespace prefix, if any.
    pub prefix: Option<String>,

    /// Attributes in source order.
    pub attributes: Vec<XmlAttribute>,

    /// Child content of this element.
    pub children: XmlChildren,

    /// Source location of the entire element, start tag through end tag.
    pub source_info: SourceInfo,
}

/// An XML attribute with separate spans for its name and value.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    /// The local name of the attribute (without namespace prefix).
    pub name: String,

    pub name_source: SourceInfo,

    pub prefix: Option<String>,

    /// The attribute value after entity unescaping.
    pub value: String,

    /// Source location of the value, quotes included.
    pub value_source: SourceInfo,
}

/// Children of an XML element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlChildren {
    /// Only child elements (whitespace between them is dropped).
    Elements(Vec<XmlElement>),

    /// Only text.
    Text {
        content: String,
        source_info: SourceInfo,
    },

    /// Text and elements interleaved.
    Mixed(Vec<XmlChild>),

    Empty,
}

/// A single child in mixed content.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlChild {
    Element(XmlElement),
    Text {
        content: String,
        source_info: SourceInfo,
    },
}

impl XmlWithSourceInfo {
    pub fn new(root: XmlElement, source_info: SourceInfo) -> Self {
        Self { root, source_info }
    }

    /// Find the parent of `target` by walking the tree from the root.
    ///
    /// `target` must be a reference into this document; elements are
    /// compared by address, not by value.
    pub fn parent_of(&self, target: &XmlElement) -> Option<&XmlElement> {
        self.root.find_parent_of(target)
    }
}

impl XmlElement {
    /// Create an element with no children.
    pub fn new(
        name: String,
        name_source: SourceInfo,
        attributes: Vec<XmlAttribute>,
        source_info: SourceInfo,
    ) -> Self {
        Self {
            name,
            name_source,
            prefix: None,
            attributes,
            children: XmlChildren::Empty,
            source_info,
        }
    }

    /// Get an attribute value by name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.get_attribute_full(name).map(|a| a.value.as_str())
    }

    /// Get an attribute by name, including its source spans.
    pub fn get_attribute_full(&self, name: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute_full(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.children, XmlChildren::Empty)
    }

    /// Text content, if this element contains only text.
    pub fn text(&self) -> Option<&str> {
        match &self.children {
            XmlChildren::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    /// All child elements in document order, ignoring text.
    pub fn all_children(&self) -> Vec<&XmlElement> {
        match &self.children {
            XmlChildren::Elements(elements) => elements.iter().collect(),
            XmlChildren::Mixed(children) => children
                .iter()
                .filter_map(|c| match c {
                    XmlChild::Element(e) => Some(e),
                    XmlChild::Text { .. } => None,
                })
                .collect(),
            XmlChildren::Text { .. } | XmlChildren::Empty => vec![],
        }
    }

    /// Child elements with the given name, in document order.
    pub fn get_children(&self, name: &str) -> Vec<&XmlElement> {
        self.all_children()
            .into_iter()
            .filter(|e| e.name == name)
            .collect()
    }

    fn find_parent_of(&self, target: &XmlElement) -> Option<&XmlElement> {
        let children = self.all_children();
        if children.iter().any(|child| std::ptr::eq(*child, target)) {
            return Some(self);
        }
        children
            .into_iter()
            .find_map(|child| child.find_parent_of(target))
    }
}
