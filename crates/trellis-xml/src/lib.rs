//! Source-tracked XML reading for Trellis markup.
//!
//! Wraps [`quick-xml`] to produce a tree of [`XmlElement`]s in which every
//! element, attribute and text node remembers the byte span it came from.
//! The template engine only relies on a small part of this tree: tag names,
//! attribute lookup, children in document order and parent lookup.
//!
//! # Example
//!
//! ```rust
//! use trellis_xml::parse;
//!
//! let xml = parse(r#"<template>
//!   <import library="widgets"/>
//!   <label id="title" text="Hello"/>
//! </template>"#).unwrap();
//!
//! assert_eq!(xml.root.name, "template");
//!
//! let children = xml.root.all_children();
//! assert_eq!(children.len(), 2);
//! assert_eq!(children[1].get_attribute("id"), Some("title"));
//!
//! let parent = xml.parent_of(children[1]).unwrap();
//! assert_eq!(parent.name, "template");
//! ```

pub mod error;
pub mod parser;
pub mod types;

pub use error::{Error, Result};
pub use parser::{parse, parse_with_file_id};
pub use trellis_source_map::SourceInfo;
pub use types::{XmlAttribute, XmlChild, XmlChildren, XmlElement, XmlWithSourceInfo};
