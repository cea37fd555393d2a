//! Error types for XML parsing with source locations.

use std::fmt;
use trellis_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use trellis_source_map::SourceInfo;

/// Result type alias for trellis-xml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading markup.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// XML syntax error reported by quick-xml.
    XmlSyntax {
        message: String,
        /// Span around the point where reading stopped.
        location: Option<SourceInfo>,
    },

    /// The input ended while elements were still open.
    UnexpectedEof {
        /// What was expected when EOF was encountered.
        expected: String,
        location: Option<SourceInfo>,
    },

    /// An end tag closes a different element than the one that is open.
    MismatchedEndTag {
        expected: String,
        found: String,
        location: Option<SourceInfo>,
    },

    /// Structural problem not covered by quick-xml.
    InvalidStructure {
        message: String,
        location: Option<SourceInfo>,
    },

    /// No root element.
    EmptyDocument,

    /// More than one root element.
    MultipleRoots { location: Option<SourceInfo> },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::XmlSyntax { message, location } => {
                write!(f, "XML syntax error: {}", message)?;
                if let Some(loc) = location {
                    write!(f, " at byte {}", loc.start)?;
                }
                Ok(())
            }
            Error::UnexpectedEof { expected, .. } => {
                write!(f, "unexpected end of input, expected {}", expected)
            }
            Error::MismatchedEndTag {
                expected, found, ..
            } => write!(
                f,
                "mismatched end tag: expected </{}>, found </{}>",
                expected, found
            ),
            Error::InvalidStructure { message, .. } => {
                write!(f, "invalid XML structure: {}", message)
            }
            Error::EmptyDocument => write!(f, "empty XML document: no root element found"),
            Error::MultipleRoots { .. } => write!(f, "invalid XML: multiple root elements"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Primary source location of the error, if known.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Error::XmlSyntax { location, .. }
            | Error::UnexpectedEof { location, .. }
            | Error::MismatchedEndTag { location, .. }
            | Error::InvalidStructure { location, .. }
            | Error::MultipleRoots { location } => location.as_ref(),
            Error::EmptyDocument => None,
        }
    }

    /// Convert this error to a DiagnosticMessage with its `T-1-*` code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match self {
            Error::XmlSyntax { message, .. } => DiagnosticMessageBuilder::error("XML Syntax Error")
                .with_code("T-1-1")
                .problem(message.clone()),

            Error::UnexpectedEof { expected, .. } => {
                DiagnosticMessageBuilder::error("Unexpected End of XML Input")
                    .with_code("T-1-2")
                    .problem(format!("The markup ended unexpectedly; expected {}", expected))
            }

            Error::MismatchedEndTag {
                expected, found, ..
            } => DiagnosticMessageBuilder::error("Mismatched XML End Tag")
                .with_code("T-1-3")
                .problem(format!(
                    "End tag `</{}>` does not match start tag `<{}>`",
                    found, expected
                ))
                .add_hint("Check that all opening tags have matching closing tags?"),

            Error::InvalidStructure { message, .. } => {
                DiagnosticMessageBuilder::error("Invalid XML Structure")
                    .with_code("T-1-4")
                    .problem(message.clone())
            }

            Error::EmptyDocument => DiagnosticMessageBuilder::error("Empty XML Document")
                .with_code("T-1-5")
                .problem("The markup contains no root element")
                .add_hint("Wrap the content in a `<template>` element?"),

            Error::MultipleRoots { .. } => {
                DiagnosticMessageBuilder::error("Multiple XML Root Elements")
                    .with_code("T-1-6")
                    .problem("The markup contains more than one root element")
                    .add_hint("Wrap the elements in a single `<template>` element?")
            }
        };

        match self.location() {
            Some(loc) => builder.with_location(loc.clone()).build(),
            None => builder.build(),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlSyntax {
            message: format!("attribute error: {}", err),
            location: None,
        }
    }
}
