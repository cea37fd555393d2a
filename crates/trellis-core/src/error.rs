/*
 * error.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Error types for the template engine.
//!
//! Each concern has its own enum; [`Error`] gathers them so that `?` works
//! across the whole parse pipeline. Every error converts to a
//! [`DiagnosticMessage`] with a stable `T-2-*` code (markup errors keep their
//! `T-1-*` code).

use thiserror::Error;
use trellis_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use trellis_source_map::SourceInfo;

/// Any failure raised by the engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Parsing(#[from] ParsingError),

    #[error(transparent)]
    Ownership(#[from] OwnershipViolation),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            Error::Configuration(err) => err.to_diagnostic(),
            Error::Parsing(err) => err.to_diagnostic(),
            Error::Ownership(err) => err.to_diagnostic(),
            Error::Lookup(err) => err.to_diagnostic(),
            Error::Evaluation(err) => err.to_diagnostic(),
        }
    }

    /// The parsing error, if this is one.
    pub fn as_parsing(&self) -> Option<&ParsingError> {
        match self {
            Error::Parsing(err) => Some(err),
            _ => None,
        }
    }
}

/// Malformed vocabulary registration. Raised before any parse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{kind} declared with an empty name")]
    EmptyName { kind: &'static str },

    #[error("attribute '{attribute}' accepts no source names")]
    NoAcceptedNames { attribute: String },

    #[error("attribute '{attribute}' has an empty source name")]
    EmptyAcceptedName { attribute: String },

    #[error("attribute '{attribute}' declares a null default")]
    NullDefault { attribute: String },

    #[error("library '{library}' redeclares {kind} '{name}'")]
    DuplicateRegistration {
        kind: &'static str,
        name: String,
        library: String,
    },
}

impl ConfigurationError {
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            ConfigurationError::EmptyName { kind } => {
                DiagnosticMessageBuilder::error("Empty Declaration Name")
                    .with_code("T-2-10")
                    .problem(format!("A {} was declared with an empty name", kind))
                    .build()
            }
            ConfigurationError::NoAcceptedNames { attribute } => {
                DiagnosticMessageBuilder::error("No Accepted Attribute Names")
                    .with_code("T-2-11")
                    .problem(format!("Attribute `{}` accepts no source names", attribute))
                    .add_hint("Pass at least one markup name, usually the attribute's own name?")
                    .build()
            }
            ConfigurationError::EmptyAcceptedName { attribute } => {
                DiagnosticMessageBuilder::error("No Accepted Attribute Names")
                    .with_code("T-2-11")
                    .problem(format!("Attribute `{}` lists an empty source name", attribute))
                    .build()
            }
            ConfigurationError::NullDefault { attribute } => {
                DiagnosticMessageBuilder::error("Null Attribute Default")
                    .with_code("T-2-12")
                    .problem(format!("Attribute `{}` declares `Null` as its default", attribute))
                    .add_info("A missing attribute without a default already reads as `Null`")
                    .build()
            }
            ConfigurationError::DuplicateRegistration {
                kind,
                name,
                library,
            } => DiagnosticMessageBuilder::error("Duplicate Registration")
                .with_code("T-2-13")
                .problem(format!(
                    "Library `{}` redeclares {} `{}`",
                    library, kind, name
                ))
                .add_hint("Use the overwrite or warn duplicate policy to allow replacement?")
                .build(),
        }
    }
}

/// A parse failure, tagged with the document it happened in.
#[derive(Debug, Error)]
#[error("{file}: {kind}")]
pub struct ParsingError {
    /// Display name of the document being parsed.
    pub file: String,
    /// Span in the document the failure points at.
    pub location: Option<SourceInfo>,
    pub kind: ParsingErrorKind,
}

/// What went wrong during a parse.
#[derive(Debug, Error)]
pub enum ParsingErrorKind {
    #[error("no macro '{name}' is defined in the document")]
    UndefinedMacro {
        name: String,
        suggestion: Option<String>,
    },

    #[error("attribute '{attribute}' must be a macro, found '{expression}'")]
    ExpectedMacro {
        attribute: String,
        expression: String,
    },

    #[error("no element '{tag}' is defined in the document")]
    UndefinedElement {
        tag: String,
        suggestion: Option<String>,
    },

    #[error("identifier '{id}' is declared more than once")]
    DuplicateIdentifier {
        id: String,
        first: Option<SourceInfo>,
    },

    #[error("library '{name}' is not available")]
    UnknownLibrary {
        name: String,
        suggestion: Option<String>,
    },

    #[error("import element does not name a library")]
    MissingLibraryName,

    #[error("{0}")]
    Markup(#[from] trellis_xml::Error),
}

impl ParsingError {
    pub fn new(file: impl Into<String>, location: Option<SourceInfo>, kind: ParsingErrorKind) -> Self {
        Self {
            file: file.into(),
            location,
            kind,
        }
    }

    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match &self.kind {
            ParsingErrorKind::Markup(err) => {
                let mut diagnostic = err.to_diagnostic();
                diagnostic.details.push(trellis_error_reporting::DetailItem {
                    kind: trellis_error_reporting::DetailKind::Note,
                    content: format!("While reading `{}`", self.file).into(),
                    location: None,
                });
                return diagnostic;
            }

            ParsingErrorKind::UndefinedMacro { name, suggestion } => {
                let builder = DiagnosticMessageBuilder::error("Undefined Macro")
                    .with_code("T-2-1")
                    .problem(format!("Macro `{}` is not defined in `{}`", name, self.file));
                match suggestion {
                    Some(suggestion) => builder.add_hint(format!("Did you mean `{}`?", suggestion)),
                    None => builder.add_hint("Import the library that declares it?"),
                }
            }

            ParsingErrorKind::ExpectedMacro {
                attribute,
                expression,
            } => DiagnosticMessageBuilder::error("Expected Macro")
                .with_code("T-2-2")
                .problem(format!("Attribute `{}` only accepts macro expressions", attribute))
                .add_detail(format!("Found the plain value `{}`", expression))
                .add_hint("Wrap the value in a macro call such as `Func(...)`?"),

            ParsingErrorKind::UndefinedElement { tag, suggestion } => {
                let builder = DiagnosticMessageBuilder::error("Undefined Element")
                    .with_code("T-2-3")
                    .problem(format!("Element `<{}>` is not defined in `{}`", tag, self.file));
                match suggestion {
                    Some(suggestion) => {
                        builder.add_hint(format!("Did you mean `<{}>`?", suggestion))
                    }
                    None => builder.add_hint("Import the library that declares it?"),
                }
            }

            ParsingErrorKind::DuplicateIdentifier { id, first } => {
                let builder = DiagnosticMessageBuilder::error("Duplicate Identifier")
                    .with_code("T-2-4")
                    .problem(format!("Identifier `{}` is declared more than once", id));
                let builder = match first {
                    Some(first) => builder.add_info_at("first declared here", first.clone()),
                    None => builder,
                };
                builder.add_hint("Give each element a unique `id`?")
            }

            ParsingErrorKind::UnknownLibrary { name, suggestion } => {
                let builder = DiagnosticMessageBuilder::error("Unknown Library")
                    .with_code("T-2-5")
                    .problem(format!("Library `{}` is not available", name));
                match suggestion {
                    Some(suggestion) => builder.add_hint(format!("Did you mean `{}`?", suggestion)),
                    None => builder.add_hint("Register the library as available before parsing?"),
                }
            }

            ParsingErrorKind::MissingLibraryName => {
                DiagnosticMessageBuilder::error("Import Without Library")
                    .with_code("T-2-6")
                    .problem("An `<import>` element must name a library")
                    .add_hint("Add a `library` attribute?")
            }
        };

        match &self.location {
            Some(location) => builder.with_location(location.clone()).build(),
            None => builder.build(),
        }
    }
}

/// An attribute or attribute set gained a second owner, or a macro
/// attribute was evaluated without one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OwnershipViolation {
    #[error("attribute '{attribute}' already has an owner")]
    AttributeAlreadyOwned { attribute: String },

    #[error("attribute set already has an owner")]
    SetAlreadyOwned,

    #[error("attribute '{attribute}' has no owning element")]
    Unowned { attribute: String },
}

impl OwnershipViolation {
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let (title, code) = match self {
            OwnershipViolation::AttributeAlreadyOwned { .. } => ("Attribute Already Owned", "T-2-20"),
            OwnershipViolation::SetAlreadyOwned => ("Attribute Set Already Owned", "T-2-21"),
            OwnershipViolation::Unowned { .. } => ("Unowned Attribute", "T-2-22"),
        };
        DiagnosticMessageBuilder::error(title)
            .with_code(code)
            .problem(self.to_string())
            .build()
    }
}

/// A public accessor was asked for something that is not registered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("no extension of type {type_name} is attached to the document")]
    UnknownExtension { type_name: &'static str },

    #[error("no element '{tag}' is registered")]
    UnknownTag { tag: String },

    #[error("no macro '{name}' is registered")]
    UnknownMacro { name: String },

    #[error("element has no attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("no function '{key}' is exported by the imported libraries")]
    UnknownFunction { key: String },

    #[error("the document that parsed this element has been dropped")]
    DocumentDropped,

    #[error("the document's extensions are borrowed elsewhere")]
    ExtensionsBorrowed,

    #[error("the behavior of element '{tag}' is already borrowed")]
    BehaviorInUse { tag: String },

    #[error("the behavior of element '{tag}' is not a {type_name}")]
    BehaviorMismatch { tag: String, type_name: &'static str },
}

impl LookupError {
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let (title, code) = match self {
            LookupError::UnknownExtension { .. } => ("Unknown Extension", "T-2-30"),
            LookupError::UnknownTag { .. } => ("Unknown Element Tag", "T-2-31"),
            LookupError::UnknownAttribute { .. } => ("Unknown Attribute", "T-2-32"),
            LookupError::UnknownFunction { .. } => ("Unknown Function", "T-2-33"),
            LookupError::DocumentDropped => ("Document Dropped", "T-2-34"),
            LookupError::UnknownMacro { .. } => ("Unknown Macro", "T-2-35"),
            LookupError::ExtensionsBorrowed => ("Extensions In Use", "T-2-36"),
            LookupError::BehaviorInUse { .. } => ("Behavior In Use", "T-2-37"),
            LookupError::BehaviorMismatch { .. } => ("Behavior Type Mismatch", "T-2-38"),
        };
        let builder = DiagnosticMessageBuilder::error(title)
            .with_code(code)
            .problem(self.to_string());
        match self {
            LookupError::UnknownFunction { .. } => builder
                .add_hint("Import a library whose function exports include this key?")
                .build(),
            LookupError::ExtensionsBorrowed | LookupError::BehaviorInUse { .. } => builder
                .add_hint("Drop the outstanding borrow before calling again?")
                .build(),
            _ => builder.build(),
        }
    }
}

/// A macro or native function reported failure while computing a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("macro '{name}' failed: {message}")]
    MacroFailed { name: String, message: String },

    #[error("function '{key}' failed: {message}")]
    FunctionFailed { key: String, message: String },
}

impl EvaluationError {
    /// Failure raised from inside a host macro closure.
    pub fn macro_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        EvaluationError::MacroFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Failure raised from inside a native function.
    pub fn function_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        EvaluationError::FunctionFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let (title, code) = match self {
            EvaluationError::MacroFailed { .. } => ("Macro Evaluation Failed", "T-2-40"),
            EvaluationError::FunctionFailed { .. } => ("Native Function Failed", "T-2-41"),
        };
        DiagnosticMessageBuilder::error(title)
            .with_code(code)
            .problem(self.to_string())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_source_map::FileId;

    #[test]
    fn test_every_code_is_catalogued() {
        let errors: Vec<Error> = vec![
            ConfigurationError::EmptyName { kind: "macro" }.into(),
            ConfigurationError::NoAcceptedNames {
                attribute: "a".to_string(),
            }
            .into(),
            ConfigurationError::NullDefault {
                attribute: "a".to_string(),
            }
            .into(),
            ConfigurationError::DuplicateRegistration {
                kind: "macro",
                name: "M".to_string(),
                library: "L".to_string(),
            }
            .into(),
            ParsingError::new(
                "menu.xml",
                None,
                ParsingErrorKind::UndefinedMacro {
                    name: "Bogus".to_string(),
                    suggestion: None,
                },
            )
            .into(),
            ParsingError::new(
                "menu.xml",
                None,
                ParsingErrorKind::ExpectedMacro {
                    attribute: "on_click".to_string(),
                    expression: "5".to_string(),
                },
            )
            .into(),
            ParsingError::new(
                "menu.xml",
                None,
                ParsingErrorKind::UndefinedElement {
                    tag: "labl".to_string(),
                    suggestion: Some("label".to_string()),
                },
            )
            .into(),
            ParsingError::new(
                "menu.xml",
                None,
                ParsingErrorKind::DuplicateIdentifier {
                    id: "x".to_string(),
                    first: None,
                },
            )
            .into(),
            ParsingError::new(
                "menu.xml",
                None,
                ParsingErrorKind::UnknownLibrary {
                    name: "extras".to_string(),
                    suggestion: None,
                },
            )
            .into(),
            ParsingError::new("menu.xml", None, ParsingErrorKind::MissingLibraryName).into(),
            ParsingError::new("menu.xml", None, trellis_xml::Error::EmptyDocument.into()).into(),
            OwnershipViolation::SetAlreadyOwned.into(),
            OwnershipViolation::Unowned {
                attribute: "a".to_string(),
            }
            .into(),
            LookupError::DocumentDropped.into(),
            LookupError::ExtensionsBorrowed.into(),
            LookupError::BehaviorInUse {
                tag: "menu".to_string(),
            }
            .into(),
            LookupError::BehaviorMismatch {
                tag: "menu".to_string(),
                type_name: "Menu",
            }
            .into(),
            LookupError::UnknownFunction {
                key: "quit".to_string(),
            }
            .into(),
            EvaluationError::macro_failed("Upper", "not a string").into(),
        ];

        for err in errors {
            let diagnostic = err.to_diagnostic();
            let code = diagnostic.code.clone().unwrap_or_default();
            assert!(
                trellis_error_reporting::get_error_info(&code).is_some(),
                "{} ({}) has no catalogued code",
                err,
                code
            );
        }
    }

    #[test]
    fn test_parsing_error_display_names_file() {
        let err = ParsingError::new(
            "menu.xml",
            None,
            ParsingErrorKind::UndefinedMacro {
                name: "Bogus".to_string(),
                suggestion: None,
            },
        );
        assert_eq!(err.to_string(), "menu.xml: no macro 'Bogus' is defined in the document");
    }

    #[test]
    fn test_undefined_macro_diagnostic() {
        let err = ParsingError::new(
            "menu.xml",
            Some(SourceInfo::original(FileId(0), 20, 30)),
            ParsingErrorKind::UndefinedMacro {
                name: "Fnuc".to_string(),
                suggestion: Some("Func".to_string()),
            },
        );

        insta::assert_snapshot!(err.to_diagnostic().to_text(None), @r"
        Error [T-2-1]: Undefined Macro
        Macro `Fnuc` is not defined in `menu.xml`
        ? Did you mean `Func`?
        ");
    }

    #[test]
    fn test_markup_error_keeps_markup_code() {
        let err = ParsingError::new("menu.xml", None, trellis_xml::Error::EmptyDocument.into());
        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.code.as_deref(), Some("T-1-5"));
        assert_eq!(diagnostic.details.len(), 1);
    }
}
