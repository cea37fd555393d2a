/*
 * lib.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Trellis: a markup-driven templating engine.
//!
//! Templates are XML documents. Each element tag is declared by a
//! [`Library`] through an [`ElementDefinition`] listing the attributes it
//! reads. Attribute text is either coerced to a typed literal or, when it is
//! written as `Outer(Inner(argument))`, resolved into a chain of staged
//! [`Macro`]s that runs every time the value is read.
//!
//! ```
//! use trellis_core::{
//!     AttributeDefinition, Document, ElementDefinition, FunctionExports, Library,
//!     ParseMode, Stage, Value,
//! };
//! use std::sync::Arc;
//!
//! let widgets = Library::new("widgets")
//!     .with_element(
//!         ElementDefinition::new("label")
//!             .unwrap()
//!             .with_attribute(
//!                 AttributeDefinition::new("text", ParseMode::MacroOrValue, ["text"]).unwrap(),
//!             ),
//!     )
//!     .with_capability(FunctionExports::new().function("greeting", || Ok(Value::from("hello"))));
//!
//! let mut document = Document::new(
//!     r#"<template><label id="title" text="Func(greeting)"/></template>"#,
//! );
//! document.import_library(Arc::new(widgets));
//! let identifiers = document.parse().unwrap();
//!
//! let title = identifiers.get("title").unwrap();
//! assert_eq!(title.attribute("text").unwrap().stage(), Stage::Activation);
//! assert_eq!(title.value("text").unwrap(), Value::from("hello"));
//! ```

pub mod attribute;
pub mod builder;
pub mod builtin;
pub mod document;
pub mod element;
pub mod error;
pub mod extension;
pub mod globals;
pub mod library;
pub mod macros;
pub mod matcher;
pub mod options;
pub mod registry;
pub mod stage;
pub mod value;

mod suggest;

pub use attribute::{Attribute, AttributeDefinition, AttributeSet, Expression, IDENTIFIER, ParseMode};
pub use builder::IdentifierIndex;
pub use builtin::{CORE_LIBRARY, FunctionExports, FunctionsExtension, core_library};
pub use document::{Document, DocumentContext};
pub use element::{ChildPolicy, Element, ElementBehavior, ElementDefinition, GenericElement};
pub use error::{
    ConfigurationError, Error, EvaluationError, LookupError, OwnershipViolation, ParsingError,
    ParsingErrorKind, Result,
};
pub use extension::{AsAny, DocumentMeta, Extension, ExtensionType, ParseOutcome};
pub use globals::{
    register_auto_extension, register_auto_import, register_available_library,
    unregister_auto_extension, unregister_auto_import, unregister_available_library,
};
pub use library::Library;
pub use macros::{HostMacroFn, Macro};
pub use matcher::{MacroChain, match_chain};
pub use options::DocumentOptions;
pub use registry::{DuplicatePolicy, Registry, Replaced};
pub use stage::Stage;
pub use value::{FunctionHandle, NativeFunction, Value, ValueKind, coerce_literal};
