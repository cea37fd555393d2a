/*
 * builtin.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! The always-imported `core` library.
//!
//! It declares the generic `template` root element, the `import` element,
//! and the function macros `Func`, `StaticFunc`, `DynFunc` and `SelfFunc`.
//! The macros look their argument up in the [`FunctionsExtension`] of the
//! document, which collects the [`FunctionExports`] of every imported
//! library at each parse.

use crate::attribute::{AttributeDefinition, ParseMode};
use crate::element::ElementDefinition;
use crate::error::{EvaluationError, LookupError, Result};
use crate::extension::Extension;
use crate::library::Library;
use crate::macros::{Macro, MacroBody};
use crate::stage::Stage;
use crate::value::{NativeFunction, Value};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Name of the core library.
pub const CORE_LIBRARY: &str = "core";

/// Tag of the element that imports a library by name.
pub const IMPORT_TAG: &str = "import";

/// Tag of the generic root element.
pub const TEMPLATE_TAG: &str = "template";

/// Markup names of the `import` element's `library` attribute.
pub(crate) const LIBRARY_ATTRIBUTE_NAMES: [&str; 2] = ["library", "lib"];

static CORE: Lazy<Arc<Library>> = Lazy::new(|| {
    let library_attribute = AttributeDefinition::new("library", ParseMode::Value, LIBRARY_ATTRIBUTE_NAMES)
        .expect("library attribute declaration is valid");

    Arc::new(
        Library::new(CORE_LIBRARY)
            .with_element(ElementDefinition::declared(TEMPLATE_TAG))
            .with_element(ElementDefinition::declared(IMPORT_TAG).with_attribute(library_attribute))
            .with_macro(Macro::builtin("Func", Stage::Activation, MacroBody::CallFunction))
            .with_macro(Macro::builtin("StaticFunc", Stage::Creation, MacroBody::CallFunction))
            .with_macro(Macro::builtin("DynFunc", Stage::Update, MacroBody::CallFunction))
            .with_macro(Macro::builtin("SelfFunc", Stage::Creation, MacroBody::FunctionHandle))
            .with_extension::<FunctionsExtension>(),
    )
});

/// The shared `core` library.
pub fn core_library() -> Arc<Library> {
    Arc::clone(&CORE)
}

type FunctionFactory = dyn Fn() -> Arc<dyn NativeFunction> + Send + Sync;

#[derive(Clone)]
enum ExportedFunction {
    /// One instance shared by every document.
    Shared(Arc<dyn NativeFunction>),
    /// A fresh instance for each parse.
    PerParse(Arc<FunctionFactory>),
}

/// Native functions a library exports under string keys.
///
/// Attach it to a library with
/// [`Library::with_capability`](crate::Library::with_capability).
///
/// ```
/// use trellis_core::{FunctionExports, Library, Value};
///
/// let app = Library::new("app").with_capability(
///     FunctionExports::new().function("version", || Ok(Value::from("1.2.0"))),
/// );
/// assert!(app.capability::<FunctionExports>().is_some());
/// ```
#[derive(Clone, Default)]
pub struct FunctionExports {
    entries: Vec<(String, ExportedFunction)>,
}

impl FunctionExports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a closure. Every document shares the same instance.
    pub fn function<F>(self, key: impl Into<String>, function: F) -> Self
    where
        F: Fn() -> std::result::Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        self.shared(key, Arc::new(function))
    }

    /// Export an existing function object.
    pub fn shared(mut self, key: impl Into<String>, function: Arc<dyn NativeFunction>) -> Self {
        self.entries.push((key.into(), ExportedFunction::Shared(function)));
        self
    }

    /// Export a function created anew at every parse, for stateful functions
    /// whose state should not outlive a parse.
    pub fn per_parse<F>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn NativeFunction> + Send + Sync + 'static,
    {
        self.entries
            .push((key.into(), ExportedFunction::PerParse(Arc::new(factory))));
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn instantiate(&self) -> impl Iterator<Item = (&str, Arc<dyn NativeFunction>)> {
        self.entries.iter().map(|(key, exported)| {
            let function = match exported {
                ExportedFunction::Shared(f) => Arc::clone(f),
                ExportedFunction::PerParse(make) => make(),
            };
            (key.as_str(), function)
        })
    }
}

impl fmt::Debug for FunctionExports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

/// The per-parse registry of native functions behind the function macros.
#[derive(Default)]
pub struct FunctionsExtension {
    functions: IndexMap<String, Arc<dyn NativeFunction>>,
}

impl FunctionsExtension {
    /// Register a function directly; the last registration of a key wins.
    pub fn register(&mut self, key: impl Into<String>, function: Arc<dyn NativeFunction>) {
        self.functions.insert(key.into(), function);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn NativeFunction>> {
        self.functions.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.functions.contains_key(key)
    }

    /// Call the function registered under `key`.
    pub fn call(&self, key: &str) -> Result<Value> {
        let function = self.get(key).ok_or_else(|| LookupError::UnknownFunction {
            key: key.to_string(),
        })?;
        Ok(function.call()?)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Extension for FunctionsExtension {
    fn pre_parse(&mut self) {
        self.functions.clear();
    }

    fn import_library(&mut self, library: &Library) {
        for exports in library.capabilities::<FunctionExports>() {
            for (key, function) in exports.instantiate() {
                debug!(library = library.name(), key, "registered native function");
                self.functions.insert(key.to_string(), function);
            }
        }
    }

    fn dispose(&mut self) {
        self.functions.clear();
    }
}
