/*
 * library.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Reusable bundles of template vocabulary.

use crate::element::ElementDefinition;
use crate::extension::{Extension, ExtensionType};
use crate::macros::Macro;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A named set of macros, element definitions and extension types.
///
/// Libraries are shared by `Arc` and never owned by a document. They may
/// also carry typed *capabilities* that cooperating extensions harvest when
/// the library is imported (see
/// [`FunctionExports`](crate::builtin::FunctionExports)).
///
/// ```
/// use trellis_core::{ElementDefinition, Library, Macro, Stage, Value};
///
/// let widgets = Library::new("widgets")
///     .with_element(ElementDefinition::new("label").unwrap())
///     .with_macro(Macro::host("Upper", Stage::Creation, |v, _| {
///         Ok(Value::String(v.to_string().to_uppercase()))
///     }).unwrap());
///
/// assert_eq!(widgets.name(), "widgets");
/// assert_eq!(widgets.elements().len(), 1);
/// ```
#[derive(Clone)]
pub struct Library {
    name: String,
    macros: Vec<Arc<Macro>>,
    elements: Vec<Arc<ElementDefinition>>,
    extensions: Vec<ExtensionType>,
    capabilities: Vec<Arc<dyn Any + Send + Sync>>,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            macros: Vec::new(),
            elements: Vec::new(),
            extensions: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_macro(mut self, declared: Macro) -> Self {
        self.macros.push(Arc::new(declared));
        self
    }

    pub fn with_element(mut self, definition: ElementDefinition) -> Self {
        self.elements.push(Arc::new(definition));
        self
    }

    /// Declare an extension type to attach when this library is imported.
    pub fn with_extension<T: Extension + Default>(mut self) -> Self {
        let extension = ExtensionType::of::<T>();
        if !self.extensions.contains(&extension) {
            self.extensions.push(extension);
        }
        self
    }

    pub fn with_capability<T: Any + Send + Sync>(mut self, capability: T) -> Self {
        self.capabilities.push(Arc::new(capability));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn macros(&self) -> &[Arc<Macro>] {
        &self.macros
    }

    pub fn elements(&self) -> &[Arc<ElementDefinition>] {
        &self.elements
    }

    pub fn extensions(&self) -> &[ExtensionType] {
        &self.extensions
    }

    /// Every capability of type `T`, in declaration order.
    pub fn capabilities<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.capabilities.iter().filter_map(|c| (**c).downcast_ref::<T>())
    }

    /// The first capability of type `T`.
    pub fn capability<T: Any>(&self) -> Option<&T> {
        self.capabilities::<T>().next()
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("macros", &self.macros.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("elements", &self.elements.iter().map(|e| e.tag()).collect::<Vec<_>>())
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}
