/*
 * extension.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Per-document extension objects and their lifecycle.
//!
//! An extension is created once per document, from an [`ExtensionType`]
//! registered process-wide, declared by an imported library, or added
//! through [`Document::add_extension`](crate::Document::add_extension).
//! The document drives it through
//!
//! ```text
//! initialize -> { pre_parse -> import_library* -> post_parse }* -> dispose
//! ```

use crate::library::Library;
use crate::options::DocumentOptions;
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::fmt;
use tracing::debug;

/// Upcast to [`Any`] for downcasting trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What an extension learns about its document when attached.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub file_name: String,
    pub options: DocumentOptions,
}

/// How a parse ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    Succeeded,
    Failed,
}

/// Session-scoped state with lifecycle hooks. All hooks default to no-ops.
pub trait Extension: AsAny {
    /// Called once, when the extension is attached to a document.
    fn initialize(&mut self, _meta: &DocumentMeta) {}

    /// Called at the start of every parse, before any import.
    fn pre_parse(&mut self) {}

    /// Called for every library imported during a parse.
    fn import_library(&mut self, _library: &Library) {}

    /// Called at the end of every parse, successful or not.
    fn post_parse(&mut self, _outcome: ParseOutcome) {}

    /// Called once, when the document is disposed or dropped.
    fn dispose(&mut self) {}
}

/// A constructible extension type.
#[derive(Clone, Copy)]
pub struct ExtensionType {
    type_id: TypeId,
    name: &'static str,
    create: fn() -> Box<dyn Extension>,
}

impl ExtensionType {
    pub fn of<T: Extension + Default>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            create: create_extension::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn create_extension<T: Extension + Default>() -> Box<dyn Extension> {
    Box::new(T::default())
}

impl fmt::Debug for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExtensionType").field(&self.name).finish()
    }
}

impl PartialEq for ExtensionType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

/// The extensions attached to one document, in attach order.
#[derive(Default)]
pub(crate) struct ExtensionSet {
    entries: IndexMap<TypeId, Box<dyn Extension>>,
}

impl ExtensionSet {
    pub(crate) fn contains(&self, type_id: TypeId) -> bool {
        self.entries.contains_key(&type_id)
    }

    /// Create and initialize an instance of `extension` unless one is
    /// already attached. Returns the new instance.
    pub(crate) fn attach(
        &mut self,
        extension: ExtensionType,
        meta: &DocumentMeta,
    ) -> Option<&mut dyn Extension> {
        if self.contains(extension.type_id) {
            return None;
        }
        let mut instance = (extension.create)();
        instance.initialize(meta);
        debug!(extension = extension.name, file = %meta.file_name, "attached extension");
        self.entries.insert(extension.type_id, instance);
        self.entries.get_mut(&extension.type_id).map(|e| &mut **e)
    }

    pub(crate) fn get<T: Extension>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|e| AsAny::as_any(&**e).downcast_ref::<T>())
    }

    pub(crate) fn get_mut<T: Extension>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|e| AsAny::as_any_mut(&mut **e).downcast_mut::<T>())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn pre_parse(&mut self) {
        for extension in self.entries.values_mut() {
            extension.pre_parse();
        }
    }

    pub(crate) fn import_library(&mut self, library: &Library) {
        for extension in self.entries.values_mut() {
            extension.import_library(library);
        }
    }

    pub(crate) fn post_parse(&mut self, outcome: ParseOutcome) {
        for extension in self.entries.values_mut() {
            extension.post_parse(outcome);
        }
    }

    /// Dispose every extension, in attach order, and detach them all.
    pub(crate) fn dispose(&mut self) {
        for (_, mut extension) in self.entries.drain(..) {
            extension.dispose();
        }
    }
}
