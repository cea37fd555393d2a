/*
 * globals.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Process-wide registration of libraries and extension types.
//!
//! These lists are read once, when a [`Document`](crate::Document) is
//! constructed; later changes only affect documents created afterwards.
//! Register everything during start-up.

use crate::builtin::core_library;
use crate::extension::{Extension, ExtensionType};
use crate::library::Library;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

struct Globals {
    /// Libraries `<import>` may name.
    available: IndexMap<String, Arc<Library>>,
    /// Libraries every document imports first.
    auto_imported: Vec<Arc<Library>>,
    /// Extensions every document attaches when constructed.
    extensions: Vec<ExtensionType>,
}

static GLOBALS: Lazy<RwLock<Globals>> = Lazy::new(|| {
    RwLock::new(Globals {
        available: IndexMap::new(),
        auto_imported: vec![core_library()],
        extensions: Vec::new(),
    })
});

/// What a new document copies out of the process-wide lists.
pub(crate) struct GlobalSnapshot {
    pub available: IndexMap<String, Arc<Library>>,
    pub auto_imported: Vec<Arc<Library>>,
    pub extensions: Vec<ExtensionType>,
}

pub(crate) fn snapshot() -> GlobalSnapshot {
    let globals = GLOBALS.read().unwrap_or_else(PoisonError::into_inner);
    GlobalSnapshot {
        available: globals.available.clone(),
        auto_imported: globals.auto_imported.clone(),
        extensions: globals.extensions.clone(),
    }
}

/// Make `library` importable by name from markup. Replaces a library of the
/// same name.
pub fn register_available_library(library: Arc<Library>) {
    debug!(library = library.name(), "registered available library");
    let mut globals = GLOBALS.write().unwrap_or_else(PoisonError::into_inner);
    globals.available.insert(library.name().to_string(), library);
}

pub fn unregister_available_library(name: &str) -> Option<Arc<Library>> {
    let mut globals = GLOBALS.write().unwrap_or_else(PoisonError::into_inner);
    globals.available.shift_remove(name)
}

/// Import `library` into every document, after the libraries registered
/// before it. Replaces a library of the same name in place.
pub fn register_auto_import(library: Arc<Library>) {
    debug!(library = library.name(), "registered auto-imported library");
    let mut globals = GLOBALS.write().unwrap_or_else(PoisonError::into_inner);
    match globals
        .auto_imported
        .iter()
        .position(|l| l.name() == library.name())
    {
        Some(index) => globals.auto_imported[index] = library,
        None => globals.auto_imported.push(library),
    }
}

/// Stop auto-importing the library called `name`. Returns whether it was
/// registered.
pub fn unregister_auto_import(name: &str) -> bool {
    let mut globals = GLOBALS.write().unwrap_or_else(PoisonError::into_inner);
    let before = globals.auto_imported.len();
    globals.auto_imported.retain(|l| l.name() != name);
    globals.auto_imported.len() != before
}

/// Attach a `T` to every document at construction.
pub fn register_auto_extension<T: Extension + Default>() {
    let extension = ExtensionType::of::<T>();
    let mut globals = GLOBALS.write().unwrap_or_else(PoisonError::into_inner);
    if !globals.extensions.contains(&extension) {
        debug!(extension = extension.name(), "registered auto-attached extension");
        globals.extensions.push(extension);
    }
}

pub fn unregister_auto_extension<T: Extension + Default>() -> bool {
    let extension = ExtensionType::of::<T>();
    let mut globals = GLOBALS.write().unwrap_or_else(PoisonError::into_inner);
    let before = globals.extensions.len();
    globals.extensions.retain(|e| *e != extension);
    globals.extensions.len() != before
}

/// Names of the libraries every document imports, in import order.
pub fn auto_imported_libraries() -> Vec<String> {
    let globals = GLOBALS.read().unwrap_or_else(PoisonError::into_inner);
    globals
        .auto_imported
        .iter()
        .map(|l| l.name().to_string())
        .collect()
}

/// Names of the libraries markup may import.
pub fn available_libraries() -> Vec<String> {
    let globals = GLOBALS.read().unwrap_or_else(PoisonError::into_inner);
    globals.available.keys().cloned().collect()
}
