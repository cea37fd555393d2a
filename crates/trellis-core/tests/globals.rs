//! Process-wide registration. Every test holds `LOCK` because the globals
//! are shared by the whole test binary.

use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use trellis_core::globals::{auto_imported_libraries, available_libraries};
use trellis_core::{
    Document, ElementDefinition, Extension, Library, ParsingErrorKind, register_auto_extension,
    register_auto_import, register_available_library, unregister_auto_extension,
    unregister_auto_import, unregister_available_library,
};

static LOCK: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

fn site() -> Arc<Library> {
    Arc::new(Library::new("site").with_element(ElementDefinition::new("banner").unwrap()))
}

#[test]
fn test_core_is_always_auto_imported() {
    let _guard = lock();
    assert_eq!(auto_imported_libraries().first().map(String::as_str), Some("core"));
}

#[test]
fn test_auto_imports_apply_to_new_documents() {
    let _guard = lock();
    register_auto_import(site());
    assert!(auto_imported_libraries().contains(&"site".to_string()));

    let mut before_removal = Document::new("<template><banner/></template>");
    before_removal.parse().unwrap();

    assert!(unregister_auto_import("site"));
    assert!(!unregister_auto_import("site"));

    // Documents keep the globals they were created with.
    before_removal.parse().unwrap();

    let mut after_removal = Document::new("<template><banner/></template>");
    let err = after_removal.parse().unwrap_err();
    assert!(matches!(
        err.as_parsing().map(|e| &e.kind),
        Some(ParsingErrorKind::UndefinedElement { tag, .. }) if tag == "banner"
    ));
}

#[test]
fn test_available_libraries_are_importable_from_markup() {
    let _guard = lock();
    register_available_library(site());
    assert!(available_libraries().contains(&"site".to_string()));

    let mut doc = Document::new(r#"<template><import library="site"/><banner id="b"/></template>"#);
    let ids = doc.parse().unwrap();
    assert_eq!(ids.get("b").unwrap().tag(), "banner");

    let removed = unregister_available_library("site").unwrap();
    assert_eq!(removed.name(), "site");

    let mut doc = Document::new(r#"<template><import library="site"/></template>"#);
    let err = doc.parse().unwrap_err();
    assert!(matches!(
        err.as_parsing().map(|e| &e.kind),
        Some(ParsingErrorKind::UnknownLibrary { .. })
    ));
}

#[derive(Default)]
struct Analytics {
    parses: usize,
}

impl Extension for Analytics {
    fn pre_parse(&mut self) {
        self.parses += 1;
    }
}

#[test]
fn test_auto_extensions_attach_at_construction() {
    let _guard = lock();
    register_auto_extension::<Analytics>();

    let mut doc = Document::new("<template/>");
    assert_eq!(doc.extension::<Analytics>().unwrap().parses, 0);
    doc.parse().unwrap();
    doc.parse().unwrap();
    assert_eq!(doc.extension::<Analytics>().unwrap().parses, 2);

    assert!(unregister_auto_extension::<Analytics>());
    let doc = Document::new("<template/>");
    assert!(doc.extension::<Analytics>().is_err());
}
