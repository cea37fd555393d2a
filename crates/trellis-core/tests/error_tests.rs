//! Rendering of engine errors as diagnostics.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use trellis_core::{
    AttributeDefinition, Document, DocumentOptions, ElementDefinition, Error, Library, ParseMode,
};

fn menu_document(source: &str) -> Document {
    let widgets = Library::new("widgets").with_element(
        ElementDefinition::new("label")
            .unwrap()
            .with_attribute(AttributeDefinition::new("text", ParseMode::MacroOrValue, ["text"]).unwrap()),
    );
    let mut document =
        Document::with_options(source, DocumentOptions::default().with_file_name("menu.xml"));
    document.make_available(Arc::new(widgets));
    document
}

fn parse_error(document: &mut Document) -> Error {
    document.parse().expect_err("parse should fail")
}

#[test]
fn test_undefined_macro_without_source() {
    let mut doc = menu_document(
        r#"<template><import library="widgets"/><label text="Fnuc(greeting)"/></template>"#,
    );
    let err = parse_error(&mut doc);

    insta::assert_snapshot!(err.to_diagnostic().to_text(None), @r"
    Error [T-2-1]: Undefined Macro
    Macro `Fnuc` is not defined in `menu.xml`
    ? Did you mean `Func`?
    ");
}

#[test]
fn test_undefined_macro_with_source_snippet() {
    let mut doc = menu_document(
        r#"<template><import library="widgets"/><label text="Bogus(1)"/></template>"#,
    );
    let err = parse_error(&mut doc);
    let rendered = doc.render_error(&err);

    assert!(rendered.contains("[T-2-1] Undefined Macro"), "{rendered}");
    assert!(rendered.contains("menu.xml"), "{rendered}");
    assert!(rendered.contains("Macro `Bogus` is not defined"), "{rendered}");
    assert!(rendered.contains("Bogus(1)"), "{rendered}");
}

#[test]
fn test_duplicate_identifier_points_at_both_declarations() {
    let mut doc = menu_document(
        r#"<template><import library="widgets"/><label id="x"/><label id="x"/></template>"#,
    );
    let err = parse_error(&mut doc);
    let diagnostic = err.to_diagnostic();

    assert_eq!(diagnostic.code.as_deref(), Some("T-2-4"));
    assert!(diagnostic.location.is_some());
    assert_eq!(diagnostic.details.len(), 1);
    assert!(diagnostic.details[0].location.is_some());

    let rendered = doc.render_error(&err);
    assert!(rendered.contains("first declared here"), "{rendered}");
}

#[test]
fn test_unknown_library_suggests_a_name() {
    let mut doc = menu_document(r#"<template><import library="widget"/></template>"#);
    let err = parse_error(&mut doc);

    insta::assert_snapshot!(err.to_diagnostic().to_text(None), @r"
    Error [T-2-5]: Unknown Library
    Library `widget` is not available
    ? Did you mean `widgets`?
    ");
}

#[test]
fn test_undefined_element_suggests_a_tag() {
    let mut doc = menu_document(r#"<template><import library="widgets"/><lable/></template>"#);
    let err = parse_error(&mut doc);

    insta::assert_snapshot!(err.to_diagnostic().to_text(None), @r"
    Error [T-2-3]: Undefined Element
    Element `<lable>` is not defined in `menu.xml`
    ? Did you mean `<label>`?
    ");
}

#[test]
fn test_markup_errors_name_the_document() {
    let mut doc = menu_document("<template><label></template>");
    let err = parse_error(&mut doc);
    let diagnostic = err.to_diagnostic();

    assert!(diagnostic.code.as_deref().is_some_and(|c| c.starts_with("T-1-")));
    let text = diagnostic.to_text(None);
    assert!(text.contains("While reading `menu.xml`"), "{text}");
}

#[test]
fn test_diagnostics_serialize_to_json() {
    let mut doc = menu_document(r#"<template><import/></template>"#);
    let err = parse_error(&mut doc);
    let json = err.to_diagnostic().to_json();

    assert_eq!(json["kind"], "error");
    assert_eq!(json["code"], "T-2-6");
    assert_eq!(json["title"], "Import Without Library");
}

#[test]
fn test_error_display_is_one_line() {
    let mut doc = menu_document(r#"<template><import library="widget"/></template>"#);
    let err = parse_error(&mut doc);
    assert_eq!(err.to_string(), "menu.xml: library 'widget' is not available");
}
