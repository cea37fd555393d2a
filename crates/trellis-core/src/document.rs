/*
 * document.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! One markup source and its parse results.
//!
//! A [`Document`] snapshots the process-wide library and extension lists when
//! it is constructed. Every call to [`Document::parse`] rebuilds the macro and
//! element registries from scratch, in this order:
//!
//! 1. the auto-imported libraries (the `core` library first),
//! 2. the libraries added with [`Document::import_library`],
//! 3. the libraries named by `<import library="..."/>` children of the root.
//!
//! Then the element tree is built. Results are kept only if the whole parse
//! succeeds.

use crate::builder::{IdentifierIndex, ParseSession};
use crate::builtin::{IMPORT_TAG, LIBRARY_ATTRIBUTE_NAMES};
use crate::element::{Element, ElementDefinition};
use crate::error::{Error, LookupError, ParsingError, ParsingErrorKind, Result};
use crate::extension::{DocumentMeta, Extension, ExtensionSet, ExtensionType, ParseOutcome};
use crate::globals;
use crate::library::Library;
use crate::macros::Macro;
use crate::options::DocumentOptions;
use crate::registry::{DuplicatePolicy, Registry, Replaced};
use crate::suggest;
use indexmap::IndexMap;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trellis_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use trellis_source_map::{FileId, SourceContext};
use trellis_xml::XmlElement;

/// The part of a document that elements and macros can reach.
pub struct DocumentContext {
    meta: DocumentMeta,
    extensions: RefCell<ExtensionSet>,
    disposed: Cell<bool>,
}

impl DocumentContext {
    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn file_name(&self) -> &str {
        &self.meta.file_name
    }

    pub fn has_extension<T: Extension>(&self) -> bool {
        self.extensions
            .try_borrow()
            .is_ok_and(|set| set.get::<T>().is_some())
    }

    /// The attached extension of type `T`.
    ///
    /// Fails with [`LookupError::ExtensionsBorrowed`] while another guard
    /// from [`DocumentContext::extension_mut`] is alive, or while the
    /// document is notifying its extensions.
    pub fn extension<T: Extension>(&self) -> std::result::Result<Ref<'_, T>, LookupError> {
        let set = self
            .extensions
            .try_borrow()
            .map_err(|_| LookupError::ExtensionsBorrowed)?;
        Ref::filter_map(set, |set| set.get::<T>()).map_err(|_| LookupError::UnknownExtension {
            type_name: std::any::type_name::<T>(),
        })
    }

    pub fn extension_mut<T: Extension>(&self) -> std::result::Result<RefMut<'_, T>, LookupError> {
        RefMut::filter_map(self.extensions_mut()?, |set| set.get_mut::<T>()).map_err(|_| {
            LookupError::UnknownExtension {
                type_name: std::any::type_name::<T>(),
            }
        })
    }

    fn extensions_mut(&self) -> std::result::Result<RefMut<'_, ExtensionSet>, LookupError> {
        self.extensions
            .try_borrow_mut()
            .map_err(|_| LookupError::ExtensionsBorrowed)
    }

    /// Dispose the extensions unless that already happened. Returns `false`
    /// when they are borrowed; disposal then waits for the context to drop.
    fn dispose_extensions(&self) -> bool {
        if self.disposed.get() {
            return true;
        }
        let Ok(mut extensions) = self.extensions.try_borrow_mut() else {
            return false;
        };
        self.disposed.set(true);
        debug!(file = %self.meta.file_name, extensions = extensions.len(), "disposing document");
        extensions.dispose();
        true
    }
}

impl Drop for DocumentContext {
    fn drop(&mut self) {
        if !self.disposed.replace(true) {
            debug!(file = %self.meta.file_name, "disposing extensions of a dropped document");
            self.extensions.get_mut().dispose();
        }
    }
}

/// A markup template and the results of its last successful parse.
///
/// ```
/// use trellis_core::Document;
///
/// let mut document = Document::new(r#"<template id="main"/>"#);
/// let identifiers = document.parse().unwrap();
///
/// assert_eq!(identifiers.get("main").unwrap().tag(), "template");
/// document.dispose();
/// ```
pub struct Document {
    sources: SourceContext,
    file_id: FileId,
    options: DocumentOptions,
    available: IndexMap<String, Arc<Library>>,
    auto_imported: Vec<Arc<Library>>,
    imports: Vec<Arc<Library>>,
    context: Rc<DocumentContext>,
    registry: Rc<Registry>,
    identifiers: Option<IdentifierIndex>,
    root: Option<Rc<Element>>,
    diagnostics: Vec<DiagnosticMessage>,
}

struct Parsed {
    registry: Rc<Registry>,
    root: Rc<Element>,
    identifiers: IdentifierIndex,
    elements: usize,
}

impl Document {
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_options(source, DocumentOptions::default())
    }

    pub fn with_options(source: impl Into<String>, options: DocumentOptions) -> Self {
        let file_name = options.display_name().to_string();
        let mut sources = SourceContext::new();
        let file_id = sources.add_file(file_name.clone(), source.into());

        let globals = globals::snapshot();
        let meta = DocumentMeta {
            file_name,
            options: options.clone(),
        };
        let mut extensions = ExtensionSet::default();
        for extension in globals.extensions {
            extensions.attach(extension, &meta);
        }

        Self {
            sources,
            file_id,
            options,
            available: globals.available,
            auto_imported: globals.auto_imported,
            imports: Vec::new(),
            context: Rc::new(DocumentContext {
                meta,
                extensions: RefCell::new(extensions),
                disposed: Cell::new(false),
            }),
            registry: Rc::new(Registry::default()),
            identifiers: None,
            root: None,
            diagnostics: Vec::new(),
        }
    }

    /// The markup source.
    pub fn source(&self) -> &str {
        self.sources
            .get_file(self.file_id)
            .map(|f| f.content.as_str())
            .unwrap_or_default()
    }

    pub fn file_name(&self) -> &str {
        self.context.file_name()
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Sources for rendering diagnostics against this document.
    pub fn source_context(&self) -> &SourceContext {
        &self.sources
    }

    pub fn context(&self) -> &Rc<DocumentContext> {
        &self.context
    }

    /// Import `library` at every parse, after the auto-imported libraries and
    /// those added before it.
    pub fn import_library(&mut self, library: Arc<Library>) {
        debug!(file = %self.file_name(), library = library.name(), "added document import");
        self.imports.push(library);
    }

    /// Let markup in this document import `library` by name.
    pub fn make_available(&mut self, library: Arc<Library>) {
        self.available.insert(library.name().to_string(), library);
    }

    /// Attach a `T` now. Returns `false` if one was already attached, or if
    /// the extensions are borrowed through [`Document::context`].
    pub fn add_extension<T: Extension + Default>(&mut self) -> bool {
        let Ok(mut extensions) = self.context.extensions_mut() else {
            warn!(
                file = %self.file_name(),
                extension = std::any::type_name::<T>(),
                "extensions are borrowed; not attaching"
            );
            return false;
        };
        extensions
            .attach(ExtensionType::of::<T>(), &self.context.meta)
            .is_some()
    }

    pub fn extension<T: Extension>(&self) -> std::result::Result<Ref<'_, T>, LookupError> {
        self.context.extension::<T>()
    }

    pub fn extension_mut<T: Extension>(&mut self) -> std::result::Result<RefMut<'_, T>, LookupError> {
        self.context.extension_mut::<T>()
    }

    /// Parse the source, replacing the results of any previous parse.
    ///
    /// On failure the document holds no tree, no identifiers and empty
    /// registries. Extensions see `post_parse` either way.
    ///
    /// If a guard from [`DocumentContext::extension`] is still alive the
    /// parse does not start: the call fails with
    /// [`LookupError::ExtensionsBorrowed`] and the previous results stay.
    pub fn parse(&mut self) -> Result<IdentifierIndex> {
        self.context.extensions_mut()?.pre_parse();
        self.root = None;
        self.identifiers = None;
        self.registry = Rc::new(Registry::default());
        self.diagnostics.clear();

        debug!(file = %self.file_name(), "parse started");
        let mut result = self.run_parse();
        let outcome = match result {
            Ok(_) => ParseOutcome::Succeeded,
            Err(_) => ParseOutcome::Failed,
        };
        match self.context.extensions_mut() {
            Ok(mut extensions) => extensions.post_parse(outcome),
            Err(err) => {
                // A macro kept an extension guard past the end of the build.
                warn!(file = %self.file_name(), "extensions are borrowed; post_parse skipped");
                if result.is_ok() {
                    result = Err(err.into());
                }
            }
        }

        match result {
            Ok(parsed) => {
                info!(
                    file = %self.file_name(),
                    elements = parsed.elements,
                    identifiers = parsed.identifiers.len(),
                    "parsed template"
                );
                self.registry = parsed.registry;
                self.root = Some(parsed.root);
                self.identifiers = Some(parsed.identifiers.clone());
                Ok(parsed.identifiers)
            }
            Err(err) => {
                debug!(file = %self.file_name(), error = %err, "parse failed");
                Err(err)
            }
        }
    }

    fn run_parse(&mut self) -> Result<Parsed> {
        let mut registry = Registry::default();
        let libraries: Vec<Arc<Library>> = self
            .auto_imported
            .iter()
            .chain(&self.imports)
            .cloned()
            .collect();
        for library in &libraries {
            self.import_into(&mut registry, library)?;
        }

        let markup = trellis_xml::parse_with_file_id(self.source(), self.file_id)
            .map_err(|err| self.markup_error(err))?;

        if self.options.import_element {
            for node in markup.root.get_children(IMPORT_TAG) {
                let library = self.resolve_import(node)?;
                self.import_into(&mut registry, &library)?;
            }
        }

        let registry = Rc::new(registry);
        let identifiers = IdentifierIndex::default();
        let session = ParseSession::new(
            Rc::clone(&registry),
            &identifiers,
            self.file_name(),
            Rc::downgrade(&self.context),
        );
        let root = session.build_root(&markup.root)?;

        Ok(Parsed {
            registry,
            root,
            identifiers,
            elements: session.built(),
        })
    }

    fn import_into(&mut self, registry: &mut Registry, library: &Library) -> Result<()> {
        {
            let mut extensions = self.context.extensions_mut()?;
            for extension in library.extensions() {
                if let Some(attached) = extensions.attach(*extension, &self.context.meta) {
                    attached.pre_parse();
                }
            }
        }

        let policy = self.options.duplicate_policy;
        let replaced = registry.import(library, policy)?;
        if policy == DuplicatePolicy::Warn {
            self.diagnostics
                .extend(replaced.iter().map(overwrite_warning));
        }

        self.context.extensions_mut()?.import_library(library);
        Ok(())
    }

    fn resolve_import(&self, node: &XmlElement) -> Result<Arc<Library>> {
        let Some(attribute) = LIBRARY_ATTRIBUTE_NAMES
            .iter()
            .find_map(|name| node.get_attribute_full(name))
        else {
            return Err(ParsingError::new(
                self.file_name(),
                Some(node.name_source.clone()),
                ParsingErrorKind::MissingLibraryName,
            )
            .into());
        };

        match self.available.get(&attribute.value) {
            Some(library) => Ok(Arc::clone(library)),
            None => Err(ParsingError::new(
                self.file_name(),
                Some(attribute.value_source.clone()),
                ParsingErrorKind::UnknownLibrary {
                    name: attribute.value.clone(),
                    suggestion: suggest::closest(
                        &attribute.value,
                        self.available.keys().map(String::as_str),
                    ),
                },
            )
            .into()),
        }
    }

    fn markup_error(&self, err: trellis_xml::Error) -> Error {
        let location = err.location().cloned();
        ParsingError::new(self.file_name(), location, ParsingErrorKind::Markup(err)).into()
    }

    /// The definition registered for `tag` by the last successful parse.
    pub fn element_definition(&self, tag: &str) -> std::result::Result<Arc<ElementDefinition>, LookupError> {
        self.registry
            .element(tag)
            .cloned()
            .ok_or_else(|| LookupError::UnknownTag {
                tag: tag.to_string(),
            })
    }

    /// The macro registered as `name` by the last successful parse.
    pub fn macro_definition(&self, name: &str) -> std::result::Result<Arc<Macro>, LookupError> {
        self.registry
            .macro_named(name)
            .cloned()
            .ok_or_else(|| LookupError::UnknownMacro {
                name: name.to_string(),
            })
    }

    pub fn root(&self) -> Option<Rc<Element>> {
        self.root.clone()
    }

    pub fn identifiers(&self) -> Option<&IdentifierIndex> {
        self.identifiers.as_ref()
    }

    pub fn element_by_id(&self, id: &str) -> Option<Rc<Element>> {
        self.identifiers.as_ref().and_then(|index| index.get(id))
    }

    /// Warnings raised by the last parse.
    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        &self.diagnostics
    }

    /// Render `err` as text, with a source snippet when it points into this
    /// document.
    pub fn render_error(&self, err: &Error) -> String {
        err.to_diagnostic().to_text(Some(&self.sources))
    }

    /// Tear down every attached extension. Dropping the document does the
    /// same; either way each extension is disposed exactly once.
    ///
    /// While an extension guard obtained through [`Document::context`] is
    /// alive, disposal waits until the last [`DocumentContext`] handle drops.
    pub fn dispose(mut self) {
        self.dispose_extensions();
    }

    fn dispose_extensions(&mut self) {
        if !self.context.dispose_extensions() {
            warn!(file = %self.file_name(), "extensions are borrowed; disposal deferred");
        }
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.dispose_extensions();
    }
}

fn overwrite_warning(replaced: &Replaced) -> DiagnosticMessage {
    DiagnosticMessageBuilder::warning("Definition Overwritten")
        .with_code("T-2-14")
        .problem(format!(
            "Library `{}` replaced the {} `{}` declared by an earlier import",
            replaced.library, replaced.kind, replaced.name
        ))
        .build()
}
