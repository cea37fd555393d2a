/*
 * builder.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Turns markup nodes into [`Element`]s.
//!
//! A [`ParseSession`] carries what every node of one parse needs: the
//! registry, the identifier index and the owning document. Elements are
//! built depth-first in document order. Identifiers found while building a
//! batch (the whole tree, or one deferred child list) are staged and only
//! committed to the index once the batch has succeeded.

use crate::attribute::{AttributeSet, IDENTIFIER};
use crate::document::DocumentContext;
use crate::element::{ChildPolicy, Element};
use crate::error::{LookupError, ParsingError, ParsingErrorKind, Result};
use crate::registry::Registry;
use crate::suggest;
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::debug;
use trellis_source_map::SourceInfo;
use trellis_xml::XmlElement;

type IdentifierMap = IndexMap<String, Rc<Element>>;

/// Elements by identifier, for one successful parse.
///
/// Clones share the same index. Deferred child loads add to it.
#[derive(Clone, Default)]
pub struct IdentifierIndex {
    entries: Rc<RefCell<IdentifierMap>>,
}

impl IdentifierIndex {
    pub fn get(&self, id: &str) -> Option<Rc<Element>> {
        self.entries.borrow().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.borrow().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Identifiers in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    fn downgrade(&self) -> Weak<RefCell<IdentifierMap>> {
        Rc::downgrade(&self.entries)
    }
}

impl std::fmt::Debug for IdentifierIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.borrow().keys()).finish()
    }
}

/// Children waiting for [`Element::load_children`].
pub(crate) struct PendingChildren {
    nodes: Vec<XmlElement>,
    session: Rc<ParseSession>,
}

/// State shared by every element built in one parse.
pub(crate) struct ParseSession {
    registry: Rc<Registry>,
    // Weak: elements hold the session through their pending children.
    identifiers: Weak<RefCell<IdentifierMap>>,
    file_name: String,
    document: Weak<DocumentContext>,
    built: Cell<usize>,
}

impl ParseSession {
    pub(crate) fn new(
        registry: Rc<Registry>,
        identifiers: &IdentifierIndex,
        file_name: impl Into<String>,
        document: Weak<DocumentContext>,
    ) -> Rc<Self> {
        Rc::new(Self {
            registry,
            identifiers: identifiers.downgrade(),
            file_name: file_name.into(),
            document,
            built: Cell::new(0),
        })
    }

    /// Number of elements built so far, deferred ones included.
    pub(crate) fn built(&self) -> usize {
        self.built.get()
    }

    /// Build the tree under `root` and commit its identifiers.
    pub(crate) fn build_root(self: &Rc<Self>, root: &XmlElement) -> Result<Rc<Element>> {
        let mut staged = IdentifierMap::new();
        let element = self.build_element(root, Weak::new(), &mut staged)?;
        self.commit(staged)?;
        Ok(element)
    }

    fn build_element(
        self: &Rc<Self>,
        node: &XmlElement,
        parent: Weak<Element>,
        staged: &mut IdentifierMap,
    ) -> Result<Rc<Element>> {
        let Some(definition) = self.registry.element(&node.name) else {
            return Err(self
                .error(
                    Some(node.name_source.clone()),
                    ParsingErrorKind::UndefinedElement {
                        tag: node.name.clone(),
                        suggestion: suggest::closest(&node.name, self.registry.element_tags()),
                    },
                )
                .into());
        };

        let mut attributes = Vec::with_capacity(definition.attributes().len());
        for attribute in definition.attributes() {
            attributes.push(attribute.parse(node, &self.registry, &self.file_name)?);
        }
        let attributes = AttributeSet::new(attributes);

        let element = Rc::new(Element {
            tag: node.name.clone(),
            id: attributes.identifier(),
            attributes,
            parent,
            children: RefCell::new(Vec::new()),
            behavior: RefCell::new(definition.create_behavior()),
            pending: RefCell::new(None),
            source: Some(node.source_info.clone()),
            document: self.document.clone(),
        });
        self.built.set(self.built.get() + 1);

        element.attributes.assign_owner(&element)?;
        element.hook()?.initialize(&element)?;

        if let Some(id) = element.id() {
            self.stage_identifier(id, &element, staged)?;
        }

        let policy = element.hook()?.child_policy();
        let nodes = node.all_children();
        match policy {
            ChildPolicy::Eager => {
                let children = self.build_children(nodes, &element, staged)?;
                *element.children.borrow_mut() = children;
            }
            ChildPolicy::Deferred if !nodes.is_empty() => {
                *element.pending.borrow_mut() = Some(PendingChildren {
                    nodes: nodes.into_iter().cloned().collect(),
                    session: Rc::clone(self),
                });
                return Ok(element);
            }
            ChildPolicy::Deferred | ChildPolicy::Skip => {}
        }

        element.hook()?.children_loaded(&element)?;
        Ok(element)
    }

    fn build_children<'n>(
        self: &Rc<Self>,
        nodes: impl IntoIterator<Item = &'n XmlElement>,
        parent: &Rc<Element>,
        staged: &mut IdentifierMap,
    ) -> Result<Vec<Rc<Element>>> {
        nodes
            .into_iter()
            .map(|node| self.build_element(node, Rc::downgrade(parent), staged))
            .collect()
    }

    fn stage_identifier(&self, id: &str, element: &Rc<Element>, staged: &mut IdentifierMap) -> Result<()> {
        let committed = match self.identifiers.upgrade() {
            Some(index) => {
                let found = index.borrow().get(id).cloned();
                found
            }
            None => None,
        };
        if let Some(first) = committed.or_else(|| staged.get(id).cloned()) {
            return Err(self
                .error(
                    identifier_span(element),
                    ParsingErrorKind::DuplicateIdentifier {
                        id: id.to_string(),
                        first: identifier_span(&first),
                    },
                )
                .into());
        }
        staged.insert(id.to_string(), Rc::clone(element));
        Ok(())
    }

    fn commit(&self, staged: IdentifierMap) -> Result<()> {
        let index = self.identifiers.upgrade().ok_or(LookupError::DocumentDropped)?;
        index.borrow_mut().extend(staged);
        Ok(())
    }

    fn error(&self, location: Option<SourceInfo>, kind: ParsingErrorKind) -> ParsingError {
        ParsingError::new(self.file_name.clone(), location, kind)
    }
}

fn identifier_span(element: &Element) -> Option<SourceInfo> {
    element
        .attributes
        .get(IDENTIFIER)
        .and_then(|a| a.source().cloned())
}

/// Build `element`'s deferred children as one batch.
pub(crate) fn load_deferred(element: &Rc<Element>, pending: PendingChildren) -> Result<usize> {
    let PendingChildren { nodes, session } = pending;
    let mut staged = IdentifierMap::new();
    let children = session.build_children(&nodes, element, &mut staged)?;
    session.commit(staged)?;

    let count = children.len();
    element.children.borrow_mut().extend(children);
    element.hook()?.children_loaded(element)?;
    debug!(
        file = %session.file_name,
        tag = %element.tag(),
        children = count,
        "loaded deferred children"
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::core_library;
    use crate::element::{ElementBehavior, ElementDefinition};
    use crate::library::Library;
    use crate::registry::DuplicatePolicy;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct LazyList;

    impl ElementBehavior for LazyList {
        fn child_policy(&self) -> ChildPolicy {
            ChildPolicy::Deferred
        }
    }

    #[derive(Default)]
    struct Opaque;

    impl ElementBehavior for Opaque {
        fn child_policy(&self) -> ChildPolicy {
            ChildPolicy::Skip
        }
    }

    fn session(index: &IdentifierIndex) -> Rc<ParseSession> {
        let library = Library::new("test")
            .with_element(ElementDefinition::new("item").unwrap())
            .with_element(ElementDefinition::new("lazy").unwrap().with_behavior::<LazyList>())
            .with_element(ElementDefinition::new("opaque").unwrap().with_behavior::<Opaque>());
        let mut registry = Registry::default();
        registry.import(&core_library(), DuplicatePolicy::Overwrite).unwrap();
        registry.import(&library, DuplicatePolicy::Overwrite).unwrap();
        ParseSession::new(Rc::new(registry), index, "t.xml", Weak::new())
    }

    fn build(xml: &str, index: &IdentifierIndex) -> Result<Rc<Element>> {
        let markup = trellis_xml::parse(xml).unwrap();
        session(index).build_root(&markup.root)
    }

    #[test]
    fn test_tree_links() {
        let index = IdentifierIndex::default();
        let root = build(r#"<template><item id="a"><item id="b"/></item></template>"#, &index).unwrap();

        assert_eq!(index.ids(), vec!["a", "b"]);
        let b = index.get("b").unwrap();
        let ancestors: Vec<String> = b.ancestors().map(|e| e.tag().to_string()).collect();
        assert_eq!(ancestors, vec!["item", "template"]);
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_duplicate_identifier_discards_batch() {
        let index = IdentifierIndex::default();
        let err = build(r#"<template><item id="x"/><item id="x"/></template>"#, &index).unwrap_err();

        let parsing = err.as_parsing().unwrap();
        match &parsing.kind {
            ParsingErrorKind::DuplicateIdentifier { id, first } => {
                assert_eq!(id, "x");
                assert!(first.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parsing.location.is_some());
        assert!(!index.contains("x"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_undefined_element_suggests() {
        let index = IdentifierIndex::default();
        let err = build("<template><iten/></template>", &index).unwrap_err();
        match &err.as_parsing().unwrap().kind {
            ParsingErrorKind::UndefinedElement { tag, suggestion } => {
                assert_eq!(tag, "iten");
                assert_eq!(suggestion.as_deref(), Some("item"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_deferred_children_load_on_demand() {
        let index = IdentifierIndex::default();
        let root = build(
            r#"<template><lazy id="menu"><item id="open"/><item id="quit"/></lazy></template>"#,
            &index,
        )
        .unwrap();

        let menu = index.get("menu").unwrap();
        assert!(menu.has_pending_children());
        assert!(menu.children().is_empty());
        assert!(!index.contains("open"));

        assert_eq!(menu.load_children().unwrap(), 2);
        assert_eq!(index.ids(), vec!["menu", "open", "quit"]);
        assert_eq!(menu.load_children().unwrap(), 0);
        assert!(Rc::ptr_eq(&index.get("quit").unwrap().parent().unwrap(), &menu));
        drop(root);
    }

    #[test]
    fn test_failed_deferred_load_keeps_no_identifiers() {
        let index = IdentifierIndex::default();
        let _root = build(
            r#"<template><item id="open"/><lazy id="menu"><item id="fresh"/><item id="open"/></lazy></template>"#,
            &index,
        )
        .unwrap();

        let menu = index.get("menu").unwrap();
        assert!(menu.load_children().is_err());
        assert!(!index.contains("fresh"));
        assert!(menu.children().is_empty());
    }

    #[test]
    fn test_skipped_children_are_never_built() {
        let index = IdentifierIndex::default();
        let root = build(r#"<template><opaque><undeclared id="z"/></opaque></template>"#, &index).unwrap();
        let opaque = &root.children()[0];
        assert!(opaque.children().is_empty());
        assert!(!opaque.has_pending_children());
        assert!(!index.contains("z"));
    }
}
