/*
 * element.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Element declarations and the instantiated tree.
//!
//! An [`ElementDefinition`] is registered per tag by a library. Building a
//! markup node through it yields an [`Element`]: the parsed attributes, a
//! weak link to the parent, the owned children and a host-defined
//! [`ElementBehavior`] created by the definition's factory.

use crate::attribute::{Attribute, AttributeDefinition, AttributeSet};
use crate::builder::{self, PendingChildren};
use crate::document::DocumentContext;
use crate::error::{ConfigurationError, LookupError, OwnershipViolation, Result};
use crate::extension::AsAny;
use crate::value::Value;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use trellis_source_map::SourceInfo;

/// When an element's children are built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChildPolicy {
    /// Right after the element itself.
    #[default]
    Eager,
    /// On demand, through [`Element::load_children`].
    Deferred,
    /// Never.
    Skip,
}

/// Host-side behavior attached to every element of a tag.
///
/// Hooks receive the element they belong to. While a hook runs,
/// [`Element::behavior`] on the same element returns
/// [`LookupError::BehaviorInUse`].
pub trait ElementBehavior: AsAny {
    /// Runs once attributes are parsed and owned, before children exist.
    fn initialize(&mut self, _element: &Element) -> Result<()> {
        Ok(())
    }

    fn child_policy(&self) -> ChildPolicy {
        ChildPolicy::Eager
    }

    /// Runs after this element's children were built.
    fn children_loaded(&mut self, _element: &Element) -> Result<()> {
        Ok(())
    }
}

/// Behavior of elements declared without one.
#[derive(Debug, Default)]
pub struct GenericElement;

impl ElementBehavior for GenericElement {}

/// Builds the behavior for a new element.
pub type ElementFactory = dyn Fn() -> Box<dyn ElementBehavior> + Send + Sync;

/// A declared element tag.
#[derive(Clone)]
pub struct ElementDefinition {
    tag: String,
    attributes: Vec<AttributeDefinition>,
    factory: Arc<ElementFactory>,
}

impl ElementDefinition {
    /// Declare `tag` with only the reserved identifier attribute.
    pub fn new(tag: impl Into<String>) -> std::result::Result<Self, ConfigurationError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(ConfigurationError::EmptyName { kind: "element" });
        }
        Ok(Self::declared(tag))
    }

    pub(crate) fn declared(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: vec![AttributeDefinition::identifier()],
            factory: Arc::new(|| -> Box<dyn ElementBehavior> { Box::new(GenericElement) }),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeDefinition) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Create behaviors with `T::default()`.
    pub fn with_behavior<T: ElementBehavior + Default>(mut self) -> Self {
        self.factory = Arc::new(|| -> Box<dyn ElementBehavior> { Box::new(T::default()) });
        self
    }

    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn ElementBehavior> + Send + Sync + 'static,
    {
        self.factory = Arc::new(factory);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute declarations in parse order, the identifier first.
    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    pub(crate) fn create_behavior(&self) -> Box<dyn ElementBehavior> {
        (self.factory)()
    }
}

impl fmt::Debug for ElementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDefinition")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

/// A node of the built tree.
pub struct Element {
    pub(crate) tag: String,
    pub(crate) id: Option<String>,
    pub(crate) attributes: AttributeSet,
    pub(crate) parent: Weak<Element>,
    pub(crate) children: RefCell<Vec<Rc<Element>>>,
    pub(crate) behavior: RefCell<Box<dyn ElementBehavior>>,
    pub(crate) pending: RefCell<Option<PendingChildren>>,
    pub(crate) source: Option<SourceInfo>,
    pub(crate) document: Weak<DocumentContext>,
}

impl Element {
    /// An element outside any document, owning `attributes`.
    ///
    /// Function macros cannot run on it since there is no document to hold
    /// the function registry.
    pub fn detached(tag: impl Into<String>, attributes: AttributeSet) -> std::result::Result<Rc<Element>, OwnershipViolation> {
        let id = attributes.identifier();
        let element = Rc::new(Element {
            tag: tag.into(),
            id,
            attributes,
            parent: Weak::new(),
            children: RefCell::new(Vec::new()),
            behavior: RefCell::new(Box::new(GenericElement)),
            pending: RefCell::new(None),
            source: None,
            document: Weak::new(),
        });
        element.attributes.assign_owner(&element)?;
        Ok(element)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Identifier from the reserved `ID` attribute.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> std::result::Result<&Attribute, LookupError> {
        self.attributes.require(name)
    }

    /// Evaluate the attribute `name`.
    pub fn value(&self, name: &str) -> Result<Value> {
        self.attributes.value(name)
    }

    pub fn parent(&self) -> Option<Rc<Element>> {
        self.parent.upgrade()
    }

    /// Parent, grandparent, and so on up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Rc<Element>> {
        std::iter::successors(self.parent(), |e| e.parent())
    }

    pub fn children(&self) -> Vec<Rc<Element>> {
        self.children.borrow().clone()
    }

    /// Whether deferred children are waiting for [`Element::load_children`].
    pub fn has_pending_children(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Build deferred children now. Returns how many were added.
    ///
    /// Loading happens once; later calls return `Ok(0)`. On failure no child
    /// and no identifier from the batch is kept.
    pub fn load_children(self: &Rc<Self>) -> Result<usize> {
        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(pending) => builder::load_deferred(self, pending),
            None => Ok(0),
        }
    }

    pub fn source(&self) -> Option<&SourceInfo> {
        self.source.as_ref()
    }

    /// The behavior, as a `T`.
    ///
    /// Fails with [`LookupError::BehaviorInUse`] while one of the behavior's
    /// own hooks is running.
    pub fn behavior<T: ElementBehavior>(&self) -> std::result::Result<Ref<'_, T>, LookupError> {
        let behavior = self.behavior.try_borrow().map_err(|_| self.behavior_in_use())?;
        Ref::filter_map(behavior, |b| AsAny::as_any(&**b).downcast_ref::<T>())
            .map_err(|_| self.behavior_mismatch::<T>())
    }

    pub fn behavior_mut<T: ElementBehavior>(&self) -> std::result::Result<RefMut<'_, T>, LookupError> {
        let behavior = self
            .behavior
            .try_borrow_mut()
            .map_err(|_| self.behavior_in_use())?;
        RefMut::filter_map(behavior, |b| AsAny::as_any_mut(&mut **b).downcast_mut::<T>())
            .map_err(|_| self.behavior_mismatch::<T>())
    }

    /// Exclusive access to the behavior for running one of its hooks.
    pub(crate) fn hook(&self) -> std::result::Result<RefMut<'_, Box<dyn ElementBehavior>>, LookupError> {
        self.behavior.try_borrow_mut().map_err(|_| self.behavior_in_use())
    }

    fn behavior_in_use(&self) -> LookupError {
        LookupError::BehaviorInUse {
            tag: self.tag.clone(),
        }
    }

    fn behavior_mismatch<T>(&self) -> LookupError {
        LookupError::BehaviorMismatch {
            tag: self.tag.clone(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The document this element was parsed by.
    pub fn document(&self) -> std::result::Result<Rc<DocumentContext>, LookupError> {
        self.document.upgrade().ok_or(LookupError::DocumentDropped)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("id", &self.id)
            .field("attributes", &self.attributes.len())
            .field("children", &self.children.borrow().len())
            .finish_non_exhaustive()
    }
}
