/*
 * attribute.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Attribute declarations and their per-element instances.
//!
//! An [`AttributeDefinition`] says which markup names an attribute may be
//! written under and how its text is interpreted. Parsing it against a
//! markup node yields an [`Attribute`] whose value is an [`Expression`]:
//! either a literal fixed at parse time, or a macro chain evaluated again on
//! every read.

use crate::element::Element;
use crate::error::{
    ConfigurationError, LookupError, OwnershipViolation, ParsingError, ParsingErrorKind, Result,
};
use crate::matcher::{MacroChain, match_chain};
use crate::registry::Registry;
use crate::stage::Stage;
use crate::value::{Value, coerce_literal};
use std::cell::OnceCell;
use std::rc::{Rc, Weak};
use trellis_source_map::SourceInfo;
use trellis_xml::XmlElement;

/// Canonical name of the reserved identifier attribute.
pub const IDENTIFIER: &str = "ID";

/// How an attribute's raw text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Literal coercion only; macro syntax is kept as text.
    Value,
    /// Must be a macro chain.
    Macro,
    /// A macro chain if the text contains one, otherwise a literal.
    MacroOrValue,
}

/// A declared attribute. Immutable once built.
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    name: String,
    mode: ParseMode,
    accepted_names: Vec<String>,
    default: Option<Value>,
}

impl AttributeDefinition {
    /// Declare an attribute read from any of `accepted_names`, tried in order.
    pub fn new<I, S>(name: impl Into<String>, mode: ParseMode, accepted_names: I) -> std::result::Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName { kind: "attribute" });
        }
        let accepted_names: Vec<String> = accepted_names.into_iter().map(Into::into).collect();
        if accepted_names.is_empty() {
            return Err(ConfigurationError::NoAcceptedNames { attribute: name });
        }
        if accepted_names.iter().any(String::is_empty) {
            return Err(ConfigurationError::EmptyAcceptedName { attribute: name });
        }
        Ok(Self {
            name,
            mode,
            accepted_names,
            default: None,
        })
    }

    /// Value used when none of the accepted names is present.
    pub fn with_default(mut self, default: Value) -> std::result::Result<Self, ConfigurationError> {
        if default.is_null() {
            return Err(ConfigurationError::NullDefault { attribute: self.name });
        }
        self.default = Some(default);
        Ok(self)
    }

    /// The reserved `ID`/`id` attribute every element declares.
    pub(crate) fn identifier() -> Self {
        Self {
            name: IDENTIFIER.to_string(),
            mode: ParseMode::Value,
            accepted_names: vec![IDENTIFIER.to_string(), "id".to_string()],
            default: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn accepted_names(&self) -> &[String] {
        &self.accepted_names
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Read this attribute off `node`.
    ///
    /// `file` names the document in any error raised.
    pub fn parse(
        &self,
        node: &XmlElement,
        registry: &Registry,
        file: &str,
    ) -> std::result::Result<Attribute, ParsingError> {
        let found = self
            .accepted_names
            .iter()
            .find_map(|name| node.get_attribute_full(name));

        let Some(raw) = found else {
            let value = self.default.clone().unwrap_or(Value::Null);
            return Ok(Attribute::literal(self.name.clone(), value));
        };

        let location = raw.value_source.clone();
        let fail = |kind: ParsingErrorKind| ParsingError::new(file, Some(location.clone()), kind);

        let expression = match self.mode {
            ParseMode::Value => Expression::Literal(coerce_literal(&raw.value)),
            ParseMode::Macro => match match_chain(&raw.value, registry).map_err(&fail)? {
                Some(chain) => Expression::Chain(chain),
                None => {
                    return Err(fail(ParsingErrorKind::ExpectedMacro {
                        attribute: self.name.clone(),
                        expression: raw.value.clone(),
                    }));
                }
            },
            ParseMode::MacroOrValue => match match_chain(&raw.value, registry).map_err(&fail)? {
                Some(chain) => Expression::Chain(chain),
                None => Expression::Literal(coerce_literal(&raw.value)),
            },
        };

        let mut attribute = Attribute::new(self.name.clone(), expression);
        attribute.source = Some(location);
        attribute.text = Some(raw.value.clone());
        Ok(attribute)
    }
}

/// How an attribute produces its value.
#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Value),
    Chain(MacroChain),
}

/// An attribute instance belonging to one element.
#[derive(Debug)]
pub struct Attribute {
    name: String,
    stage: Stage,
    expression: Expression,
    source: Option<SourceInfo>,
    text: Option<String>,
    owner: OnceCell<Weak<Element>>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, expression: Expression) -> Self {
        let stage = match &expression {
            Expression::Literal(_) => Stage::Creation,
            Expression::Chain(chain) => chain.stage(),
        };
        Self {
            name: name.into(),
            stage,
            expression,
            source: None,
            text: None,
            owner: OnceCell::new(),
        }
    }

    pub fn literal(name: impl Into<String>, value: Value) -> Self {
        Self::new(name, Expression::Literal(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn is_chain(&self) -> bool {
        matches!(self.expression, Expression::Chain(_))
    }

    /// Span of the attribute value in the markup, when it was written there.
    pub fn source(&self) -> Option<&SourceInfo> {
        self.source.as_ref()
    }

    /// The attribute text as written in the markup.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn owner(&self) -> Option<Rc<Element>> {
        self.owner.get().and_then(Weak::upgrade)
    }

    /// Bind this attribute to `owner`. An attribute can be bound only once.
    pub fn assign_owner(&self, owner: &Rc<Element>) -> std::result::Result<(), OwnershipViolation> {
        self.owner
            .set(Rc::downgrade(owner))
            .map_err(|_| OwnershipViolation::AttributeAlreadyOwned {
                attribute: self.name.clone(),
            })
    }

    /// Compute the value. Chains run again on every call.
    pub fn value(&self) -> Result<Value> {
        let chain = match &self.expression {
            Expression::Literal(value) => return Ok(value.clone()),
            Expression::Chain(chain) => chain,
        };

        let owner = self.owner().ok_or_else(|| OwnershipViolation::Unowned {
            attribute: self.name.clone(),
        })?;

        chain
            .macros
            .iter()
            .try_fold(Value::String(chain.argument.clone()), |input, m| {
                m.evaluate(input, &owner)
            })
    }
}

/// The ordered attributes of one element.
#[derive(Debug, Default)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
    owner: OnceCell<Weak<Element>>,
}

impl AttributeSet {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            owner: OnceCell::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn require(&self, name: &str) -> std::result::Result<&Attribute, LookupError> {
        self.get(name).ok_or_else(|| LookupError::UnknownAttribute {
            name: name.to_string(),
        })
    }

    /// Shorthand for `require(name)?.value()`.
    pub fn value(&self, name: &str) -> Result<Value> {
        self.require(name)?.value()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Bind the set and every attribute in it to `owner`.
    pub fn assign_owner(&self, owner: &Rc<Element>) -> std::result::Result<(), OwnershipViolation> {
        self.owner
            .set(Rc::downgrade(owner))
            .map_err(|_| OwnershipViolation::SetAlreadyOwned)?;
        for attribute in &self.attributes {
            attribute.assign_owner(owner)?;
        }
        Ok(())
    }

    /// The identifier declared through the reserved attribute, if any.
    ///
    /// Markup identifiers keep their written text, so `007` and `7` differ.
    pub(crate) fn identifier(&self) -> Option<String> {
        let attribute = self.get(IDENTIFIER)?;
        match (&attribute.text, &attribute.expression) {
            (Some(text), _) => Some(text.clone()),
            (None, Expression::Literal(value)) if !value.is_null() => Some(value.to_string()),
            _ => None,
        }
    }
}
