/*
 * registry.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! The per-parse lookup tables built from imported libraries.

use crate::element::ElementDefinition;
use crate::error::ConfigurationError;
use crate::library::Library;
use crate::macros::Macro;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// What an import does when a name is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Replace silently; the last import wins.
    #[default]
    Overwrite,
    /// Replace and report a warning.
    Warn,
    /// Fail the import.
    Reject,
}

/// A declaration replaced by an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    /// `"macro"` or `"element"`.
    pub kind: &'static str,
    pub name: String,
    /// Library whose import did the replacing.
    pub library: String,
}

/// Macros by name and element definitions by tag.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    macros: IndexMap<String, Arc<Macro>>,
    elements: IndexMap<String, Arc<ElementDefinition>>,
}

impl Registry {
    /// Copy `library`'s declarations in.
    ///
    /// Under [`DuplicatePolicy::Reject`] nothing is copied if any name
    /// collides.
    pub fn import(
        &mut self,
        library: &Library,
        policy: DuplicatePolicy,
    ) -> Result<Vec<Replaced>, ConfigurationError> {
        if policy == DuplicatePolicy::Reject {
            if let Some(m) = library.macros().iter().find(|m| self.macros.contains_key(m.name())) {
                return Err(ConfigurationError::DuplicateRegistration {
                    kind: "macro",
                    name: m.name().to_string(),
                    library: library.name().to_string(),
                });
            }
            if let Some(e) = library.elements().iter().find(|e| self.elements.contains_key(e.tag())) {
                return Err(ConfigurationError::DuplicateRegistration {
                    kind: "element",
                    name: e.tag().to_string(),
                    library: library.name().to_string(),
                });
            }
        }

        let mut replaced = Vec::new();
        for m in library.macros() {
            if self.macros.insert(m.name().to_string(), Arc::clone(m)).is_some() {
                replaced.push(Replaced {
                    kind: "macro",
                    name: m.name().to_string(),
                    library: library.name().to_string(),
                });
            }
        }
        for e in library.elements() {
            if self.elements.insert(e.tag().to_string(), Arc::clone(e)).is_some() {
                replaced.push(Replaced {
                    kind: "element",
                    name: e.tag().to_string(),
                    library: library.name().to_string(),
                });
            }
        }

        for r in &replaced {
            if policy == DuplicatePolicy::Warn {
                warn!(kind = r.kind, name = %r.name, library = %r.library, "import replaced an existing declaration");
            } else {
                debug!(kind = r.kind, name = %r.name, library = %r.library, "import replaced an existing declaration");
            }
        }
        debug!(
            library = library.name(),
            macros = library.macros().len(),
            elements = library.elements().len(),
            "imported library"
        );

        Ok(replaced)
    }

    pub fn macro_named(&self, name: &str) -> Option<&Arc<Macro>> {
        self.macros.get(name)
    }

    pub fn element(&self, tag: &str) -> Option<&Arc<ElementDefinition>> {
        self.elements.get(tag)
    }

    /// Registered macro names, in first-registration order.
    pub fn macro_names(&self) -> impl Iterator<Item = &str> {
        self.macros.keys().map(String::as_str)
    }

    pub fn element_tags(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty() && self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::attribute::AttributeSet;
    use crate::stage::Stage;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn constant(library: &str, value: i32) -> Library {
        Library::new(library)
            .with_macro(Macro::host("M", Stage::Creation, move |_, _| Ok(Value::Int32(value))).unwrap())
            .with_element(ElementDefinition::new("label").unwrap())
    }

    #[test]
    fn test_last_import_wins() {
        let mut registry = Registry::default();
        assert!(registry.import(&constant("L1", 1), DuplicatePolicy::Overwrite).unwrap().is_empty());
        let replaced = registry.import(&constant("L2", 2), DuplicatePolicy::Overwrite).unwrap();

        assert_eq!(
            replaced,
            vec![
                Replaced {
                    kind: "macro",
                    name: "M".to_string(),
                    library: "L2".to_string()
                },
                Replaced {
                    kind: "element",
                    name: "label".to_string(),
                    library: "L2".to_string()
                },
            ]
        );

        let element = Element::detached("label", AttributeSet::default()).unwrap();
        let m = registry.macro_named("M").unwrap();
        assert_eq!(m.evaluate(Value::Null, &element).unwrap(), Value::Int32(2));
    }

    #[test]
    fn test_reject_leaves_registry_untouched() {
        let mut registry = Registry::default();
        registry.import(&constant("L1", 1), DuplicatePolicy::Reject).unwrap();
        let extra = constant("L2", 2).with_macro(Macro::host("Extra", Stage::Update, |v, _| Ok(v)).unwrap());

        let err = registry.import(&extra, DuplicatePolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateRegistration {
                kind: "macro",
                name: "M".to_string(),
                library: "L2".to_string()
            }
        );
        assert!(registry.macro_named("Extra").is_none());
    }

    #[test]
    fn test_names_in_registration_order() {
        let mut registry = Registry::default();
        let library = Library::new("x")
            .with_macro(Macro::host("B", Stage::Creation, |v, _| Ok(v)).unwrap())
            .with_macro(Macro::host("A", Stage::Creation, |v, _| Ok(v)).unwrap());
        registry.import(&library, DuplicatePolicy::Warn).unwrap();
        assert_eq!(registry.macro_names().collect::<Vec<_>>(), vec!["B", "A"]);
        assert!(registry.element_tags().next().is_none());
    }
}
