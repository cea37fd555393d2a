/*
 * matcher.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Decomposition of `Outer(Inner(arg))` expressions into macro chains.

use crate::error::ParsingErrorKind;
use crate::macros::Macro;
use crate::registry::Registry;
use crate::stage::Stage;
use crate::suggest;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

// Greedy, so the last `)` closes the outermost call.
static MACRO_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\w+)\((.+)\)").expect("macro call pattern is valid"));

/// A resolved chain of macros and the literal text they start from.
#[derive(Debug, Clone)]
pub struct MacroChain {
    /// Macros in evaluation order, innermost first.
    pub macros: Vec<Arc<Macro>>,
    /// Text left once every call is peeled off.
    pub argument: String,
}

impl MacroChain {
    /// The latest stage among the chain's macros.
    pub fn stage(&self) -> Stage {
        Stage::latest(self.macros.iter().map(|m| m.stage()))
    }

    /// Macro names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.macros.iter().map(|m| m.name()).collect()
    }
}

/// Peel macro calls off `expression`, resolving each name in `registry`.
///
/// Returns `Ok(None)` when the expression contains no call at all. A call
/// whose name is not registered fails the whole match.
pub fn match_chain(expression: &str, registry: &Registry) -> Result<Option<MacroChain>, ParsingErrorKind> {
    let mut stack = Vec::new();
    let mut current = expression;

    while let Some(captures) = MACRO_CALL.captures(current) {
        let (Some(name), Some(inner)) = (captures.get(1), captures.get(2)) else {
            break;
        };
        let name = name.as_str();
        let Some(found) = registry.macro_named(name) else {
            return Err(ParsingErrorKind::UndefinedMacro {
                name: name.to_string(),
                suggestion: suggest::closest(name, registry.macro_names()),
            });
        };
        stack.push(Arc::clone(found));
        current = inner.as_str();
    }

    if stack.is_empty() {
        return Ok(None);
    }

    stack.reverse();
    Ok(Some(MacroChain {
        macros: stack,
        argument: current.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Library;
    use crate::registry::DuplicatePolicy;
    use pretty_assertions::assert_eq;

    fn registry() -> Registry {
        let library = Library::new("test")
            .with_macro(Macro::host("A", Stage::Creation, |v, _| Ok(v)).unwrap())
            .with_macro(Macro::host("B", Stage::Update, |v, _| Ok(v)).unwrap())
            .with_macro(Macro::host("C", Stage::Activation, |v, _| Ok(v)).unwrap());
        let mut registry = Registry::default();
        registry.import(&library, DuplicatePolicy::Overwrite).unwrap();
        registry
    }

    #[test]
    fn test_nested_chain_is_innermost_first() {
        let chain = match_chain("A(B(x))", &registry()).unwrap().unwrap();
        assert_eq!(chain.names(), vec!["B", "A"]);
        assert_eq!(chain.argument, "x");
        assert_eq!(chain.stage(), Stage::Update);
    }

    #[test]
    fn test_plain_text_is_not_a_chain() {
        assert!(match_chain("hello", &registry()).unwrap().is_none());
        assert!(match_chain("A()", &registry()).unwrap().is_none());
    }

    #[test]
    fn test_argument_may_span_lines_and_parentheses() {
        let chain = match_chain("C(f(1) + (2)\n)", &registry());
        // `f(` starts another call, and `f` is not registered.
        assert!(chain.is_err());

        let chain = match_chain("C(one (two)\nthree)", &registry()).unwrap().unwrap();
        assert_eq!(chain.names(), vec!["C"]);
        assert_eq!(chain.argument, "one (two)\nthree");
    }

    #[test]
    fn test_unknown_macro_suggests_close_name() {
        let err = match_chain("Bogus(1)", &registry()).unwrap_err();
        match err {
            ParsingErrorKind::UndefinedMacro { name, suggestion } => {
                assert_eq!(name, "Bogus");
                assert_eq!(suggestion, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
