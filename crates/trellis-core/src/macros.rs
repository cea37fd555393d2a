/*
 * macros.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Named, staged value transforms.
//!
//! A macro takes one input value and the element that owns the attribute
//! being evaluated, and produces one output value. The set of macro kinds is
//! closed: the function-registry macros of the core library, plus host
//! closures registered through [`Macro::host`].

use crate::builtin::FunctionsExtension;
use crate::element::Element;
use crate::error::{ConfigurationError, EvaluationError, LookupError, Result};
use crate::stage::Stage;
use crate::value::{FunctionHandle, NativeFunction, Value};
use std::fmt;
use std::sync::Arc;

/// Signature of a host-registered macro body.
pub type HostMacroFn = dyn Fn(Value, &Element) -> std::result::Result<Value, EvaluationError> + Send + Sync;

/// A macro declaration. Immutable once built; libraries share it by `Arc`.
pub struct Macro {
    name: String,
    stage: Stage,
    body: MacroBody,
}

#[derive(Clone)]
pub(crate) enum MacroBody {
    /// Look the input up in the function registry and call it.
    CallFunction,
    /// Look the input up in the function registry and return a handle to it.
    FunctionHandle,
    Host(Arc<HostMacroFn>),
}

impl Macro {
    /// Declare a macro backed by a host closure.
    ///
    /// ```
    /// use trellis_core::{Macro, Stage, Value};
    ///
    /// let upper = Macro::host("Upper", Stage::Creation, |input, _element| {
    ///     Ok(Value::String(input.to_string().to_uppercase()))
    /// })
    /// .unwrap();
    /// assert_eq!(upper.name(), "Upper");
    /// ```
    pub fn host<F>(name: impl Into<String>, stage: Stage, body: F) -> std::result::Result<Self, ConfigurationError>
    where
        F: Fn(Value, &Element) -> std::result::Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName { kind: "macro" });
        }
        Ok(Self {
            name,
            stage,
            body: MacroBody::Host(Arc::new(body)),
        })
    }

    pub(crate) fn builtin(name: &str, stage: Stage, body: MacroBody) -> Self {
        Self {
            name: name.to_string(),
            stage,
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Whether the macro is backed by a host closure.
    pub fn is_host(&self) -> bool {
        matches!(self.body, MacroBody::Host(_))
    }

    /// Apply the macro to `input` on behalf of `element`.
    pub fn evaluate(&self, input: Value, element: &Element) -> Result<Value> {
        match &self.body {
            MacroBody::Host(body) => Ok(body(input, element)?),
            MacroBody::CallFunction => {
                let key = input.to_string();
                let function = resolve_function(&key, element)?;
                Ok(function.call()?)
            }
            MacroBody::FunctionHandle => {
                let key = input.to_string();
                let function = resolve_function(&key, element)?;
                Ok(Value::Function(FunctionHandle::new(key, function)))
            }
        }
    }
}

fn resolve_function(key: &str, element: &Element) -> Result<Arc<dyn NativeFunction>> {
    let document = element.document()?;
    let function = {
        let functions = document.extension::<FunctionsExtension>()?;
        functions.get(key)
    };
    function.ok_or_else(|| {
        LookupError::UnknownFunction {
            key: key.to_string(),
        }
        .into()
    })
}

impl fmt::Debug for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            MacroBody::CallFunction => "call-function",
            MacroBody::FunctionHandle => "function-handle",
            MacroBody::Host(_) => "host",
        };
        f.debug_struct("Macro")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("kind", &kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeSet;

    #[test]
    fn test_host_macro_rejects_empty_name() {
        let err = Macro::host("", Stage::Update, |v, _| Ok(v)).unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyName { kind: "macro" });
    }

    #[test]
    fn test_host_macro_sees_owning_element() {
        let tag = Macro::host("Tag", Stage::Creation, |_, element| {
            Ok(Value::String(element.tag().to_string()))
        })
        .unwrap();
        let element = Element::detached("label", AttributeSet::default()).unwrap();

        let value = tag.evaluate(Value::Null, &element).unwrap();
        assert_eq!(value, Value::from("label"));
        assert!(tag.is_host());
    }

    #[test]
    fn test_function_macro_needs_a_document() {
        let func = Macro::builtin("Func", Stage::Activation, MacroBody::CallFunction);
        let element = Element::detached("label", AttributeSet::default()).unwrap();

        let err = func.evaluate(Value::from("quit"), &element).unwrap_err();
        assert!(matches!(err, crate::Error::Lookup(LookupError::DocumentDropped)));
    }
}
