/*
 * value.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Attribute values and literal coercion.

use crate::error::EvaluationError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A value produced by an attribute: a coerced literal or a macro result.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    String(String),
    List(Vec<Value>),
    /// A callable handle, as returned by `SelfFunc`.
    Function(FunctionHandle),
}

/// Which representation a [`Value`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    String,
    List,
    Function,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int16(_) => ValueKind::Int16,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float32(_) => ValueKind::Float32,
            Value::Float64(_) => ValueKind::Float64,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Function(_) => ValueKind::Function,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer representation, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric representation, converted (decimals may lose precision).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int16(v) => Some(f64::from(*v)),
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Int64(v) => v.to_f64(),
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            Value::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionHandle> {
        match self {
            Value::Function(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.same_function(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({:?})", v),
            Value::Int16(v) => write!(f, "Int16({:?})", v),
            Value::Int32(v) => write!(f, "Int32({:?})", v),
            Value::Int64(v) => write!(f, "Int64({:?})", v),
            Value::Float32(v) => write!(f, "Float32({:?})", v),
            Value::Float64(v) => write!(f, "Float64({:?})", v),
            Value::Decimal(v) => write!(f, "Decimal({})", v),
            Value::String(v) => write!(f, "String({:?})", v),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Function(handle) => write!(f, "Function({:?})", handle.key()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Function(handle) => write!(f, "<function {}>", handle.key()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int16(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

/// A native callable that function macros resolve by key.
///
/// Implementations may keep state between calls (behind a lock or atomics,
/// since libraries are shared across threads).
pub trait NativeFunction: Send + Sync {
    fn call(&self) -> Result<Value, EvaluationError>;
}

impl<F> NativeFunction for F
where
    F: Fn() -> Result<Value, EvaluationError> + Send + Sync,
{
    fn call(&self) -> Result<Value, EvaluationError> {
        self()
    }
}

/// A native function together with the key it was looked up under.
#[derive(Clone)]
pub struct FunctionHandle {
    key: String,
    function: Arc<dyn NativeFunction>,
}

impl FunctionHandle {
    pub fn new(key: impl Into<String>, function: Arc<dyn NativeFunction>) -> Self {
        Self {
            key: key.into(),
            function,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn call(&self) -> Result<Value, EvaluationError> {
        self.function.call()
    }

    /// Whether both handles point at the same function instance.
    pub fn same_function(&self, other: &FunctionHandle) -> bool {
        Arc::ptr_eq(&self.function, &other.function)
    }
}

impl fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionHandle").field("key", &self.key).finish()
    }
}

/// Coerce literal text into the narrowest representation that round-trips it.
///
/// Representations are tried in order: `i16`, `i32`, `i64`, `f32`, `f64`,
/// decimal. Text that none of them reproduces exactly stays a string. This
/// never fails.
///
/// ```
/// use trellis_core::{Value, coerce_literal};
///
/// assert_eq!(coerce_literal("5"), Value::Int16(5));
/// assert_eq!(coerce_literal("70000"), Value::Int32(70000));
/// assert_eq!(coerce_literal("3.14"), Value::Float32(3.14));
/// assert_eq!(coerce_literal("abc"), Value::String("abc".to_string()));
/// ```
pub fn coerce_literal(text: &str) -> Value {
    if let Ok(v) = text.parse::<i16>() {
        return Value::Int16(v);
    }
    if let Ok(v) = text.parse::<i32>() {
        return Value::Int32(v);
    }
    if let Ok(v) = text.parse::<i64>() {
        return Value::Int64(v);
    }

    // Everything below needs a plain decimal or scientific spelling; this
    // keeps `inf`, `NaN` and digit separators as strings.
    if !looks_numeric(text) {
        return Value::String(text.to_string());
    }
    let Some(written) = Digits::parse(text) else {
        return Value::String(text.to_string());
    };

    if let Ok(v) = text.parse::<f32>() {
        if v.is_finite() && Digits::parse(&v.to_string()).as_ref() == Some(&written) {
            return Value::Float32(v);
        }
    }
    if let Ok(v) = text.parse::<f64>() {
        if v.is_finite() && Digits::parse(&v.to_string()).as_ref() == Some(&written) {
            return Value::Float64(v);
        }
    }

    exact_decimal(text).map_or_else(|| Value::String(text.to_string()), Value::Decimal)
}

fn looks_numeric(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

/// A decimal number as `±0.d1d2d3… × 10^exponent`, with no leading or
/// trailing zero digits. Zero has no digits and no sign.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Digits {
    negative: bool,
    digits: String,
    exponent: i64,
}

impl Digits {
    fn parse(text: &str) -> Option<Self> {
        let (negative, unsigned) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => (mantissa, exponent.parse::<i64>().ok()?),
            None => (unsigned, 0),
        };
        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }

        let all = format!("{whole}{fraction}");
        let leading = all.len() - all.trim_start_matches('0').len();
        let significant = all.trim_matches('0');
        if significant.is_empty() {
            return Some(Self {
                negative: false,
                digits: String::new(),
                exponent: 0,
            });
        }
        let point = i64::try_from(whole.len()).ok()? - i64::try_from(leading).ok()?;
        Some(Self {
            negative,
            digits: significant.to_string(),
            exponent: exponent.checked_add(point)?,
        })
    }
}

fn exact_decimal(text: &str) -> Option<Decimal> {
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}
