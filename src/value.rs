use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::ast::Node;

/// A runtime value. Values are immutable; every operator produces a
/// fresh one. `Function` carries the unevaluated body node bound by
/// `^`; `Struct` is the evaluated form of a `{ ... }` literal.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(Rc<str>),
    Function(Rc<Node>),
    Struct(Rc<StructValue>),
}

/// Ordered tree of evaluated values, isomorphic to the struct literal
/// that produced it. A nested literal shows up as a `Value::Struct`
/// field.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub fields: Vec<Value>,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::Text(left), Value::Text(right)) => left == right,
            (Value::Function(left), Value::Function(right)) => Rc::ptr_eq(left, right),
            (Value::Struct(left), Value::Struct(right)) => left == right,
            _ => false,
        }
    }
}

// NaN is never equal to itself, so a NaN key can never be found again;
// that degrades to the ordinary soft-fail lookup (Null).
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(flag) => flag.hash(state),
            Value::Number(number) => {
                // -0.0 equals 0.0, so both must hash alike.
                let canonical = if *number == 0.0 { 0.0_f64 } else { *number };
                canonical.to_bits().hash(state);
            }
            Value::Text(text) => text.hash(state),
            Value::Function(body) => (Rc::as_ptr(body) as usize).hash(state),
            Value::Struct(fields) => fields.hash(state),
        }
    }
}

impl Hash for StructValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields.len().hash(state);
        for field in &self.fields {
            field.hash(state);
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => *number != 0.0,
            Value::Text(text) => !text.is_empty(),
            Value::Function(_) | Value::Struct(_) => true,
        }
    }

    /// Numeric coercion. `None` only for text that does not parse as a
    /// number; the caller turns that into the fatal NumberFormat error.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Text(text) => text.trim().parse().ok(),
            Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Value::Null | Value::Function(_) | Value::Struct(_) => Some(0.0),
        }
    }

    pub fn coerce_text(&self) -> String {
        match self {
            Value::Number(number) => format_number(*number),
            Value::Text(text) => text.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null | Value::Function(_) | Value::Struct(_) => String::new(),
        }
    }
}

/// Integral values print without a trailing `.0`.
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.is_finite() {
        format!("{:.0}", number)
    } else {
        number.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(flag) => write!(f, "{}", flag),
            Value::Number(number) => write!(f, "{}", format_number(*number)),
            Value::Text(text) => write!(f, "{}", text),
            Value::Function(_) => write!(f, "<function>"),
            Value::Struct(fields) => write!(f, "{}", fields),
        }
    }
}

impl fmt::Display for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for field in &self.fields {
            write!(f, " {}", field)?;
        }
        write!(f, " }}")
    }
}
