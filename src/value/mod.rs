//! Runtime values that templates render and navigate
//!
//! Host data enters the engine as a [`Value`]. Path lookups go through the
//! closed set of [`Capability`] variants, so a template can only reach what
//! a value explicitly exposes: map keys, sequence accessors, or the names an
//! [`Object`] puts on its allow-list.

mod capability;
mod convert;
mod safe;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

pub use capability::Capability;
pub use safe::{escape_html, SafeString};

/// String-keyed map that keeps insertion order
pub type Map = IndexMap<String, Value>;

/// A host value with a deny-by-default accessor surface
///
/// Only names returned by [`Object::allowed`] are ever passed to
/// [`Object::access`]; any other segment resolves to nothing.
pub trait Object: fmt::Debug + Send + Sync {
    /// Accessor names reachable from templates
    fn allowed(&self) -> &[&str];

    /// Read an allowed accessor
    fn access(&self, name: &str) -> Value;

    /// Whether block sections should treat this object as empty
    fn is_empty(&self) -> bool {
        false
    }
}

/// Zero-argument callable stored in a map; invoked when looked up
#[derive(Clone)]
pub struct Lambda(Arc<dyn Fn() -> Value + Send + Sync>);

impl Lambda {
    pub fn new(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lambda(..)")
    }
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Pre-escaped text, written out as is
    Safe(SafeString),
    Array(Vec<Value>),
    Map(Map),
    Object(Arc<dyn Object>),
    Lambda(Lambda),
}

impl Value {
    pub fn object(object: impl Object + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    pub fn lambda(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Value::Lambda(Lambda::new(f))
    }

    pub fn safe(text: impl Into<String>) -> Self {
        Value::Safe(SafeString::new(text))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Emptiness as seen by conditionals and block sections
    ///
    /// Numbers are always truthy, including zero.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(_) | Value::Float(_) | Value::Lambda(_) => true,
            Value::String(s) => !s.is_empty(),
            Value::Safe(s) => !s.as_str().is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Object(object) => !object.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Safe(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Text for an escaped expression; safe strings pass through untouched
    pub fn to_escaped_string(&self) -> String {
        match self {
            Value::Safe(s) => s.as_str().to_string(),
            other => escape_html(&other.to_string()),
        }
    }
}

/// Containers and objects have no text form and render as nothing
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Safe(s) => f.write_str(s.as_str()),
            Value::Null
            | Value::Array(_)
            | Value::Map(_)
            | Value::Object(_)
            | Value::Lambda(_) => Ok(()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Safe(a), Value::Safe(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Lambda(a), Value::Lambda(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}
