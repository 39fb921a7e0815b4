use std::borrow::Cow;

use super::{Map, Object, Value};

/// Accessors exposed by every sequence
const SEQUENCE_ACCESSORS: &[&str] = &["first", "last", "count", "size", "length", "reverse"];

/// How a value can be addressed by a path segment
#[derive(Debug, Clone)]
pub enum Capability<'a> {
    /// Allow-listed accessors only
    Plain(&'a dyn Object),
    /// Key lookup
    Map(&'a Map),
    /// Iteration plus size/first/last/reverse
    Sequence(&'a [Value]),
    /// A string that is its own text form
    Str(Cow<'a, str>),
}

impl Value {
    /// Adapt a value for path lookup
    ///
    /// Numbers and `true` become their literal text. `null`, `false` and
    /// lambdas are not addressable at all.
    pub fn capability(&self) -> Option<Capability<'_>> {
        match self {
            Value::String(s) => Some(Capability::Str(Cow::Borrowed(s))),
            Value::Safe(s) => Some(Capability::Str(Cow::Borrowed(s.as_str()))),
            Value::Int(n) => Some(Capability::Str(Cow::Owned(n.to_string()))),
            Value::Float(n) => Some(Capability::Str(Cow::Owned(n.to_string()))),
            Value::Bool(true) => Some(Capability::Str(Cow::Borrowed("true"))),
            Value::Array(items) => Some(Capability::Sequence(items)),
            Value::Map(map) => Some(Capability::Map(map)),
            Value::Object(object) => Some(Capability::Plain(object.as_ref())),
            Value::Null | Value::Bool(false) | Value::Lambda(_) => None,
        }
    }

    /// Look up one path segment; anything unreachable is `Null`
    pub fn lookup(&self, segment: &str) -> Value {
        self.capability()
            .map(|cap| cap.lookup(segment))
            .unwrap_or_default()
    }
}

impl Capability<'_> {
    pub fn lookup(&self, segment: &str) -> Value {
        match self {
            Capability::Plain(object) => {
                if object.allowed().contains(&segment) {
                    object.access(segment)
                } else {
                    Value::Null
                }
            }
            Capability::Map(map) => match map.get(segment) {
                Some(Value::Lambda(lambda)) => lambda.call(),
                Some(value) => value.clone(),
                None => Value::Null,
            },
            Capability::Sequence(items) => sequence_accessor(items, segment),
            Capability::Str(_) => Value::Null,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Capability::Sequence(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Capability::Map(_))
    }
}

fn sequence_accessor(items: &[Value], name: &str) -> Value {
    if !SEQUENCE_ACCESSORS.contains(&name) {
        return Value::Null;
    }
    match name {
        "first" => items.first().cloned().unwrap_or_default(),
        "last" => items.last().cloned().unwrap_or_default(),
        "reverse" => Value::Array(items.iter().rev().cloned().collect()),
        _ => Value::Int(items.len() as i64),
    }
}
