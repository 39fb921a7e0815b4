//! Built-in helpers: `each`, `if`, `unless`, `with` and `log`

use tracing::info;

use crate::registry::{Helper, HelperRegistry};
use crate::runtime::{Block, Branch, EvalError};
use crate::value::{Capability, Map, Value};

/// Register every built-in helper
pub fn register(registry: &mut HelperRegistry) {
    registry.register("each", Each);
    registry.register("if", If);
    registry.register("unless", Unless);
    registry.register("with", With);
    registry.register("log", Log);
}

fn require_block<'b, 'a>(
    name: &str,
    block: Option<&'b mut Block<'a>>,
) -> Result<&'b mut Block<'a>, EvalError> {
    block.ok_or_else(|| EvalError::helper(name, "can only be used as a block"))
}

fn first_arg(args: &[Value]) -> Value {
    args.first().cloned().unwrap_or_default()
}

/// Iterates sequences and maps
///
/// Sequences expose `@index`, `@first` and `@last`; maps add `@key`.
/// Anything empty or not iterable renders the inverse.
struct Each;

impl Helper for Each {
    fn call(&self, args: &[Value], _hash: &Map, block: Option<&mut Block<'_>>) -> Result<Value, EvalError> {
        let block = require_block("each", block)?;
        let collection = first_arg(args);
        let mut output = String::new();

        match collection.capability() {
            Some(Capability::Map(map)) if !map.is_empty() => {
                let last = map.len() - 1;
                for (index, (key, value)) in map.iter().enumerate() {
                    let mut locals = loop_locals(index, last);
                    locals.insert("key".to_string(), Value::from(key.as_str()));
                    output.push_str(&block.render(Branch::Body, Some(value.clone()), Some(locals))?);
                }
            }
            Some(Capability::Sequence(items)) if !items.is_empty() => {
                let last = items.len() - 1;
                for (index, item) in items.iter().enumerate() {
                    let locals = loop_locals(index, last);
                    output.push_str(&block.render(Branch::Body, Some(item.clone()), Some(locals))?);
                }
            }
            _ => output = block.inverse()?,
        }

        Ok(Value::safe(output))
    }
}

fn loop_locals(index: usize, last: usize) -> Map {
    let mut locals = Map::new();
    locals.insert("index".to_string(), Value::from(index));
    locals.insert("first".to_string(), Value::Bool(index == 0));
    locals.insert("last".to_string(), Value::Bool(index == last));
    locals
}

struct If;

impl Helper for If {
    fn call(&self, args: &[Value], _hash: &Map, block: Option<&mut Block<'_>>) -> Result<Value, EvalError> {
        let block = require_block("if", block)?;
        let output = if first_arg(args).is_truthy() {
            block.body()?
        } else {
            block.inverse()?
        };
        Ok(Value::safe(output))
    }
}

struct Unless;

impl Helper for Unless {
    fn call(&self, args: &[Value], _hash: &Map, block: Option<&mut Block<'_>>) -> Result<Value, EvalError> {
        let block = require_block("unless", block)?;
        let output = if first_arg(args).is_truthy() {
            block.inverse()?
        } else {
            block.body()?
        };
        Ok(Value::safe(output))
    }
}

/// Renders the body with its argument as the context
struct With;

impl Helper for With {
    fn call(&self, args: &[Value], _hash: &Map, block: Option<&mut Block<'_>>) -> Result<Value, EvalError> {
        let block = require_block("with", block)?;
        let context = first_arg(args);
        let output = if context.is_truthy() {
            block.render(Branch::Body, Some(context), None)?
        } else {
            block.inverse()?
        };
        Ok(Value::safe(output))
    }
}

/// Writes its arguments to the `tempo::log` target and renders nothing
struct Log;

impl Helper for Log {
    fn call(&self, args: &[Value], _hash: &Map, _block: Option<&mut Block<'_>>) -> Result<Value, EvalError> {
        let message = args
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        info!(target: "tempo::log", "{}", message);
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all() {
        let mut registry = HelperRegistry::new();
        register(&mut registry);
        assert_eq!(registry.names(), vec!["each", "if", "log", "unless", "with"]);
    }

    #[test]
    fn test_block_helpers_require_a_block() {
        let mut registry = HelperRegistry::new();
        register(&mut registry);
        for name in ["each", "if", "unless", "with"] {
            let err = registry
                .get(name)
                .expect("Should be registered")
                .call(&[Value::Bool(true)], &Map::new(), None)
                .unwrap_err();
            assert!(matches!(err, EvalError::Helper { .. }), "{}", name);
        }
    }

    #[test]
    fn test_log_renders_nothing() {
        let out = Log
            .call(&[Value::from("hello"), Value::Int(2)], &Map::new(), None)
            .expect("Should log");
        assert_eq!(out, Value::Null);
    }
}
