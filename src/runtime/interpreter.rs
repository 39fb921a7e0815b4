//! Tree-walking evaluator

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::error::Span;
use crate::parser::{parse, BlockExpression, Call, Callee, Expression, Hash, Node, Spanned, Template};
use crate::registry::{HelperRegistry, PartialRegistry, PartialTemplate};
use crate::runtime::{Environment, EvalError};
use crate::value::{Capability, Map, Value};

/// Which section of a block to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Branch {
    #[default]
    Body,
    Inverse,
}

/// Evaluates templates against an [`Environment`] using a fixed set of
/// registries
#[derive(Debug, Clone, Copy)]
pub struct Interpreter<'a> {
    helpers: &'a HelperRegistry,
    partials: &'a PartialRegistry,
    max_partial_depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        helpers: &'a HelperRegistry,
        partials: &'a PartialRegistry,
        max_partial_depth: usize,
    ) -> Self {
        Self {
            helpers,
            partials,
            max_partial_depth,
        }
    }

    /// Render every statement and concatenate the output
    pub fn render(&self, template: &Template, env: &mut Environment) -> Result<String, EvalError> {
        let mut output = String::new();
        for statement in &template.statements {
            output.push_str(&self.visit(statement, env)?.to_string());
        }
        Ok(output)
    }

    /// Evaluate one node
    ///
    /// Statement nodes evaluate to the text they render, marked safe so it
    /// is never escaped twice.
    pub fn visit(&self, node: &Spanned<Node>, env: &mut Environment) -> Result<Value, EvalError> {
        match &node.node {
            Node::Content(text) => Ok(Value::safe(text.as_str())),
            Node::Comment(_) => Ok(Value::Null),
            Node::Call(call) => self.resolve(call, &node.span, env),
            Node::Data(name) => Ok(env.data(name)),
            Node::Str(s) => Ok(Value::String(s.clone())),
            Node::Number(n) => Ok(Value::Int(*n)),
            Node::Boolean(b) => Ok(Value::Bool(*b)),
            Node::Partial(partial) => {
                self.visit_partial(&partial.name, partial.context.as_ref(), env)
            }
            Node::Expression(expr) => {
                let value = self.visit_expression(expr, env)?;
                Ok(Value::safe(value.to_escaped_string()))
            }
            Node::UnescapedExpression(expr) => {
                let value = self.visit_expression(expr, env)?;
                Ok(Value::safe(value.to_string()))
            }
            Node::Block(block) => self.visit_block(block, env).map(Value::safe),
        }
    }

    /// Walk a path from the current context
    ///
    /// Leading `..` segments step out one context each. `this` and `.` are
    /// only valid as the first segment. A helper named by the first segment
    /// is called with no arguments. Lookups through anything that cannot be
    /// addressed yield `Null` for the rest of the path.
    pub fn resolve(&self, call: &Call, span: &Span, env: &Environment) -> Result<Value, EvalError> {
        let mut depth = env.depth();
        let mut parent_allowed = true;
        let mut current: Cow<'_, Value> = match env.context() {
            Some(context) => Cow::Borrowed(context),
            None => Cow::Owned(Value::Null),
        };

        for (index, segment) in call.segments.iter().enumerate() {
            match segment.as_str() {
                "this" | "." => {
                    if index > 0 {
                        return Err(EvalError::NestedThis {
                            path: call.to_string(),
                            span: span.clone(),
                        });
                    }
                    parent_allowed = false;
                }
                ".." => {
                    if !parent_allowed {
                        return Err(EvalError::NestedParent {
                            path: call.to_string(),
                            span: span.clone(),
                        });
                    }
                    if depth == 0 {
                        return Err(EvalError::NoParentContext {
                            path: call.to_string(),
                            span: span.clone(),
                        });
                    }
                    depth -= 1;
                    current = match env.context_at(depth) {
                        Some(context) => Cow::Borrowed(context),
                        None => Cow::Owned(Value::Null),
                    };
                }
                name => {
                    parent_allowed = false;
                    let helper = if index == 0 { self.helpers.get(name) } else { None };
                    current = Cow::Owned(match helper {
                        Some(helper) => {
                            trace!(helper = name, "calling helper from path");
                            helper.call(&[], &Map::new(), None)?
                        }
                        None => current.lookup(name),
                    });
                }
            }
        }

        Ok(current.into_owned())
    }

    fn eval_params(&self, params: &[Spanned<Node>], env: &mut Environment) -> Result<Vec<Value>, EvalError> {
        params.iter().map(|param| self.visit(param, env)).collect()
    }

    fn eval_hash(&self, hash: Option<&Hash>, env: &mut Environment) -> Result<Map, EvalError> {
        let mut options = Map::new();
        if let Some(hash) = hash {
            for (key, value) in &hash.pairs {
                options.insert(key.clone(), self.visit(value, env)?);
            }
        }
        Ok(options)
    }

    /// A single-segment path naming a helper calls it; otherwise resolve
    fn visit_expression(&self, expr: &Expression, env: &mut Environment) -> Result<Value, EvalError> {
        let args = self.eval_params(&expr.params, env)?;
        let options = self.eval_hash(expr.hash.as_ref(), env)?;

        match &expr.path.node {
            Callee::Data(name) => Ok(env.data(name)),
            Callee::Call(call) => match call.single().and_then(|name| self.helpers.get(name)) {
                Some(helper) => {
                    trace!(helper = %call, args = args.len(), "calling helper");
                    helper.call(&args, &options, None)
                }
                None => self.resolve(call, &expr.path.span, env),
            },
        }
    }

    fn visit_block(&self, block: &BlockExpression, env: &mut Environment) -> Result<String, EvalError> {
        let args = self.eval_params(&block.params, env)?;
        let options = self.eval_hash(block.hash.as_ref(), env)?;
        let path = &block.path;

        if let Some(helper) = path.node.single().and_then(|name| self.helpers.get(name)) {
            trace!(helper = %path.node, args = args.len(), "calling block helper");
            let mut callback = Block::new(self, env, block);
            return helper.call(&args, &options, Some(&mut callback)).map(|v| v.to_string());
        }

        let conditional = self.resolve(&path.node, &path.span, env)?;
        match conditional.capability() {
            Some(Capability::Sequence(items)) if !items.is_empty() => {
                let mut output = String::new();
                for (index, item) in items.iter().enumerate() {
                    let mut frame = Map::new();
                    frame.insert("index".to_string(), Value::from(index));
                    let mut scope = env.scope(Some(item.clone()), Some(frame));
                    output.push_str(&self.render(&block.body, &mut scope)?);
                }
                Ok(output)
            }
            _ if conditional.is_truthy() => {
                let mut scope = env.scope(Some(conditional.clone()), None);
                self.render(&block.body, &mut scope)
            }
            _ => match &block.inverse {
                Some(inverse) => self.render(inverse, env),
                None => Ok(String::new()),
            },
        }
    }

    fn visit_partial(
        &self,
        name: &str,
        context: Option<&Spanned<Call>>,
        env: &mut Environment,
    ) -> Result<Value, EvalError> {
        let Some(partial) = self.partials.get(name) else {
            debug!(partial = name, "missing partial");
            return Ok(Value::safe(format!("Missing partial '{}'", name)));
        };

        let context = match context {
            Some(call) => Some(self.resolve(&call.node, &call.span, env)?),
            None => None,
        };

        let template = match partial {
            PartialTemplate::Parsed(template) => Cow::Borrowed(template.as_ref()),
            PartialTemplate::Source(source) => {
                Cow::Owned(parse(source).map_err(|errors| EvalError::PartialSyntax {
                    name: name.to_string(),
                    errors,
                })?)
            }
        };

        trace!(partial = name, depth = env.partial_depth(), "rendering partial");
        let mut scope = env.partial_scope(name, context, self.max_partial_depth)?;
        self.render(&template, &mut scope).map(Value::safe)
    }
}

/// Render callback handed to block helpers
///
/// Each call pushes the optional locals and context, renders the chosen
/// section, and pops them again before returning.
pub struct Block<'a> {
    interpreter: &'a Interpreter<'a>,
    env: &'a mut Environment,
    node: &'a BlockExpression,
}

impl<'a> Block<'a> {
    fn new(interpreter: &'a Interpreter<'a>, env: &'a mut Environment, node: &'a BlockExpression) -> Self {
        Self {
            interpreter,
            env,
            node,
        }
    }

    pub fn render(
        &mut self,
        branch: Branch,
        context: Option<Value>,
        locals: Option<Map>,
    ) -> Result<String, EvalError> {
        let template = match branch {
            Branch::Body => Some(&self.node.body),
            Branch::Inverse => self.node.inverse.as_ref(),
        };
        let Some(template) = template else {
            return Ok(String::new());
        };
        let mut scope = self.env.scope(context, locals);
        self.interpreter.render(template, &mut scope)
    }

    /// Render the main section in the current context
    pub fn body(&mut self) -> Result<String, EvalError> {
        self.render(Branch::Body, None, None)
    }

    /// Render the `{{else}}` section in the current context
    pub fn inverse(&mut self) -> Result<String, EvalError> {
        self.render(Branch::Inverse, None, None)
    }

    pub fn has_inverse(&self) -> bool {
        self.node.inverse.is_some()
    }

    /// Read-only view of the scoping state, for helpers that inspect it
    pub fn env(&self) -> &Environment {
        self.env
    }
}

impl std::fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("path", &self.node.path.node)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn resolve_path(segments: &[&str], env: &Environment) -> Result<Value, EvalError> {
        let helpers = HelperRegistry::new();
        let partials = PartialRegistry::new();
        let interpreter = Interpreter::new(&helpers, &partials, 8);
        interpreter.resolve(&Call::new(segments.iter().copied()), &(0..0), env)
    }

    #[test]
    fn test_resolve_nested_lookup() {
        let env = Environment::new(json!({"a": {"b": "c"}}).into(), Map::new());
        assert_eq!(resolve_path(&["a", "b"], &env).expect("Should resolve"), Value::from("c"));
        assert_eq!(resolve_path(&["a", "x", "y"], &env).expect("Should resolve"), Value::Null);
    }

    #[test]
    fn test_resolve_this() {
        let env = Environment::new(Value::from("self"), Map::new());
        assert_eq!(resolve_path(&["this"], &env).expect("Should resolve"), Value::from("self"));
        assert_eq!(resolve_path(&["."], &env).expect("Should resolve"), Value::from("self"));
    }

    #[test]
    fn test_resolve_parent_after_push() {
        let mut env = Environment::new(json!({"a": "outer"}).into(), Map::new());
        let scope = env.scope(Some(json!({"a": "inner"}).into()), None);
        assert_eq!(resolve_path(&["..", "a"], &scope).expect("Should resolve"), Value::from("outer"));
        assert_eq!(resolve_path(&["a"], &scope).expect("Should resolve"), Value::from("inner"));
    }

    #[test]
    fn test_resolve_parent_after_this_is_error() {
        let env = Environment::new(json!({"a": 1}).into(), Map::new());
        let err = resolve_path(&["this", "..", "a"], &env).unwrap_err();
        assert!(matches!(err, EvalError::NestedParent { .. }));
    }

    #[test]
    fn test_resolve_parent_after_lookup_is_error() {
        let env = Environment::new(json!({"a": {}}).into(), Map::new());
        let err = resolve_path(&["a", ".."], &env).unwrap_err();
        assert!(matches!(err, EvalError::NestedParent { .. }));
    }

    #[test]
    fn test_resolve_nested_this_is_error() {
        let env = Environment::new(json!({"a": {}}).into(), Map::new());
        let err = resolve_path(&["a", "this"], &env).unwrap_err();
        assert!(matches!(err, EvalError::NestedThis { .. }));
    }

    #[test]
    fn test_resolve_above_root_is_empty() {
        let env = Environment::new(json!({"a": 1}).into(), Map::new());
        assert_eq!(resolve_path(&["..", "a"], &env).expect("Should resolve"), Value::Null);
        let err = resolve_path(&["..", "..", "a"], &env).unwrap_err();
        assert!(matches!(err, EvalError::NoParentContext { .. }));
    }

    #[test]
    fn test_resolve_does_not_touch_environment() {
        let mut env = Environment::new(json!({"a": 1}).into(), Map::new());
        let scope = env.scope(Some(json!({"b": 2}).into()), None);
        resolve_path(&["..", "a"], &scope).expect("Should resolve");
        assert_eq!(scope.depth(), 2);
    }
}
