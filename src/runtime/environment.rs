//! Context and local-variable stacks for one render call

use std::ops::{Deref, DerefMut};

use crate::runtime::EvalError;
use crate::value::{Map, Value};

/// Scoping state for a single render
///
/// Contexts (`this`) and local-variable frames (`@index`, `@key`, ...) live
/// on two independent stacks. Every push goes through a [`Scope`] guard
/// that pops again when dropped, so stacks stay balanced when evaluation
/// bails out with an error.
#[derive(Debug, Default)]
pub struct Environment {
    contexts: Vec<Value>,
    frames: Vec<Map>,
    partial_depth: usize,
}

impl Environment {
    /// Start with `context` as the root; non-empty `options` become the
    /// bottom local-variable frame
    pub fn new(context: Value, options: Map) -> Self {
        let frames = if options.is_empty() {
            Vec::new()
        } else {
            vec![options]
        };
        Self {
            contexts: vec![context],
            frames,
            partial_depth: 0,
        }
    }

    /// Current `this`
    pub fn context(&self) -> Option<&Value> {
        self.contexts.last()
    }

    /// Number of contexts on the stack
    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    /// Top context when only the first `depth` levels are considered
    pub fn context_at(&self, depth: usize) -> Option<&Value> {
        depth.checked_sub(1).and_then(|i| self.contexts.get(i))
    }

    /// Nearest local-variable frame
    pub fn locals(&self) -> Option<&Map> {
        self.frames.last()
    }

    /// `@name` reads only the nearest frame
    pub fn data(&self, name: &str) -> Value {
        self.locals()
            .and_then(|frame| frame.get(name))
            .cloned()
            .unwrap_or_default()
    }

    pub fn partial_depth(&self) -> usize {
        self.partial_depth
    }

    /// Push `locals` then `context`; both are popped when the guard drops
    pub fn scope(&mut self, context: Option<Value>, locals: Option<Map>) -> Scope<'_> {
        let locals = locals.map(|frame| self.frames.push(frame)).is_some();
        let context = context.map(|value| self.contexts.push(value)).is_some();
        Scope {
            env: self,
            context,
            locals,
            partial: false,
        }
    }

    /// Like [`Environment::scope`], also counting partial nesting
    pub fn partial_scope(
        &mut self,
        name: &str,
        context: Option<Value>,
        limit: usize,
    ) -> Result<Scope<'_>, EvalError> {
        if self.partial_depth >= limit {
            return Err(EvalError::PartialDepth {
                name: name.to_string(),
                limit,
            });
        }
        self.partial_depth += 1;
        let mut scope = self.scope(context, None);
        scope.partial = true;
        Ok(scope)
    }
}

/// Guard returned by [`Environment::scope`]
#[derive(Debug)]
pub struct Scope<'e> {
    env: &'e mut Environment,
    context: bool,
    locals: bool,
    partial: bool,
}

impl Deref for Scope<'_> {
    type Target = Environment;

    fn deref(&self) -> &Environment {
        self.env
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut Environment {
        self.env
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if self.context {
            self.env.contexts.pop();
        }
        if self.locals {
            self.env.frames.pop();
        }
        if self.partial {
            self.env.partial_depth -= 1;
        }
    }
}
