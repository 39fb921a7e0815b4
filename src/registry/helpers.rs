//! Helper trait and the name-keyed helper table

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::runtime::{Block, EvalError};
use crate::value::{Map, Value};

/// A named function callable from templates
///
/// `block` is `Some` when the helper opens a block section (`{{#name}}`),
/// giving it control over which section renders and in what scope.
pub trait Helper: Send + Sync {
    fn call(&self, args: &[Value], hash: &Map, block: Option<&mut Block<'_>>) -> Result<Value, EvalError>;
}

/// Adapts a plain closure into a [`Helper`]; any block is ignored
pub struct FnHelper<F>(pub F);

impl<F> Helper for FnHelper<F>
where
    F: Fn(&[Value], &Map) -> Result<Value, EvalError> + Send + Sync,
{
    fn call(&self, args: &[Value], hash: &Map, _block: Option<&mut Block<'_>>) -> Result<Value, EvalError> {
        (self.0)(args, hash)
    }
}

/// Adapts a closure that needs the block callback into a [`Helper`]
pub struct BlockFnHelper<F> {
    name: String,
    f: F,
}

impl<F> BlockFnHelper<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> Helper for BlockFnHelper<F>
where
    F: for<'b> Fn(&[Value], &Map, &mut Block<'b>) -> Result<Value, EvalError> + Send + Sync,
{
    fn call(&self, args: &[Value], hash: &Map, block: Option<&mut Block<'_>>) -> Result<Value, EvalError> {
        match block {
            Some(block) => (self.f)(args, hash, block),
            None => Err(EvalError::helper(&self.name, "can only be used as a block")),
        }
    }
}

/// Registry of helpers by exact name
#[derive(Clone, Default)]
pub struct HelperRegistry {
    helpers: HashMap<String, Arc<dyn Helper>>,
}

impl HelperRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a helper, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, helper: impl Helper + 'static) {
        self.helpers.insert(name.into(), Arc::new(helper));
    }

    /// Register a closure taking positional arguments and hash options
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value], &Map) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.register(name, FnHelper(f));
    }

    /// Register a closure that renders through the block callback
    pub fn register_block_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: for<'b> Fn(&[Value], &Map, &mut Block<'b>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.register(name.clone(), BlockFnHelper::new(name, f));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Helper>> {
        self.helpers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.helpers.remove(name).is_some()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.helpers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("helpers", &self.names())
            .finish()
    }
}
