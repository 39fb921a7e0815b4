//! Tempo - a logic-less Mustache/Handlebars-style template engine
//!
//! Templates are lexed and parsed into an AST, then evaluated by a
//! tree-walking interpreter against a data context. Named helpers and
//! partials extend the language without adding logic to templates.
//!
//! # Example
//!
//! ```rust
//! use tempo::render;
//! use serde_json::json;
//!
//! let out = render("Hello {{name}}!", json!({"name": "<World>"})).unwrap();
//! assert_eq!(out, "Hello &lt;World&gt;!");
//! ```

pub mod builtins;
pub mod config;
pub mod error;
pub mod parser;
pub mod registry;
pub mod runtime;
pub mod value;

pub use config::{ConfigError, EngineConfig};
pub use error::ParseError;
pub use parser::{parse, Template};
pub use registry::{Helper, HelperRegistry, PartialRegistry, PartialTemplate, RegistryError};
pub use runtime::{Block, Branch, Environment, EvalError};
pub use value::{Map, Object, SafeString, Value};

use thiserror::Error;
use tracing::trace;

use runtime::Interpreter;

/// Errors that can occur during a render call
#[derive(Debug, Error)]
pub enum RenderError {
    /// Lexical or syntax errors in the template
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// Error during evaluation
    #[error("render error: {0}")]
    Eval(#[from] EvalError),
}

impl From<Vec<ParseError>> for RenderError {
    fn from(errors: Vec<ParseError>) -> Self {
        RenderError::Parse(errors)
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Helpers, partials and configuration shared by every render
///
/// An engine is immutable while rendering; register helpers and partials
/// up front, then render from as many threads as needed.
#[derive(Debug, Clone)]
pub struct Engine {
    helpers: HelperRegistry,
    partials: PartialRegistry,
    config: EngineConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with the built-in helpers registered
    pub fn new() -> Self {
        let mut engine = Self::empty();
        builtins::register(&mut engine.helpers);
        engine
    }

    /// Create an engine with no helpers or partials
    pub fn empty() -> Self {
        Self {
            helpers: HelperRegistry::new(),
            partials: PartialRegistry::new(),
            config: EngineConfig::default(),
        }
    }

    /// Create an engine with built-ins, loading partials from the
    /// configured directory if one is set
    pub fn from_config(config: EngineConfig) -> Result<Self, RegistryError> {
        let mut engine = Self::new().with_config(config);
        if let Some(dir) = engine.config.partials.directory.clone() {
            let extension = engine.config.partials.extension.clone();
            engine.partials.load_directory(&dir, &extension)?;
        }
        Ok(engine)
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    pub fn helpers_mut(&mut self) -> &mut HelperRegistry {
        &mut self.helpers
    }

    pub fn partials(&self) -> &PartialRegistry {
        &self.partials
    }

    pub fn partials_mut(&mut self) -> &mut PartialRegistry {
        &mut self.partials
    }

    /// Register a helper, replacing any previous one with the same name
    pub fn register_helper(&mut self, name: impl Into<String>, helper: impl Helper + 'static) {
        self.helpers.register(name, helper);
    }

    /// Register a partial, replacing any previous one with the same name
    pub fn register_partial(&mut self, name: impl Into<String>, partial: impl Into<PartialTemplate>) {
        self.partials.register(name, partial);
    }

    /// Parse and render `source` against `context`
    ///
    /// # Example
    ///
    /// ```rust
    /// use tempo::Engine;
    /// use serde_json::json;
    ///
    /// let engine = Engine::new();
    /// let out = engine
    ///     .render("{{#each items}}{{@index}}:{{this}} {{/each}}", json!({"items": ["a", "b"]}))
    ///     .unwrap();
    /// assert_eq!(out, "0:a 1:b ");
    /// ```
    pub fn render(&self, source: &str, context: impl Into<Value>) -> Result<String, RenderError> {
        self.render_with_options(source, context, Map::new())
    }

    /// Render with `options` readable as `@name` outside any block
    pub fn render_with_options(
        &self,
        source: &str,
        context: impl Into<Value>,
        options: Map,
    ) -> Result<String, RenderError> {
        let template = parse(source)?;
        self.render_template_with_options(&template, context, options)
    }

    /// Render a template parsed ahead of time
    pub fn render_template(&self, template: &Template, context: impl Into<Value>) -> Result<String, RenderError> {
        self.render_template_with_options(template, context, Map::new())
    }

    pub fn render_template_with_options(
        &self,
        template: &Template,
        context: impl Into<Value>,
        options: Map,
    ) -> Result<String, RenderError> {
        trace!(statements = template.statements.len(), "rendering template");
        let mut env = Environment::new(context.into(), options);
        let interpreter = Interpreter::new(&self.helpers, &self.partials, self.config.max_partial_depth);
        Ok(interpreter.render(template, &mut env)?)
    }
}

/// Render `source` with a fresh default engine
///
/// Use an [`Engine`] directly to register helpers or partials, or to avoid
/// rebuilding the built-in helper table on every call.
pub fn render(source: &str, context: impl Into<Value>) -> Result<String, RenderError> {
    Engine::new().render(source, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_render_simple() {
        let out = render("Hi {{name}}", json!({"name": "Ada"})).unwrap();
        assert_eq!(out, "Hi Ada");
    }

    #[test]
    fn test_render_parse_error() {
        let err = render("{{#a}}", Value::Null).unwrap_err();
        assert!(matches!(err, RenderError::Parse(_)));
    }

    #[test]
    fn test_render_eval_error() {
        let err = render("{{a/this}}", json!({"a": {}})).unwrap_err();
        assert!(matches!(err, RenderError::Eval(EvalError::NestedThis { .. })));
    }

    #[test]
    fn test_empty_engine_has_no_helpers() {
        let engine = Engine::empty();
        assert!(engine.helpers().is_empty());
        let out = engine.render("{{#if x}}yes{{/if}}", json!({"if": false, "x": true})).unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_render_with_options() {
        let mut options = Map::new();
        options.insert("site".to_string(), Value::from("docs"));
        let out = Engine::new()
            .render_with_options("{{@site}}", Value::Null, options)
            .unwrap();
        assert_eq!(out, "docs");
    }

    #[test]
    fn test_render_pre_parsed() {
        let template = parse("{{x}}").unwrap();
        let engine = Engine::new();
        assert_eq!(engine.render_template(&template, json!({"x": 1})).unwrap(), "1");
        assert_eq!(engine.render_template(&template, json!({"x": 2})).unwrap(), "2");
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}
