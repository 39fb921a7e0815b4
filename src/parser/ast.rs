//! Abstract Syntax Tree types for templates

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Root AST node - a parsed template
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub statements: Vec<Spanned<Node>>,
}

impl Template {
    pub fn new(statements: Vec<Spanned<Node>>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Every node the parser can produce
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal passthrough text
    Content(String),
    /// Comment body, kept in the tree but rendered as nothing
    Comment(String),
    /// Identifier path: `foo`, `foo.bar`, `../foo`, `this`
    Call(Call),
    /// Local variable reference: `@index`
    Data(String),
    Str(String),
    Number(i64),
    Boolean(bool),
    /// `{{> name context}}`
    Partial(Partial),
    /// `{{path params hash}}`, output is HTML-escaped
    Expression(Expression),
    /// `{{{...}}}` or `{{&...}}`
    UnescapedExpression(Expression),
    /// `{{#path}}...{{else}}...{{/path}}`
    Block(BlockExpression),
}

/// A dotted or slashed identifier path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    pub segments: Vec<String>,
}

impl Call {
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Single-segment paths are candidates for helper dispatch
    pub fn single(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Ordered `key=value` arguments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hash {
    pub pairs: Vec<(String, Spanned<Node>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub name: String,
    pub context: Option<Spanned<Call>>,
}

/// What an expression calls: a path or a bare `@name`
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Call(Call),
    Data(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub path: Spanned<Callee>,
    pub params: Vec<Spanned<Node>>,
    pub hash: Option<Hash>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockExpression {
    pub path: Spanned<Call>,
    pub params: Vec<Spanned<Node>>,
    pub hash: Option<Hash>,
    pub body: Template,
    pub inverse: Option<Template>,
}
