//! Lexer for template source
//!
//! Template text is scanned with a small stack of modes. Literal text,
//! escaped tags and comments are handled by hand; the inside of a tag is
//! tokenized by a `logos` lexer that runs until the closing braces.

use logos::Logos;

use crate::error::ParseError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// Literal text between tags
    Content(String),
    /// Body of a `{{! }}` or `{{!-- --}}` comment
    Comment(String),
    /// `{{`
    Open,
    /// `{{{`
    OpenUnescaped,
    /// `{{&`
    OpenUnescapedAmp,
    /// `{{#`
    OpenBlock,
    /// `{{^` or `{{else`
    OpenInverse,
    /// `{{/`
    OpenEndBlock,
    /// `{{>`
    OpenPartial,
    /// `}}`
    Close,
    /// `}}}`
    CloseUnescaped,
    Id(String),
    /// Path separator, `.` or `/`
    Sep(char),
    Str(String),
    Number(String),
    Boolean(bool),
    Equals,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Default,
    Expression,
    Escaped,
    Comment,
}

/// Tokens recognized inside an open tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
enum ExprToken {
    #[token("}}}")]
    CloseUnescaped,

    #[token("}}")]
    Close,

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice(), '"'))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| unquote(lex.slice(), '\''))]
    Str(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().to_string(), priority = 3)]
    Number(String),

    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Boolean(bool),

    #[regex(r##"[^\s!"#%-,\./;->@\[-\^`\{-~]+"##, identifier, priority = 1)]
    Id(String),

    #[regex(r"\[[^\]]+\]", |lex| { let s = lex.slice(); s[1..s.len() - 1].to_string() })]
    Bracketed(String),

    #[regex(r"\.\.?", dots)]
    Dots(Token),

    #[token("/")]
    Slash,

    #[token("=")]
    Equals,

    #[token("@")]
    Data,
}

fn unquote(slice: &str, quote: char) -> String {
    let inner = &slice[1..slice.len() - 1];
    inner.replace(&format!("\\{}", quote), &quote.to_string())
}

/// Identifiers end right before `=`, `}`, `/`, `.` or whitespace
fn identifier(lex: &mut logos::Lexer<ExprToken>) -> Option<String> {
    match lex.remainder().chars().next() {
        None => Some(lex.slice().to_string()),
        Some(c) if c.is_whitespace() || matches!(c, '=' | '}' | '/' | '.') => {
            Some(lex.slice().to_string())
        }
        Some(_) => None,
    }
}

/// `.` and `..` directly before a separator or closer are self/parent segments
fn dots(lex: &mut logos::Lexer<ExprToken>) -> Option<Token> {
    let navigates = matches!(lex.remainder().chars().next(), Some('}' | '/' | '|'));
    match (lex.slice(), navigates) {
        (slice, true) => Some(Token::Id(slice.to_string())),
        (".", false) => Some(Token::Sep('.')),
        _ => None,
    }
}

impl From<ExprToken> for Token {
    fn from(tok: ExprToken) -> Self {
        match tok {
            ExprToken::CloseUnescaped => Token::CloseUnescaped,
            ExprToken::Close => Token::Close,
            ExprToken::Str(s) => Token::Str(s),
            ExprToken::Number(n) => Token::Number(n),
            ExprToken::Boolean(b) => Token::Boolean(b),
            ExprToken::Id(s) | ExprToken::Bracketed(s) => Token::Id(s),
            ExprToken::Dots(t) => t,
            ExprToken::Slash => Token::Sep('/'),
            ExprToken::Equals => Token::Equals,
            ExprToken::Data => Token::Data,
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    modes: Vec<Mode>,
    /// Start of the tag currently being lexed, for error spans
    tag_start: usize,
    tokens: Vec<(Token, Span)>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            modes: vec![Mode::Default],
            tag_start: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<(Token, Span)>, ParseError> {
        while self.pos < self.input.len() {
            match self.modes.last().copied().unwrap_or(Mode::Default) {
                Mode::Default => self.lex_default(),
                Mode::Expression => self.lex_expression()?,
                Mode::Escaped => self.lex_escaped(),
                Mode::Comment => self.lex_comment()?,
            }
        }

        match self.modes.last() {
            Some(Mode::Expression) => Err(ParseError::lexical(
                self.tag_start..self.input.len(),
                "Unterminated tag: expected '}}' before end of input",
            )),
            Some(Mode::Comment) => Err(ParseError::lexical(
                self.tag_start..self.input.len(),
                "Unterminated comment: expected '--}}' before end of input",
            )),
            _ => Ok(self.tokens),
        }
    }

    fn emit(&mut self, token: Token, span: Span) {
        self.tokens.push((token, span));
    }

    fn emit_content(&mut self, text: &str, start: usize) {
        if !text.is_empty() {
            self.emit(Token::Content(text.to_string()), start..start + text.len());
        }
    }

    fn lex_default(&mut self) {
        let rest = &self.input[self.pos..];
        let Some(offset) = rest.find("{{") else {
            self.emit_content(rest, self.pos);
            self.pos = self.input.len();
            return;
        };

        let start = self.pos;
        let text = &rest[..offset];
        self.pos += offset;

        if text.ends_with("\\\\") {
            self.emit_content(&text[..text.len() - 1], start);
            self.open_tag();
        } else if let Some(stripped) = text.strip_suffix('\\') {
            self.emit_content(stripped, start);
            self.modes.push(Mode::Escaped);
        } else {
            self.emit_content(text, start);
            self.open_tag();
        }
    }

    /// Classify the opener at `self.pos` and switch to the matching mode
    fn open_tag(&mut self) {
        let start = self.pos;
        let rest = &self.input[start..];
        self.tag_start = start;

        if rest.starts_with("{{!--") {
            self.pos += 5;
            self.modes.push(Mode::Comment);
            return;
        }
        if rest.starts_with("{{!") {
            self.pos += 3;
            self.lex_inline_comment(start);
            return;
        }

        let (token, len) = if rest.starts_with("{{{") {
            (Token::OpenUnescaped, 3)
        } else if rest.starts_with("{{&") {
            (Token::OpenUnescapedAmp, 3)
        } else if rest.starts_with("{{#") {
            (Token::OpenBlock, 3)
        } else if rest.starts_with("{{/") {
            (Token::OpenEndBlock, 3)
        } else if rest.starts_with("{{^") {
            (Token::OpenInverse, 3)
        } else if rest.starts_with("{{>") {
            (Token::OpenPartial, 3)
        } else if let Some(len) = else_opener(rest) {
            (Token::OpenInverse, len)
        } else {
            (Token::Open, 2)
        };

        self.pos += len;
        self.emit(token, start..start + len);
        self.modes.push(Mode::Expression);
    }

    fn lex_inline_comment(&mut self, start: usize) {
        let rest = &self.input[self.pos..];
        match rest.find("}}") {
            Some(end) if !rest.starts_with('-') => {
                self.emit(
                    Token::Comment(rest[..end].to_string()),
                    start..self.pos + end + 2,
                );
                self.pos += end + 2;
            }
            // Leave the opener in expression mode so the tag is reported
            _ => {
                self.pos = start + 2;
                self.modes.push(Mode::Expression);
            }
        }
    }

    fn lex_comment(&mut self) -> Result<(), ParseError> {
        let rest = &self.input[self.pos..];
        let end = rest.find("--}}").ok_or_else(|| {
            ParseError::lexical(
                self.tag_start..self.input.len(),
                "Unterminated comment: expected '--}}' before end of input",
            )
        })?;
        let body = rest[..end].to_string();
        let span = self.tag_start..self.pos + end + 4;
        self.pos += end + 4;
        self.emit(Token::Comment(body), span);
        self.modes.pop();
        Ok(())
    }

    /// Emit an escaped tag verbatim up to the next opener
    fn lex_escaped(&mut self) {
        let start = self.pos;
        let rest = &self.input[start..];
        let end = rest
            .get(2..)
            .and_then(|after| after.find("{{"))
            .map(|offset| offset + 2)
            .unwrap_or(rest.len());
        let chunk = &rest[..end];
        self.pos += end;

        if let Some(stripped) = chunk.strip_suffix('\\') {
            self.emit_content(stripped, start);
        } else {
            self.emit_content(chunk, start);
            self.modes.pop();
        }
    }

    fn lex_expression(&mut self) -> Result<(), ParseError> {
        let base = self.pos;
        let mut lexer = ExprToken::lexer(&self.input[base..]);

        while let Some(result) = lexer.next() {
            let span = base + lexer.span().start..base + lexer.span().end;
            let tok = result.map_err(|_| {
                ParseError::lexical(
                    span.clone(),
                    format!("Unexpected character sequence '{}' in tag", lexer.slice()),
                )
            })?;

            let closes = matches!(tok, ExprToken::Close | ExprToken::CloseUnescaped);
            self.emit(tok.into(), span.clone());
            if closes {
                self.pos = span.end;
                self.modes.pop();
                return Ok(());
            }
        }

        Err(ParseError::lexical(
            self.tag_start..self.input.len(),
            "Unterminated tag: expected '}}' before end of input",
        ))
    }
}

/// Length of a `{{else` opener, which must be followed by whitespace or `}`
fn else_opener(rest: &str) -> Option<usize> {
    let after_braces = &rest[2..];
    let trimmed = after_braces.trim_start();
    let ws = after_braces.len() - trimmed.len();
    let tail = trimmed.strip_prefix("else")?;
    match tail.chars().next() {
        Some(c) if c.is_whitespace() || c == '}' => Some(2 + ws + 4),
        _ => None,
    }
}

/// Lex template source into tokens with spans
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    Lexer::new(input).run()
}
