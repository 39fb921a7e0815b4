//! Error types for lexing and parsing templates

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Malformed or unterminated tag
    #[error("Lexical error at {span:?}: {message}")]
    Lexical { span: Span, message: String },

    /// Grammar violation, including mismatched block close tags
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    pub fn lexical(span: Span, message: impl Into<String>) -> Self {
        ParseError::Lexical {
            span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ParseError::Lexical { span, .. } | ParseError::Syntax { span, .. } => span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::Lexical { message, .. } | ParseError::Syntax { message, .. } => message,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let (span, label) = match self {
            ParseError::Lexical { span, message } => (span, message.clone()),
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                if expected.is_empty() {
                    (span, message.clone())
                } else {
                    (span, format!("{}\nExpected: {}", message, expected.join(", ")))
                }
            }
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.message())
            .with_label(
                Label::new((filename, span.clone()))
                    .with_message(label)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::{RichPattern, RichReason};

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("Unexpected {}", format_token(tok)),
                None => "Unexpected end of input".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                RichPattern::Token(tok) => Some(format_token(tok)),
                RichPattern::Label(label) => Some(label.to_string()),
                RichPattern::EndOfInput => Some("end of input".to_string()),
                RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                RichPattern::Any => Some("any token".to_string()),
                RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Content(_) => "text".to_string(),
        Token::Comment(_) => "comment".to_string(),
        Token::Open => "'{{'".to_string(),
        Token::OpenUnescaped => "'{{{'".to_string(),
        Token::OpenUnescapedAmp => "'{{&'".to_string(),
        Token::OpenBlock => "'{{#'".to_string(),
        Token::OpenInverse => "'{{^'".to_string(),
        Token::OpenEndBlock => "'{{/'".to_string(),
        Token::OpenPartial => "'{{>'".to_string(),
        Token::Close => "'}}'".to_string(),
        Token::CloseUnescaped => "'}}}'".to_string(),
        Token::Id(s) => format!("identifier '{}'", s),
        Token::Sep(c) => format!("'{}'", c),
        Token::Str(s) => format!("string \"{}\"", s),
        Token::Number(n) => format!("number {}", n),
        Token::Boolean(b) => format!("boolean {}", b),
        Token::Equals => "'='".to_string(),
        Token::Data => "'@'".to_string(),
    }
}
