//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// A single argument inside a tag, before params and hash are separated
#[derive(Debug, Clone)]
enum Arg {
    Param(Spanned<Node>),
    Pair(String, Spanned<Node>),
}

/// Parse template source into an AST
pub fn parse(input: &str) -> Result<Template, Vec<crate::ParseError>> {
    let len = input.len();

    let tokens = crate::parser::lexer::lex(input).map_err(|e| vec![e])?;
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// A leading `this` is dropped unless it is the whole path
fn normalize_path(mut segments: Vec<String>) -> Call {
    if segments.len() > 1 && segments[0] == "this" {
        segments.remove(0);
    }
    Call { segments }
}

/// Positional params must all come before the first `key=value` pair
fn split_args<'a>(
    args: Vec<Arg>,
    span: SimpleSpan,
) -> Result<(Vec<Spanned<Node>>, Option<Hash>), Rich<'a, Token>> {
    let mut params = Vec::new();
    let mut hash: Option<Hash> = None;

    for arg in args {
        match arg {
            Arg::Param(param) => {
                if hash.is_some() {
                    return Err(Rich::custom(
                        span,
                        "Positional arguments must come before hash arguments",
                    ));
                }
                params.push(param);
            }
            Arg::Pair(key, value) => {
                let pairs = &mut hash.get_or_insert_with(Hash::default).pairs;
                if pairs.iter().any(|(existing, _)| *existing == key) {
                    return Err(Rich::custom(span, format!("Duplicate hash key '{}'", key)));
                }
                pairs.push((key, value));
            }
        }
    }

    Ok((params, hash))
}

fn check_close<'a>(
    open: &Spanned<Call>,
    close: &Spanned<Call>,
    span: SimpleSpan,
) -> Result<(), Rich<'a, Token>> {
    if open.node.segments == close.node.segments {
        Ok(())
    } else {
        Err(Rich::custom(
            span,
            format!("'{}' doesn't match '{}'", open.node, close.node),
        ))
    }
}

fn template_parser<'a, I>() -> impl Parser<'a, I, Template, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let id = select! { Token::Id(s) => s };
    let sep = select! { Token::Sep(c) => c };

    let path = id
        .clone()
        .separated_by(sep.clone())
        .at_least(1)
        .collect::<Vec<_>>()
        .map(normalize_path)
        .map_with(|call, e| Spanned::new(call, span_range(&e.span())));

    let data_ref = just(Token::Data).ignore_then(id.clone());

    let number = select! { Token::Number(n) => n }.try_map(|n: String, span: SimpleSpan| {
        n.parse::<i64>()
            .map(Node::Number)
            .map_err(|_| Rich::custom(span, format!("Number literal '{}' is out of range", n)))
    });

    let param = choice((
        path.clone().map(|p| Node::Call(p.node)),
        select! {
            Token::Str(s) => Node::Str(s),
            Token::Boolean(b) => Node::Boolean(b),
        },
        number,
        data_ref.clone().map(Node::Data),
    ))
    .map_with(|node, e| Spanned::new(node, span_range(&e.span())));

    let pair = id
        .clone()
        .then_ignore(just(Token::Equals))
        .then(param.clone())
        .map(|(key, value)| Arg::Pair(key, value));

    let args = choice((pair, param.map(Arg::Param)))
        .repeated()
        .collect::<Vec<_>>()
        .try_map(|args, span: SimpleSpan| split_args(args, span));

    // `path param* hash?` or a bare `@name`
    let expression_contents = choice((
        data_ref.map_with(|name, e| Expression {
            path: Spanned::new(Callee::Data(name), span_range(&e.span())),
            params: Vec::new(),
            hash: None,
        }),
        path.clone().then(args.clone()).map(|(path, (params, hash))| Expression {
            path: Spanned::new(Callee::Call(path.node), path.span),
            params,
            hash,
        }),
    ));

    let expression = choice((
        just(Token::Open)
            .ignore_then(expression_contents.clone())
            .then_ignore(just(Token::Close))
            .map(Node::Expression),
        just(Token::OpenUnescapedAmp)
            .ignore_then(expression_contents.clone())
            .then_ignore(just(Token::Close))
            .map(Node::UnescapedExpression),
        just(Token::OpenUnescaped)
            .ignore_then(expression_contents)
            .then_ignore(just(Token::CloseUnescaped))
            .map(Node::UnescapedExpression),
    ));

    // Dotted names are joined back together with their separators
    let partial_name = choice((
        id.clone().then(sep.then(id).repeated().collect::<Vec<_>>())
            .map(|(first, rest)| {
                rest.into_iter().fold(first, |mut name, (c, segment)| {
                    name.push(c);
                    name.push_str(&segment);
                    name
                })
            }),
        select! {
            Token::Str(s) => s,
            Token::Number(n) => n,
        },
    ));

    let partial = just(Token::OpenPartial)
        .ignore_then(partial_name)
        .then(path.clone().or_not())
        .then_ignore(just(Token::Close))
        .map(|(name, context)| Node::Partial(Partial { name, context }));

    let text = select! {
        Token::Content(s) => Node::Content(s),
        Token::Comment(s) => Node::Comment(s),
    };

    let close_block = just(Token::OpenEndBlock)
        .ignore_then(path.clone())
        .then_ignore(just(Token::Close));

    let simple_inverse = just(Token::OpenInverse).then(just(Token::Close)).ignored();

    let template = recursive(|template| {
        // body, then an optional `{{else}}` section
        let contents = template
            .clone()
            .then(simple_inverse.ignore_then(template.clone()).or_not());

        let block = just(Token::OpenBlock)
            .ignore_then(path.clone())
            .then(args.clone())
            .then_ignore(just(Token::Close))
            .then(contents.clone())
            .then(close_block.clone())
            .try_map(|(((path, (params, hash)), (body, inverse)), close), span: SimpleSpan| {
                check_close(&path, &close, span)?;
                Ok(Node::Block(BlockExpression {
                    path,
                    params,
                    hash,
                    body,
                    inverse,
                }))
            });

        // `{{^foo}}A{{else}}B{{/foo}}` renders A when foo is falsy
        let inverse_block = just(Token::OpenInverse)
            .ignore_then(path.clone())
            .then(args.clone())
            .then_ignore(just(Token::Close))
            .then(contents)
            .then(close_block.clone())
            .try_map(|(((path, (params, hash)), (body, inverse)), close), span: SimpleSpan| {
                check_close(&path, &close, span)?;
                Ok(Node::Block(BlockExpression {
                    path,
                    params,
                    hash,
                    body: inverse.unwrap_or_default(),
                    inverse: Some(body),
                }))
            });

        choice((block, inverse_block, expression, partial, text))
            .map_with(|node, e| Spanned::new(node, span_range(&e.span())))
            .boxed()
            .repeated()
            .collect::<Vec<_>>()
            .map(Template::new)
    });

    template.then_ignore(end())
}
