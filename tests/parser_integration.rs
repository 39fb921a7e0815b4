//! Integration tests for the Tempo parser

use tempo::parser::{Callee, Node};
use tempo::{parse, ParseError};

#[test]
fn test_mixed_statements() {
    let input = "<h1>{{title}}</h1>\n{{! note }}{{{body}}}{{> footer}}";

    let doc = parse(input).expect("Should parse");
    assert_eq!(doc.statements.len(), 6);
}

#[test]
fn test_nested_blocks() {
    let input = r#"
        {{#each sections}}
            {{#if visible}}
                {{#each items}}{{name}}{{/each}}
            {{else}}
                hidden
            {{/if}}
        {{/each}}
    "#;

    let doc = parse(input).expect("Should parse");
    let outer = doc
        .statements
        .iter()
        .find_map(|s| match &s.node {
            Node::Block(block) => Some(block),
            _ => None,
        })
        .expect("Should contain a block");
    assert_eq!(outer.path.node.to_string(), "each");
    assert!(outer.inverse.is_none());

    let inner = outer
        .body
        .statements
        .iter()
        .find_map(|s| match &s.node {
            Node::Block(block) => Some(block),
            _ => None,
        })
        .expect("Should contain a nested block");
    assert_eq!(inner.path.node.to_string(), "if");
    assert!(inner.inverse.is_some());
}

#[test]
fn test_helper_call_shape() {
    let doc = parse(r#"{{format date "short" tz=zone pad=2}}"#).expect("Should parse");
    match &doc.statements[0].node {
        Node::Expression(expr) => {
            match &expr.path.node {
                Callee::Call(call) => assert_eq!(call.to_string(), "format"),
                other => panic!("Expected Call, got {:?}", other),
            }
            assert_eq!(expr.params.len(), 2);
            let keys: Vec<_> = expr
                .hash
                .as_ref()
                .expect("Should have hash")
                .pairs
                .iter()
                .map(|(k, _)| k.as_str())
                .collect();
            assert_eq!(keys, vec!["tz", "pad"]);
        }
        other => panic!("Expected Expression, got {:?}", other),
    }
}

#[test]
fn test_data_expression_shape() {
    let doc = parse("{{@index}}").expect("Should parse");
    match &doc.statements[0].node {
        Node::Expression(expr) => match &expr.path.node {
            Callee::Data(name) => assert_eq!(name, "index"),
            other => panic!("Expected Data, got {:?}", other),
        },
        other => panic!("Expected Expression, got {:?}", other),
    }
}

#[test]
fn test_mismatched_close_reports_both_paths() {
    let errors = parse("{{#outer}}x{{/other}}").unwrap_err();
    let message = errors[0].message().to_string();
    assert!(message.contains("outer"), "{}", message);
    assert!(message.contains("other"), "{}", message);
}

#[test]
fn test_unterminated_tag_is_lexical_error() {
    let errors = parse("Hello {{name").unwrap_err();
    assert!(matches!(errors[0], ParseError::Lexical { .. }));
}

#[test]
fn test_error_report_names_file() {
    let source = "{{#list}}\n  {{item}}\n{{/lsit}}";
    let errors = parse(source).unwrap_err();
    let report = errors[0].format(source, "page.hbs");
    assert!(report.contains("page.hbs"), "{}", report);
}

#[test]
fn test_else_prefix_is_plain_identifier() {
    let doc = parse("{{elsewhere}}").expect("Should parse");
    assert!(matches!(doc.statements[0].node, Node::Expression(_)));
}

#[test]
fn test_number_overflow_is_syntax_error() {
    let errors = parse("{{f 99999999999999999999}}").unwrap_err();
    assert!(matches!(errors[0], ParseError::Syntax { .. }));
}
