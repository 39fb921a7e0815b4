//! Integration tests for partial lookup, scoping and loading

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde_json::json;

use tempo::{parse, render, Engine, EngineConfig, EvalError, RegistryError, RenderError, Value};

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tempo-it-{}-{}", label, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Should create temp dir");
    dir
}

#[test]
fn test_missing_partial_is_inline_notice() {
    let out = render("{{> nope}}", json!({})).expect("Should render");
    assert_eq!(out, "Missing partial 'nope'");
}

#[test]
fn test_registered_partial_uses_current_context() {
    let mut engine = Engine::new();
    engine.register_partial("nope", "{{x}}");
    assert_eq!(engine.render("{{> nope}}", json!({"x": "v"})).expect("Should render"), "v");
}

#[test]
fn test_partial_with_context_path() {
    let mut engine = Engine::new();
    engine.register_partial("user", "<{{name}}>");
    let ctx = json!({"owner": {"name": "ada"}, "name": "root"});
    let out = engine.render("{{> user owner}} {{> user}}", ctx).expect("Should render");
    assert_eq!(out, "<ada> <root>");
}

#[test]
fn test_partial_inside_each() {
    let mut engine = Engine::new();
    engine.register_partial("row", "{{@index}}={{this}};");
    let out = engine
        .render("{{#each xs}}{{> row}}{{/each}}", json!({"xs": ["a", "b"]}))
        .expect("Should render");
    assert_eq!(out, "0=a;1=b;");
}

#[test]
fn test_partial_names_with_paths_and_strings() {
    let mut engine = Engine::new();
    engine.register_partial("shared/header", "H");
    engine.register_partial("with space", "S");
    engine.register_partial("404", "N");
    let out = engine
        .render("{{> shared/header}}{{> \"with space\"}}{{> 404}}", Value::Null)
        .expect("Should render");
    assert_eq!(out, "HSN");
}

#[test]
fn test_pre_parsed_partial() {
    let mut engine = Engine::new();
    engine.register_partial("item", parse("[{{this}}]").expect("Should parse"));
    let out = engine.render("{{#each xs}}{{> item}}{{/each}}", json!({"xs": [1, 2]})).expect("Should render");
    assert_eq!(out, "[1][2]");
}

#[test]
fn test_recursive_partials_hit_depth_limit() {
    let mut engine = Engine::new().with_config(EngineConfig::new().with_max_partial_depth(3));
    engine.register_partial("loop", "x{{> loop}}");
    let err = engine.render("{{> loop}}", Value::Null).unwrap_err();
    match err {
        RenderError::Eval(EvalError::PartialDepth { name, limit }) => {
            assert_eq!(name, "loop");
            assert_eq!(limit, 3);
        }
        other => panic!("Expected PartialDepth, got {:?}", other),
    }
}

#[test]
fn test_bounded_recursion_renders() {
    let mut engine = Engine::new();
    engine.register_partial("node", "{{name}}{{#if children}}({{#each children}}{{> node}}{{/each}}){{/if}}");
    let ctx = json!({"name": "a", "children": [{"name": "b", "children": [{"name": "c"}]}, {"name": "d"}]});
    let out = engine.render("{{> node}}", ctx).expect("Should render");
    assert_eq!(out, "a(b(c)d)");
}

#[test]
fn test_partial_syntax_error_aborts_render() {
    let mut engine = Engine::new();
    engine.register_partial("bad", "{{#open}}never closed");
    let err = engine.render("ok {{> bad}}", Value::Null).unwrap_err();
    assert!(matches!(err, RenderError::Eval(EvalError::PartialSyntax { .. })));
}

#[test]
fn test_engine_loads_partials_from_config() {
    let dir = temp_dir("config");
    fs::create_dir_all(dir.join("layout")).expect("Should create subdir");
    fs::write(dir.join("greet.hbs"), "Hi {{name}}").expect("Should write");
    fs::write(dir.join("layout").join("footer.hbs"), "--").expect("Should write");

    let engine = Engine::from_config(EngineConfig::new().with_partials_directory(&dir)).expect("Should load");
    assert_eq!(engine.partials().names(), vec!["greet", "layout/footer"]);

    let out = engine
        .render("{{> greet}} {{> layout/footer}}", json!({"name": "Ada"}))
        .expect("Should render");
    assert_eq!(out, "Hi Ada --");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_config_file_resolves_relative_partials_directory() {
    let dir = temp_dir("config-file");
    fs::create_dir_all(dir.join("views")).expect("Should create subdir");
    fs::write(dir.join("views").join("title.mustache"), "T").expect("Should write");
    fs::write(
        dir.join("tempo.toml"),
        "[partials]\ndirectory = \"views\"\nextension = \"mustache\"\n",
    )
    .expect("Should write");

    let config = EngineConfig::from_file(&dir.join("tempo.toml")).expect("Should load config");
    let engine = Engine::from_config(config).expect("Should load partials");
    assert_eq!(engine.render("{{> title}}", Value::Null).expect("Should render"), "T");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_partials_directory_is_error() {
    let config = EngineConfig::new().with_partials_directory("/no/such/tempo/dir");
    let err = Engine::from_config(config).unwrap_err();
    assert!(matches!(err, RegistryError::DirectoryNotFound { .. }));
}
