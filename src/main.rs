//! Tempo CLI
//!
//! Usage:
//!   tempo [OPTIONS] [TEMPLATE]
//!
//! Options:
//!   -d, --data <FILE>        Context data (JSON or TOML, by extension)
//!   -p, --partials <DIR>     Directory of partial templates
//!   -c, --config <FILE>      Engine configuration (TOML format)
//!   --option <KEY=VALUE>     Render option, readable as @KEY
//!   -g, --grammar            Show template syntax reference
//!   -v, --verbose            Log at debug, or trace when repeated
//!   -h, --help               Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tempo::{Engine, EngineConfig, Map, RenderError, Value};

#[derive(Parser)]
#[command(name = "tempo")]
#[command(about = "Render logic-less Mustache/Handlebars templates")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Context data file: `.json` or `.toml`
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Directory of partial templates, overriding the config file
    #[arg(short, long)]
    partials: Option<PathBuf>,

    /// Engine configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render option readable as `@KEY`; may be repeated
    #[arg(long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
    options: Vec<(String, String)>,

    /// Show template syntax reference
    #[arg(short, long)]
    grammar: bool,

    /// Increase log verbosity: -v debug, -vv trace
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_option(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.grammar {
        print_grammar();
        return;
    }

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let mut config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    if let Some(dir) = &cli.partials {
        config = config.with_partials_directory(dir);
    }

    let engine = match Engine::from_config(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error loading partials: {}", e);
            std::process::exit(1);
        }
    };
    debug!(partials = engine.partials().len(), "engine ready");

    let context = match &cli.data {
        Some(path) => match load_data(path) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("Error loading data '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Value::Null,
    };

    // Read input
    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let options: Map = cli
        .options
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    match engine.render_with_options(&source, context, options) {
        Ok(output) => {
            print!("{}", output);
        }
        Err(RenderError::Parse(errors)) => {
            for error in &errors {
                eprint!("{}", error.format(&source, &filename));
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr so rendered output stays clean; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn load_data(path: &Path) -> Result<Value, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => {
            let table: toml::Table = toml::from_str(&content).map_err(|e| e.to_string())?;
            Ok(Value::from(toml::Value::Table(table)))
        }
        _ => {
            let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
            Ok(Value::from(json))
        }
    }
}

fn print_intro() {
    println!(
        r#"Tempo - logic-less Mustache/Handlebars templates

USAGE:
    tempo [OPTIONS] [TEMPLATE]
    echo '<template>' | tempo [OPTIONS]

OPTIONS:
    -d, --data         Context data (JSON or TOML file)
    -p, --partials     Directory of partial templates
    -c, --config       Engine configuration (TOML file)
    --option KEY=VAL   Render option, readable as @KEY
    -g, --grammar      Show template syntax reference
    -v, --verbose      Increase log verbosity
    -h, --help         Print help

QUICK START:
    echo '{{{{#each items}}}}{{{{@index}}}}: {{{{this}}}}
{{{{/each}}}}' | tempo -d data.json

Run --grammar for the syntax reference."#
    );
}

fn print_grammar() {
    println!(
        r#"TEMPO TEMPLATE SYNTAX
=====================

OUTPUT
------
{{{{path}}}}              Value at path, HTML-escaped
{{{{{{path}}}}}}            Value at path, unescaped
{{{{&path}}}}             Value at path, unescaped
{{{{! comment }}}}        Renders nothing
\{{{{literal}}}}          Literal "{{{{literal}}}}"

PATHS
-----
a.b.c  a/b/c          Nested lookup
this  .               Current context
../name               Parent context
[any chars]           Segment with arbitrary characters
@index @key @first    Block-local variables

HELPERS
-------
{{{{helper arg key=value}}}}     Call a helper with arguments
{{{{#each list}}}}...{{{{else}}}}...{{{{/each}}}}
{{{{#if value}}}}...{{{{else}}}}...{{{{/if}}}}
{{{{#unless value}}}}...{{{{/unless}}}}
{{{{#with object}}}}...{{{{/with}}}}
{{{{log value}}}}                Log the value at info level

SECTIONS
--------
{{{{#path}}}}...{{{{/path}}}}      Iterate a list, enter a truthy value
{{{{^path}}}}...{{{{/path}}}}      Render when path is falsy

PARTIALS
--------
{{{{> name}}}}                   Render partial in the current context
{{{{> name path}}}}              Render partial with path as context"#
    );
}
