#![forbid(unsafe_code)]

use std::process::exit;

use tracing::debug;
use tracing_subscriber::EnvFilter;
use yaml_anchor_codec::{
    find_anchors, find_references, from_annotated_json, generate, parse_with_options, render_error, scope_report,
    to_annotated_json, AnnotatedValue, Error, Options,
};

const USAGE: &str = "\
usage: yaml-anchor-codec <command> <file>

commands:
  parse <file.yaml>       print the annotated JSON form
  generate <file.json>    read annotated JSON, print YAML
  roundtrip <file.yaml>   parse and generate again
  scope <file.yaml>       print the anchor/reference scope report

The annotated JSON form keeps anchors and references on mappings only.
Sequence anchors and aliases are lost, so `generate` on the output of
`parse` writes aliased sequences in full.

Set RUST_LOG (for example RUST_LOG=debug) for diagnostics on stderr.";

enum Command {
    Parse,
    Generate,
    Roundtrip,
    Scope,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (command, path) = match (args.next(), args.next(), args.next()) {
        (Some(command), Some(path), None) => {
            let command = match command.as_str() {
                "parse" => Command::Parse,
                "generate" => Command::Generate,
                "roundtrip" => Command::Roundtrip,
                "scope" => Command::Scope,
                other => {
                    eprintln!("unknown command `{other}`\n\n{USAGE}");
                    exit(1);
                }
            };
            (command, path)
        }
        _ => {
            eprintln!("{USAGE}");
            exit(1);
        }
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Failed to read {path}: {err}");
            exit(2);
        }
    };

    match run(&command, &content, &path) {
        Ok(output) => print!("{output}"),
        Err(err) => {
            eprintln!("{path} invalid:\n{}", render_error(&err, &content, &path));
            exit(3);
        }
    }
}

fn run(command: &Command, content: &str, path: &str) -> Result<String, Error> {
    match command {
        Command::Parse => {
            let value = parse_yaml(content)?;
            let mut json = to_annotated_json(&value)?;
            json.push('\n');
            Ok(json)
        }
        Command::Generate => Ok(generate(&from_annotated_json(content)?)),
        Command::Roundtrip => Ok(generate(&parse_yaml(content)?)),
        Command::Scope => {
            let value = parse_yaml(content)?;
            Ok(scope_report(&find_anchors(&value), &find_references(&value), path))
        }
    }
}

fn parse_yaml(content: &str) -> Result<AnnotatedValue, Error> {
    let options = Options::default().with_budget_report(|report| debug!(?report, "budget report"));
    parse_with_options(content, options)
}
