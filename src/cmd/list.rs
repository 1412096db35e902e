/*!
`list.rs`

Implements the `list` subcommand: a summary of every operation in the
server's catalogue.

Human output (table):
  #  OPERATION   PARAMS                                DESCRIPTION
  1  get_issue   issue_number*:number, owner*:string   Get an issue

  `*` marks a required parameter; `?` marks a type this client cannot
  turn into a flag (the parameter is unreachable from `operations`).

JSON Output Shape (--json):
{
  "status": "ok",
  "server": "<server command>",
  "elapsed_ms": 12,
  "count": 1,
  "operations": [
    { "name": "get_issue", "description": "...",
      "parameters": [ { "name": "owner", "type": "string", "required": true } ],
      "additional_parameters": true }
  ]
}
*/

use std::io::IsTerminal;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Value, json};

use crate::cmd::format::{Role, StyleOptions, color, table};
use crate::config::Settings;
use crate::mcp::{Catalogue, Operation, SubprocessTransport, fetch_catalogue};

/// CLI arguments for `mcp-synth list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn execute_list(args: ListArgs, settings: &Settings) -> Result<()> {
    let server = settings.server_command()?;
    let transport = SubprocessTransport::new(settings.timeout);

    let started = Instant::now();
    let catalogue =
        fetch_catalogue(&transport, server).context("failed to fetch operation catalogue")?;
    let elapsed_ms = started.elapsed().as_millis();

    if args.json {
        let doc = catalogue_json(&catalogue, server, elapsed_ms);
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let mut style = StyleOptions::detect();
    if !std::io::stdout().is_terminal() {
        style = StyleOptions::plain(style.term_width);
    }
    println!(
        "{}",
        color(
            Role::Title,
            format!("Operations ({}) - {server} - {elapsed_ms} ms", catalogue.len()),
            &style
        )
    );
    if catalogue.is_empty() {
        println!("{}", color(Role::Dim, "(none)", &style));
        return Ok(());
    }
    println!(
        "{}",
        table(
            &["#", "OPERATION", "PARAMS", "DESCRIPTION"],
            &rows(&catalogue, &style),
            &style
        )
    );
    println!(
        "\n{}",
        color(
            Role::Dim,
            "Use `mcp-synth operations <name> --help` for an operation's flags",
            &style
        )
    );
    Ok(())
}

fn rows(catalogue: &Catalogue, style: &StyleOptions) -> Vec<Vec<String>> {
    catalogue
        .tools
        .iter()
        .enumerate()
        .map(|(idx, op)| {
            let summary = op.description().lines().next().unwrap_or_default();
            vec![
                (idx + 1).to_string(),
                color(Role::Name, &op.name, style),
                param_summary(op),
                summary.to_string(),
            ]
        })
        .collect()
}

/// `name*:type` pairs, required first.
fn param_summary(op: &Operation) -> String {
    let schema = &op.schema;
    let mut pairs: Vec<(bool, String)> = schema
        .properties
        .iter()
        .map(|(name, param)| {
            let required = schema.is_required(name);
            let label = param.kind().map(|k| k.label()).unwrap_or("?");
            let marker = if required { "*" } else { "" };
            (required, format!("{name}{marker}:{label}"))
        })
        .collect();
    if pairs.is_empty() {
        return "-".to_string();
    }
    pairs.sort_by_key(|(required, _)| !*required);
    pairs
        .into_iter()
        .map(|(_, p)| p)
        .collect::<Vec<_>>()
        .join(", ")
}

fn catalogue_json(catalogue: &Catalogue, server: &str, elapsed_ms: u128) -> Value {
    let operations: Vec<Value> = catalogue
        .tools
        .iter()
        .map(|op| {
            let parameters: Vec<Value> = op
                .schema
                .properties
                .iter()
                .map(|(name, param)| {
                    json!({
                        "name": name,
                        "type": param.kind().map(|k| k.label()),
                        "required": op.schema.is_required(name),
                    })
                })
                .collect();
            json!({
                "name": op.name,
                "description": op.description(),
                "parameters": parameters,
                "additional_parameters": op.schema.tolerates_unknown(),
            })
        })
        .collect();
    json!({
        "status": "ok",
        "server": server,
        "elapsed_ms": elapsed_ms,
        "count": catalogue.len(),
        "operations": operations,
    })
}
