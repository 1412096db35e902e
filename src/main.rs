use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;
mod error;
mod mcp;
mod synth;
mod utils;

use cmd::{ListArgs, OperationsArgs};
use config::{Overrides, Settings};

/// mcp-synth - a CLI synthesized at runtime from an MCP server's tool catalogue
///
/// Command layout:
///   mcp-synth catalogue                               raw `tools/list` response
///   mcp-synth list [--json]                           operation summary
///   mcp-synth operations <operation> [--<param>=...]  invoke one operation
///
/// Every call spawns the server command afresh, writes one JSON-RPC line to
/// its stdin and reads stdout until it exits. The server command is split on
/// whitespace only (no quoting).
///
/// Global flags / env:
///   --server-command     Server command (or MCP_SERVER_COMMAND env)
///   --pretty[=BOOL]      Pretty-print JSON content (default true)
///   --timeout-secs N     Kill the server after N seconds (default 60, 0 = never)
///   --explicit-presence  Send only flags given on the command line
///   -c / --config        YAML config file
///   -v / -vv / -q        Verbosity
///
/// Examples:
///   mcp-synth --server-command="github-mcp-server stdio" list
///   mcp-synth --server-command="github-mcp-server stdio" operations get_issue --owner=golang --repo=go --issue_number=1
///   mcp-synth --server-command="github-mcp-server stdio" operations get_issue --help
#[derive(Parser, Debug)]
#[command(
    name = "mcp-synth",
    version,
    author,
    about = "mcp-synth - CLI synthesized from an MCP server's tool catalogue",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Command that starts the MCP server on stdio
    #[arg(long = "server-command", global = true, value_name = "CMD")]
    server_command: Option<String>,

    /// Pretty-print JSON responses
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pretty: Option<bool>,

    /// Deadline for each server process in seconds (0 disables)
    #[arg(long = "timeout-secs", global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Include a parameter only when its flag was given, even if zero or empty
    #[arg(long = "explicit-presence", global = true)]
    explicit_presence: bool,

    /// YAML config file
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and print the raw operation catalogue
    Catalogue,

    /// Summarize the operations the server offers
    List(ListArgs),

    /// Invoke an operation (flags are generated from its schema)
    #[command(disable_help_flag = true)]
    Operations(OperationsArgs),
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            server_command: self.server_command.clone(),
            pretty: self.pretty,
            timeout_secs: self.timeout_secs,
            explicit_presence: self.explicit_presence,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::init_logging(utils::derive_level(cli.verbose, cli.quiet));

    let file = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::FileConfig::default(),
    };
    let settings = Settings::resolve(cli.overrides(), config::env_server_command(), file);
    tracing::debug!(?settings, "resolved settings");

    match cli.command {
        Commands::Catalogue => cmd::execute_catalogue(&settings),
        Commands::List(args) => cmd::execute_list(args, &settings),
        Commands::Operations(args) => cmd::execute_operations(args, &settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_before_subcommand() {
        let cli = Cli::try_parse_from([
            "mcp-synth",
            "--server-command=srv stdio",
            "--pretty=false",
            "--timeout-secs=5",
            "catalogue",
        ])
        .unwrap();
        assert_eq!(cli.server_command.as_deref(), Some("srv stdio"));
        assert_eq!(cli.pretty, Some(false));
        assert_eq!(cli.timeout_secs, Some(5));
        assert!(matches!(cli.command, Commands::Catalogue));
    }

    #[test]
    fn bare_pretty_means_true() {
        let cli = Cli::try_parse_from(["mcp-synth", "--pretty", "catalogue"]).unwrap();
        assert_eq!(cli.pretty, Some(true));
    }

    #[test]
    fn operation_flags_are_passed_through() {
        let cli = Cli::try_parse_from([
            "mcp-synth",
            "--server-command=srv",
            "operations",
            "get_issue",
            "--owner=golang",
            "--force",
            "--verbose=1",
        ])
        .unwrap();
        match cli.command {
            Commands::Operations(args) => assert_eq!(
                args.args,
                vec!["get_issue", "--owner=golang", "--force", "--verbose=1"]
            ),
            other => panic!("expected operations, got {other:?}"),
        }
    }

    #[test]
    fn operations_help_is_deferred() {
        let cli = Cli::try_parse_from(["mcp-synth", "operations", "get_issue", "--help"]).unwrap();
        match cli.command {
            Commands::Operations(args) => assert_eq!(args.args, vec!["get_issue", "--help"]),
            other => panic!("expected operations, got {other:?}"),
        }
    }
}
