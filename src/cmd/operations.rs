/*!
`operations.rs`

`mcp-synth operations <operation> [--<param>=<value> ...]`

Flow:
  1. fetch the catalogue (one subprocess call)
  2. synthesize the `operations` command set and parse the trailing args
  3. validate required flags + enum values     (no request sent on failure)
  4. marshal flags into the argument map       (no request sent on failure)
  5. send `tools/call` (second subprocess call) and render the response

Usage errors and `--help` on the synthesized commands are reported by clap.
*/

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgMatches, Args};
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::SynthResult;
use crate::mcp::{Request, SubprocessTransport, Transport, fetch_catalogue, render};
use crate::synth::{CommandSet, InclusionPolicy, OperationCommand, marshal};

pub const BIN_NAME: &str = "mcp-synth";

#[derive(Args, Debug)]
pub struct OperationsArgs {
    /// Operation name followed by its flags (`operations --help` lists operations)
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..,
        value_name = "OPERATION [FLAGS]"
    )]
    pub args: Vec<String>,
}

pub fn execute_operations(args: OperationsArgs, settings: &Settings) -> Result<()> {
    let server = settings.server_command()?;
    let transport = SubprocessTransport::new(settings.timeout);

    let catalogue = fetch_catalogue(&transport, server)
        .context("cannot build operation commands without a catalogue")?;
    let set = CommandSet::from_catalogue(&catalogue);
    if set.is_empty() {
        warn!("catalogue offers no operations that can be invoked");
    }
    info!(operations = set.len(), "operation commands ready");

    let argv = std::iter::once("operations".to_string()).chain(args.args);
    let matches = match set.command(BIN_NAME).try_get_matches_from(argv) {
        Ok(m) => m,
        Err(e) => e.exit(),
    };
    let Some((name, sub)) = matches.subcommand() else {
        bail!("no operation given");
    };
    let op = set
        .get(name)
        .ok_or_else(|| anyhow!("unknown operation '{name}'"))?;

    let output = invoke(
        &transport,
        server,
        op,
        sub,
        settings.inclusion,
        settings.pretty,
    )?;
    print!("{output}");
    Ok(())
}

/// Validate, marshal, send and render one operation call.
pub fn invoke(
    transport: &dyn Transport,
    server: &str,
    op: &OperationCommand,
    matches: &ArgMatches,
    inclusion: InclusionPolicy,
    pretty: bool,
) -> SynthResult<String> {
    op.validate(matches)?;
    let arguments = marshal(op, matches, inclusion)?;
    info!(operation = %op.name, arguments = arguments.len(), "calling operation");

    let request = Request::call_tool(op.name.clone(), arguments).to_line()?;
    let response = transport.execute(server, &request)?;
    render(&response, pretty)
}
