//! Server plumbing: command-line splitting, one-shot stdio transport,
//! JSON-RPC envelopes and the tool catalogue model.
//!
//! parse_server_command -> ServerCommand { program, args }
//! transport::Transport / SubprocessTransport
//! protocol::{Request, render}
//! catalogue::{Catalogue, fetch_catalogue}
//!
pub mod catalogue;
pub mod protocol;
pub mod transport;

use std::fmt;
use std::io;

use crate::error::{SynthError, SynthResult};

pub use catalogue::{Catalogue, Operation, ParameterKind, fetch_catalogue};
pub use protocol::{Request, render};
pub use transport::{SubprocessTransport, Transport};

/// A server command split into program and arguments.
///
/// Splitting is plain whitespace splitting: quotes are not interpreted, so
/// arguments containing spaces cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Split a `--server-command` value on whitespace.
pub fn parse_server_command(raw: &str) -> SynthResult<ServerCommand> {
    let mut parts = raw.split_whitespace().map(str::to_string);
    let Some(program) = parts.next() else {
        return Err(SynthError::Spawn {
            program: raw.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "server command is empty"),
        });
    };
    Ok(ServerCommand {
        program,
        args: parts.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let cmd = parse_server_command("github-mcp-server stdio --read-only").unwrap();
        assert_eq!(cmd.program, "github-mcp-server");
        assert_eq!(cmd.args, vec!["stdio", "--read-only"]);
    }

    #[test]
    fn collapses_repeated_whitespace() {
        let cmd = parse_server_command("  docker \t run   -i  img ").unwrap();
        assert_eq!(cmd.program, "docker");
        assert_eq!(cmd.args, vec!["run", "-i", "img"]);
        assert_eq!(cmd.to_string(), "docker run -i img");
    }

    #[test]
    fn quotes_are_not_interpreted() {
        let cmd = parse_server_command(r#"server --path "/tmp/my dir""#).unwrap();
        assert_eq!(cmd.args, vec!["--path", "\"/tmp/my", "dir\""]);
    }

    #[test]
    fn empty_command_rejected() {
        let err = parse_server_command("   ").unwrap_err();
        assert!(matches!(err, SynthError::Spawn { .. }));
        assert!(err.to_string().contains("empty"));
    }
}
