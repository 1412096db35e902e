/*!
transport.rs - one-shot stdio exchange with a freshly spawned server.

Each call:
  1. splits the server command on whitespace
  2. spawns the child with piped stdin/stdout/stderr
  3. writes the request followed by '\n', then closes stdin
  4. collects stdout/stderr until the child exits

The whole exchange runs under an optional deadline. On expiry the child is
killed (kill_on_drop) and the call fails with `SynthError::Timeout`.
*/

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use super::{ServerCommand, parse_server_command};
use crate::error::{SynthError, SynthResult};

/// Sends one request body to a server command and returns its stdout.
pub trait Transport {
    fn execute(&self, command: &str, request_body: &str) -> SynthResult<String>;
}

/// Spawns a new child process for every call.
#[derive(Debug, Clone)]
pub struct SubprocessTransport {
    deadline: Option<Duration>,
}

impl SubprocessTransport {
    pub fn new(deadline: Option<Duration>) -> Self {
        Self { deadline }
    }
}

impl Transport for SubprocessTransport {
    fn execute(&self, command: &str, request_body: &str) -> SynthResult<String> {
        let server = parse_server_command(command)?;
        debug!(server = %server, deadline = ?self.deadline, "spawning server process");
        trace!(request = request_body, "request line");

        // main is sync; a throwaway runtime drives the child for this one call.
        let rt = tokio::runtime::Runtime::new().map_err(SynthError::Collect)?;
        let output = rt.block_on(async {
            let exchange = exchange(&server, request_body);
            match self.deadline {
                Some(limit) => tokio::time::timeout(limit, exchange)
                    .await
                    .map_err(|_| SynthError::Timeout(limit))?,
                None => exchange.await,
            }
        })?;

        let stdout = decode_stdout(output.stdout);
        debug!(bytes = stdout.len(), "server process finished");
        Ok(stdout)
    }
}

/// Invalid UTF-8 is replaced with U+FFFD, loudly.
fn decode_stdout(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            let valid_up_to = e.utf8_error().valid_up_to();
            warn!(
                valid_up_to,
                "server output is not valid UTF-8; invalid bytes replaced"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

async fn exchange(server: &ServerCommand, request_body: &str) -> SynthResult<Output> {
    let mut child = Command::new(&server.program)
        .args(&server.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| SynthError::Spawn {
            program: server.program.clone(),
            source,
        })?;

    let written = match child.stdin.take() {
        Some(mut stdin) => {
            let result = async {
                stdin.write_all(request_body.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.shutdown().await
            }
            .await;
            // dropping the handle closes the pipe
            drop(stdin);
            result
        }
        None => Err(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "child stdin was not captured",
        )),
    };

    let output = child.wait_with_output().await.map_err(SynthError::Collect)?;

    // A child that fails without reading its input also breaks the pipe;
    // its exit status and stderr say more than EPIPE does.
    if !output.status.success() {
        return Err(SynthError::Exit {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    written.map_err(SynthError::Write)?;
    Ok(output)
}
