/*!
Typed failures for the synthesized CLI.

Every variant terminates the single invocation that produced it; nothing is
retried. Transport variants come from the child process plumbing, the
argument variants are raised before any request leaves the process.
*/

use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    /// The server process could not be started.
    #[error("failed to start server process '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Writing the request line to the child's stdin failed.
    #[error("failed to write request to server process: {0}")]
    Write(#[source] io::Error),

    /// The child terminated with a non-zero status.
    #[error("server process exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    /// The child outlived the deadline and was killed.
    #[error("server process did not finish within {0:?} and was terminated")]
    Timeout(Duration),

    /// Waiting on the child or draining its output streams failed.
    #[error("failed to collect server process output: {0}")]
    Collect(#[source] io::Error),

    #[error("failed to decode operation catalogue: {0}")]
    SchemaDecode(String),

    #[error("missing required flag --{flag} (parameter '{parameter}')")]
    MissingRequired { parameter: String, flag: String },

    #[error(
        "invalid value '{value}' for parameter '{parameter}': expected one of [{}]",
        allowed.join(", ")
    )]
    EnumValidation {
        parameter: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("parameter '{parameter}' is not a valid JSON array: {source}")]
    ArgumentDecode {
        parameter: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to render response: {0}")]
    Render(String),
}

pub type SynthResult<T> = Result<T, SynthError>;
