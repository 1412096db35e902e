/*!
`catalogue.rs`

`mcp-synth catalogue`: send `tools/list` and print the response body. With
`--pretty` (the default) a JSON body is re-indented; anything else is
printed as received. Works even when the catalogue could not be turned into
operation commands.
*/

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

use crate::config::Settings;
use crate::mcp::SubprocessTransport;
use crate::mcp::catalogue::fetch_raw;

pub fn execute_catalogue(settings: &Settings) -> Result<()> {
    let server = settings.server_command()?;
    let transport = SubprocessTransport::new(settings.timeout);
    let raw = fetch_raw(&transport, server).context("failed to fetch operation catalogue")?;
    print!("{}", format_catalogue(&raw, settings.pretty));
    Ok(())
}

pub(crate) fn format_catalogue(raw: &str, pretty: bool) -> String {
    if !pretty {
        return raw.to_string();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(s) => format!("{s}\n"),
            Err(_) => raw.to_string(),
        },
        Err(e) => {
            warn!("catalogue response is not JSON ({e}); printing as received");
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_reindents_json() {
        let out = format_catalogue(r#"{"result":{"tools":[]}}"#, true);
        assert_eq!(out, "{\n  \"result\": {\n    \"tools\": []\n  }\n}\n");
    }

    #[test]
    fn raw_when_not_pretty_or_not_json() {
        let raw = "{\"a\":1}\n";
        assert_eq!(format_catalogue(raw, false), raw);
        assert_eq!(format_catalogue("banner text\n", true), "banner text\n");
    }
}
