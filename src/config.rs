/*!
Runtime settings.

Precedence: CLI flag > environment (`MCP_SERVER_COMMAND`) > YAML config file
(`--config`) > built-in default.

Config file keys:
  server_command: "github-mcp-server stdio"
  pretty: true
  timeout_secs: 60        # 0 disables the deadline
  explicit_presence: false
*/

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::synth::InclusionPolicy;

pub const SERVER_COMMAND_ENV: &str = "MCP_SERVER_COMMAND";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server_command: Option<String>,
    pub pretty: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub explicit_presence: Option<bool>,
}

/// Values taken from global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_command: Option<String>,
    pub pretty: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub explicit_presence: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_command: Option<String>,
    pub pretty: bool,
    pub timeout: Option<Duration>,
    pub inclusion: InclusionPolicy,
}

impl Settings {
    pub fn resolve(cli: Overrides, env_command: Option<String>, file: FileConfig) -> Self {
        let server_command = cli
            .server_command
            .filter(|s| !s.trim().is_empty())
            .or(env_command)
            .or(file.server_command.filter(|s| !s.trim().is_empty()));
        let timeout_secs = cli
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let explicit = cli.explicit_presence || file.explicit_presence.unwrap_or(false);

        Settings {
            server_command,
            pretty: cli.pretty.or(file.pretty).unwrap_or(true),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            inclusion: if explicit {
                InclusionPolicy::ExplicitlySet
            } else {
                InclusionPolicy::NonDefaultValue
            },
        }
    }

    pub fn server_command(&self) -> Result<&str> {
        match self.server_command.as_deref() {
            Some(cmd) => Ok(cmd),
            None => bail!(
                "no server command configured (use --server-command, {SERVER_COMMAND_ENV} or `server_command` in the config file)"
            ),
        }
    }
}

pub fn env_server_command() -> Option<String> {
    std::env::var(SERVER_COMMAND_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
}

pub fn load_config(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse YAML config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let s = Settings::resolve(Overrides::default(), None, FileConfig::default());
        assert_eq!(s.server_command, None);
        assert!(s.pretty);
        assert_eq!(s.timeout, Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)));
        assert_eq!(s.inclusion, InclusionPolicy::NonDefaultValue);
        assert!(s.server_command().is_err());
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let file = FileConfig {
            server_command: Some("from-file".into()),
            pretty: Some(false),
            timeout_secs: Some(5),
            explicit_presence: Some(true),
        };
        let s = Settings::resolve(Overrides::default(), Some("from-env".into()), file.clone());
        assert_eq!(s.server_command().unwrap(), "from-env");
        assert!(!s.pretty);
        assert_eq!(s.timeout, Some(Duration::from_secs(5)));
        assert_eq!(s.inclusion, InclusionPolicy::ExplicitlySet);

        let cli = Overrides {
            server_command: Some("from-cli".into()),
            pretty: Some(true),
            timeout_secs: Some(0),
            explicit_presence: false,
        };
        let s = Settings::resolve(cli, Some("from-env".into()), file);
        assert_eq!(s.server_command().unwrap(), "from-cli");
        assert!(s.pretty);
        assert_eq!(s.timeout, None);
    }

    #[test]
    fn load_yaml_file() {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(f, "server_command: cat\ntimeout_secs: 3").unwrap();
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.server_command.as_deref(), Some("cat"));
        assert_eq!(cfg.timeout_secs, Some(3));
        assert_eq!(cfg.pretty, None);
    }

    #[test]
    fn unknown_keys_rejected() {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(f, "server: cat").unwrap();
        let err = load_config(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("server"));
    }
}
