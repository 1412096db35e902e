/*!
Runtime command synthesis.

Every catalogue operation becomes one clap subcommand of `operations`; every
parameter with a known kind becomes one long flag:

  string            --name <STRING>           (enum checked by the EnumGuard)
  number / integer  --name <NUMBER>
  boolean           --name[=<BOOL>]           (bare flag means true)
  array of string   --name <STRING>...        (repeatable, comma separated)
  array of object   --name-json <JSON>        (decoded when marshaling)

Required parameters and enum membership are checked by
`OperationCommand::validate`, which callers run before any request is built.
clap's own `required` is not used so both failures surface as `SynthError`.
*/

pub mod marshal;

use std::collections::HashSet;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tracing::{debug, warn};

use crate::error::{SynthError, SynthResult};
use crate::mcp::{Catalogue, Operation, ParameterKind};

pub use marshal::{InclusionPolicy, marshal};

/// Suffix for the raw-JSON flag of object-array parameters.
pub const JSON_FLAG_SUFFIX: &str = "-json";

/// Flags clap registers on its own.
const RESERVED_FLAGS: &[&str] = &["help"];

/* ---- Flag ---- */

#[derive(Debug, Clone, PartialEq)]
pub struct FlagSpec {
    /// Parameter name as sent on the wire.
    pub parameter: String,
    /// Long flag name (and clap id).
    pub flag: String,
    pub kind: ParameterKind,
    pub required: bool,
    pub description: String,
}

impl FlagSpec {
    fn help_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.description.is_empty() {
            parts.push(self.description.clone());
        }
        match &self.kind {
            ParameterKind::Text { allowed } if !allowed.is_empty() => {
                parts.push(format!("[one of: {}]", allowed.join(", ")));
            }
            ParameterKind::Number { minimum, maximum }
            | ParameterKind::Integer { minimum, maximum } => {
                if let Some(range) = advisory_range(*minimum, *maximum) {
                    parts.push(range);
                }
            }
            ParameterKind::StringList => parts.push("[repeatable, comma separated]".into()),
            ParameterKind::ObjectList { fields, required } => {
                let described: Vec<String> = fields
                    .iter()
                    .map(|f| {
                        if required.contains(f) {
                            format!("{f}*")
                        } else {
                            f.clone()
                        }
                    })
                    .collect();
                if described.is_empty() {
                    parts.push("[JSON array of objects]".into());
                } else {
                    parts.push(format!("[JSON array of objects: {}]", described.join(", ")));
                }
            }
            _ => {}
        }
        if self.required {
            parts.push("(required)".into());
        }
        parts.join(" ")
    }

    fn to_arg(&self) -> Arg {
        let arg = Arg::new(self.flag.clone())
            .long(self.flag.clone())
            .help(self.help_text());
        match &self.kind {
            ParameterKind::Text { .. } => arg.action(ArgAction::Set).value_name("STRING"),
            ParameterKind::Number { .. } => arg
                .action(ArgAction::Set)
                .value_parser(finite_number)
                .allow_negative_numbers(true)
                .value_name("NUMBER"),
            ParameterKind::Integer { .. } => arg
                .action(ArgAction::Set)
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true)
                .value_name("INTEGER"),
            ParameterKind::Boolean => arg
                .action(ArgAction::Set)
                .value_parser(value_parser!(bool))
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_name("BOOL"),
            ParameterKind::StringList => arg
                .action(ArgAction::Append)
                .value_delimiter(',')
                .value_name("STRING"),
            ParameterKind::ObjectList { .. } => arg.action(ArgAction::Set).value_name("JSON"),
        }
    }
}

/// JSON has no infinity or NaN, so those never leave the command line.
fn finite_number(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.trim().parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{raw}' is not a finite number"))
    }
}

fn advisory_range(minimum: Option<f64>, maximum: Option<f64>) -> Option<String> {
    match (minimum, maximum) {
        (Some(lo), Some(hi)) => Some(format!("[range: {lo}..={hi}]")),
        (Some(lo), None) => Some(format!("[min: {lo}]")),
        (None, Some(hi)) => Some(format!("[max: {hi}]")),
        (None, None) => None,
    }
}

/// True when the flag appeared on the command line (as opposed to a default).
pub fn explicitly_set(matches: &ArgMatches, flag: &str) -> bool {
    matches.value_source(flag) == Some(ValueSource::CommandLine)
}

/* ---- Enum guard ---- */

#[derive(Debug, Clone, PartialEq)]
struct EnumConstraint {
    parameter: String,
    flag: String,
    allowed: Vec<String>,
}

/// Membership check over every enum-constrained flag of one command.
///
/// Built once from the finished flag list, never extended afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumGuard {
    constraints: Vec<EnumConstraint>,
}

impl EnumGuard {
    fn from_flags(flags: &[FlagSpec]) -> Self {
        let constraints = flags
            .iter()
            .filter_map(|f| match &f.kind {
                ParameterKind::Text { allowed } if !allowed.is_empty() => Some(EnumConstraint {
                    parameter: f.parameter.clone(),
                    flag: f.flag.clone(),
                    allowed: allowed.clone(),
                }),
                _ => None,
            })
            .collect();
        Self { constraints }
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Empty values pass; anything else must be a declared member.
    pub fn check(&self, matches: &ArgMatches) -> SynthResult<()> {
        for c in &self.constraints {
            if let Some(value) = matches.get_one::<String>(&c.flag)
                && !value.is_empty()
                && !c.allowed.iter().any(|a| a == value)
            {
                return Err(SynthError::EnumValidation {
                    parameter: c.parameter.clone(),
                    value: value.clone(),
                    allowed: c.allowed.clone(),
                });
            }
        }
        Ok(())
    }
}

/* ---- Operation command ---- */

#[derive(Debug, Clone, PartialEq)]
pub struct OperationCommand {
    pub name: String,
    pub description: String,
    pub flags: Vec<FlagSpec>,
    /// Required parameters left without a flag by a name clash; the
    /// operation can never be invoked.
    pub unreachable_required: Vec<FlagSpec>,
    guard: EnumGuard,
}

impl OperationCommand {
    pub fn from_operation(op: &Operation) -> Self {
        let schema = &op.schema;
        let mut used: HashSet<String> = RESERVED_FLAGS.iter().map(|s| s.to_string()).collect();
        let mut flags = Vec::with_capacity(schema.properties.len());
        let mut unreachable_required = Vec::new();

        for (name, param) in &schema.properties {
            let Some(kind) = param.kind() else {
                debug!(operation = %op.name, parameter = %name, "unsupported parameter type; no flag");
                continue;
            };
            let flag = match kind {
                ParameterKind::ObjectList { .. } => format!("{name}{JSON_FLAG_SUFFIX}"),
                _ => name.clone(),
            };
            let candidate = FlagSpec {
                parameter: name.clone(),
                flag,
                kind,
                required: schema.is_required(name),
                description: param.description().to_string(),
            };
            if !usable_name(&candidate.flag) || !used.insert(candidate.flag.clone()) {
                warn!(operation = %op.name, parameter = %name, flag = %candidate.flag, "flag name unusable or taken; parameter skipped");
                if candidate.required {
                    unreachable_required.push(candidate);
                }
                continue;
            }
            flags.push(candidate);
        }

        for name in &schema.required {
            if !schema.properties.contains_key(name) {
                debug!(operation = %op.name, parameter = %name, "required parameter not declared in properties; ignored");
            }
        }

        let guard = EnumGuard::from_flags(&flags);
        debug!(
            operation = %op.name,
            flags = flags.len(),
            enum_checks = guard.constraint_count(),
            tolerates_unknown = schema.tolerates_unknown(),
            "operation synthesized"
        );
        Self {
            name: op.name.clone(),
            description: op.description().to_string(),
            flags,
            unreachable_required,
            guard,
        }
    }

    pub fn to_command(&self) -> Command {
        let summary = self.description.lines().next().unwrap_or_default().to_string();
        let mut cmd = Command::new(self.name.clone()).about(summary);
        if self.description.lines().nth(1).is_some() {
            cmd = cmd.long_about(self.description.clone());
        }
        cmd.args(self.flags.iter().map(FlagSpec::to_arg))
    }

    /// Required-flag and enum checks; must pass before anything is sent.
    pub fn validate(&self, matches: &ArgMatches) -> SynthResult<()> {
        if let Some(missing) = self.unreachable_required.first().or_else(|| {
            self.flags
                .iter()
                .find(|f| f.required && !explicitly_set(matches, &f.flag))
        }) {
            return Err(SynthError::MissingRequired {
                parameter: missing.parameter.clone(),
                flag: missing.flag.clone(),
            });
        }
        self.guard.check(matches)
    }
}

fn usable_name(flag: &str) -> bool {
    !flag.is_empty()
        && !flag.starts_with('-')
        && !flag.contains(|c: char| c == '=' || c.is_whitespace())
}

/* ---- Command set ---- */

/// All synthesized operation commands of one catalogue.
#[derive(Debug, Clone, Default)]
pub struct CommandSet {
    operations: Vec<OperationCommand>,
}

impl CommandSet {
    pub fn from_catalogue(catalogue: &Catalogue) -> Self {
        let mut seen = HashSet::new();
        let mut operations = Vec::with_capacity(catalogue.len());
        for op in &catalogue.tools {
            if !usable_name(&op.name) || !seen.insert(op.name.clone()) {
                warn!(operation = %op.name, "operation name unusable or duplicated; skipped");
                continue;
            }
            operations.push(OperationCommand::from_operation(op));
        }
        debug!(commands = operations.len(), "synthesized operation commands");
        Self { operations }
    }

    pub fn get(&self, name: &str) -> Option<&OperationCommand> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The `operations` command with one subcommand per operation.
    pub fn command(&self, bin_name: &str) -> Command {
        Command::new("operations")
            .bin_name(format!("{bin_name} operations"))
            .about("Invoke an operation from the server's catalogue")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .disable_help_subcommand(true)
            .subcommands(self.operations.iter().map(OperationCommand::to_command))
    }
}
