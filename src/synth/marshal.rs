/*!
marshal.rs - resolved flags -> JSON argument map.

Default inclusion (`InclusionPolicy::NonDefaultValue`):
  string        non-empty
  number/int    non-zero (explicit zero is indistinguishable from "unset")
  boolean       explicitly set, whatever the value
  string list   non-empty
  object list   non-empty raw JSON, decoded as an array

`InclusionPolicy::ExplicitlySet` includes a parameter iff its flag appeared
on the command line, for every kind.
*/

use clap::ArgMatches;
use serde_json::{Map, Number, Value};

use super::{FlagSpec, OperationCommand, explicitly_set};
use crate::error::{SynthError, SynthResult};
use crate::mcp::ParameterKind;

/// Largest integer an f64 represents exactly (2^53).
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InclusionPolicy {
    #[default]
    NonDefaultValue,
    ExplicitlySet,
}

impl InclusionPolicy {
    fn includes(self, explicit: bool, non_default: bool) -> bool {
        match self {
            InclusionPolicy::NonDefaultValue => non_default,
            InclusionPolicy::ExplicitlySet => explicit,
        }
    }
}

/// Build the `arguments` object for one invocation.
pub fn marshal(
    op: &OperationCommand,
    matches: &ArgMatches,
    policy: InclusionPolicy,
) -> SynthResult<Map<String, Value>> {
    let mut arguments = Map::new();
    for flag in &op.flags {
        if let Some(value) = resolve(flag, matches, policy)? {
            arguments.insert(flag.parameter.clone(), value);
        }
    }
    Ok(arguments)
}

fn resolve(
    flag: &FlagSpec,
    matches: &ArgMatches,
    policy: InclusionPolicy,
) -> SynthResult<Option<Value>> {
    let id = flag.flag.as_str();
    let explicit = explicitly_set(matches, id);

    let value = match &flag.kind {
        ParameterKind::Text { .. } => {
            let v = matches.get_one::<String>(id).cloned().unwrap_or_default();
            policy
                .includes(explicit, !v.is_empty())
                .then(|| Value::String(v))
        }
        ParameterKind::Number { .. } => {
            let v = matches.get_one::<f64>(id).copied().unwrap_or(0.0);
            policy.includes(explicit, v != 0.0).then(|| number_value(v))
        }
        ParameterKind::Integer { .. } => {
            let v = matches.get_one::<i64>(id).copied().unwrap_or(0);
            policy.includes(explicit, v != 0).then(|| Value::from(v))
        }
        ParameterKind::Boolean => {
            let v = matches.get_one::<bool>(id).copied().unwrap_or(false);
            explicit.then_some(Value::Bool(v))
        }
        ParameterKind::StringList => {
            let items: Vec<Value> = matches
                .get_many::<String>(id)
                .map(|vals| vals.cloned().map(Value::String).collect())
                .unwrap_or_default();
            policy
                .includes(explicit, !items.is_empty())
                .then(|| Value::Array(items))
        }
        ParameterKind::ObjectList { .. } => {
            let raw = matches.get_one::<String>(id).cloned().unwrap_or_default();
            if !policy.includes(explicit, !raw.is_empty()) {
                return Ok(None);
            }
            let items: Vec<Value> =
                serde_json::from_str(&raw).map_err(|source| SynthError::ArgumentDecode {
                    parameter: flag.parameter.clone(),
                    source,
                })?;
            Some(Value::Array(items))
        }
    };
    Ok(value)
}

/// Whole numbers go on the wire as integers (`1`, not `1.0`).
fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() <= MAX_EXACT_F64_INT {
        return Value::from(v as i64);
    }
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::Catalogue;
    use crate::synth::CommandSet;
    use serde_json::json;

    fn command_set() -> CommandSet {
        let raw = json!({"tools": [{
            "name": "update",
            "inputSchema": {"properties": {
                "title": {"type": "string"},
                "weight": {"type": "number"},
                "count": {"type": "integer"},
                "force": {"type": "boolean"},
                "labels": {"type": "array", "items": {"type": "string"}},
                "files": {"type": "array", "items": {"type": "object"}}
            }}
        }]});
        CommandSet::from_catalogue(&Catalogue::from_response(&raw.to_string()).unwrap())
    }

    fn run(args: &[&str], policy: InclusionPolicy) -> SynthResult<Map<String, Value>> {
        let set = command_set();
        let argv = ["operations", "update"].into_iter().chain(args.iter().copied());
        let matches = set
            .command("mcp-synth")
            .try_get_matches_from(argv)
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        marshal(set.get("update").unwrap(), sub, policy)
    }

    #[test]
    fn nothing_set_yields_empty_map() {
        let args = run(&[], InclusionPolicy::default()).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn unset_boolean_is_omitted_explicit_false_is_kept() {
        let args = run(&["--title=x"], InclusionPolicy::default()).unwrap();
        assert!(!args.contains_key("force"));

        let args = run(&["--force=false"], InclusionPolicy::default()).unwrap();
        assert_eq!(args.get("force"), Some(&json!(false)));
    }

    #[test]
    fn value_based_policy_drops_zero_and_empty() {
        let args = run(
            &["--title=", "--weight=0", "--count=0"],
            InclusionPolicy::NonDefaultValue,
        )
        .unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn explicit_policy_keeps_zero_and_empty() {
        let args = run(
            &["--title=", "--weight=0", "--count=0"],
            InclusionPolicy::ExplicitlySet,
        )
        .unwrap();
        assert_eq!(Value::Object(args), json!({"title": "", "weight": 0, "count": 0}));
    }

    #[test]
    fn all_kinds_marshal() {
        let args = run(
            &[
                "--title=Fix it",
                "--weight=2.5",
                "--count=3",
                "--force",
                "--labels=bug,ui",
                "--labels",
                "p1",
                r#"--files-json=[{"path":"a.txt"}]"#,
            ],
            InclusionPolicy::default(),
        )
        .unwrap();
        assert_eq!(
            Value::Object(args),
            json!({
                "title": "Fix it",
                "weight": 2.5,
                "count": 3,
                "force": true,
                "labels": ["bug", "ui", "p1"],
                "files": [{"path": "a.txt"}]
            })
        );
    }

    #[test]
    fn whole_numbers_serialize_as_integers() {
        let args = run(&["--weight=1"], InclusionPolicy::default()).unwrap();
        assert_eq!(serde_json::to_string(&args).unwrap(), r#"{"weight":1}"#);
    }

    #[test]
    fn non_finite_weight_never_marshals() {
        let set = command_set();
        for bad in ["--weight=inf", "--weight=NaN", "--weight=1e400"] {
            let argv = ["operations", "update", bad];
            assert!(set.command("mcp-synth").try_get_matches_from(argv).is_err(), "{bad}");
        }
    }

    #[test]
    fn bad_object_json_names_parameter() {
        let err = run(&["--files-json={\"path\":1}"], InclusionPolicy::default()).unwrap_err();
        match err {
            SynthError::ArgumentDecode { parameter, .. } => assert_eq!(parameter, "files"),
            other => panic!("expected ArgumentDecode, got {other:?}"),
        }
    }
}
