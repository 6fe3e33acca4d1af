use anyhow::{bail, Result};
use serde::Serialize;
use std::time::Duration;

use crate::adapter::{Adapter, CallOpts};
use crate::command::{OptionSet, OptionValue};
use crate::exec::Execution;
use crate::output::{format_payload_human, OutputFormat, Payload};

pub struct RunInputs {
    pub resource: String,
    pub action: String,
    pub options: Vec<String>,
    pub format: Option<OutputFormat>,
    pub timeout_secs: Option<u64>,
    pub ignore_stderr: bool,
    pub raw_response: bool,
}

#[derive(Debug, Serialize)]
pub struct RunResult {
    pub resource: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<Execution>,
}

/// Parse `-o key=value` pairs. A bare `key` is a valueless flag.
pub fn parse_option_pairs(pairs: &[String]) -> Result<OptionSet> {
    let mut options = OptionSet::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some(("", _)) => bail!(
                "invalid option {:?}\n  hint: use -o key=value",
                pair
            ),
            Some((key, value)) => options.insert(key, value),
            None => {
                if pair.is_empty() {
                    bail!("invalid empty option\n  hint: use -o key=value");
                }
                options.insert(pair.clone(), OptionValue::Flag);
            }
        }
    }
    Ok(options)
}

pub fn cmd_run(adapter: &Adapter, inputs: RunInputs) -> Result<RunResult> {
    let options = parse_option_pairs(&inputs.options)?;
    let call = CallOpts {
        format: inputs.format,
        timeout: inputs.timeout_secs.map(Duration::from_secs),
        ignore_stderr: if inputs.ignore_stderr { Some(true) } else { None },
    };

    if inputs.raw_response {
        let execution = adapter.invoke_raw(&inputs.resource, &inputs.action, &options, &call)?;
        return Ok(RunResult {
            resource: inputs.resource,
            action: inputs.action,
            payload: None,
            execution: Some(execution),
        });
    }

    let payload = adapter.invoke(&inputs.resource, &inputs.action, &options, &call)?;
    Ok(RunResult {
        resource: inputs.resource,
        action: inputs.action,
        payload: Some(payload),
        execution: None,
    })
}

pub fn format_run_human(result: &RunResult) -> String {
    if let Some(payload) = &result.payload {
        return format_payload_human(payload);
    }
    if let Some(execution) = &result.execution {
        let mut lines = vec![format!("exit code: {}", execution.code)];
        if !execution.stdout.trim().is_empty() {
            lines.push("stdout:".to_string());
            lines.push(execution.stdout.trim_end().to_string());
        }
        if !execution.stderr.trim().is_empty() {
            lines.push("stderr:".to_string());
            lines.push(execution.stderr.trim_end().to_string());
        }
        return lines.join("\n");
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestEnv;

    fn run_inputs(resource: &str, action: &str, options: &[&str]) -> RunInputs {
        RunInputs {
            resource: resource.to_string(),
            action: action.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            format: None,
            timeout_secs: None,
            ignore_stderr: false,
            raw_response: false,
        }
    }

    #[test]
    fn parse_option_pairs_values_and_flags() {
        let options = parse_option_pairs(&[
            "id=5".to_string(),
            "force".to_string(),
            "name=two words".to_string(),
        ])
        .unwrap();
        assert_eq!(
            options.render(),
            vec![
                "--force".to_string(),
                "--id=5".to_string(),
                "--name=two words".to_string(),
            ]
        );
    }

    #[test]
    fn parse_option_pairs_empty_key_errors() {
        assert!(parse_option_pairs(&["=5".to_string()]).is_err());
        assert!(parse_option_pairs(&["".to_string()]).is_err());
    }

    #[test]
    fn cmd_run_returns_payload() {
        let env = TestEnv::new();
        let stub = env.write_stub_tool("tool", "echo 'Id,Name'\necho '1,cap01'\n");
        let adapter = Adapter::new(env.local_config(stub.to_str().unwrap()));

        let result = cmd_run(&adapter, run_inputs("capsule", "list", &[])).unwrap();
        assert!(result.execution.is_none());
        let payload = result.payload.unwrap();
        assert_eq!(payload.as_table().unwrap().len(), 1);
    }

    #[test]
    fn cmd_run_raw_reports_nonzero_without_failing() {
        let env = TestEnv::new();
        let stub = env.write_stub_tool("tool", "echo 'denied' >&2\nexit 70\n");
        let adapter = Adapter::new(env.local_config(stub.to_str().unwrap()));

        let mut inputs = run_inputs("capsule", "delete", &["id=5"]);
        inputs.raw_response = true;
        let result = cmd_run(&adapter, inputs).unwrap();
        let execution = result.execution.unwrap();
        assert_eq!(execution.code, 70);

        let text = format_run_human(&RunResult {
            resource: "capsule".to_string(),
            action: "delete".to_string(),
            payload: None,
            execution: Some(execution),
        });
        assert!(text.contains("exit code: 70"));
        assert!(text.contains("denied"));
    }

    #[test]
    fn cmd_run_propagates_failure() {
        let env = TestEnv::new();
        let stub = env.write_stub_tool("tool", "echo 'denied' >&2\nexit 70\n");
        let adapter = Adapter::new(env.local_config(stub.to_str().unwrap()));

        let result = cmd_run(&adapter, run_inputs("capsule", "list", &[]));
        assert!(result.is_err());
    }

    #[test]
    fn cmd_run_ignore_stderr_flag_applies() {
        let env = TestEnv::new();
        let stub = env.write_stub_tool("tool", "echo 'Id,Name'\necho 'noise' >&2\n");
        let adapter = Adapter::new(env.local_config(stub.to_str().unwrap()));

        let mut inputs = run_inputs("capsule", "list", &[]);
        inputs.ignore_stderr = true;
        assert!(cmd_run(&adapter, inputs).is_ok());
    }
}
