use std::time::Duration;

use thiserror::Error;

use crate::catalog::{self, ActionSpec, ResourceSpec};
use crate::command::{build_args, OptionSet, ToolArgs};
use crate::config::ResolvedConfig;
use crate::exec::{self, ExecError, Execution};
use crate::output::{parse_payload, OutputFormat, ParseError, Payload};

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("unknown resource {name:?} (known: {known})")]
    UnknownResource { name: String, known: String },
    #[error("unknown action {action:?} for resource {resource:?} (known: {known})")]
    UnknownAction {
        resource: String,
        action: String,
        known: String,
    },
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("failed to parse {format} output: {source}")]
    Parse {
        format: OutputFormat,
        #[source]
        source: ParseError,
    },
}

/// Per-call overrides on top of the catalog defaults.
#[derive(Debug, Clone, Default)]
pub struct CallOpts {
    pub format: Option<OutputFormat>,
    pub timeout: Option<Duration>,
    pub ignore_stderr: Option<bool>,
}

/// One invocation, fully resolved: what to run, how long to wait, how to
/// judge stderr, how to parse.
#[derive(Debug)]
pub(crate) struct Plan {
    pub argv: Vec<String>,
    pub format: OutputFormat,
    pub timeout: Duration,
    pub ignore_stderr: bool,
}

/// Generic adapter over the resource catalog. Stateless beyond the config
/// it was built with; every call is an independent request/response unit.
pub struct Adapter {
    config: ResolvedConfig,
}

impl Adapter {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Run a cataloged action and parse its output into a payload.
    /// Nonzero exit or disallowed stderr noise is an error, never a payload.
    pub fn invoke(
        &self,
        resource: &str,
        action: &str,
        options: &OptionSet,
        call: &CallOpts,
    ) -> Result<Payload, AdapterError> {
        let plan = self.plan(resource, action, options, call)?;
        let execution = exec::run(&self.config.endpoint, &plan.argv, plan.timeout)?;
        let execution = execution.check(plan.ignore_stderr)?;
        parse_payload(plan.format, &execution.stdout).map_err(|source| AdapterError::Parse {
            format: plan.format,
            source,
        })
    }

    /// Run a cataloged action and hand back the raw execution result with
    /// no exit-status check and no parsing. Negative tests judge the
    /// outcome themselves.
    pub fn invoke_raw(
        &self,
        resource: &str,
        action: &str,
        options: &OptionSet,
        call: &CallOpts,
    ) -> Result<Execution, AdapterError> {
        let plan = self.plan(resource, action, options, call)?;
        Ok(exec::run(&self.config.endpoint, &plan.argv, plan.timeout)?)
    }

    /// Run the bare tool with ad-hoc arguments (no catalog, no parsing).
    /// Used for endpoint health checks like `--version`.
    pub fn invoke_bare(&self, args: &[&str], timeout: Duration) -> Result<Execution, ExecError> {
        let mut argv = vec![self.config.tool.binary.clone()];
        argv.extend(args.iter().map(|a| a.to_string()));
        exec::run(&self.config.endpoint, &argv, timeout)
    }

    pub(crate) fn plan(
        &self,
        resource: &str,
        action: &str,
        options: &OptionSet,
        call: &CallOpts,
    ) -> Result<Plan, AdapterError> {
        let (spec, act) = lookup(resource, action)?;

        let format = call.format.unwrap_or(act.format);
        let ignore_stderr = call.ignore_stderr.unwrap_or(act.ignore_stderr);
        let timeout = call
            .timeout
            .or(act.timeout_secs.map(Duration::from_secs))
            .unwrap_or(self.config.tool.command_timeout);

        let tool = ToolArgs {
            username: self.config.tool.username.as_deref(),
            password: self.config.tool.password.as_deref(),
        };
        let mut argv = vec![self.config.tool.binary.clone()];
        argv.extend(build_args(&tool, format, &spec.full_path(act), options));

        Ok(Plan {
            argv,
            format,
            timeout,
            ignore_stderr,
        })
    }
}

fn lookup(
    resource: &str,
    action: &str,
) -> Result<(&'static ResourceSpec, &'static ActionSpec), AdapterError> {
    let spec = catalog::resource(resource).ok_or_else(|| AdapterError::UnknownResource {
        name: resource.to_string(),
        known: catalog::resource_names().join(", "),
    })?;
    let act = spec.action(action).ok_or_else(|| AdapterError::UnknownAction {
        resource: resource.to_string(),
        action: action.to_string(),
        known: spec
            .actions
            .iter()
            .map(|a| a.name)
            .collect::<Vec<_>>()
            .join(", "),
    })?;
    Ok((spec, act))
}
