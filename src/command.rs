use std::collections::BTreeMap;

use crate::output::OutputFormat;

/// One flag value. `Flag` renders bare (`--force`), lists render
/// comma-joined (`--organization-ids=1,2`), everything else as `--key=value`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Flag,
    Str(String),
    Int(i64),
    List(Vec<String>),
}

impl OptionValue {
    fn render(&self) -> Option<String> {
        match self {
            OptionValue::Flag => None,
            OptionValue::Str(s) => Some(s.clone()),
            OptionValue::Int(n) => Some(n.to_string()),
            OptionValue::List(items) => Some(items.join(",")),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

impl From<i64> for OptionValue {
    fn from(n: i64) -> Self {
        OptionValue::Int(n)
    }
}

impl From<u64> for OptionValue {
    fn from(n: u64) -> Self {
        OptionValue::Int(n as i64)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(items: Vec<String>) -> Self {
        OptionValue::List(items)
    }
}

/// Flag-name-to-value mapping supplied by the caller. Values are not
/// validated here; the remote tool is the judge. Setting a flag twice
/// replaces the earlier value, so a flag never renders more than once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    entries: BTreeMap<String, OptionValue>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder form of `insert`.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Flags as argv tokens, in sorted flag-name order.
    pub fn render(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(key, value)| match value.render() {
                Some(v) => format!("--{}={}", key, v),
                None => format!("--{}", key),
            })
            .collect()
    }
}

/// Tool-level settings that prefix every command line.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs<'a> {
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

/// Build the argv for one invocation, without the binary itself:
/// credentials, output-format flag, subcommand path words, then the
/// rendered option flags. The result contains exactly the flags implied
/// by the option set, in deterministic order.
pub fn build_args(
    tool: &ToolArgs<'_>,
    format: OutputFormat,
    path: &[&str],
    options: &OptionSet,
) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(username) = tool.username {
        args.push(format!("--username={}", username));
    }
    if let Some(password) = tool.password {
        args.push(format!("--password={}", password));
    }
    if let Some(flag) = format.output_flag() {
        args.push(flag.to_string());
    }
    args.extend(path.iter().map(|word| word.to_string()));
    args.extend(options.render());
    args
}
