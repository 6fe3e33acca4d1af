use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use ureq::Agent;

use crate::adapter::Adapter;

const API_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorResult {
    pub generated_at: DateTime<Utc>,
    pub checks: Vec<DoctorCheck>,
    pub ok: bool,
}

/// Verify the harness can actually drive the endpoint: the tool answers
/// `--version` with an acceptable version, and the management API responds
/// when one is configured.
pub fn cmd_doctor(adapter: &Adapter) -> Result<DoctorResult> {
    let checks = vec![tool_version_check(adapter), api_status_check(adapter)];
    let ok = checks.iter().all(|c| c.status != CheckStatus::Fail);
    Ok(DoctorResult {
        generated_at: Utc::now(),
        checks,
        ok,
    })
}

fn tool_version_check(adapter: &Adapter) -> DoctorCheck {
    let binary = adapter.config().tool.binary.clone();
    let execution = match adapter.invoke_bare(&["--version"], Duration::from_secs(30)) {
        Ok(e) => e,
        Err(e) => {
            return DoctorCheck {
                name: "tool-version".to_string(),
                status: CheckStatus::Fail,
                detail: format!("could not run {binary} --version: {e}"),
            }
        }
    };

    if !execution.success() {
        return DoctorCheck {
            name: "tool-version".to_string(),
            status: CheckStatus::Fail,
            detail: format!(
                "{binary} --version exited with code {}: {}",
                execution.code,
                execution.stderr.trim()
            ),
        };
    }

    let reported = execution.stdout.trim();
    let Some(version) = parse_version_token(reported) else {
        return DoctorCheck {
            name: "tool-version".to_string(),
            status: CheckStatus::Warn,
            detail: format!("could not find a version in {reported:?}"),
        };
    };

    match &adapter.config().tool.min_version {
        Some(min) if &version < min => DoctorCheck {
            name: "tool-version".to_string(),
            status: CheckStatus::Fail,
            detail: format!("{binary} {version} is older than required {min}"),
        },
        Some(min) => DoctorCheck {
            name: "tool-version".to_string(),
            status: CheckStatus::Ok,
            detail: format!("{binary} {version} (minimum {min})"),
        },
        None => DoctorCheck {
            name: "tool-version".to_string(),
            status: CheckStatus::Ok,
            detail: format!("{binary} {version}"),
        },
    }
}

/// Last whitespace-separated token of the first line that parses as a
/// version, e.g. "hammer (3.5.1)" or "hammer 3.5.1".
fn parse_version_token(reported: &str) -> Option<semver::Version> {
    let first_line = reported.lines().next()?;
    first_line
        .split_whitespace()
        .rev()
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_digit() && c != '.'))
        .find_map(|token| semver::Version::parse(token).ok())
}

fn api_status_check(adapter: &Adapter) -> DoctorCheck {
    let Some(api_url) = adapter.config().api_url.as_deref() else {
        return DoctorCheck {
            name: "api-status".to_string(),
            status: CheckStatus::Warn,
            detail: "endpoint.api_url not configured, skipping".to_string(),
        };
    };

    let url = format!("{}/api/status", api_url.trim_end_matches('/'));
    let config = Agent::config_builder()
        .timeout_global(Some(API_TIMEOUT))
        .build();
    let agent: Agent = config.into();

    let response = agent
        .get(&url)
        .header(
            "User-Agent",
            &format!("mallet/{}", env!("CARGO_PKG_VERSION")),
        )
        .call();

    match response {
        Ok(mut resp) => match resp.body_mut().read_json::<serde_json::Value>() {
            Ok(body) => {
                let version = body
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown version");
                DoctorCheck {
                    name: "api-status".to_string(),
                    status: CheckStatus::Ok,
                    detail: format!("{url} answered ({version})"),
                }
            }
            Err(e) => DoctorCheck {
                name: "api-status".to_string(),
                status: CheckStatus::Fail,
                detail: format!("{url} answered with an unreadable body: {e}"),
            },
        },
        Err(e) => DoctorCheck {
            name: "api-status".to_string(),
            status: CheckStatus::Fail,
            detail: format!("could not reach {url}: {e}"),
        },
    }
}

pub fn format_doctor_human(result: &DoctorResult) -> String {
    let mut lines = Vec::new();
    for check in &result.checks {
        lines.push(format!(
            "{:<4}  {:<12}  {}",
            check.status.to_string(),
            check.name,
            check.detail
        ));
    }
    lines.push(String::new());
    lines.push(if result.ok {
        "All checks passed.".to_string()
    } else {
        "Some checks failed.".to_string()
    });
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Adapter;
    use crate::testutil::TestEnv;

    #[test]
    fn parse_version_token_bare() {
        assert_eq!(
            parse_version_token("hammer 3.5.1"),
            Some(semver::Version::new(3, 5, 1))
        );
    }

    #[test]
    fn parse_version_token_parenthesized() {
        assert_eq!(
            parse_version_token("hammer (3.5.1)"),
            Some(semver::Version::new(3, 5, 1))
        );
    }

    #[test]
    fn parse_version_token_first_line_only() {
        assert_eq!(
            parse_version_token("hammer 3.5.1\nplugin foo 9.9.9"),
            Some(semver::Version::new(3, 5, 1))
        );
    }

    #[test]
    fn parse_version_token_none_when_absent() {
        assert_eq!(parse_version_token("no version here"), None);
    }

    #[test]
    fn version_check_ok_against_stub() {
        let env = TestEnv::new();
        let stub = env.write_stub_tool("tool", "echo 'hammer 3.5.1'\n");
        let adapter = Adapter::new(env.local_config(stub.to_str().unwrap()));

        let check = tool_version_check(&adapter);
        assert_eq!(check.status, CheckStatus::Ok);
        assert!(check.detail.contains("3.5.1"));
    }

    #[test]
    fn version_check_fails_below_minimum() {
        let env = TestEnv::new();
        let stub = env.write_stub_tool("tool", "echo 'hammer 2.0.0'\n");
        let mut config = env.local_config(stub.to_str().unwrap());
        config.tool.min_version = Some(semver::Version::new(3, 0, 0));
        let adapter = Adapter::new(config);

        let check = tool_version_check(&adapter);
        assert_eq!(check.status, CheckStatus::Fail);
        assert!(check.detail.contains("older than required"));
    }

    #[test]
    fn version_check_warns_on_unparseable_output() {
        let env = TestEnv::new();
        let stub = env.write_stub_tool("tool", "echo 'development build'\n");
        let adapter = Adapter::new(env.local_config(stub.to_str().unwrap()));

        let check = tool_version_check(&adapter);
        assert_eq!(check.status, CheckStatus::Warn);
    }

    #[test]
    fn version_check_fails_when_binary_missing() {
        let env = TestEnv::new();
        let adapter = Adapter::new(env.local_config("/nonexistent/tool-binary"));

        let check = tool_version_check(&adapter);
        assert_eq!(check.status, CheckStatus::Fail);
    }

    #[test]
    fn api_check_warns_without_url() {
        let env = TestEnv::new();
        let adapter = Adapter::new(env.local_config("hammer"));

        let check = api_status_check(&adapter);
        assert_eq!(check.status, CheckStatus::Warn);
        assert!(check.detail.contains("not configured"));
    }

    #[test]
    fn doctor_overall_ok_ignores_warns() {
        let env = TestEnv::new();
        let stub = env.write_stub_tool("tool", "echo 'hammer 3.5.1'\n");
        let adapter = Adapter::new(env.local_config(stub.to_str().unwrap()));

        // tool-version ok, api-status warn (no url) -> overall ok
        let result = cmd_doctor(&adapter).unwrap();
        assert!(result.ok);
        assert_eq!(result.checks.len(), 2);
    }
}
