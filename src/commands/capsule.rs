use anyhow::Result;
use serde::Serialize;
use std::time::Duration;

use crate::adapter::Adapter;
use crate::capsule::{self, SyncStatus};
use crate::output::{format_payload_human, Payload};

pub struct SyncInputs {
    pub id: u64,
    pub wait: bool,
    pub timeout_secs: Option<u64>,
    pub poll_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct CapsuleSyncResult {
    pub id: u64,
    pub waited: bool,
    pub payload: Payload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SyncStatus>,
}

#[derive(Debug, Serialize)]
pub struct CapsuleStatusResult {
    pub id: u64,
    pub status: SyncStatus,
}

pub fn cmd_capsule_sync(adapter: &Adapter, inputs: SyncInputs) -> Result<CapsuleSyncResult> {
    let timeout = inputs.timeout_secs.map(Duration::from_secs);
    let payload = capsule::synchronize(adapter, inputs.id, timeout)?;

    let status = if inputs.wait {
        let budget = timeout.unwrap_or(Duration::from_secs(
            crate::catalog::CAPSULE_SYNC_TIMEOUT_SECS,
        ));
        Some(capsule::wait_for_sync(
            adapter,
            inputs.id,
            budget,
            Duration::from_secs(inputs.poll_secs.max(1)),
        )?)
    } else {
        None
    };

    Ok(CapsuleSyncResult {
        id: inputs.id,
        waited: inputs.wait,
        payload,
        status,
    })
}

pub fn cmd_capsule_status(adapter: &Adapter, id: u64) -> Result<CapsuleStatusResult> {
    let status = capsule::synchronization_status(adapter, id)?;
    Ok(CapsuleStatusResult { id, status })
}

pub fn format_capsule_sync_human(result: &CapsuleSyncResult) -> String {
    let mut lines = Vec::new();
    let payload_text = format_payload_human(&result.payload);
    if !payload_text.is_empty() {
        lines.push(payload_text);
    }
    match &result.status {
        Some(status) => lines.push(format!(
            "Capsule {} synchronized (last sync: {})",
            result.id,
            status.last_sync_time.as_deref().unwrap_or("unknown")
        )),
        None if result.waited => {}
        None => lines.push(format!("Capsule {} sync started", result.id)),
    }
    lines.join("\n")
}

pub fn format_capsule_status_human(result: &CapsuleStatusResult) -> String {
    let mut lines = vec![format!(
        "Capsule {}: {} active sync task(s)",
        result.id, result.status.active_sync_tasks
    )];
    if let Some(last) = &result.status.last_sync_time {
        lines.push(format!("  last sync: {}", last));
    }
    for failure in &result.status.failed_sync_tasks {
        lines.push(format!("  failed: {}", failure));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestEnv;

    const STATUS_HEADERS: &str = "Last Sync Time,Active Sync Tasks,Last Failed Sync Tasks";

    #[test]
    fn sync_without_wait_reports_started() {
        let env = TestEnv::new();
        let stub = env.write_stub_tool("tool", "echo 'Id,Result'\necho '5,success'\n");
        let adapter = Adapter::new(env.local_config(stub.to_str().unwrap()));

        let result = cmd_capsule_sync(
            &adapter,
            SyncInputs {
                id: 5,
                wait: false,
                timeout_secs: None,
                poll_secs: 1,
            },
        )
        .unwrap();
        assert!(result.status.is_none());

        let text = format_capsule_sync_human(&result);
        assert!(text.contains("sync started"));
    }

    #[test]
    fn sync_with_wait_polls_status() {
        let env = TestEnv::new();
        // One stub serves both the synchronize call and the status polls;
        // status output satisfies both parsers.
        let stub = env.write_stub_tool(
            "tool",
            &format!("echo '{STATUS_HEADERS}'\necho '2026/08/07 10:00:00,0,'\n"),
        );
        let adapter = Adapter::new(env.local_config(stub.to_str().unwrap()));

        let result = cmd_capsule_sync(
            &adapter,
            SyncInputs {
                id: 5,
                wait: true,
                timeout_secs: Some(5),
                poll_secs: 1,
            },
        )
        .unwrap();
        let status = result.status.unwrap();
        assert!(status.idle());
    }

    #[test]
    fn status_command_formats_failures() {
        let env = TestEnv::new();
        let stub = env.write_stub_tool(
            "tool",
            &format!("echo '{STATUS_HEADERS}'\necho ',0,repo-a timed out'\n"),
        );
        let adapter = Adapter::new(env.local_config(stub.to_str().unwrap()));

        let result = cmd_capsule_status(&adapter, 5).unwrap();
        let text = format_capsule_status_human(&result);
        assert!(text.contains("Capsule 5: 0 active sync task(s)"));
        assert!(text.contains("failed: repo-a timed out"));
    }
}
