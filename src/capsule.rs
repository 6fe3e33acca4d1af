use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;

use crate::adapter::{Adapter, CallOpts};
use crate::command::OptionSet;
use crate::output::{Payload, Table};

/// Typed front for the capsule content operations that tests lean on.
/// Everything here goes through the generic adapter; this module only adds
/// parsing of the synchronization-status table and the wait loop.

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub last_sync_time: Option<String>,
    pub active_sync_tasks: usize,
    pub failed_sync_tasks: Vec<String>,
}

impl SyncStatus {
    pub fn idle(&self) -> bool {
        self.active_sync_tasks == 0
    }
}

/// Kick off a content sync. The tool reports progress on stderr, which the
/// catalog entry already tolerates; the call blocks until the tool returns
/// or the timeout elapses.
pub fn synchronize(adapter: &Adapter, id: u64, timeout: Option<Duration>) -> Result<Payload> {
    let options = OptionSet::new().set("id", id);
    let call = CallOpts {
        timeout,
        ..CallOpts::default()
    };
    adapter
        .invoke("capsule", "content-synchronize", &options, &call)
        .with_context(|| format!("content synchronize failed for capsule {id}"))
}

pub fn synchronization_status(adapter: &Adapter, id: u64) -> Result<SyncStatus> {
    let options = OptionSet::new().set("id", id);
    let payload = adapter
        .invoke(
            "capsule",
            "content-synchronization-status",
            &options,
            &CallOpts::default(),
        )
        .with_context(|| format!("failed to read sync status for capsule {id}"))?;
    let table = payload
        .as_table()
        .context("sync status did not come back as a table")?;
    status_from_table(table)
}

/// Poll the sync status until no sync task is active or the budget runs
/// out. A sync that settles with recorded failures is an error.
pub fn wait_for_sync(
    adapter: &Adapter,
    id: u64,
    budget: Duration,
    poll_interval: Duration,
) -> Result<SyncStatus> {
    let started = Utc::now();
    loop {
        let status = synchronization_status(adapter, id)?;
        if status.idle() {
            if !status.failed_sync_tasks.is_empty() {
                bail!(
                    "capsule {} sync finished with failed tasks: {}",
                    id,
                    status.failed_sync_tasks.join("; ")
                );
            }
            return Ok(status);
        }

        let elapsed = Utc::now().signed_duration_since(started);
        if elapsed.num_milliseconds() as u128 >= budget.as_millis() {
            bail!(
                "capsule {} still syncing after {} s ({} active tasks)",
                id,
                budget.as_secs(),
                status.active_sync_tasks
            );
        }
        std::thread::sleep(poll_interval);
    }
}

fn status_from_table(table: &Table) -> Result<SyncStatus> {
    let row = table
        .records()
        .into_iter()
        .next()
        .context("sync status table has no rows")?;

    let field = |name: &str| -> Result<String> {
        row.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.to_string())
            .with_context(|| format!("sync status table has no {name:?} column"))
    };

    let last_sync_time = field("Last Sync Time")?;
    let active = field("Active Sync Tasks")?;
    let failed = field("Last Failed Sync Tasks")?;

    Ok(SyncStatus {
        last_sync_time: if last_sync_time.is_empty() {
            None
        } else {
            Some(last_sync_time)
        },
        active_sync_tasks: active
            .trim()
            .parse()
            .with_context(|| format!("active sync task count is not a number: {active:?}"))?,
        failed_sync_tasks: failed
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
