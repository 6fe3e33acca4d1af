use serde::Serialize;
use std::io::{Read, Seek, SeekFrom};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command timed out after {0} s")]
    Timeout(u64),
    #[error("command exited with code {code}: {stderr}")]
    ReturnCode { code: i32, stderr: String },
    #[error("command succeeded but wrote to stderr: {stderr}")]
    StderrNoise { stderr: String },
    #[error("command output was not valid UTF-8")]
    NonUtf8,
    #[error("failed to capture command output: {0}")]
    Capture(#[from] std::io::Error),
}

/// Captured outcome of one invocation. `code` is `-1` when the process
/// died to a signal.
#[derive(Debug, Clone, Serialize)]
pub struct Execution {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Execution {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Apply the exit-status and stderr policy. Nonzero exit is always an
    /// error. Zero exit with nonempty stderr is noise unless the caller
    /// opted to ignore it.
    pub fn check(self, ignore_stderr: bool) -> Result<Execution, ExecError> {
        if self.code != 0 {
            return Err(ExecError::ReturnCode {
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            });
        }
        if !ignore_stderr && !self.stderr.trim().is_empty() {
            return Err(ExecError::StderrNoise {
                stderr: self.stderr.trim().to_string(),
            });
        }
        Ok(self)
    }
}

/// Where the tool runs: spawned directly, or wrapped in an ssh call
/// against the management host.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    Local,
    Ssh {
        host: String,
        user: String,
        port: u16,
    },
}

impl Endpoint {
    /// Translate a tool argv into the (program, args) pair to spawn.
    pub fn command_for(&self, argv: &[String]) -> (String, Vec<String>) {
        match self {
            Endpoint::Local => (argv[0].clone(), argv[1..].to_vec()),
            Endpoint::Ssh { host, user, port } => {
                let remote = argv
                    .iter()
                    .map(|a| shell_quote(a))
                    .collect::<Vec<_>>()
                    .join(" ");
                (
                    "ssh".to_string(),
                    vec![
                        "-p".to_string(),
                        port.to_string(),
                        "-o".to_string(),
                        "BatchMode=yes".to_string(),
                        format!("{}@{}", user, host),
                        remote,
                    ],
                )
            }
        }
    }
}

/// Single-quote an argument for the remote shell. Plain tokens pass
/// through untouched.
pub fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Run one command to completion, capturing stdout and stderr. Blocks
/// until the child exits or the timeout elapses; on timeout the child is
/// killed. Output is captured through temp files so a slow reader can
/// never deadlock the child against a full pipe.
pub fn run(endpoint: &Endpoint, argv: &[String], timeout: Duration) -> Result<Execution, ExecError> {
    let (program, args) = endpoint.command_for(argv);

    let stdout_file = tempfile::tempfile()?;
    let stderr_file = tempfile::tempfile()?;

    let mut child = Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file.try_clone()?))
        .stderr(Stdio::from(stderr_file.try_clone()?))
        .spawn()
        .map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

    let started = Instant::now();
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if started.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExecError::Timeout(timeout.as_secs()));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    };

    let stdout = read_capture(stdout_file)?;
    let stdout = String::from_utf8(stdout).map_err(|_| ExecError::NonUtf8)?;
    let stderr = read_capture(stderr_file)?;
    let stderr = String::from_utf8_lossy(&stderr).to_string();

    Ok(Execution {
        code: status.code().unwrap_or(-1),
        stdout,
        stderr,
    })
}

fn read_capture(mut file: std::fs::File) -> Result<Vec<u8>, std::io::Error> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}
