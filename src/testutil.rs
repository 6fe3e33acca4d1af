#![cfg(test)]

use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

use crate::config::{ResolvedConfig, ResolvedTool};
use crate::exec::Endpoint;

pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Write an executable stub standing in for the management tool. The
    /// body is a shell script; arguments the tool would receive are in $@.
    pub fn write_stub_tool(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join("bin").join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        path
    }

    /// Config with a local endpoint pointing at the given binary.
    pub fn local_config(&self, binary: &str) -> ResolvedConfig {
        ResolvedConfig {
            endpoint: Endpoint::Local,
            api_url: None,
            tool: ResolvedTool {
                binary: binary.to_string(),
                username: None,
                password: None,
                min_version: None,
                command_timeout: Duration::from_secs(30),
            },
        }
    }
}
