use crate::output::OutputFormat;

/// One remote resource category and the actions the tool exposes for it.
/// The whole per-resource surface is this table; there is no per-resource
/// adapter code.
#[derive(Debug)]
pub struct ResourceSpec {
    pub name: &'static str,
    pub prefix: &'static [&'static str],
    pub actions: &'static [ActionSpec],
}

#[derive(Debug)]
pub struct ActionSpec {
    pub name: &'static str,
    pub path: &'static [&'static str],
    pub format: OutputFormat,
    pub ignore_stderr: bool,
    pub timeout_secs: Option<u64>,
}

impl ResourceSpec {
    pub fn action(&self, name: &str) -> Option<&'static ActionSpec> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Subcommand path for an action: resource prefix plus action words.
    pub fn full_path(&self, action: &ActionSpec) -> Vec<&'static str> {
        let mut path = self.prefix.to_vec();
        path.extend_from_slice(action.path);
        path
    }
}

const fn action(name: &'static str, path: &'static [&'static str]) -> ActionSpec {
    ActionSpec {
        name,
        path,
        format: OutputFormat::Table,
        ignore_stderr: false,
        timeout_secs: None,
    }
}

const fn json_action(name: &'static str, path: &'static [&'static str]) -> ActionSpec {
    ActionSpec {
        format: OutputFormat::Json,
        ..action(name, path)
    }
}

pub const CAPSULE_SYNC_TIMEOUT_SECS: u64 = 3600;

pub static CATALOG: &[ResourceSpec] = &[
    ResourceSpec {
        name: "capsule",
        prefix: &["capsule"],
        actions: &[
            action("list", &["list"]),
            json_action("info", &["info"]),
            action("create", &["create"]),
            action("update", &["update"]),
            action("delete", &["delete"]),
            action("refresh-features", &["refresh-features"]),
            action("import-classes", &["import-classes"]),
            action(
                "content-add-lifecycle-environment",
                &["content", "add-lifecycle-environment"],
            ),
            action(
                "content-available-lifecycle-environments",
                &["content", "available-lifecycle-environments"],
            ),
            action(
                "content-lifecycle-environments",
                &["content", "lifecycle-environments"],
            ),
            action(
                "content-remove-lifecycle-environment",
                &["content", "remove-lifecycle-environment"],
            ),
            json_action("content-info", &["content", "info"]),
            action(
                "content-synchronization-status",
                &["content", "synchronization-status"],
            ),
            ActionSpec {
                // Long-running; the tool chats progress on stderr.
                ignore_stderr: true,
                timeout_secs: Some(CAPSULE_SYNC_TIMEOUT_SECS),
                ..action("content-synchronize", &["content", "synchronize"])
            },
            json_action("content-update-counts", &["content", "update-counts"]),
        ],
    },
    ResourceSpec {
        name: "host",
        prefix: &["host"],
        actions: &[
            action("list", &["list"]),
            json_action("info", &["info"]),
            action("create", &["create"]),
            action("update", &["update"]),
            action("delete", &["delete"]),
        ],
    },
    ResourceSpec {
        name: "subscription",
        prefix: &["subscription"],
        actions: &[
            action("list", &["list"]),
            action("upload", &["upload"]),
            action("refresh-manifest", &["refresh-manifest"]),
            action("delete-manifest", &["delete-manifest"]),
        ],
    },
    ResourceSpec {
        name: "activation-key",
        prefix: &["activation-key"],
        actions: &[
            action("list", &["list"]),
            json_action("info", &["info"]),
            action("create", &["create"]),
            action("update", &["update"]),
            action("delete", &["delete"]),
            action("add-subscription", &["add-subscription"]),
        ],
    },
    ResourceSpec {
        name: "virt-who-config",
        prefix: &["virt-who-config"],
        actions: &[
            action("list", &["list"]),
            json_action("info", &["info"]),
            action("create", &["create"]),
            action("update", &["update"]),
            action("delete", &["delete"]),
            action("deploy", &["deploy"]),
        ],
    },
];

pub fn resource(name: &str) -> Option<&'static ResourceSpec> {
    CATALOG.iter().find(|r| r.name == name)
}

pub fn resource_names() -> Vec<&'static str> {
    CATALOG.iter().map(|r| r.name).collect()
}
