use anyhow::{bail, Result};
use serde::Serialize;

use crate::catalog::{self, CATALOG};
use crate::output::OutputFormat;

#[derive(Debug, Serialize)]
pub struct ResourcesResult {
    pub resources: Vec<ResourceSummary>,
}

#[derive(Debug, Serialize)]
pub struct ResourceSummary {
    pub name: String,
    pub actions: Vec<ActionSummary>,
}

#[derive(Debug, Serialize)]
pub struct ActionSummary {
    pub name: String,
    pub path: String,
    pub format: OutputFormat,
    pub ignore_stderr: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

pub fn cmd_resources(filter: Option<&str>) -> Result<ResourcesResult> {
    let resources: Vec<&_> = match filter {
        Some(name) => match catalog::resource(name) {
            Some(spec) => vec![spec],
            None => bail!(
                "unknown resource {:?}\n  hint: run `mallet resources` to list them",
                name
            ),
        },
        None => CATALOG.iter().collect(),
    };

    let summaries = resources
        .into_iter()
        .map(|spec| ResourceSummary {
            name: spec.name.to_string(),
            actions: spec
                .actions
                .iter()
                .map(|action| ActionSummary {
                    name: action.name.to_string(),
                    path: spec.full_path(action).join(" "),
                    format: action.format,
                    ignore_stderr: action.ignore_stderr,
                    timeout_secs: action.timeout_secs,
                })
                .collect(),
        })
        .collect();

    Ok(ResourcesResult {
        resources: summaries,
    })
}

pub fn format_resources_human(result: &ResourcesResult) -> String {
    let mut lines = Vec::new();
    for (i, resource) in result.resources.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!("{}:", resource.name));

        let name_width = resource
            .actions
            .iter()
            .map(|a| a.name.len())
            .max()
            .unwrap_or(0);
        let path_width = resource
            .actions
            .iter()
            .map(|a| a.path.len())
            .max()
            .unwrap_or(0);

        for action in &resource.actions {
            let mut notes = vec![action.format.to_string()];
            if action.ignore_stderr {
                notes.push("ignore-stderr".to_string());
            }
            if let Some(secs) = action.timeout_secs {
                notes.push(format!("{}s", secs));
            }
            lines.push(format!(
                "  {:<name_width$}  {:<path_width$}  [{}]",
                action.name,
                action.path,
                notes.join(", ")
            ));
        }
    }
    lines.join("\n")
}
