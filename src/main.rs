mod adapter;
mod capsule;
mod catalog;
mod cli;
mod command;
mod commands;
mod config;
mod doctor;
mod exec;
mod output;
mod testutil;

use anyhow::Result;
use clap::Parser;
use cli::{CapsuleCommand, Cli, Command};

use adapter::Adapter;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = config::resolve_config_path(cli.config.as_deref())?;

    match cli.command {
        Command::Init {
            host,
            user,
            port,
            api_url,
            binary,
            username,
            password,
            force,
            show_path,
        } => {
            if show_path {
                println!("{}", config_path.display());
                return Ok(());
            }
            let inputs = commands::InitInputs {
                host,
                user,
                port,
                api_url,
                binary,
                username,
                password,
            };
            let result = commands::cmd_init(inputs, &config_path, force)?;
            output(&result, cli.json, commands::format_init_human)?;
        }
        Command::Resources { resource } => {
            let result = commands::cmd_resources(resource.as_deref())?;
            output(&result, cli.json, commands::format_resources_human)?;
        }
        Command::Run {
            resource,
            action,
            options,
            format,
            timeout_secs,
            ignore_stderr,
            raw,
        } => {
            let adapter = Adapter::new(config::load_config(&config_path)?);
            let inputs = commands::RunInputs {
                resource,
                action,
                options,
                format,
                timeout_secs,
                ignore_stderr,
                raw_response: raw,
            };
            let result = commands::cmd_run(&adapter, inputs)?;
            output(&result, cli.json, commands::format_run_human)?;
        }
        Command::Capsule { command } => {
            let adapter = Adapter::new(config::load_config(&config_path)?);
            match command {
                CapsuleCommand::Sync {
                    id,
                    wait,
                    timeout_secs,
                    poll_secs,
                } => {
                    let inputs = commands::SyncInputs {
                        id,
                        wait,
                        timeout_secs,
                        poll_secs,
                    };
                    let result = commands::cmd_capsule_sync(&adapter, inputs)?;
                    output(&result, cli.json, commands::format_capsule_sync_human)?;
                }
                CapsuleCommand::Status { id } => {
                    let result = commands::cmd_capsule_status(&adapter, id)?;
                    output(&result, cli.json, commands::format_capsule_status_human)?;
                }
            }
        }
        Command::Doctor => {
            let adapter = Adapter::new(config::load_config(&config_path)?);
            let result = doctor::cmd_doctor(&adapter)?;
            let ok = result.ok;
            output(&result, cli.json, doctor::format_doctor_human)?;
            if !ok {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

fn output<T: serde::Serialize>(result: &T, json: bool, human_fn: fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let text = human_fn(result);
        if !text.is_empty() {
            println!("{}", text);
        }
    }
    Ok(())
}
