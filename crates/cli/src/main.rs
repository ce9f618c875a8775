use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use epiccrm_core::DomainError;
use epiccrm_infra::{AppConfig, SnapshotFile};

mod app;
mod args;
mod render;

use app::App;
use args::{Cli, Command, EmployeesCommand};

fn main() -> ExitCode {
    epiccrm_observability::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Load, run exactly one command, and save only if it succeeded.
fn run(cli: Cli) -> anyhow::Result<String> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    let snapshot = SnapshotFile::new(config.snapshot_path());
    let store = snapshot.load()?;
    let app = App::open(&config, store).context("invalid session configuration")?;

    let command = with_password(cli.command)?;
    let output = app.execute(command)?;

    snapshot.save(app.store())?;
    Ok(output)
}

/// Prompt on stdin for a password the command line left out.
fn with_password(command: Command) -> anyhow::Result<Command> {
    Ok(match command {
        Command::Login {
            email,
            password: None,
        } => Command::Login {
            password: Some(prompt("password: ")?),
            email,
        },
        Command::Employees {
            command:
                EmployeesCommand::Create {
                    first_name,
                    last_name,
                    email,
                    role,
                    password: None,
                },
        } => Command::Employees {
            command: EmployeesCommand::Create {
                first_name,
                last_name,
                email,
                role,
                password: Some(prompt("password for the new account: ")?),
            },
        },
        other => other,
    })
}

fn prompt(label: &str) -> anyhow::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{label}").context("failed to write prompt")?;
    stderr.flush().context("failed to write prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<DomainError>() {
        Some(domain) if !domain.is_unexpected() => eprintln!("error: {domain}"),
        _ => {
            tracing::error!(error = %format!("{err:#}"), "command failed");
            eprintln!("unexpected error: {err:#}");
            eprintln!("no changes were saved");
        }
    }
}

/// 1 for domain errors the caller can act on, 2 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DomainError>() {
        Some(domain) if !domain.is_unexpected() => 1,
        _ => 2,
    }
}
