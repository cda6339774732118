//! Vault CLI - drive a note vault's local REST API from the terminal
//!
//! Markdown goes to stdout as-is; structured results print as pretty JSON.

mod cli;
mod error;

use std::io::{self, IsTerminal, Read, Write};

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use vault_core::config::{ENV_BASE_URL, ENV_TOKEN};
use vault_core::{ApiError, ClientConfig, Insertion, SearchQuery, Vault};

use crate::cli::{
    ActiveAction, Cli, CommandAction, Commands, FileAction, InsertArgs, PeriodicAction, SearchArgs,
};
use crate::error::CliError;

fn main() {
    if let Err(error) = run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vault=info,vault_core=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.url, cli.token)?;
    let vault = Vault::from_config(&config)?;
    tracing::debug!(base_url = %config.base_url, "Client configured");

    match cli.command {
        Commands::Status => print_json(&vault.server_status()?)?,
        Commands::Active { action } => run_active(&vault, action)?,
        Commands::File { action } => run_file(&vault, action)?,
        Commands::Ls { directory } => {
            let files = match directory.as_deref() {
                Some(dir) if !dir.trim_matches('/').is_empty() => {
                    vault.list_directory(dir.trim_end_matches('/'))?
                }
                _ => vault.list_vault()?,
            };
            for file in files {
                println!("{file}");
            }
        }
        Commands::Commands { action } => match action {
            CommandAction::List => {
                for command in vault.list_commands()? {
                    println!("{}\t{}", command.id, command.name);
                }
            }
            CommandAction::Run { id } => {
                vault.run_command(&id)?;
                tracing::info!(command = %id, "Command executed");
            }
        },
        Commands::Search(args) => run_search(&vault, args)?,
        Commands::Open { path, new_leaf } => {
            vault.open_file(&path, new_leaf)?;
            tracing::info!(%path, "Opened");
        }
        Commands::Periodic { period, action } => match action {
            PeriodicAction::Get => print_markdown(&vault.get_periodic_note(period)?)?,
            PeriodicAction::Put { content } => {
                vault.update_periodic_note(period, &resolve_content(content)?)?;
            }
            PeriodicAction::Append { content } => {
                vault.append_to_periodic_note(period, &resolve_content(content)?)?;
            }
            PeriodicAction::Insert(args) => {
                let (insertion, content) = split_insert(args)?;
                vault.insert_into_periodic_note(period, &content, &insertion)?;
            }
            PeriodicAction::Delete => vault.delete_periodic_note(period)?,
        },
    }

    Ok(())
}

/// Environment config with command-line overrides layered on top.
fn load_config(url: Option<String>, token: Option<String>) -> Result<ClientConfig, ApiError> {
    config_with_overrides(url, token, |name| std::env::var(name).ok())
}

fn config_with_overrides(
    url: Option<String>,
    token: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig, ApiError> {
    ClientConfig::from_lookup(|name| match name {
        ENV_BASE_URL if url.is_some() => url.clone(),
        ENV_TOKEN if token.is_some() => token.clone(),
        _ => env(name),
    })
}

fn run_active(vault: &Vault, action: ActiveAction) -> Result<(), CliError> {
    match action {
        ActiveAction::Get => print_markdown(&vault.get_active_file()?)?,
        ActiveAction::Append { content } => {
            vault.append_to_active_file(&resolve_content(content)?)?;
        }
        ActiveAction::Put { content } => vault.update_active_file(&resolve_content(content)?)?,
        ActiveAction::Insert(args) => {
            let (insertion, content) = split_insert(args)?;
            vault.insert_into_active_file(&content, &insertion)?;
        }
        ActiveAction::Delete => vault.delete_active_file()?,
    }
    Ok(())
}

fn run_file(vault: &Vault, action: FileAction) -> Result<(), CliError> {
    match action {
        FileAction::Get { path } => print_markdown(&vault.get_file(&path)?)?,
        FileAction::Note { path } => print_json(&vault.get_note(&path)?)?,
        FileAction::Put { path, content } => {
            vault.create_or_update_file(&path, &resolve_content(content)?)?;
        }
        FileAction::Append { path, content } => {
            vault.append_to_file(&path, &resolve_content(content)?)?;
        }
        FileAction::Insert { path, insert } => {
            let (insertion, content) = split_insert(insert)?;
            vault.insert_into_file(&path, &content, &insertion)?;
        }
        FileAction::Delete { path } => vault.delete_file(&path)?,
    }
    Ok(())
}

fn run_search(vault: &Vault, args: SearchArgs) -> Result<(), CliError> {
    let query = normalize_search_query(&args.query)?;
    if args.simple {
        print_json(&vault.simple_search(&query, args.context_length)?)
    } else if args.gui {
        print_json(&vault.gui_search(&query, args.context_length)?)
    } else {
        print_json(&vault.search(build_search_query(&query, args.jsonlogic)?)?)
    }
}

fn build_search_query(query: &str, jsonlogic: bool) -> Result<SearchQuery, CliError> {
    if jsonlogic {
        let rule: serde_json::Value = serde_json::from_str(query)?;
        Ok(SearchQuery::JsonLogic(rule))
    } else {
        Ok(SearchQuery::Dataview(query.to_string()))
    }
}

fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

fn split_insert(args: InsertArgs) -> Result<(Insertion, String), CliError> {
    let mut insertion = Insertion::new(args.heading).at(args.position);
    if let Some(boundary) = args.boundary {
        insertion = insertion.with_boundary(boundary);
    }
    Ok((insertion, resolve_content(args.content)?))
}

/// Use the argument when given, otherwise read piped stdin.
fn resolve_content(content: Option<String>) -> Result<String, CliError> {
    match content {
        Some(content) => Ok(content),
        None => read_piped_stdin()?.ok_or(CliError::EmptyContent),
    }
}

fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(non_empty(buffer))
}

fn non_empty(content: String) -> Option<String> {
    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}

fn print_markdown(content: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
