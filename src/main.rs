// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Install {
            manifest,
            prefix,
            with_docs,
            with_dev,
            python,
            mirror,
            force,
            dry_run,
            quiet,
        } => commands::cmd_install(
            &manifest, &prefix, with_docs, with_dev, python, mirror, force, dry_run, quiet,
        ),
        Commands::Uninstall { prefix } => commands::cmd_uninstall(&prefix),
        Commands::List { prefix, json } => commands::cmd_list(&prefix, json),
        Commands::Check { prefix } => commands::cmd_check(&prefix),
        Commands::Lint { manifest } => commands::cmd_lint(&manifest),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
