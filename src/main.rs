// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_path();
    let registry = cli.registry.as_deref();

    match cli.command {
        Some(Commands::Init) => commands::cmd_init(config),
        Some(Commands::List) => commands::cmd_list(config, registry),
        Some(Commands::Add { names, all, yes }) => {
            commands::cmd_add(config, registry, &names, all, yes)
        }
        Some(Commands::Remove { name }) => commands::cmd_remove(config, &name),
        Some(Commands::Health) => commands::cmd_health(config, registry),
        Some(Commands::Package {
            components_dir,
            registry_dir,
            pkg_version,
            only,
        }) => commands::cmd_package(components_dir, registry_dir, pkg_version, only),
        Some(Commands::Verify { dir }) => commands::cmd_verify(&dir),
        Some(Commands::CheckImmutable { base, current }) => {
            commands::cmd_check_immutable(&base, &current)
        }
        #[cfg(feature = "server")]
        Some(Commands::Serve { bind, dir }) => commands::cmd_serve(&bind, dir),
        Some(Commands::Completions { shell }) => commands::cmd_completions(shell),
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
