mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    modbox_core::observability::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            sandbox,
            verb,
            args,
        } => commands::run::cmd_run(&sandbox, &verb, &args)?,
        Commands::Env { sandbox } => commands::env::cmd_env(&sandbox)?,
        Commands::Split { path } => commands::split::cmd_split(&path)?,
    }

    Ok(())
}
