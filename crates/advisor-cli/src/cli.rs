//! Main CLI entry point and command routing

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use crate::args::{AdvisorArgs, Commands};
use crate::commands;
use crate::output::OutputOptions;

/// Parse the process arguments and run the selected command
pub async fn run() -> Result<()> {
    let args = AdvisorArgs::parse();
    let default_filter = if args.verbose() { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let output = execute(args).await?;
    print!("{}", output);
    Ok(())
}

/// Run already-parsed arguments and return the rendered output
pub async fn execute(args: AdvisorArgs) -> Result<String> {
    let config = commands::load_config(args.config.as_deref(), args.domain)?;
    let options = OutputOptions {
        json: args.json,
        no_color: args.no_color,
        verbose: false,
    };

    match &args.command {
        Commands::Prioritize(input) => commands::prioritize(config, input, &options),
        Commands::Recommend(recommend) => {
            commands::recommend(args.domain, config, recommend, &options).await
        }
        Commands::Templates { action } => commands::templates(args.domain, action, &options),
    }
}
