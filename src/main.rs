use std::process;

use advisor_cli::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
