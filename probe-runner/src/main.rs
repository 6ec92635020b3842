//! Probe Runner Binary Entry Point

use clap::Parser;
use probe_runner::{logging, run, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.json);

    if let Err(e) = run(args).await {
        tracing::error!("Probe runner failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}
