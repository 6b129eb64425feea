mod cli;
mod clock;
mod host;
mod ingest;
mod outbox;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run(cli::Args::parse()).await
}
