use clap::Parser;
use azdo_knowledge_gateway::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    cli::query::run(cli).await
}
