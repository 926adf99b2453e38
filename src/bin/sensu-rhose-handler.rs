use anyhow::Result;
use clap::Parser;
use sensu_rhose_handler::app;
use sensu_rhose_handler::config::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    app::run(&args).await?;
    Ok(())
}
