use clap::Parser;
use labelkit::cli::{self, Args};
use labelkit::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging()?;
    cli::run(args).await
}
