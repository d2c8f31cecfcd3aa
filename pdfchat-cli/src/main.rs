use clap::Parser;
use pdfchat_cli::cli::Cli;
use pdfchat_cli::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.options.verbose);

    pdfchat_cli::run(cli).await
}
