use clap::Parser;
use ledgersim::adapter::inbound::cli::{command::Cli, run};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let code = run::execute(cli).await;

    std::process::exit(code);
}
