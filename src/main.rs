use clap::Parser;
use county_weather::cli::{run, Cli};
use county_weather::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
