use std::process::ExitCode;

use clap::Parser;
use riff_lib::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    riff_lib::log::init();

    let cli = Cli::parse();
    match riff_lib::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
