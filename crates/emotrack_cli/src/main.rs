mod app;
mod cli;
mod logging;
mod render;

use std::process::ExitCode;

use clap::Parser;
use client_logging::client_error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    logging::initialize(cli.global.verbose, cli.global.log_file.clone());
    install_panic_report();

    match app::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            client_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Unexpected failures are reported with their location instead of vanishing.
fn install_panic_report() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        client_error!("Unexpected failure: {}", info);
        default_hook(info);
    }));
}
