use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = scoutline_cli::Cli::parse();
    scoutline_cli::init_tracing(cli.verbose);

    match scoutline_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(scoutline_cli::exit_code(&e))
        }
    }
}
