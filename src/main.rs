use std::process::ExitCode;

use tracing::Level;

use punchbag::config::{Config, ConfigError};
use punchbag::http::response::ResponseSet;
use punchbag::server::listener::Server;

fn usage(program: &str) -> String {
    format!(
        "Usage:   {program} [-v|--verbose] <port> [response_body]\n\
         Or:      {program} [-v|--verbose] --config <file.yaml>\n\
         Example: {program} 8080 '<html></html>'\n\
         response_body can be empty"
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "punchbag".to_string());

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            if matches!(e, ConfigError::Usage) {
                eprintln!("{}", usage(&program));
            }
            return ExitCode::from(e.exit_code());
        }
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if config.verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .init();

    let responses = match ResponseSet::build(config.body.as_bytes()) {
        Ok(responses) => responses,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let server = match Server::bind(&config, responses) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    tokio::select! {
        res = server.run() => {
            if let Err(e) = res {
                tracing::error!("Server error: {}", e);
                return ExitCode::FAILURE;
            }
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    ExitCode::SUCCESS
}
