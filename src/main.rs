use std::process::ExitCode;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use shrinkurl_client::protocol::network::{ApiError, ErrorKind};
use shrinkurl_client::*;

#[tokio::main]
async fn main() -> ExitCode {
    let args = shell::Args::parse();

    let log_config = format!("reqwest=off,hyper=off,shrinkurl_client={}", args.log_level);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_config))
        .with_writer(std::io::stderr)
        .init();

    match shell::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let auth_expired = e
                .downcast_ref::<ApiError>()
                .is_some_and(|e| e.kind() == ErrorKind::AuthExpired);
            if auth_expired {
                eprintln!("Session expired, please log in again");
            }
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
