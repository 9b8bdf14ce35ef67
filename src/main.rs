use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod bootstrap;
mod cli;
mod credentials;
mod error;
mod identity;
mod image;

#[cfg(test)]
mod testing;

use cli::*;
use error::ModuleError;
use identity::KeystoneClient;
use image::GlanceClient;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Operation to perform
    #[arg(value_enum)]
    command: CommandName,

    #[command(flatten)]
    args: ImageArgs,

    /// Output format of the result record
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the result record
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let http_client = Client::new();
    let identity = KeystoneClient::new(http_client.clone());

    let outcome = execute(cli.command, &cli.args, &identity, |session, version| {
        GlanceClient::new(http_client.clone(), session, version)
    })
    .await;

    match outcome {
        Ok(result) => print_result(&result, cli.output),
        Err(ModuleError::Runtime(err)) => Err(err),
        Err(err) => {
            // Only runtime errors lack a return code
            let rc = err.rc().unwrap_or(1);
            error!(rc = rc, "{}", err);
            print_failure(&FailureRecord::from_error(&err, rc))?;
            std::process::exit(rc);
        }
    }
}
