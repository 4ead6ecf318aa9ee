use clap::Parser;
use cli::Args;
use indicatif::ProgressStyle;
use tracing_error::ErrorLayer;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub mod artifacts;
pub mod error;
pub mod network;
pub mod serde_utils;
pub mod types;

mod cli;
mod config;
mod deployment;
mod interactive;
mod report;

const SPINNER_TEMPLATE: &str = "{spinner:.green} {span_name} {span_fields}";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    dotenv::dotenv().ok();

    let indicatif_layer = IndicatifLayer::new()
        .with_progress_style(ProgressStyle::with_template(SPINNER_TEMPLATE)?);

    let filter = EnvFilter::from_default_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(indicatif_layer.get_stderr_writer())
                .with_filter(filter),
        )
        .with(indicatif_layer)
        .with(ErrorLayer::default())
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            err.print()?;
            std::process::exit(cli::parse_error_exit_code(&err))
        }
    };

    let result =
        deployment::run_deployment(args, &mut std::io::stdout().lock()).await;

    std::process::exit(deployment::exit_code(result))
}
