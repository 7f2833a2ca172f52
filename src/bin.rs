//! Binary entry point for `ticket-classifier`.
//!
//! This module provides the command-line interface for the classifier: the
//! ticket and category files, an optional output path and model, plus options
//! for the configuration file path and logging verbosity.

use std::path::PathBuf;

use clap::Parser;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use ticket_classifier::{
    base::{config::Config, types::Void},
    pipeline::ClassifyJob,
};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

/// Ticket-classifier – sort a support ticket into a category hierarchy.
///
/// Credentials and endpoint settings come from `.hidden/config.toml` (or the
/// `--config` file) and `TICKET_CLASSIFIER_*` environment variables.
#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
struct Args {
    /// Path to the ticket text file.
    ticket_file: PathBuf,
    /// Path to the JSON categories file.
    categories_file: PathBuf,
    /// Optional output file path; the result is printed to stdout otherwise.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Model (Azure OpenAI deployment) name (default: gpt-4o).
    #[arg(long)]
    model: Option<String>,
    /// Override the config file path (optional).
    ///
    /// By default, the classifier will look for a config file at `.hidden/config.toml`
    /// in the current directory.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v, -vv, etc.).
    ///
    /// Use multiple times to increase verbosity:
    /// - No flag: INFO level
    /// - -v: DEBUG level
    /// - -vv or more: TRACE level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Main entry point for the ticket-classifier binary.
///
/// Loads configuration, sets up logging based on verbosity, and classifies the ticket.
#[tokio::main]
async fn main() -> Void {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;

    if let Some(model) = args.model {
        config = config.with_model(model);
    }

    // Construct the level filter.

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let level_filter = tracing_subscriber::filter::LevelFilter::from_level(level);

    // Prepare the log layer; stdout is reserved for the result.

    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_ansi(true)
        .with_level(true)
        .with_file(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    // Prepare the otlp layer, if an endpoint is configured.

    let otel = match &config.otlp_endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .with_protocol(Protocol::HttpBinary)
                .with_endpoint(endpoint.clone())
                .build()?;
            let tracer = opentelemetry_sdk::trace::SdkTracerProvider::builder().with_simple_exporter(exporter).build().tracer("ticket-classifier");

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    tracing_subscriber::registry().with(otel).with(level_filter).with(stderr).init();

    let job = ClassifyJob {
        ticket_file: args.ticket_file,
        categories_file: args.categories_file,
        output_file: args.output,
    };

    ticket_classifier::start(config, job).await?;

    Ok(())
}
