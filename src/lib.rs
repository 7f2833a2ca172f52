//! Library root for `ticket-classifier`.
//!
//! Ticket-classifier sorts free-text support tickets into a user-supplied,
//! hierarchical category tree:
//! - Load and validate the category tree and the ticket text
//! - Render the tree into an indented outline inside the system directive
//! - Ask an OpenAI (or Azure OpenAI) model for a JSON classification
//! - Validate the answer and write or print it
//!
//! The remote model sits behind the `GenericLlmClient` trait so the
//! deterministic parts of the pipeline can be exercised without the network.

pub mod base;
pub mod pipeline;
pub mod prelude;
pub mod runtime;
pub mod service;

use base::{
    config::Config,
    types::{ClassificationResult, Res},
};
use pipeline::ClassifyJob;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Creates the runtime context with the LLM client, then runs the
/// classification pipeline for a single job.
pub async fn start(config: Config, job: ClassifyJob) -> Res<ClassificationResult> {
    info!("Starting ticket-classifier ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Classify the ticket.
    Ok(runtime.process_ticket(&job).await?)
}
