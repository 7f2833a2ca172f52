//! Runtime services and shared state for the ticket classifier.

use std::io;

use tracing::instrument;

use crate::{
    base::{
        config::Config,
        error::ClassifyRes,
        types::{ClassificationResult, Res},
    },
    pipeline::{self, ClassifyJob},
    service::llm::LlmClient,
};

/// Runtime service context, built once at startup.
///
/// This struct holds the configuration and the LLM client. It is designed to
/// be trivially cloneable, allowing it to be passed around without the need
/// for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The LLM client instance.
    pub llm: LlmClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Initialize the LLM client.
        let llm = LlmClient::openai(&config)?;

        Ok(Self { config, llm })
    }

    /// Classify one ticket, printing to stdout unless the job names an output file.
    pub async fn process_ticket(&self, job: &ClassifyJob) -> ClassifyRes<ClassificationResult> {
        pipeline::process_ticket(job, &self.config, &self.llm, &mut io::stdout()).await
    }
}
