//! The classification pipeline.
//!
//! Stages run strictly in order, and each one fails fast:
//! - Load the category tree and the ticket text.
//! - Render the tree into the system directive.
//! - Ask the model for a classification.
//! - Validate the answer, then write or print it.

pub mod loader;
pub mod outline;
pub mod validate;

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tracing::{debug, error, info, instrument};

use crate::{
    base::{
        config::Config,
        error::{ClassifyError, ClassifyRes},
        types::{CategoryNode, ClassificationResult, CompletionRequest},
    },
    service::llm::LlmClient,
};

/// The files involved in classifying one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyJob {
    /// Path to the ticket text file.
    pub ticket_file: PathBuf,
    /// Path to the JSON categories file.
    pub categories_file: PathBuf,
    /// Where to write the result; printed to stdout when absent.
    pub output_file: Option<PathBuf>,
}

/// Send the system directive and ticket to the model once, returning its raw answer.
///
/// Every failure of the remote call collapses into `ClassificationFailed`.
#[instrument(skip_all, fields(model = %config.model))]
pub async fn request_classification(llm: &LlmClient, config: &Config, system_directive: String, ticket: &str) -> ClassifyRes<String> {
    let request = CompletionRequest {
        model: config.model.clone(),
        system_directive,
        user_content: ticket.to_string(),
        temperature: config.send_temperature.then_some(config.temperature),
        max_tokens: config.max_tokens,
        json_response: true,
    };

    llm.get_completion_response(&request).await.map_err(ClassifyError::remote)
}

/// Classify a ticket against a category tree.
#[instrument(skip_all)]
pub async fn classify_ticket(llm: &LlmClient, config: &Config, ticket: &str, categories: &[CategoryNode]) -> ClassifyRes<ClassificationResult> {
    let system_directive = outline::build_system_directive(&config.system_directive, categories, config.max_category_depth)?;

    let answer = request_classification(llm, config, system_directive, ticket).await?;

    validate::parse_classification(&answer)
}

/// Run the complete pipeline for one job.
///
/// On failure, a single `Error: ...` line is logged and the error is returned unchanged.
#[instrument(skip_all)]
pub async fn process_ticket<W: Write>(job: &ClassifyJob, config: &Config, llm: &LlmClient, stdout: &mut W) -> ClassifyRes<ClassificationResult> {
    let result = process_ticket_internal(job, config, llm, stdout).await;

    if let Err(err) = &result {
        error!("Error: {err}");
    }

    result
}

async fn process_ticket_internal<W: Write>(job: &ClassifyJob, config: &Config, llm: &LlmClient, stdout: &mut W) -> ClassifyRes<ClassificationResult> {
    let categories = loader::load_categories(&job.categories_file)?;
    let ticket = loader::load_ticket(&job.ticket_file)?;

    let node_count: usize = categories.iter().map(CategoryNode::node_count).sum();
    info!("Classifying ticket against {} top-level categories ({node_count} in total) ...", categories.len());

    let result = classify_ticket(llm, config, &ticket, &categories).await?;

    info!("Received {} category paths.", result.analysis_results.len());

    for path in &result.analysis_results {
        match path.labels() {
            Some(labels) => debug!("Category path: {}", labels.join(" > ")),
            None => debug!("Category path with non-text segments: {:?}", path.0),
        }
    }

    emit_result(&result, job.output_file.as_deref(), stdout)?;

    Ok(result)
}

/// Write the result as pretty-printed JSON to `output`, or print it to `stdout`.
pub fn emit_result<W: Write>(result: &ClassificationResult, output: Option<&Path>, stdout: &mut W) -> ClassifyRes<()> {
    let json = serde_json::to_string_pretty(result).map_err(|e| ClassifyError::invalid_input(format!("Unable to serialize result: {e}")))?;

    let write_error = |e: std::io::Error| ClassifyError::invalid_input(format!("Unable to write output: {e}"));

    match output {
        Some(path) => {
            fs::write(path, json).map_err(|e| ClassifyError::invalid_input(format!("Unable to write output file {}: {e}", path.display())))?;
            writeln!(stdout, "Results saved to {}", path.display()).map_err(write_error)?;
        }
        None => writeln!(stdout, "{json}").map_err(write_error)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        base::{
            config::ConfigInner,
            error::{ErrorKind, FailureOrigin},
            types::Res,
        },
        service::llm::GenericLlmClient,
    };

    /// Returns a canned answer, or fails like a transport error would.
    struct CannedLlm(Option<&'static str>);

    #[async_trait]
    impl GenericLlmClient for CannedLlm {
        async fn get_completion_response(&self, _request: &CompletionRequest) -> Res<String> {
            self.0.map(str::to_string).ok_or_else(|| anyhow::anyhow!("401 Unauthorized"))
        }
    }

    /// Remembers the request it was sent.
    #[derive(Default)]
    struct RecordingLlm(Mutex<Option<CompletionRequest>>);

    #[async_trait]
    impl GenericLlmClient for RecordingLlm {
        async fn get_completion_response(&self, request: &CompletionRequest) -> Res<String> {
            *self.0.lock().unwrap() = Some(request.clone());
            Ok(r#"{"analysis_results":[]}"#.to_string())
        }
    }

    fn test_config() -> Config {
        Config {
            inner: Arc::new(ConfigInner::default()),
        }
    }

    #[tokio::test]
    async fn test_request_carries_configured_temperature() {
        let recorder = Arc::new(RecordingLlm::default());
        let llm = LlmClient::new(recorder.clone());

        request_classification(&llm, &test_config(), "directive".to_string(), "ticket").await.unwrap();
        let request = recorder.0.lock().unwrap().take().unwrap();
        assert_eq!(request.temperature, Some(0.1));
        assert!(request.json_response);

        let config = Config {
            inner: Arc::new(ConfigInner {
                send_temperature: false,
                ..Default::default()
            }),
        };

        request_classification(&llm, &config, "directive".to_string(), "ticket").await.unwrap();
        assert_eq!(recorder.0.lock().unwrap().take().unwrap().temperature, None);
    }

    #[tokio::test]
    async fn test_classify_ticket() {
        let llm = LlmClient::new(Arc::new(CannedLlm(Some(r#"{"analysis_results":[["Issue Type","Bug"]]}"#))));
        let categories = vec![CategoryNode::leaf("Issue Type").with_subcategories(vec![CategoryNode::leaf("Bug")])];

        let result = classify_ticket(&llm, &test_config(), "App crashes", &categories).await.unwrap();

        assert_eq!(serde_json::to_value(&result).unwrap(), json!({ "analysis_results": [["Issue Type", "Bug"]] }));
    }

    #[tokio::test]
    async fn test_remote_failure_is_classification_failed() {
        let llm = LlmClient::new(Arc::new(CannedLlm(None)));

        let err = request_classification(&llm, &test_config(), "directive".to_string(), "ticket").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ClassificationFailed);
        assert!(matches!(err, ClassifyError::ClassificationFailed { origin: FailureOrigin::Remote, .. }));
        assert!(err.to_string().contains("401 Unauthorized"));
    }

    #[tokio::test]
    async fn test_remote_and_validation_failures_share_a_kind() {
        let remote = classify_ticket(&LlmClient::new(Arc::new(CannedLlm(None))), &test_config(), "ticket", &[]).await.unwrap_err();
        let invalid = classify_ticket(&LlmClient::new(Arc::new(CannedLlm(Some("not json")))), &test_config(), "ticket", &[]).await.unwrap_err();

        assert_eq!(remote.kind(), invalid.kind());
    }

    #[test]
    fn test_emit_result_prints_pretty_json() {
        let result: ClassificationResult = serde_json::from_str(r#"{"analysis_results":[["Issue Type","Bug"]]}"#).unwrap();
        let mut stdout = Vec::new();

        emit_result(&result, None, &mut stdout).unwrap();

        let expected = "{\n  \"analysis_results\": [\n    [\n      \"Issue Type\",\n      \"Bug\"\n    ]\n  ]\n}\n";
        assert_eq!(String::from_utf8(stdout).unwrap(), expected);
    }

    #[test]
    fn test_emit_result_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let result: ClassificationResult = serde_json::from_str(r#"{"analysis_results":[]}"#).unwrap();
        let mut stdout = Vec::new();

        emit_result(&result, Some(&path), &mut stdout).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n  \"analysis_results\": []\n}");
        assert_eq!(String::from_utf8(stdout).unwrap(), format!("Results saved to {}\n", path.display()));
    }

    #[test]
    fn test_emit_result_bad_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let result: ClassificationResult = serde_json::from_str(r#"{"analysis_results":[]}"#).unwrap();

        let err = emit_result(&result, Some(&path), &mut Vec::new()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
