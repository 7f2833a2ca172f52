//! Parsing and shape-checking the model's answer.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::base::{
    error::{ClassifyError, ClassifyRes},
    types::ClassificationResult,
};

/// Key holding the list of category paths.
pub const ANALYSIS_RESULTS_KEY: &str = "analysis_results";

/// Parse the raw answer and check it has the expected shape.
///
/// The answer must be a JSON object whose `analysis_results` is an array of
/// arrays. Path contents are not inspected, and the result is otherwise
/// passed through untouched (no de-duplication or sorting).
#[instrument(skip_all)]
pub fn parse_classification(answer: &str) -> ClassifyRes<ClassificationResult> {
    let document: Value = serde_json::from_str(answer).map_err(|e| ClassifyError::validation(format!("Response is not valid JSON: {e}")))?;

    let Value::Object(object) = &document else {
        return Err(ClassifyError::validation("Invalid response format from API: expected a JSON object"));
    };

    let Some(results) = object.get(ANALYSIS_RESULTS_KEY) else {
        return Err(ClassifyError::validation(format!("Invalid response format from API: missing `{ANALYSIS_RESULTS_KEY}`")));
    };

    let Value::Array(paths) = results else {
        return Err(ClassifyError::validation(format!("`{ANALYSIS_RESULTS_KEY}` should be a list")));
    };

    if let Some(position) = paths.iter().position(|path| !path.is_array()) {
        return Err(ClassifyError::validation(format!("Each analysis result should be a list (item {position} is not)")));
    }

    debug!("Answer holds {} category paths.", paths.len());

    serde_json::from_value(document).map_err(|e| ClassifyError::validation(e.to_string()))
}
