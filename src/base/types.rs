use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// A node in the user-supplied category hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    /// Label shown to the model, and used as a path segment.
    pub value: String,
    /// Optional hint rendered in parentheses after the label.
    ///
    /// Numbers and booleans are accepted and kept in their JSON text form.
    #[serde(default, deserialize_with = "deserialize_scalar_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Child categories, in the order given by the source file.
    #[serde(default, deserialize_with = "deserialize_nullable_vec", skip_serializing_if = "Vec::is_empty")]
    pub subcategories: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn leaf(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
            subcategories: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_subcategories(mut self, subcategories: Vec<CategoryNode>) -> Self {
        self.subcategories = subcategories;
        self
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.subcategories.iter());
        }

        count
    }
}

fn deserialize_scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(scalar @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(scalar.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("expected a string, number or boolean description, found {other}"))),
    }
}

fn deserialize_nullable_vec<'de, D>(deserializer: D) -> Result<Vec<CategoryNode>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<CategoryNode>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A root-to-leaf chain of labels, as selected by the model.
///
/// Segments are kept verbatim: they are neither checked against the loaded
/// tree nor required to be strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryPath(pub Vec<Value>);

impl CategoryPath {
    /// The path as string labels, or `None` if any segment is not a string.
    pub fn labels(&self) -> Option<Vec<&str>> {
        self.0.iter().map(Value::as_str).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for CategoryPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| Value::String(s.into())).collect())
    }
}

/// The classification answer, which is also the tool's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub analysis_results: Vec<CategoryPath>,
    /// Any additional keys the model returned, passed through untouched and
    /// in their original order, after `analysis_results`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single request to the remote completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model (or Azure deployment) identifier.
    pub model: String,
    /// System-level instructions.
    pub system_directive: String,
    /// User content; here, the raw ticket text.
    pub user_content: String,
    /// Sampling temperature; the service default applies when `None`.
    pub temperature: Option<f32>,
    /// Optional cap on generated tokens.
    pub max_tokens: Option<u32>,
    /// Ask the service for a JSON object answer.
    pub json_response: bool,
}
