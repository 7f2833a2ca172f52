//! Loading the category tree and ticket text from disk.

use std::{fs, io, path::Path};

use serde_json::Value;
use tracing::{debug, instrument};

use crate::base::{
    error::{ClassifyError, ClassifyRes},
    types::CategoryNode,
};

/// Load and validate the top-level categories from a JSON file.
///
/// The file must hold a JSON array of category nodes. Nodes are validated
/// eagerly, so a node without a `value` fails here.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_categories(path: &Path) -> ClassifyRes<Vec<CategoryNode>> {
    let contents = read_file(path, "Categories")?;

    let document: Value = serde_json::from_str(&contents).map_err(|e| ClassifyError::invalid_input(format!("Invalid JSON in categories file: {e}")))?;

    if !document.is_array() {
        return Err(ClassifyError::invalid_input("Categories file should contain a JSON array"));
    }

    let categories: Vec<CategoryNode> = serde_json::from_value(document).map_err(|e| ClassifyError::invalid_input(format!("Invalid category in categories file: {e}")))?;

    debug!("Loaded {} top-level categories.", categories.len());

    Ok(categories)
}

/// Load the ticket text verbatim.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_ticket(path: &Path) -> ClassifyRes<String> {
    let ticket = read_file(path, "Ticket")?;

    debug!("Loaded ticket of {} bytes.", ticket.len());

    Ok(ticket)
}

fn read_file(path: &Path, label: &str) -> ClassifyRes<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ClassifyError::invalid_input(format!("{label} file not found: {}", path.display())),
        _ => ClassifyError::invalid_input(format!("Unable to read {} file {}: {e}", label.to_lowercase(), path.display())),
    })
}
