//! Rendering the category tree into the indented outline shown to the model.

use std::fmt::Write;

use tracing::{debug, instrument};

use crate::base::{
    error::{ClassifyError, ClassifyRes},
    prompts,
    types::CategoryNode,
};

/// Indentation added per tree level.
const INDENT: &str = "  ";

/// Render the category tree as an outline, one node per line.
///
/// Each line is `<indent>- <value>`, followed by ` (<description>)` when the
/// node has one. Nodes are visited depth-first, pre-order, in source order.
/// A node at depth `max_depth` or deeper fails the render.
#[instrument(skip_all)]
pub fn render_category_outline(categories: &[CategoryNode], max_depth: usize) -> ClassifyRes<String> {
    let mut lines = Vec::new();
    let mut stack: Vec<(&CategoryNode, usize)> = categories.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        if depth >= max_depth {
            return Err(ClassifyError::invalid_input(format!(
                "Category tree is deeper than {max_depth} levels (at `{}`)",
                node.value
            )));
        }

        let mut line = format!("{}- {}", INDENT.repeat(depth), node.value);
        if let Some(description) = &node.description {
            let _ = write!(line, " ({description})");
        }
        lines.push(line);

        stack.extend(node.subcategories.iter().rev().map(|child| (child, depth + 1)));
    }

    debug!("Rendered {} category lines.", lines.len());

    Ok(lines.join("\n"))
}

/// Render the complete system directive for a category tree.
pub fn build_system_directive(template: &str, categories: &[CategoryNode], max_depth: usize) -> ClassifyRes<String> {
    let outline = render_category_outline(categories, max_depth)?;
    Ok(prompts::render_system_directive(template, &outline))
}
