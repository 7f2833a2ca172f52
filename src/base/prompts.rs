//! Prompt templates for the classification model.

/// Placeholder replaced by the rendered category outline.
pub const CATEGORIES_PLACEHOLDER: &str = "{categories}";

/// Default system directive for the classifier.
pub const CLASSIFIER_SYSTEM_DIRECTIVE: &str = r#####"
You are an expert support ticket classifier. Your task is to analyze support tickets and categorize them according to the following category hierarchy:

{categories}

Rules:
1. Analyze the ticket thoroughly and identify ALL relevant categories and subcategories.
2. For each identified aspect, provide the FULL PATH from the top-level category to the most specific subcategory.
3. Only use categories and subcategories that are explicitly defined in the hierarchy.
4. If no categories match, return an empty list.
5. Be as specific as possible: always go to the deepest matching subcategory.
6. Return your response as a JSON object with a single key "analysis_results" containing a list of lists (each inner list represents one category path).

Example output format:
{
  "analysis_results": [
    ["Issue Type", "Bug"],
    ["Priority", "High", "Performance"],
    ["Component", "Frontend"]
  ]
}
"#####;

/// Embed the rendered category outline into a directive template.
pub fn render_system_directive(template: &str, category_outline: &str) -> String {
    template.replace(CATEGORIES_PLACEHOLDER, category_outline)
}
