//! Prompt assembly for recipe questions.
//!
//! The composer is pure: identical inputs yield byte-identical prompts.
//! Layout:
//!
//! ```text
//! <context header>
//! - id: 1, name: ..., description: ..., <other attributes in key order>
//! - ...
//!
//! Question: <seed>
//!
//! <policy clause>
//! ```
//!
//! The context block is omitted when nothing was retrieved.

use serde_json::Value;

use crate::domain::models::CorpusRecord;

pub const CONTEXT_HEADER: &str = "Here are some recipes from our collection that may be relevant:";

pub const POLICY_CLAUSE: &str = "Only answer requests about food, cooking, ingredients or recipes, \
and politely decline anything unrelated to food. If the ingredients I have on hand are not enough \
for a recipe you suggest, say so clearly and list what is missing.";

/// Builds the instruction sent to the language model.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    context_header: String,
    policy_clause: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptComposer {
    pub fn new() -> Self {
        Self {
            context_header: CONTEXT_HEADER.to_string(),
            policy_clause: POLICY_CLAUSE.to_string(),
        }
    }

    pub fn policy_clause(&self) -> &str {
        &self.policy_clause
    }

    /// The question seed alone, or `None` when there is neither text nor a label.
    ///
    /// Text is taken verbatim apart from surrounding whitespace, which is
    /// trimmed on every branch so a whitespace-only message counts as empty.
    /// Also used as the similarity search text.
    pub fn question(&self, query_text: &str, labels: &[String]) -> Option<String> {
        let text = query_text.trim();
        match (text.is_empty(), labels.is_empty()) {
            (true, true) => None,
            (true, false) => Some(format!(
                "I have the following ingredients: {}. What recipes can I make with them?",
                labels.join(", ")
            )),
            (false, false) => Some(format!(
                "{text}\n\nIngredients I have on hand: {}.",
                labels.join(", ")
            )),
            (false, true) => Some(text.to_string()),
        }
    }

    /// Full prompt, or an empty string when there is no input at all.
    pub fn compose(&self, query_text: &str, labels: &[String], retrieved: &[CorpusRecord]) -> String {
        let Some(seed) = self.question(query_text, labels) else {
            return String::new();
        };

        let mut prompt = String::new();
        if !retrieved.is_empty() {
            prompt.push_str(&self.context_header);
            prompt.push('\n');
            for record in retrieved {
                prompt.push_str("- ");
                prompt.push_str(&render_record(record));
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        prompt.push_str("Question: ");
        prompt.push_str(&seed);
        prompt.push_str("\n\n");
        prompt.push_str(&self.policy_clause);
        prompt
    }
}

/// One record as a single `key: value` line. Null attributes are skipped.
pub fn render_record(record: &CorpusRecord) -> String {
    let mut fields = vec![
        format!("id: {}", record.id),
        format!("name: {}", flatten(&record.name)),
        format!("description: {}", flatten(&record.description)),
    ];
    let mut attributes: Vec<(&String, &Value)> = record.attributes.iter().collect();
    attributes.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in attributes {
        if let Some(rendered) = render_value(value) {
            fields.push(format!("{}: {}", flatten(key), rendered));
        }
    }
    fields.join(", ")
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(flatten(s)),
        other => Some(flatten(&other.to_string())),
    }
}

/// Collapse all whitespace runs, newlines included, to single spaces.
fn flatten(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
