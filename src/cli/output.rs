use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as FmtWrite;

use crate::models::{ContextResult, OutputFormat, SemanticSearchResults};
use crate::services::ItemOutput;

/// Longest numeric array printed in full by the text formats.
const MAX_INLINE_VECTOR: usize = 8;

pub trait Formatter {
    fn format_records(&self, records: &[ItemOutput]) -> String;
    fn format_search_results(&self, results: &SemanticSearchResults) -> String;
    fn format_context(&self, context: &ContextResult) -> String;
    fn format_collections(&self, names: &[String]) -> String;
    fn format_value(&self, title: &str, value: &Value) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Render a field value on one line, abbreviating long vectors.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items)
            if items.len() > MAX_INLINE_VECTOR && items.iter().all(Value::is_number) =>
        {
            format!("[{} floats]", items.len())
        }
        other => other.to_string(),
    }
}

fn preview(text: &str, limit: usize) -> String {
    let head: String = text.chars().take(limit).collect();
    if text.chars().count() > limit {
        format!("{}...", head)
    } else {
        head
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_records(&self, records: &[ItemOutput]) -> String {
        if records.is_empty() {
            return "No records.\n".to_string();
        }

        let mut output = String::new();
        for (i, record) in records.iter().enumerate() {
            let label = if record.is_error() { " [ERROR]" } else { "" };
            writeln!(output, "{}. item {}{}", i + 1, record.item_index, label).unwrap();
            match &record.json {
                Value::Object(map) => {
                    for (key, value) in map {
                        writeln!(output, "   {}: {}", key, display_value(value)).unwrap();
                    }
                }
                other => writeln!(output, "   {}", display_value(other)).unwrap(),
            }
            writeln!(output).unwrap();
        }
        output
    }

    fn format_search_results(&self, results: &SemanticSearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms ({}/{})\n",
            results.total_results, results.duration_ms, results.database, results.collection
        )
        .unwrap();

        for result in &results.search_results {
            writeln!(
                output,
                "{}. [Score: {:.3}] {}",
                result.rank,
                result.similarity_score,
                result.title.as_deref().unwrap_or("Untitled")
            )
            .unwrap();
            writeln!(output, "   Document: {}", display_value(&result.document_id)).unwrap();
            if let Some(ref index) = result.chunk_index {
                writeln!(output, "   Chunk: {}", display_value(index)).unwrap();
            }
            writeln!(output, "   ---").unwrap();
            let text = preview(result.text_chunk.as_deref().unwrap_or_default(), 200);
            for line in text.lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_context(&self, context: &ContextResult) -> String {
        if context.context_chunks.is_empty() {
            return format!("No context found for: {}\n", context.query);
        }

        let mut output = String::new();
        writeln!(output, "{}", context.context_text).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Sources: {}", context.sources.join(", ")).unwrap();
        writeln!(output, "Context length: {}", context.total_context_length).unwrap();
        output
    }

    fn format_collections(&self, names: &[String]) -> String {
        if names.is_empty() {
            return "No collections found.\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "Collections").unwrap();
        writeln!(output, "-----------").unwrap();
        for name in names {
            writeln!(output, "  {}", name).unwrap();
        }
        output
    }

    fn format_value(&self, title: &str, value: &Value) -> String {
        let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        format!("{}\n{}\n{}\n", title, "-".repeat(title.chars().count()), body)
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_records(&self, records: &[ItemOutput]) -> String {
        self.render(records)
    }

    fn format_search_results(&self, results: &SemanticSearchResults) -> String {
        self.render(results)
    }

    fn format_context(&self, context: &ContextResult) -> String {
        self.render(context)
    }

    fn format_collections(&self, names: &[String]) -> String {
        self.render(&serde_json::json!({ "collections": names }))
    }

    fn format_value(&self, _title: &str, value: &Value) -> String {
        self.render(value)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_records(&self, records: &[ItemOutput]) -> String {
        if records.is_empty() {
            return "## Records\n\n*No records.*\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "## Records\n").unwrap();
        for (i, record) in records.iter().enumerate() {
            let label = if record.is_error() { " ⚠️" } else { "" };
            writeln!(output, "### {}. Item {}{}\n", i + 1, record.item_index, label).unwrap();
            match &record.json {
                Value::Object(map) => {
                    writeln!(output, "| Field | Value |").unwrap();
                    writeln!(output, "|-------|-------|").unwrap();
                    for (key, value) in map {
                        let cell = display_value(value).replace('|', "\\|").replace('\n', " ");
                        writeln!(output, "| `{}` | {} |", key, cell).unwrap();
                    }
                }
                other => writeln!(output, "`{}`", display_value(other)).unwrap(),
            }
            writeln!(output).unwrap();
        }
        output
    }

    fn format_search_results(&self, results: &SemanticSearchResults) -> String {
        if results.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.total_results, results.duration_ms
        )
        .unwrap();

        for result in &results.search_results {
            writeln!(
                output,
                "### {}. Score: {:.3}\n",
                result.rank, result.similarity_score
            )
            .unwrap();
            if let Some(ref title) = result.title {
                writeln!(output, "**Title:** {}\n", title).unwrap();
            }
            writeln!(
                output,
                "**Document:** `{}`\n",
                display_value(&result.document_id)
            )
            .unwrap();
            writeln!(output, "```").unwrap();
            writeln!(output, "{}", result.text_chunk.as_deref().unwrap_or_default()).unwrap();
            writeln!(output, "```\n").unwrap();
        }

        output
    }

    fn format_context(&self, context: &ContextResult) -> String {
        let mut output = String::new();
        writeln!(output, "## Context\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", context.query).unwrap();
        if context.context_chunks.is_empty() {
            writeln!(output, "*No context found.*").unwrap();
            return output;
        }

        for (i, chunk) in context.context_chunks.iter().enumerate() {
            writeln!(
                output,
                "### Context {} ({}, relevance {:.3})\n",
                i + 1,
                chunk.source,
                chunk.relevance
            )
            .unwrap();
            for line in chunk.content.lines() {
                writeln!(output, "> {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        let sources: Vec<String> = context.sources.iter().map(|s| format!("`{}`", s)).collect();
        writeln!(output, "**Sources:** {}", sources.join(", ")).unwrap();
        output
    }

    fn format_collections(&self, names: &[String]) -> String {
        if names.is_empty() {
            return "## Collections\n\n*No collections found.*\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "## Collections\n").unwrap();
        for name in names {
            writeln!(output, "- `{}`", name).unwrap();
        }
        output
    }

    fn format_value(&self, title: &str, value: &Value) -> String {
        let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        format!("## {}\n\n```json\n{}\n```\n", title, body)
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
