use std::fmt::Write as FmtWrite;

use crate::models::{Answer, IngestStats, OutputFormat, SearchResults};

pub trait Formatter {
    fn format_answer(&self, answer: &Answer, show_context: bool) -> String;
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_ingest_stats(&self, stats: &IngestStats) -> String;
    fn format_ingested(&self, source: &str, chunks: usize) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub index_name: String,
    pub namespace: Option<String>,
    pub embedding_driver: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub vector_store_driver: String,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub index_exists: bool,
    pub vector_count: u64,
}

const PREVIEW_CHARS: usize = 200;

fn preview(content: &str) -> String {
    let head: String = content.chars().take(PREVIEW_CHARS).collect();
    if content.chars().count() > PREVIEW_CHARS {
        format!("{}...", head)
    } else {
        head
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_answer(&self, answer: &Answer, show_context: bool) -> String {
        let mut output = String::new();
        writeln!(output, "{}", answer.answer).unwrap();

        if show_context {
            writeln!(output).unwrap();
            writeln!(output, "Sources ({})", answer.context.len()).unwrap();
            writeln!(output, "-------").unwrap();
            for (i, chunk) in answer.context.iter().enumerate() {
                match chunk.page() {
                    Some(page) => writeln!(output, "{}. {} (page {})", i + 1, chunk.source(), page),
                    None => writeln!(output, "{}. {}", i + 1, chunk.source()),
                }
                .unwrap();
                for line in preview(chunk.content()).lines() {
                    writeln!(output, "   {}", line).unwrap();
                }
            }
        }

        output
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, result) in results.results.iter().enumerate() {
            writeln!(output, "{}. [Score: {:.3}]", i + 1, result.score).unwrap();
            writeln!(output, "   Source: {}", result.chunk.source()).unwrap();
            if let Some(page) = result.chunk.page() {
                writeln!(output, "   Page: {}", page).unwrap();
            }
            writeln!(output, "   ---").unwrap();
            for line in preview(result.chunk.content()).lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();
        writeln!(
            output,
            "Embedding:     {} ({})",
            status.embedding_model, status.embedding_driver
        )
        .unwrap();
        writeln!(output, "Generation:    {}", status.generation_model).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(
            output,
            "Vector Store:  {} ({})",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "  URL:         {}", status.vector_store_url).unwrap();
        writeln!(output, "  Index:       {}", status.index_name).unwrap();
        if let Some(ref namespace) = status.namespace {
            writeln!(output, "  Namespace:   {}", namespace).unwrap();
        }
        if status.vector_store_connected {
            if status.index_exists {
                writeln!(output, "  Vectors:     {}", status.vector_count).unwrap();
            } else {
                writeln!(output, "  Vectors:     (index not created yet)").unwrap();
            }
        }

        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "Ingest Complete").unwrap();
        writeln!(output, "---------------").unwrap();
        writeln!(output, "Files scanned: {}", stats.files_scanned).unwrap();
        writeln!(output, "Files indexed: {}", stats.files_indexed).unwrap();
        writeln!(output, "Files skipped: {}", stats.files_skipped).unwrap();
        writeln!(output, "Chunks created: {}", stats.chunks_created).unwrap();
        writeln!(output, "Duration: {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_ingested(&self, source: &str, chunks: usize) -> String {
        format!("Added {} chunks from {}\n", chunks, source)
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

    fn render(&self, value: &serde_json::Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

impl Formatter for JsonFormatter {
    fn format_answer(&self, answer: &Answer, show_context: bool) -> String {
        let mut json = serde_json::json!({
            "question": answer.question,
            "answer": answer.answer,
        });
        if show_context {
            json["context"] = serde_json::to_value(&answer.context).unwrap_or_default();
        }
        self.render(&json)
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        match serde_json::to_value(results) {
            Ok(json) => self.render(&json),
            Err(e) => format!("{{\"error\": \"{}\"}}", e),
        }
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "embedding": {
                "driver": status.embedding_driver,
                "model": status.embedding_model,
            },
            "generation": {
                "model": status.generation_model,
            },
            "vector_store": {
                "driver": status.vector_store_driver,
                "url": status.vector_store_url,
                "connected": status.vector_store_connected,
                "index": status.index_name,
                "namespace": status.namespace,
                "exists": status.index_exists,
                "vectors": status.vector_count,
            }
        });
        self.render(&json)
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        match serde_json::to_value(stats) {
            Ok(json) => self.render(&json),
            Err(e) => format!("{{\"error\": \"{}\"}}", e),
        }
    }

    fn format_ingested(&self, source: &str, chunks: usize) -> String {
        serde_json::json!({"source": source, "chunks": chunks}).to_string()
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, ScoredChunk, metadata_from};

    fn answer() -> Answer {
        Answer {
            question: "What color is the sky?".to_string(),
            answer: "Blue.".to_string(),
            context: vec![Chunk::new(
                "The sky is blue.",
                metadata_from([("source", "sky.pdf"), ("page", "0")]),
            )],
        }
    }

    #[test]
    fn test_text_answer_with_sources() {
        let text = TextFormatter.format_answer(&answer(), true);
        assert!(text.starts_with("Blue.\n"));
        assert!(text.contains("1. sky.pdf (page 0)"));
        assert!(!TextFormatter.format_answer(&answer(), false).contains("Sources"));
    }

    #[test]
    fn test_json_answer() {
        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter::new(false).format_answer(&answer(), true)).unwrap();
        assert_eq!(json["answer"], "Blue.");
        assert_eq!(json["context"][0]["content"], "The sky is blue.");
    }

    #[test]
    fn test_text_search_results() {
        let results = SearchResults::new(
            "sky".to_string(),
            vec![ScoredChunk {
                chunk: Chunk::new("The sky is blue.", metadata_from([("source", "notes.md")])),
                score: 0.9,
            }],
            3,
        );
        let text = TextFormatter.format_search_results(&results);
        assert!(text.contains("[Score: 0.900]"));
        assert!(text.contains("Source: notes.md"));

        let empty = SearchResults::new("nothing".to_string(), vec![], 1);
        assert_eq!(
            TextFormatter.format_search_results(&empty),
            "No results found for: nothing\n"
        );
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        let long = "é".repeat(PREVIEW_CHARS + 5);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
    }
}
