//! Local document search tool
//!
//! Scans a directory of plain-text documents and returns the best-matching
//! chunks as JSON. Scoring is simple term frequency; good enough to ground
//! answers in local notes without an index.

use std::path::PathBuf;

use async_trait::async_trait;
use relay_router::{DocumentChunk, Tool, ToolResult};
use serde::Deserialize;

const SNIPPET_LEN: usize = 400;
const DEFAULT_LIMIT: usize = 3;

pub struct DocSearchTool {
    docs_dir: PathBuf,
}

impl DocSearchTool {
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
        }
    }
}

#[derive(Deserialize)]
struct Arguments {
    query: String,
    limit: Option<usize>,
}

#[async_trait]
impl Tool for DocSearchTool {
    fn name(&self) -> &str {
        "doc_search"
    }

    fn description(&self) -> &str {
        "Search local text documents for a query and return the most relevant excerpts."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Maximum number of excerpts to return (default 3)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        let args: Arguments = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return ToolResult::error(format!("Invalid arguments: {}", e)),
        };
        if args.query.trim().is_empty() {
            return ToolResult::error("Query must not be empty");
        }

        let chunks = match self.search(&args.query, args.limit.unwrap_or(DEFAULT_LIMIT)) {
            Ok(chunks) => chunks,
            Err(e) => return ToolResult::error(format!("Search failed: {}", e)),
        };
        if chunks.is_empty() {
            return ToolResult::text("No matching documents found.");
        }

        match serde_json::to_string_pretty(&chunks) {
            Ok(json) => ToolResult::text(json),
            Err(e) => ToolResult::error(format!("Failed to encode results: {}", e)),
        }
    }
}

impl DocSearchTool {
    fn search(&self, query: &str, limit: usize) -> std::io::Result<Vec<DocumentChunk>> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();

        let mut scored: Vec<DocumentChunk> = Vec::new();
        for entry in std::fs::read_dir(&self.docs_dir)? {
            let path = entry?.path();
            let is_text = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("txt") | Some("md")
            );
            if !is_text {
                continue;
            }

            let content = std::fs::read_to_string(&path)?;
            let lowered = content.to_lowercase();
            let hits: usize = terms.iter().map(|t| lowered.matches(t.as_str()).count()).sum();
            if hits == 0 {
                continue;
            }

            let doc_id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();
            let first_hit = terms
                .iter()
                .filter_map(|t| lowered.find(t.as_str()))
                .min()
                .unwrap_or(0);
            let words = content.split_whitespace().count().max(1);

            let mut metadata = std::collections::HashMap::new();
            metadata.insert(
                "path".to_string(),
                serde_json::Value::String(path.display().to_string()),
            );

            scored.push(DocumentChunk {
                doc_id,
                content: snippet(&content, first_hit),
                metadata,
                relevance_score: hits as f64 / words as f64,
            });
        }

        scored.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }
}

// Window of text around the first match, aligned to char boundaries.
fn snippet(content: &str, around: usize) -> String {
    let mut start = around.saturating_sub(SNIPPET_LEN / 4);
    while start > 0 && !content.is_char_boundary(start) {
        start -= 1;
    }
    let excerpt: String = content[start..].chars().take(SNIPPET_LEN).collect();
    excerpt.trim().to_string()
}
