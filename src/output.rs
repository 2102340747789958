//! JSON response types and formatting for CLI output.

use chrono::{DateTime, Utc};
use serde::Serialize;

use memrank::{MatchType, Memory, Metadata, SearchResult, StoreStats};

/// Response for successful memory addition.
#[derive(Serialize)]
pub struct AddResponse {
    pub status: &'static str,
    pub id: String,
    pub embedded: bool,
}

/// Response for search results.
#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
}

/// Individual search result item.
#[derive(Serialize)]
pub struct SearchResultItem {
    pub id: String,
    pub content: String,
    pub score: f64,
    pub match_type: MatchType,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl From<SearchResult> for SearchResultItem {
    fn from(result: SearchResult) -> Self {
        Self {
            id: result.memory.id,
            content: result.memory.content,
            score: result.score,
            match_type: result.match_type,
            metadata: result.memory.metadata,
            created_at: result.memory.created_at,
        }
    }
}

/// A memory without its embedding, for `get` and `list`.
#[derive(Serialize)]
pub struct MemoryResponse {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub has_embedding: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Memory> for MemoryResponse {
    fn from(memory: Memory) -> Self {
        Self {
            has_embedding: memory.has_embedding(),
            id: memory.id,
            content: memory.content,
            metadata: memory.metadata,
            created_at: memory.created_at,
            updated_at: memory.updated_at,
        }
    }
}

/// Response for listing memories.
#[derive(Serialize)]
pub struct ListResponse {
    pub memories: Vec<MemoryResponse>,
}

/// Response for successful memory deletion.
#[derive(Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
    pub id: String,
}

/// Response for store statistics.
#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StoreStats,
}

/// Response for errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Print a value as formatted JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn memory() -> Memory {
        Memory {
            id: "test-id".to_string(),
            content: "test content".to_string(),
            embedding: Some(vec![0.1, 0.2]),
            metadata: Metadata::new(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn test_serialize_add_response() {
        let response = AddResponse {
            status: "added",
            id: "test-id".to_string(),
            embedded: true,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"added\""));
        assert!(json.contains("\"id\":\"test-id\""));
    }

    #[test]
    fn test_serialize_search_response() {
        let response = SearchResponse {
            results: vec![SearchResultItem::from(SearchResult {
                memory: memory(),
                score: 0.95,
                match_type: MatchType::Hybrid,
            })],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"results\""));
        assert!(json.contains("\"score\":0.95"));
        assert!(json.contains("\"match_type\":\"hybrid\""));
        assert!(!json.contains("embedding"));
    }

    #[test]
    fn test_serialize_memory_response_omits_embedding() {
        let json = serde_json::to_string(&MemoryResponse::from(memory())).unwrap();
        assert!(json.contains("\"has_embedding\":true"));
        assert!(!json.contains("0.1"));
        assert!(!json.contains("updated_at"));
    }

    #[test]
    fn test_serialize_stats_response() {
        let response = StatsResponse {
            stats: StoreStats {
                total_memories: 3,
                memories_with_embeddings: 1,
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"total_memories":3,"memories_with_embeddings":1}"#);
    }
}
