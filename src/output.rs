//! JSON response types and formatting for CLI output.

use serde::Serialize;

/// Response for a successful upsert or delete.
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub id: String,
}

/// Response for `resolve`. `id` is empty when nothing matched.
#[derive(Serialize)]
pub struct ResolveResponse {
    pub reference: String,
    pub id: String,
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
    pub score: f64,
}

/// Response for retrieving a specific document.
#[derive(Serialize)]
pub struct GetResponse {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Response for listing documents.
#[derive(Serialize)]
pub struct ListResponse {
    pub documents: Vec<ListItem>,
}

/// Individual list item.
#[derive(Serialize)]
pub struct ListItem {
    pub id: String,
    pub content: String,
    pub updated_at: String,
}

/// Response for errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
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

    #[test]
    fn test_serialize_status_response() {
        let response = StatusResponse {
            status: "upserted".to_string(),
            id: "p1".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"upserted\""));
        assert!(json.contains("\"id\":\"p1\""));
    }

    #[test]
    fn test_serialize_search_response() {
        let response = SearchResponse {
            results: vec![SearchResultItem {
                id: "p2".to_string(),
                score: 0.5,
            }],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"results\""));
        assert!(json.contains("\"score\":0.5"));
    }

    #[test]
    fn test_serialize_empty_resolve() {
        let response = ResolveResponse {
            reference: "the hiker".to_string(),
            id: String::new(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"id\":\"\""));
    }
}
