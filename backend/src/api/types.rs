//! REST API response types.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::InputFormat;
use crate::parser::ParseResult;
use crate::transform::pipeline::{inspect, Inspection};

/// Response to `POST /api/inspect`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectResponse {
    /// Unique request identifier
    pub request_id: String,

    /// Always "ok"; errors use [`error_response`]
    pub status: String,

    pub file: FileMetadata,

    pub inspection: Inspection,
}

/// Uploaded file metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    pub size_kb: f64,
    pub format: InputFormat,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
}

impl InspectResponse {
    pub fn new(name: &str, size: usize, parsed: &ParseResult, preview_rows: usize) -> Self {
        InspectResponse {
            request_id: Uuid::new_v4().to_string(),
            status: "ok".to_string(),
            file: FileMetadata {
                name: name.to_string(),
                size_kb: size as f64 / 1024.0,
                format: parsed.format,
                encoding: parsed.encoding.clone(),
                delimiter: parsed.delimiter.map(|d| d.to_string()),
            },
            inspection: inspect(&parsed.dataset, preview_rows),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "requestId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ingest, ParseOptions};

    #[test]
    fn test_inspect_response_shape() {
        let parsed = ingest(b"a;b\n1;x\n1;x\n", ".csv", &ParseOptions::default()).unwrap();
        let response = InspectResponse::new("t.csv", 2048, &parsed, 5);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["file"]["sizeKb"], 2.0);
        assert_eq!(json["file"]["format"], "csv");
        assert_eq!(json["file"]["delimiter"], ";");
        assert_eq!(json["inspection"]["rows"], 2);
        assert_eq!(json["inspection"]["duplicateRows"], 1);
        assert_eq!(json["inspection"]["head"][0], json!([1, "x"]));
        assert!(Uuid::parse_str(json["requestId"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_error_response() {
        let json = error_response("boom");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
    }
}
