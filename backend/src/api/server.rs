//! HTTP server for the Data Sweeper API.
//!
//! # API Endpoints
//!
//! | Method | Path           | Description                               |
//! |--------|----------------|-------------------------------------------|
//! | GET    | `/`            | Upload page                               |
//! | GET    | `/health`      | Health check                              |
//! | GET    | `/api/i18n`    | Interface strings (`?lang=en/ar/ur/fa`)   |
//! | POST   | `/api/inspect` | Summary and preview of an upload          |
//! | POST   | `/api/convert` | Clean and convert an upload               |
//! | POST   | `/api/chart`   | Histogram PNG of numeric columns          |
//! | GET    | `/api/logs`    | SSE stream for real-time logs             |

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{sse::Event, Html, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{collections::HashMap, convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, InspectResponse};
use crate::chart::{render_histogram_png, ChartOptions};
use crate::config::SweeperConfig;
use crate::convert::ConvertOptions;
use crate::error::{ChartError, ConvertError, IngestError, ServerError, SweepError};
use crate::i18n::{translate, ui_strings, Language, TAGLINE, TITLE, UPLOAD_PROMPT};
use crate::parser::{ingest_named, ParseOptions};
use crate::transform::clean::CellEdit;
use crate::transform::pipeline::{sweep_bytes, SweepOptions};

const ROWS_TRUNCATED: HeaderName = HeaderName::from_static("x-rows-truncated");
const ROWS_RENDERED: HeaderName = HeaderName::from_static("x-rows-rendered");

#[derive(Clone)]
struct AppState {
    config: Arc<SweeperConfig>,
}

/// Build the router.
pub fn router(config: SweeperConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            header::CONTENT_TYPE,
            header::CONTENT_DISPOSITION,
            ROWS_TRUNCATED,
            ROWS_RENDERED,
        ]);

    let body_limit = config.max_upload_bytes();
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/i18n", get(i18n))
        .route("/api/inspect", post(inspect_upload))
        .route("/api/convert", post(convert_upload))
        .route("/api/chart", post(chart_upload))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: SweeperConfig) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let max_upload_mb = config.max_upload_mb;
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Data Sweeper server running on http://localhost:{}", port);
    println!("   POST /api/inspect - Inspect an upload");
    println!("   POST /api/convert - Clean and convert an upload");
    println!("   POST /api/chart   - Histogram of numeric columns");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");
    println!();
    println!("📦 Uploads limited to {} MB", max_upload_mb);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// Errors
// =============================================================================

/// HTTP status for a failed request: malformed requests are 400, unknown
/// upload types 415, unusable content 422.
fn status_code(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ServerError::Sweep(sweep) => match sweep {
            SweepError::Ingest(IngestError::UnsupportedFormat(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            SweepError::Ingest(IngestError::Parse(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            SweepError::Ingest(IngestError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            SweepError::Dataset(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SweepError::Convert(ConvertError::UnsupportedTarget(_)) => StatusCode::BAD_REQUEST,
            SweepError::Convert(ConvertError::Render { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            SweepError::Convert(ConvertError::Chart(ChartError::Render(_)))
            | SweepError::Chart(ChartError::Render(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            SweepError::Convert(_) | SweepError::Chart(_) => StatusCode::UNPROCESSABLE_ENTITY,
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = status_code(&self);
        eprintln!("❌ {} {}", status.as_u16(), self);
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<T, ServerError>;

// =============================================================================
// Multipart form
// =============================================================================

/// An uploaded file plus its text fields.
#[derive(Debug, Default)]
struct UploadForm {
    file_name: String,
    bytes: Vec<u8>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();
        let mut has_file = false;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                form.file_name = field.file_name().unwrap_or("upload").to_string();
                form.bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec();
                has_file = true;
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.fields.insert(name, value);
            }
        }

        if !has_file {
            return Err(ServerError::BadRequest("No file provided".to_string()));
        }
        Ok(form)
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim())
    }

    fn flag(&self, name: &str) -> bool {
        matches!(
            self.field(name).map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "on" | "1" | "yes")
        )
    }

    fn number(&self, name: &str) -> ApiResult<Option<usize>> {
        self.field(name)
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse()
                    .map_err(|_| ServerError::BadRequest(format!("'{}' must be a number, got '{}'", name, v)))
            })
            .transpose()
    }

    fn columns(&self) -> Vec<String> {
        self.field("columns")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn chart_options(&self, config: &SweeperConfig) -> ApiResult<ChartOptions> {
        Ok(ChartOptions::new(self.columns()).with_buckets(self.number("buckets")?.unwrap_or(config.buckets)))
    }

    fn parse_options(&self) -> ApiResult<ParseOptions> {
        let delimiter = match self.fields.get("delimiter").map(String::as_str) {
            None | Some("") => None,
            Some("\\t") | Some("tab") => Some('\t'),
            Some(d) => {
                let mut chars = d.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => {
                        return Err(ServerError::BadRequest(format!(
                            "Delimiter must be a single character, got '{}'",
                            d
                        )))
                    }
                }
            }
        };
        Ok(ParseOptions { delimiter })
    }

    /// Target format and sweep options for `/api/convert`.
    fn sweep_request(&self, config: &SweeperConfig) -> ApiResult<(String, SweepOptions)> {
        let target = self
            .field("target")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServerError::BadRequest("Missing 'target' field".to_string()))?
            .to_string();

        let fill_missing = self.fields.get("fill").map(|v| {
            if v.is_empty() {
                config.fill_value.clone()
            } else {
                v.clone()
            }
        });

        let edits: Vec<CellEdit> = match self.field("edits").filter(|v| !v.is_empty()) {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| ServerError::BadRequest(format!("Invalid edits: {}", e)))?,
            None => Vec::new(),
        };

        let preview_row_limit = match self.field("rows") {
            Some("all") => None,
            _ => Some(self.number("rows")?.unwrap_or(config.export_rows)),
        };

        let chart = if self.field("columns").is_some() {
            Some(self.chart_options(config)?)
        } else {
            None
        };

        Ok((
            target,
            SweepOptions {
                remove_duplicates: self.flag("dedup"),
                fill_missing,
                edits,
                parse: self.parse_options()?,
                convert: ConvertOptions {
                    chart,
                    preview_row_limit,
                    file_stem: None,
                },
            },
        ))
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

impl LangQuery {
    fn language(&self) -> Language {
        self.lang
            .as_deref()
            .and_then(|l| l.parse().ok())
            .unwrap_or_default()
    }
}

/// Minimal upload page in the requested language.
async fn index(Query(query): Query<LangQuery>) -> Html<String> {
    let lang = query.language();
    let dir = if lang.is_rtl() { "rtl" } else { "ltr" };
    let options: String = crate::convert::TargetFormat::ALL
        .iter()
        .map(|t| format!("<option value=\"{}\">{}</option>", t.extension(), t))
        .collect();

    Html(format!(
        "<!doctype html>\n<html lang=\"{code}\" dir=\"{dir}\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n<p>{tagline}</p>\n\
         <form action=\"/api/convert\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <label>{prompt} <input type=\"file\" name=\"file\" accept=\".csv,.xlsx\"></label>\n\
         <select name=\"target\">{options}</select>\n\
         <label><input type=\"checkbox\" name=\"dedup\" value=\"true\"> Remove duplicates</label>\n\
         <label><input type=\"checkbox\" name=\"fill\" value=\"\"> Fill missing values</label>\n\
         <button type=\"submit\">Convert</button>\n</form>\n</body>\n</html>\n",
        code = lang.code(),
        dir = dir,
        title = translate(TITLE, lang),
        tagline = translate(TAGLINE, lang),
        prompt = translate(UPLOAD_PROMPT, lang),
        options = options,
    ))
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "datasweeper",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "inspect": "POST /api/inspect",
            "convert": "POST /api/convert",
            "chart": "POST /api/chart",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn i18n(Query(query): Query<LangQuery>) -> Json<Value> {
    Json(json!(ui_strings(query.language())))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        // Lagged receivers skip what they missed
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn inspect_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<InspectResponse>> {
    let form = UploadForm::read(multipart).await?;
    let rows = form.number("rows")?.unwrap_or(state.config.preview_rows);
    let parse = form.parse_options()?;

    log_info(format!("🔍 Inspecting {} ({} bytes)", form.file_name, form.bytes.len()));
    let response = tokio::task::spawn_blocking(move || {
        let parsed = ingest_named(&form.file_name, &form.bytes, &parse).map_err(SweepError::from)?;
        Ok::<_, ServerError>(InspectResponse::new(&form.file_name, form.bytes.len(), &parsed, rows))
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(response))
}

async fn convert_upload(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let form = UploadForm::read(multipart).await?;
    let (target, options) = form.sweep_request(&state.config)?;

    println!("\n{}", "=".repeat(70));
    println!("📄 NEW UPLOAD: {} ({} bytes) → {}", form.file_name, form.bytes.len(), target);
    println!("{}\n", "=".repeat(70));

    let swept = tokio::task::spawn_blocking(move || sweep_bytes(&form.file_name, &form.bytes, &target, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    let output = swept.output;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, output.mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", output.file_name.replace('"', "")),
        )
        .header(ROWS_TRUNCATED, output.truncated.to_string())
        .header(ROWS_RENDERED, output.rows_rendered.to_string())
        .body(Body::from(output.bytes))
        .map_err(|e| ServerError::Internal(e.to_string()))
}

async fn chart_upload(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let form = UploadForm::read(multipart).await?;
    let chart = form.chart_options(&state.config)?;
    let parse = form.parse_options()?;

    log_info(format!("📊 Charting {}", form.file_name));
    let png = tokio::task::spawn_blocking(move || {
        let parsed = ingest_named(&form.file_name, &form.bytes, &parse).map_err(SweepError::from)?;
        render_histogram_png(&parsed.dataset, &chart).map_err(SweepError::from)
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> UploadForm {
        UploadForm {
            file_name: "data.csv".to_string(),
            bytes: b"a\n1\n".to_vec(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_sweep_request_defaults() {
        let config = SweeperConfig::default();
        let (target, options) = form(&[("target", "pdf")]).sweep_request(&config).unwrap();
        assert_eq!(target, "pdf");
        assert!(!options.remove_duplicates);
        assert_eq!(options.fill_missing, None);
        assert_eq!(options.convert.preview_row_limit, Some(config.export_rows));
        assert!(options.convert.chart.is_none());
    }

    #[test]
    fn test_sweep_request_fields() {
        let config = SweeperConfig::default();
        let (_, options) = form(&[
            ("target", "png"),
            ("dedup", "on"),
            ("fill", ""),
            ("rows", "all"),
            ("edits", r#"[{"row": 0, "column": "a", "value": "5"}]"#),
            ("columns", "a, b"),
            ("buckets", "8"),
            ("delimiter", "\\t"),
        ])
        .sweep_request(&config)
        .unwrap();

        assert!(options.remove_duplicates);
        assert_eq!(options.fill_missing.as_deref(), Some("N/A"));
        assert_eq!(options.convert.preview_row_limit, None);
        assert_eq!(options.edits, vec![CellEdit::new(0, "a", "5")]);
        let chart = options.convert.chart.unwrap();
        assert_eq!(chart.columns, vec!["a", "b"]);
        assert_eq!(chart.buckets, 8);
        assert_eq!(options.parse.delimiter, Some('\t'));
    }

    #[test]
    fn test_sweep_request_errors() {
        let config = SweeperConfig::default();
        assert!(matches!(form(&[]).sweep_request(&config), Err(ServerError::BadRequest(_))));
        assert!(form(&[("target", "csv"), ("rows", "many")]).sweep_request(&config).is_err());
        assert!(form(&[("target", "csv"), ("edits", "{")]).sweep_request(&config).is_err());
        assert!(form(&[("target", "csv"), ("delimiter", ";;")]).sweep_request(&config).is_err());
    }

    #[test]
    fn test_status_codes() {
        let unsupported: ServerError = SweepError::from(IngestError::UnsupportedFormat(".txt".into())).into();
        assert_eq!(status_code(&unsupported), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let parse: ServerError = SweepError::from(IngestError::Parse("bad".into())).into();
        assert_eq!(status_code(&parse), StatusCode::UNPROCESSABLE_ENTITY);

        let target: ServerError = SweepError::from(ConvertError::UnsupportedTarget("gif".into())).into();
        assert_eq!(status_code(&target), StatusCode::BAD_REQUEST);

        let chart: ServerError =
            SweepError::from(ConvertError::Chart(ChartError::NoNumericColumns)).into();
        assert_eq!(status_code(&chart), StatusCode::UNPROCESSABLE_ENTITY);

        let internal = ServerError::Internal("join".into());
        assert_eq!(status_code(&internal), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_into_response() {
        let response = ServerError::BadRequest("No file provided".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_language_query() {
        let query = LangQuery { lang: Some("ur".into()) };
        assert_eq!(query.language(), Language::Urdu);
        let query = LangQuery { lang: Some("xx".into()) };
        assert_eq!(query.language(), Language::English);
    }

    #[tokio::test]
    async fn test_index_is_localised() {
        let Html(page) = index(Query(LangQuery { lang: Some("ar".into()) })).await;
        assert!(page.contains("dir=\"rtl\""));
        assert!(page.contains(translate(TITLE, Language::Arabic)));
        assert!(page.contains("value=\"xlsx\""));
    }
}
