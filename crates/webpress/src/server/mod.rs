//! The `webpress serve` command: authenticated HTTP conversion service.
//!
//! One conversion endpoint behind the request gate, plus an unauthenticated
//! health check. Uploads arrive as multipart (field `file`); remote sources
//! via `?url=` when enabled in config. All tuning options ride the query
//! string and are normalized leniently, so a malformed `quality=abc` falls
//! back to the default instead of failing the request.

mod error;

use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use clap::Args;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use webpress_core::{ApiGate, Config, ConvertError, Converter, RawOptions, UrlFetcher};

use error::ApiError;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Shared state behind every request handler.
struct AppState {
    converter: Converter,
    gate: ApiGate,
    fetcher: UrlFetcher,
    allow_url_fetch: bool,
    max_upload_bytes: u64,
}

impl AppState {
    fn new(config: &Config) -> Result<Self, ConvertError> {
        let max_upload_bytes = config.server.max_upload_bytes();
        Ok(Self {
            converter: Converter::new(config.encoding.clone(), &config.cache),
            gate: ApiGate::new(&config.server),
            fetcher: UrlFetcher::new(max_upload_bytes, config.server.fetch_timeout_ms)?,
            allow_url_fetch: config.server.allow_url_fetch,
            max_upload_bytes,
        })
    }
}

/// Run the HTTP service until shutdown.
pub async fn execute(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let port = args.port.unwrap_or(config.server.port);
    if config.server.api_keys.is_empty() {
        tracing::warn!("no API keys configured; every /convert request will be rejected");
    }

    let app = router(Arc::new(AppState::new(&config)?));
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, version = webpress_core::VERSION, "webpress listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router. `/healthz` bypasses the gate; everything else sits
/// behind it.
fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes as usize;
    Router::new()
        .route("/convert", post(convert))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), gate))
        .layer(DefaultBodyLimit::max(body_limit))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Admission middleware: API key then rate limit, before any body is read.
async fn gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = extract_credential(request.headers());
    state.gate.admit(credential.as_deref())?;
    Ok(next.run(request).await)
}

/// Credential from `X-API-Key` or `Authorization: Bearer <key>`.
fn extract_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SourceQuery {
    url: Option<String>,
}

/// `POST /convert` — multipart upload or remote URL in, WebP bytes out.
async fn convert(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<RawOptions>,
    Query(source): Query<SourceQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let (bytes, stem, source_kind) = read_source(&state, source, request).await?;
    let input_bytes = bytes.len();

    let converted = state.converter.convert(bytes, &raw).await?;
    let output_bytes = converted.bytes.len();

    tracing::info!(
        source = source_kind,
        input_bytes,
        output_bytes,
        cache_hit = converted.cache_hit,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "converted"
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/webp"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Ok(value) = HeaderValue::from_str(&format!("inline; filename=\"{stem}.webp\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers.insert("x-image-input-bytes", HeaderValue::from(input_bytes as u64));
    headers.insert(
        "x-image-output-bytes",
        HeaderValue::from(output_bytes as u64),
    );

    Ok((StatusCode::OK, headers, converted.bytes).into_response())
}

/// Resolve the request's byte source: multipart `file` field first, then
/// `?url=` when remote fetching is enabled.
async fn read_source(
    state: &AppState,
    source: SourceQuery,
    request: Request,
) -> Result<(Vec<u8>, String, &'static str), ApiError> {
    if is_multipart(request.headers()) {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::bad_request("invalid_multipart", e.to_string()))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| map_multipart(state, e))?
        {
            if field.name() != Some("file") {
                continue;
            }
            let stem = field
                .file_name()
                .map(sanitize_stem)
                .unwrap_or_else(|| "image".to_string());
            let bytes = field.bytes().await.map_err(|e| map_multipart(state, e))?;
            return Ok((bytes.to_vec(), stem, "upload"));
        }
    }

    if let Some(url) = source.url.filter(|u| !u.trim().is_empty()) {
        if !state.allow_url_fetch {
            return Err(ConvertError::UrlFetchDisabled.into());
        }
        let bytes = state.fetcher.fetch(&url).await?;
        // Stem comes from the URL path only; query and fragment never
        // leak into the suggested filename.
        let stem = webpress_core::fetch::url_file_name(&url)
            .map(|name| sanitize_stem(&name))
            .unwrap_or_else(|| "image".to_string());
        return Ok((bytes, stem, "url"));
    }

    Err(ConvertError::MissingInput.into())
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Body-limit overruns surface through multipart reads; everything else is
/// a malformed upload.
fn map_multipart(state: &AppState, err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ConvertError::PayloadTooLarge {
            max_bytes: state.max_upload_bytes,
        }
        .into()
    } else {
        ApiError::bad_request("invalid_multipart", err.to_string())
    }
}

/// Filename stem safe to echo back in a Content-Disposition header.
fn sanitize_stem(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}
