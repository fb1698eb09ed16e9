//! Analysis-engine stage: sanitize PDF bytes and delegate layout analysis.
//!
//! All document understanding happens on a remote MinerU-compatible server;
//! this module only owns the byte-level hand-off. The server seam is the
//! [`AnalysisEngine`] trait so tests and embedding applications can inject
//! their own implementation; [`HttpAnalysisEngine`] is the shipping one.
//!
//! ## Why no timeout or retry?
//!
//! Layout analysis of a large scanned document legitimately runs for
//! minutes, and the server already queues and bounds its own work. A
//! client-side timeout would only turn slow-but-successful runs into
//! failures, and a retry would resubmit an expensive job that is probably
//! still executing. Transport failures surface immediately as
//! [`Mineru2MdError::EngineUnreachable`].

use crate::error::Mineru2MdError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything the analysis server produces for one document.
///
/// `middle_json` and `content_list` are opaque to this crate: they are
/// written out verbatim and interpreted only by downstream consumers. The
/// single shape requirement is that `middle_json` carries a `pdf_info` key,
/// which is what marks a response as an actual analysis result rather than
/// an error body that slipped through with HTTP 200.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResult {
    /// Structured document result; keyed by `pdf_info`.
    pub middle_json: serde_json::Value,
    /// Engine-rendered Markdown; image refs are relative to `images/`.
    #[serde(rename = "md_content")]
    pub markdown: String,
    /// Flat reading-order content list.
    pub content_list: serde_json::Value,
    /// Extracted images: file name → base64-encoded bytes.
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

impl AnalysisResult {
    /// Validate the one structural invariant we rely on.
    pub fn check_shape(&self) -> Result<(), Mineru2MdError> {
        if self.middle_json.get("pdf_info").is_none() {
            return Err(Mineru2MdError::MalformedResult {
                detail: "middle_json is missing the 'pdf_info' key".into(),
            });
        }
        Ok(())
    }
}

/// The layout-analysis seam.
///
/// One method, one document. Implementations must be `Send + Sync`: the
/// orchestrator moves the call onto a spawned worker task.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Analyze a sanitized PDF and return the structured result.
    async fn analyze(
        &self,
        pdf_bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<AnalysisResult, Mineru2MdError>;
}

/// HTTP client for a MinerU-compatible `/file_parse` endpoint.
pub struct HttpAnalysisEngine {
    client: reqwest::Client,
    server_url: String,
    backend: String,
}

/// Error body the server may attach to a non-success status.
#[derive(Debug, Deserialize)]
struct EngineErrorBody {
    #[serde(default)]
    error: String,
}

impl HttpAnalysisEngine {
    /// Build a client for the given server. No request timeout is set.
    pub fn new(
        server_url: impl Into<String>,
        backend: impl Into<String>,
    ) -> Result<Self, Mineru2MdError> {
        let server_url = server_url.into();
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Mineru2MdError::EngineUnreachable {
                server_url: server_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            server_url,
            backend: backend.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/file_parse", self.server_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl AnalysisEngine for HttpAnalysisEngine {
    async fn analyze(
        &self,
        pdf_bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<AnalysisResult, Mineru2MdError> {
        let endpoint = self.endpoint();
        info!(
            "Submitting {} bytes to analysis server: {} (backend={})",
            pdf_bytes.len(),
            endpoint,
            self.backend
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "files",
                reqwest::multipart::Part::bytes(pdf_bytes).file_name(file_name.to_string()),
            )
            .text("backend", self.backend.clone())
            .text("return_md", "true")
            .text("return_middle_json", "true")
            .text("return_content_list", "true")
            .text("return_images", "true");

        let response = self
            .client
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Mineru2MdError::EngineUnreachable {
                server_url: self.server_url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<EngineErrorBody>(&body)
                .ok()
                .filter(|b| !b.error.is_empty())
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(Mineru2MdError::EngineRejected {
                status: status.as_u16(),
                detail,
            });
        }

        let result: AnalysisResult =
            response
                .json()
                .await
                .map_err(|e| Mineru2MdError::MalformedResult {
                    detail: e.to_string(),
                })?;
        result.check_shape()?;

        debug!(
            "Analysis complete: {} bytes of markdown, {} images",
            result.markdown.len(),
            result.images.len()
        );
        Ok(result)
    }
}

/// Strip byte-level noise that makes otherwise-fine PDFs choke strict parsers.
///
/// Two cheap passes, mirroring what a full PDF rewrite would fix for the
/// cases we actually see in the wild:
///
/// * leading junk before the `%PDF-` header (HTTP banners, shell output) —
///   the header must appear within the first 1 KiB or the file is rejected;
/// * trailing garbage after the final `%%EOF` marker (download tails,
///   appended nulls).
///
/// A clean PDF passes through unchanged.
pub fn normalize_pdf_bytes(bytes: &[u8], origin: &Path) -> Result<Vec<u8>, Mineru2MdError> {
    const HEADER: &[u8] = b"%PDF-";
    const TRAILER: &[u8] = b"%%EOF";
    const HEADER_SCAN_WINDOW: usize = 1024;

    let window = &bytes[..bytes.len().min(HEADER_SCAN_WINDOW)];
    let start = find_subsequence(window, HEADER).ok_or_else(|| {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        Mineru2MdError::NotAPdf {
            path: origin.to_path_buf(),
            magic,
        }
    })?;

    if start > 0 {
        warn!(
            "Stripping {} junk bytes before PDF header in {}",
            start,
            origin.display()
        );
    }

    let body = &bytes[start..];
    let end = match rfind_subsequence(body, TRAILER) {
        Some(pos) => {
            let after = pos + TRAILER.len();
            // keep a single trailing newline if the file had one
            match body.get(after) {
                Some(b'\n') => after + 1,
                Some(b'\r') if body.get(after + 1) == Some(&b'\n') => after + 2,
                _ => after,
            }
        }
        // No trailer at all: leave the tail alone and let the engine decide.
        None => body.len(),
    };

    Ok(body[..end].to_vec())
}

/// Hand the engine call to a single one-shot worker task and await it.
///
/// A panicking engine implementation surfaces as `Internal` rather than
/// unwinding through the orchestrator.
pub async fn analyze_on_worker(
    engine: Arc<dyn AnalysisEngine>,
    pdf_bytes: Vec<u8>,
    file_name: String,
) -> Result<AnalysisResult, Mineru2MdError> {
    let handle = tokio::spawn(async move { engine.analyze(pdf_bytes, &file_name).await });
    handle
        .await
        .map_err(|e| Mineru2MdError::Internal(format!("analysis worker failed: {e}")))?
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn rfind_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .rposition(|window| window == needle)
}
