//! Error types for the mineru2md library.
//!
//! A single fatal error enum: the pipeline is one linear delegated call, so
//! there is no page-level partial success to model. Every failure — bad
//! input, office conversion, engine rejection, artifact write — aborts the
//! run and surfaces as `Err(Mineru2MdError)` from [`crate::job::parse_pdf`],
//! after the progress callback has been notified with a failure message.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the mineru2md library.
#[derive(Debug, Error)]
pub enum Mineru2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a PDF path, office document, or HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a PDF path, office document, or HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but no `%PDF` header was found.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// LibreOffice could not convert the office document to PDF.
    #[error(
        "Office-to-PDF conversion failed for '{path}': {detail}\n\
         Conversion requires LibreOffice (soffice) on PATH."
    )]
    ConversionFailed { path: PathBuf, detail: String },

    // ── Analysis-engine errors ────────────────────────────────────────────
    /// The analysis server could not be reached or the request failed in transit.
    #[error(
        "Failed to reach analysis server at '{server_url}': {reason}\n\
         Is the MinerU server running? Set MINERU_SERVER_URL to override the address."
    )]
    EngineUnreachable { server_url: String, reason: String },

    /// The analysis server answered with a non-success status.
    #[error("Analysis server returned HTTP {status}: {detail}")]
    EngineRejected { status: u16, detail: String },

    /// The analysis server answered 200 but the body was not the expected shape.
    #[error("Malformed analysis result: {detail}")]
    MalformedResult { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (worker panic, temp-file failure, …).
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_rejected_display() {
        let e = Mineru2MdError::EngineRejected {
            status: 503,
            detail: "model loading".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("503"), "got: {msg}");
        assert!(msg.contains("model loading"));
    }

    #[test]
    fn engine_unreachable_mentions_env_var() {
        let e = Mineru2MdError::EngineUnreachable {
            server_url: "http://127.0.0.1:30000".into(),
            reason: "connection refused".into(),
        };
        assert!(e.to_string().contains("MINERU_SERVER_URL"));
    }

    #[test]
    fn not_a_pdf_shows_magic() {
        let e = Mineru2MdError::NotAPdf {
            path: PathBuf::from("/tmp/x.pdf"),
            magic: *b"<htm",
        };
        assert!(e.to_string().contains("/tmp/x.pdf"));
    }

    #[test]
    fn conversion_failed_mentions_soffice() {
        let e = Mineru2MdError::ConversionFailed {
            path: PathBuf::from("report.docx"),
            detail: "exit code 77".into(),
        };
        assert!(e.to_string().contains("soffice"));
    }
}
