//! Input resolution: materialise a path, URL, or office document as a local PDF.
//!
//! ## Why three variants?
//!
//! The analysis server only understands PDF bytes, but callers hand us three
//! kinds of input. Each resolution leaves a different cleanup obligation
//! behind, and [`ResolvedInput`] encodes exactly that:
//!
//! * a local PDF path is borrowed — never touched after the run;
//! * a URL is downloaded into a `TempDir` whose `Drop` reclaims the file,
//!   even if the process panics mid-run;
//! * an office document is converted into the job directory, and that
//!   converted artifact is the one file the orchestrator deletes afterwards.
//!
//! We validate the PDF magic bytes (`%PDF`) before returning so callers get
//! a meaningful error rather than an opaque engine rejection.

use crate::error::Mineru2MdError;
use crate::pipeline::office;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input — a local PDF path plus its cleanup obligation.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local PDF file. Caller-owned; never deleted.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was an office document; converted PDF written into the job
    /// directory. Deleted by the orchestrator once processing finishes.
    Converted { path: PathBuf },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
            ResolvedInput::Converted { path } => path,
        }
    }

    /// The conversion artifact to delete after processing, if any.
    ///
    /// Only office conversions produce one; downloads clean themselves up
    /// via `TempDir` and local paths are caller-owned.
    pub fn converted_artifact(&self) -> Option<&Path> {
        match self {
            ResolvedInput::Converted { path } => Some(path),
            _ => None,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Check if the path carries an office-document extension that LibreOffice
/// can convert to PDF.
pub fn is_office_document(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    matches!(
        ext.as_str(),
        "doc" | "docx" | "ppt" | "pptx" | "xls" | "xlsx" | "odt" | "odp" | "ods" | "rtf"
    )
}

/// Resolve the input string to a local PDF file path.
///
/// URLs are downloaded, office documents are converted into `job_dir`,
/// and local paths are validated (existence, readability, PDF magic).
pub async fn resolve_input(
    input: &str,
    job_dir: &Path,
    timeout_secs: u64,
) -> Result<ResolvedInput, Mineru2MdError> {
    if is_url(input) {
        return download_url(input, timeout_secs).await;
    }

    let path = PathBuf::from(input);
    if is_office_document(&path) {
        let pdf_path = office::convert_to_pdf(&path, job_dir).await?;
        return Ok(ResolvedInput::Converted { path: pdf_path });
    }

    resolve_local(input)
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, Mineru2MdError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(Mineru2MdError::FileNotFound { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            // Verify PDF magic bytes
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Mineru2MdError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Mineru2MdError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Mineru2MdError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Mineru2MdError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Mineru2MdError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Mineru2MdError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Mineru2MdError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Mineru2MdError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);

    let temp_dir = TempDir::new().map_err(|e| Mineru2MdError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Mineru2MdError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    // Verify PDF magic bytes before writing anything
    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(Mineru2MdError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Mineru2MdError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_is_office_document() {
        assert!(is_office_document(Path::new("report.docx")));
        assert!(is_office_document(Path::new("slides.PPTX")));
        assert!(is_office_document(Path::new("/data/sheet.ods")));
        assert!(!is_office_document(Path::new("doc.pdf")));
        assert!(!is_office_document(Path::new("noextension")));
    }

    #[test]
    fn test_extract_filename() {
        assert_eq!(
            extract_filename("https://example.com/papers/attn.pdf"),
            "attn.pdf"
        );
        assert_eq!(extract_filename("https://example.com/"), "downloaded.pdf");
        assert_eq!(extract_filename("not a url"), "downloaded.pdf");
    }

    #[test]
    fn local_missing_file_is_not_found() {
        let err = resolve_local("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, Mineru2MdError::FileNotFound { .. }));
    }

    #[test]
    fn local_non_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.pdf");
        std::fs::write(&path, b"<html>hello</html>").unwrap();

        let err = resolve_local(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Mineru2MdError::NotAPdf { .. }));
    }

    #[test]
    fn local_pdf_resolves_without_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.7\n%%EOF\n").unwrap();

        let resolved = resolve_local(path.to_str().unwrap()).unwrap();
        assert_eq!(resolved.path(), path.as_path());
        assert!(resolved.converted_artifact().is_none());
    }
}
