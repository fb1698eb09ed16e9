//! Office-to-PDF conversion via headless LibreOffice.
//!
//! LibreOffice is the one external tool that reliably converts the whole
//! legacy office zoo (doc/ppt/xls and their OOXML and OpenDocument
//! successors) without per-format parsing code. We shell out to `soffice
//! --headless` with the job directory as `--outdir`, so the produced PDF is
//! a job-scoped artifact the orchestrator can delete once processing ends.

use crate::error::Mineru2MdError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Binary name probed on PATH. Overridable for deployments that install
/// LibreOffice under a wrapper name.
pub const SOFFICE_BIN_ENV: &str = "MINERU2MD_SOFFICE_BIN";

fn soffice_bin() -> String {
    std::env::var(SOFFICE_BIN_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "soffice".to_string())
}

/// Convert an office document to PDF, writing the result into `out_dir`.
///
/// Returns the path of the produced PDF (`{out_dir}/{stem}.pdf`). The input
/// document is never modified.
pub async fn convert_to_pdf(input: &Path, out_dir: &Path) -> Result<PathBuf, Mineru2MdError> {
    if !input.exists() {
        return Err(Mineru2MdError::FileNotFound {
            path: input.to_path_buf(),
        });
    }

    let bin = soffice_bin();
    info!(
        "Converting office document to PDF: {} (via {})",
        input.display(),
        bin
    );

    let output = Command::new(&bin)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(out_dir)
        .arg(input)
        .output()
        .await
        .map_err(|e| Mineru2MdError::ConversionFailed {
            path: input.to_path_buf(),
            detail: format!("failed to launch '{}': {}", bin, e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Mineru2MdError::ConversionFailed {
            path: input.to_path_buf(),
            detail: format!("{} — {}", output.status, stderr.trim()),
        });
    }

    let pdf_path = expected_pdf_path(input, out_dir);
    if !pdf_path.exists() {
        // soffice exits 0 on some failures (e.g. a filter it cannot load).
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Err(Mineru2MdError::ConversionFailed {
            path: input.to_path_buf(),
            detail: format!(
                "conversion reported success but '{}' was not produced ({})",
                pdf_path.display(),
                stdout.trim()
            ),
        });
    }

    debug!("Converted PDF at: {}", pdf_path.display());
    Ok(pdf_path)
}

/// Where soffice places the output: input stem + `.pdf` under `--outdir`.
fn expected_pdf_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "converted".to_string());
    out_dir.join(format!("{stem}.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_path_uses_input_stem() {
        assert_eq!(
            expected_pdf_path(Path::new("/in/quarterly report.docx"), Path::new("/job")),
            PathBuf::from("/job/quarterly report.pdf")
        );
    }

    #[tokio::test]
    async fn missing_input_is_not_found() {
        let out = tempfile::tempdir().unwrap();
        let err = convert_to_pdf(Path::new("/no/such.docx"), out.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Mineru2MdError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn unlaunchable_binary_is_conversion_failed() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.docx");
        std::fs::write(&input, b"fake").unwrap();

        // Point the binary override at something that cannot exist.
        std::env::set_var(SOFFICE_BIN_ENV, "/nonexistent/soffice-test-binary");
        let err = convert_to_pdf(&input, dir.path()).await.unwrap_err();
        std::env::remove_var(SOFFICE_BIN_ENV);

        assert!(matches!(err, Mineru2MdError::ConversionFailed { .. }));
    }
}
