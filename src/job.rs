//! Orchestration entry point: one document in, one artifact tree out.
//!
//! The pipeline is strictly linear — resolve, provision, sanitize, delegate,
//! emit — with progress reported at the fixed 0.10 / 0.30 / 0.50
//! checkpoints. There is no parallelism across documents here; callers that
//! parse many documents run many jobs, each with its own job directory.
//!
//! ## Cleanup contract
//!
//! The job directory and everything under `output/` belong to the caller
//! and are never deleted. The single thing this module cleans up is the
//! PDF produced by office conversion: it is a by-product of normalization,
//! not an output, and deleting it keeps the job directory from accumulating
//! one stray PDF per office document. Deletion failures are logged and
//! swallowed — a leftover temp file must not fail an otherwise complete run.

use crate::config::ParseConfig;
use crate::error::Mineru2MdError;
use crate::pipeline::emit::{self, EmittedArtifacts};
use crate::pipeline::engine::{self, AnalysisEngine, HttpAnalysisEngine};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::layout::JobLayout;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Timing and size counters for one parse run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ParseStats {
    /// Wall-clock time of the analysis-engine call.
    pub engine_duration_ms: u64,
    /// Wall-clock time of the whole run, resolution included.
    pub total_duration_ms: u64,
    /// Images written under `output/images/`.
    pub image_count: usize,
    /// Byte length of the generated Markdown.
    pub markdown_bytes: usize,
}

/// Result of a successful parse run.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    /// `{job_dir}/output/{name}.md`
    pub markdown_path: PathBuf,
    /// `{job_dir}/output`
    pub output_dir: PathBuf,
    /// `{job_dir}/output/images`
    pub images_dir: PathBuf,
    pub stats: ParseStats,
}

/// Parse a document into Markdown plus extracted images.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`   — local PDF path, HTTP/HTTPS URL, or office-document path
/// * `job_dir` — caller-owned working directory for this run's outputs
/// * `config`  — parse configuration
///
/// # Errors
/// Any failure aborts the run: unresolvable input, engine rejection, or
/// artifact-write error. The progress callback receives a failure message
/// at fraction 0.50 before the error is returned.
pub async fn parse_pdf(
    input: impl AsRef<str>,
    job_dir: impl AsRef<Path>,
    config: &ParseConfig,
) -> Result<ParseOutput, Mineru2MdError> {
    let input = input.as_ref();
    let job_dir = job_dir.as_ref();
    let total_start = Instant::now();

    notify(config, 0.10, "Starting file preprocessing");
    info!("Received input for processing: {}", input);

    let resolved = match input::resolve_input(input, job_dir, config.download_timeout_secs).await {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to materialise a PDF for input '{}': {}", input, e);
            notify(config, 0.50, &format!("File processing failed: {e}"));
            return Err(e);
        }
    };

    let outcome = run_pipeline(&resolved, job_dir, config, total_start).await;

    if let Err(ref e) = outcome {
        error!("Parse run failed for input '{}': {}", input, e);
        notify(config, 0.50, &format!("File processing failed: {e}"));
    }

    cleanup_converted(&resolved).await;

    outcome
}

/// Synchronous wrapper around [`parse_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn parse_pdf_sync(
    input: impl AsRef<str>,
    job_dir: impl AsRef<Path>,
    config: &ParseConfig,
) -> Result<ParseOutput, Mineru2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Mineru2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(parse_pdf(input, job_dir, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Everything between input resolution and artifact emission.
async fn run_pipeline(
    resolved: &ResolvedInput,
    job_dir: &Path,
    config: &ParseConfig,
    total_start: Instant,
) -> Result<ParseOutput, Mineru2MdError> {
    let pdf_path = resolved.path();
    info!("PDF file to process: {}", pdf_path.display());
    if let Some(artifact) = resolved.converted_artifact() {
        info!(
            "PDF is a converted temp artifact, will be removed after processing: {}",
            artifact.display()
        );
    }

    let file_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    notify(
        config,
        0.30,
        &format!("PDF ready ({file_name}), starting analysis-engine processing"),
    );

    let layout = JobLayout::create(job_dir).await?;

    let name = pdf_path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let raw_bytes = tokio::fs::read(pdf_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Mineru2MdError::FileNotFound {
                path: pdf_path.to_path_buf(),
            }
        } else {
            Mineru2MdError::Internal(format!("failed to read '{}': {e}", pdf_path.display()))
        }
    })?;
    let pdf_bytes = engine::normalize_pdf_bytes(&raw_bytes, pdf_path)?;

    let engine = resolve_engine(config)?;
    let engine_start = Instant::now();
    let result = engine::analyze_on_worker(engine, pdf_bytes, file_name).await?;
    let engine_duration_ms = engine_start.elapsed().as_millis() as u64;
    info!("Engine processing finished in {}ms", engine_duration_ms);

    let EmittedArtifacts {
        markdown_path,
        image_count,
        ..
    } = emit::write_artifacts(&result, &name, &layout).await?;

    let md_name = markdown_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    notify(
        config,
        0.50,
        &format!("Processing and Markdown generation complete: {md_name}"),
    );
    info!("Final Markdown path: {}", markdown_path.display());

    Ok(ParseOutput {
        markdown_path,
        output_dir: layout.output_dir,
        images_dir: layout.images_dir,
        stats: ParseStats {
            engine_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            image_count,
            markdown_bytes: result.markdown.len(),
        },
    })
}

/// Resolve the analysis engine: a pre-built one from config, else HTTP.
fn resolve_engine(config: &ParseConfig) -> Result<Arc<dyn AnalysisEngine>, Mineru2MdError> {
    if let Some(ref engine) = config.engine {
        return Ok(Arc::clone(engine));
    }
    Ok(Arc::new(HttpAnalysisEngine::new(
        config.server_url.clone(),
        config.backend.clone(),
    )?))
}

/// Delete the office-conversion artifact, if any. Failures are non-fatal.
async fn cleanup_converted(resolved: &ResolvedInput) {
    let Some(artifact) = resolved.converted_artifact() else {
        return;
    };
    match tokio::fs::remove_file(artifact).await {
        Ok(()) => info!("Removed converted temp PDF: {}", artifact.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => error!(
            "Failed to remove converted temp PDF '{}': {}",
            artifact.display(),
            e
        ),
    }
}

fn notify(config: &ParseConfig, fraction: f32, message: &str) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_progress(fraction, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::ResolvedInput;

    #[tokio::test]
    async fn cleanup_removes_converted_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("converted.pdf");
        tokio::fs::write(&artifact, b"%PDF-1.4\n%%EOF").await.unwrap();

        let resolved = ResolvedInput::Converted {
            path: artifact.clone(),
        };
        cleanup_converted(&resolved).await;
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn cleanup_leaves_local_input_alone() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("original.pdf");
        tokio::fs::write(&original, b"%PDF-1.4\n%%EOF").await.unwrap();

        let resolved = ResolvedInput::Local(original.clone());
        cleanup_converted(&resolved).await;
        assert!(original.exists());
    }

    #[tokio::test]
    async fn cleanup_tolerates_already_missing_artifact() {
        let resolved = ResolvedInput::Converted {
            path: PathBuf::from("/tmp/never-existed-mineru2md.pdf"),
        };
        // must not panic
        cleanup_converted(&resolved).await;
    }
}
