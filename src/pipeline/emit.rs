//! Artifact emission: write Markdown, JSON side-files, and extracted images.
//!
//! Output naming follows the source document: for an input `paper.pdf` the
//! output directory receives `paper.md`, `paper_content_list.json`, and
//! `paper_middle.json`, with images under `images/`. Downstream consumers
//! locate artifacts purely by this convention.

use crate::error::Mineru2MdError;
use crate::pipeline::engine::AnalysisResult;
use crate::pipeline::layout::JobLayout;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Paths of the written artifacts plus an image tally.
#[derive(Debug, Clone)]
pub struct EmittedArtifacts {
    /// `{output}/{name}.md`
    pub markdown_path: PathBuf,
    /// `{output}/{name}_content_list.json`
    pub content_list_path: PathBuf,
    /// `{output}/{name}_middle.json`
    pub middle_json_path: PathBuf,
    /// Images decoded and written under `{output}/images/`.
    pub image_count: usize,
}

/// Write all artifacts for one analysis result.
///
/// `name` is the source document's base filename with extension stripped.
pub async fn write_artifacts(
    result: &AnalysisResult,
    name: &str,
    layout: &JobLayout,
) -> Result<EmittedArtifacts, Mineru2MdError> {
    let markdown_path = layout.output_dir.join(format!("{name}.md"));
    info!("Generating Markdown file: {}", markdown_path.display());
    write_file(&markdown_path, result.markdown.as_bytes()).await?;

    let content_list_path = layout.output_dir.join(format!("{name}_content_list.json"));
    write_file(&content_list_path, pretty_json(&result.content_list)?.as_bytes()).await?;

    let middle_json_path = layout.output_dir.join(format!("{name}_middle.json"));
    write_file(&middle_json_path, pretty_json(&result.middle_json)?.as_bytes()).await?;

    let mut image_count = 0;
    for (file_name, b64) in &result.images {
        // Image names come from the engine; refuse anything that would
        // escape the images directory.
        if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
            warn!("Skipping image with unsafe name: {file_name:?}");
            continue;
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| Mineru2MdError::MalformedResult {
                detail: format!("image '{file_name}' is not valid base64: {e}"),
            })?;
        write_file(&layout.images_dir.join(file_name), &bytes).await?;
        image_count += 1;
    }

    info!(
        "Wrote {} ({} bytes) and {} images",
        markdown_path.display(),
        result.markdown.len(),
        image_count
    );

    Ok(EmittedArtifacts {
        markdown_path,
        content_list_path,
        middle_json_path,
        image_count,
    })
}

fn pretty_json(value: &serde_json::Value) -> Result<String, Mineru2MdError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Mineru2MdError::Internal(format!("JSON serialisation failed: {e}")))
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), Mineru2MdError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| Mineru2MdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use std::collections::BTreeMap;

    fn sample_result() -> AnalysisResult {
        let mut images = BTreeMap::new();
        images.insert(
            "fig_0.jpg".to_string(),
            base64::engine::general_purpose::STANDARD.encode(b"jpegbytes"),
        );
        AnalysisResult {
            middle_json: serde_json::json!({"pdf_info": [{"page_idx": 0}]}),
            markdown: "# Doc\n\n![](images/fig_0.jpg)\n".to_string(),
            content_list: serde_json::json!([{"type": "text", "text": "Doc"}]),
            images,
        }
    }

    #[tokio::test]
    async fn writes_three_files_and_images() {
        let job_dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::create(job_dir.path()).await.unwrap();

        let emitted = write_artifacts(&sample_result(), "paper", &layout)
            .await
            .unwrap();

        assert!(emitted.markdown_path.ends_with("output/paper.md"));
        assert!(emitted.markdown_path.exists());
        assert!(emitted.content_list_path.exists());
        assert!(emitted.middle_json_path.exists());
        assert_eq!(emitted.image_count, 1);

        let img = std::fs::read(layout.images_dir.join("fig_0.jpg")).unwrap();
        assert_eq!(img, b"jpegbytes");

        // JSON side-files must round-trip as JSON
        let middle: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&emitted.middle_json_path).unwrap())
                .unwrap();
        assert!(middle.get("pdf_info").is_some());
    }

    #[tokio::test]
    async fn unsafe_image_names_are_skipped() {
        let job_dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::create(job_dir.path()).await.unwrap();

        let mut result = sample_result();
        result.images.insert(
            "../escape.jpg".to_string(),
            base64::engine::general_purpose::STANDARD.encode(b"x"),
        );

        let emitted = write_artifacts(&result, "doc", &layout).await.unwrap();
        assert_eq!(emitted.image_count, 1);
        assert!(!job_dir.path().join("output/escape.jpg").exists());
    }

    #[tokio::test]
    async fn invalid_base64_is_malformed_result() {
        let job_dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::create(job_dir.path()).await.unwrap();

        let mut result = sample_result();
        result
            .images
            .insert("bad.jpg".to_string(), "!!not-base64!!".to_string());

        let err = write_artifacts(&result, "doc", &layout).await.unwrap_err();
        assert!(matches!(err, Mineru2MdError::MalformedResult { .. }));
    }
}
