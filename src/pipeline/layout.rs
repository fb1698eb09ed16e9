//! Directory provisioning for one parse run.
//!
//! Every run owns a caller-provided job directory; this module carves the
//! fixed `output/images` tree out of it. Creation is idempotent so a retried
//! job can reuse the same directory, and nothing here ever deletes — the job
//! directory's lifecycle belongs to the caller.

use crate::error::Mineru2MdError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the artifact directory under the job directory.
pub const OUTPUT_DIR_NAME: &str = "output";

/// Name of the image directory under the output directory.
///
/// Also the relative prefix the engine uses for image references in the
/// generated Markdown, which is what makes the written tree self-consistent.
pub const IMAGE_DIR_NAME: &str = "images";

/// Typed paths for a provisioned job directory tree.
#[derive(Debug, Clone)]
pub struct JobLayout {
    /// `{job_dir}/output` — receives the Markdown and JSON artifacts.
    pub output_dir: PathBuf,
    /// `{job_dir}/output/images` — receives extracted images.
    pub images_dir: PathBuf,
}

impl JobLayout {
    /// Create `{job_dir}/output/images` (and implicitly `{job_dir}/output`).
    ///
    /// Idempotent; existing directories are left untouched. Filesystem
    /// failures propagate as [`Mineru2MdError::OutputWriteFailed`].
    pub async fn create(job_dir: impl AsRef<Path>) -> Result<Self, Mineru2MdError> {
        let output_dir = job_dir.as_ref().join(OUTPUT_DIR_NAME);
        let images_dir = output_dir.join(IMAGE_DIR_NAME);

        tokio::fs::create_dir_all(&images_dir)
            .await
            .map_err(|e| Mineru2MdError::OutputWriteFailed {
                path: images_dir.clone(),
                source: e,
            })?;

        debug!("Ensured output directory exists: {}", output_dir.display());
        debug!("Ensured images directory exists: {}", images_dir.display());

        Ok(Self {
            output_dir,
            images_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_nested_tree() {
        let job_dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::create(job_dir.path()).await.unwrap();

        assert!(layout.output_dir.is_dir());
        assert!(layout.images_dir.is_dir());
        assert_eq!(layout.output_dir, job_dir.path().join("output"));
        assert_eq!(layout.images_dir, job_dir.path().join("output/images"));
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let job_dir = tempfile::tempdir().unwrap();
        let first = JobLayout::create(job_dir.path()).await.unwrap();

        // Pre-existing content must survive a second provisioning pass.
        let marker = first.images_dir.join("existing.jpg");
        tokio::fs::write(&marker, b"jpeg").await.unwrap();

        let second = JobLayout::create(job_dir.path()).await.unwrap();
        assert_eq!(first.output_dir, second.output_dir);
        assert!(marker.exists());
    }
}
