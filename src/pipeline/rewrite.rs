//! Image-URL rewrite: point generated Markdown at a content server.
//!
//! The engine emits image references relative to the job's `images/`
//! directory (`![](images/fig_0.jpg)`), which only resolve on the machine
//! that ran the parse. Once the images have been uploaded to a content
//! server, this pass rewrites every reference into an `<img>` tag whose
//! `src` is the hosted URL for the image under its knowledge base.
//!
//! The `<img>` tag (rather than Markdown syntax) is deliberate: the
//! consuming front end renders Markdown as HTML and relies on the inline
//! `max-width` style to keep page images from dominating the layout.

use crate::error::Mineru2MdError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;
use tracing::debug;

/// Matches empty-alt Markdown image references: `![](...)`.
///
/// The engine only ever emits the empty-alt form, so references a human
/// added by hand (with alt text) are left alone.
static RE_IMAGE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[\]\((.*?)\)").unwrap());

/// Resolves an image's hosted URL from its knowledge base and file name.
///
/// This is the seam to the external image-hosting service. Implementations
/// must be `Send + Sync`; the lookup is expected to be a cheap, local
/// computation (URL templating, presigned-URL derivation from cached
/// credentials), not a network round trip per image.
pub trait ImageUrlResolver: Send + Sync {
    /// Return the URL serving `image_name` within knowledge base `kb_id`.
    fn image_url(&self, kb_id: &str, image_name: &str) -> String;
}

/// Resolver that templates `{base_url}/{kb_id}/{image_name}`.
///
/// Fits any content server exposing images under a stable per-knowledge-base
/// prefix (nginx static trees, MinIO public buckets, CDN paths).
pub struct StaticBaseResolver {
    base_url: String,
}

impl StaticBaseResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }
}

impl ImageUrlResolver for StaticBaseResolver {
    fn image_url(&self, kb_id: &str, image_name: &str) -> String {
        format!("{}/{}/{}", self.base_url, kb_id, image_name)
    }
}

/// Rewrite every `![](...)` reference in `content`.
///
/// Non-absolute references are resolved via `resolver`, keyed by `kb_id`
/// and the reference's base filename; absolute `http(s)://` references keep
/// their URL. Content without matches is returned unchanged, which is what
/// makes the file-level pass idempotent once all references are rewritten.
pub fn rewrite_image_urls(content: &str, kb_id: &str, resolver: &dyn ImageUrlResolver) -> String {
    RE_IMAGE_REF
        .replace_all(content, |caps: &Captures<'_>| {
            let reference = &caps[1];
            let url = if reference.starts_with("http://") || reference.starts_with("https://") {
                reference.to_string()
            } else {
                resolver.image_url(kb_id, base_name(reference))
            };
            format!(r#"<img src="{url}" style="max-width: 300px;" alt="图片">"#)
        })
        .into_owned()
}

/// Rewrite a generated Markdown file in place.
///
/// Reads `md_path`, applies [`rewrite_image_urls`], writes the result back
/// to the same file, and returns the updated content.
pub async fn update_markdown_image_urls(
    md_path: impl AsRef<Path>,
    kb_id: &str,
    resolver: &dyn ImageUrlResolver,
) -> Result<String, Mineru2MdError> {
    let md_path = md_path.as_ref();
    let content = tokio::fs::read_to_string(md_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Mineru2MdError::FileNotFound {
                path: md_path.to_path_buf(),
            }
        } else {
            Mineru2MdError::Internal(format!("failed to read '{}': {e}", md_path.display()))
        }
    })?;

    let updated = rewrite_image_urls(&content, kb_id, resolver);
    if updated != content {
        tokio::fs::write(md_path, &updated)
            .await
            .map_err(|e| Mineru2MdError::OutputWriteFailed {
                path: md_path.to_path_buf(),
                source: e,
            })?;
        debug!(
            "Rewrote image references in {} for kb '{}'",
            md_path.display(),
            kb_id
        );
    }

    Ok(updated)
}

/// Final path component of an image reference.
fn base_name(reference: &str) -> &str {
    reference
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Resolver that makes the lookup key visible in the output.
    struct EchoResolver;

    impl ImageUrlResolver for EchoResolver {
        fn image_url(&self, kb_id: &str, image_name: &str) -> String {
            format!("http://cdn.test/{kb_id}/{image_name}")
        }
    }

    #[test]
    fn relative_reference_is_resolved() {
        let out = rewrite_image_urls("before ![](foo.png) after", "kb1", &EchoResolver);
        assert_eq!(
            out,
            r#"before <img src="http://cdn.test/kb1/foo.png" style="max-width: 300px;" alt="图片"> after"#
        );
    }

    #[test]
    fn nested_reference_uses_base_name() {
        let out = rewrite_image_urls("![](images/fig_0.jpg)", "kb9", &EchoResolver);
        assert!(out.contains("http://cdn.test/kb9/fig_0.jpg"));
    }

    #[test]
    fn absolute_url_passes_through() {
        let out = rewrite_image_urls("![](http://example.com/x.png)", "kb1", &EchoResolver);
        assert!(out.contains(r#"src="http://example.com/x.png""#));
        assert!(!out.contains("cdn.test"));
    }

    #[test]
    fn content_without_matches_is_unchanged() {
        let content = "# Title\n\nplain text, [a link](http://example.com), ![alt](x.png)\n";
        assert_eq!(rewrite_image_urls(content, "kb1", &EchoResolver), content);
    }

    #[test]
    fn multiple_references_all_rewritten() {
        let out = rewrite_image_urls("![](a.png)\n![](b.png)\n", "kb1", &EchoResolver);
        assert!(out.contains("/kb1/a.png"));
        assert!(out.contains("/kb1/b.png"));
        assert!(!out.contains("!["));
    }

    #[test]
    fn static_base_resolver_trims_trailing_slash() {
        let r = StaticBaseResolver::new("http://cdn.test/images/");
        assert_eq!(r.image_url("kb1", "x.png"), "http://cdn.test/images/kb1/x.png");
    }

    #[tokio::test]
    async fn file_is_rewritten_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("doc.md");
        tokio::fs::write(&md, "![](images/fig.jpg)\n").await.unwrap();

        let updated = update_markdown_image_urls(&md, "kb1", &EchoResolver)
            .await
            .unwrap();
        assert!(updated.contains("cdn.test/kb1/fig.jpg"));
        assert_eq!(tokio::fs::read_to_string(&md).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn file_without_matches_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("doc.md");
        let content = "no images here\n";
        tokio::fs::write(&md, content).await.unwrap();

        let updated = update_markdown_image_urls(&md, "kb1", &EchoResolver)
            .await
            .unwrap();
        assert_eq!(updated, content);
        assert_eq!(tokio::fs::read_to_string(&md).await.unwrap(), content);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = update_markdown_image_urls("/no/such/file.md", "kb1", &EchoResolver)
            .await
            .unwrap_err();
        assert!(matches!(err, Mineru2MdError::FileNotFound { .. }));
    }
}
