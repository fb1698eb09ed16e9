//! # mineru2md
//!
//! Convert PDF and office documents to Markdown via a MinerU analysis server.
//!
//! ## Why this crate?
//!
//! Layout analysis — reading order, tables, formulae, figure extraction — is
//! a model-inference problem, and the MinerU server family already solves it
//! well. What a host application still needs is the unglamorous sequencing
//! around that call: materialising the input as a PDF (downloading URLs,
//! converting office documents), provisioning a per-job output tree, feeding
//! sanitized bytes to the server, writing the Markdown/JSON/image artifacts,
//! and rewriting image references once the images are hosted. This crate is
//! exactly that glue, with the analysis engine kept behind a trait seam.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input (path / URL / office doc)
//!  │
//!  ├─ 1. Input    materialise a local PDF (download / soffice convert)
//!  ├─ 2. Layout   provision {job_dir}/output/images
//!  ├─ 3. Engine   sanitize bytes, POST to the MinerU server (one worker task)
//!  ├─ 4. Emit     {name}.md + {name}_content_list.json + {name}_middle.json + images
//!  └─ 5. Rewrite  ![](…) → <img src="hosted URL"> (separate pass, per kb id)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mineru2md::{parse_pdf, ParseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Server address taken from MINERU_SERVER_URL (default http://127.0.0.1:30000)
//!     let config = ParseConfig::default();
//!     let job_dir = std::env::current_dir()?;
//!     let output = parse_pdf("document.pdf", &job_dir, &config).await?;
//!     println!("markdown at: {}", output.markdown_path.display());
//!     eprintln!("{} images, {}ms", output.stats.image_count, output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mineru2md` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! mineru2md = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{configured_server_url, ParseConfig, ParseConfigBuilder};
pub use error::Mineru2MdError;
pub use job::{parse_pdf, parse_pdf_sync, ParseOutput, ParseStats};
pub use pipeline::engine::{AnalysisEngine, AnalysisResult, HttpAnalysisEngine};
pub use pipeline::rewrite::{update_markdown_image_urls, ImageUrlResolver, StaticBaseResolver};
pub use progress::{NoopProgressCallback, ParseProgressCallback, ProgressCallback};
