//! Pipeline stages for document-to-Markdown parsing.
//!
//! Each submodule implements exactly one step of the linear pipeline.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. point the engine seam at a mock) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ layout ──▶ engine ──▶ emit ──▶ rewrite
//! (URL/path/ (output/   (MinerU    (md +    (image-URL
//!  office)    images/)   server)    JSON)    post-pass)
//! ```
//!
//! 1. [`input`]   — materialise the user-supplied path, URL, or office
//!    document as a local PDF; delegates office conversion to [`office`]
//! 2. [`layout`]  — provision the job's `output/images` directory tree
//! 3. [`engine`]  — sanitize the PDF bytes and submit them to the analysis
//!    server; the only stage with network I/O
//! 4. [`emit`]    — write the Markdown, JSON side-files, and extracted images
//! 5. [`rewrite`] — in-place image-reference rewrite pointing at a content
//!    server; runs separately, keyed by knowledge-base id

pub mod emit;
pub mod engine;
pub mod input;
pub mod layout;
pub mod office;
pub mod rewrite;
