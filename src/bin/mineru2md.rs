//! CLI binary for mineru2md.
//!
//! A thin shim over the library crate that maps CLI flags to `ParseConfig`,
//! runs one parse job, and optionally applies the image-URL rewrite pass.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mineru2md::{
    parse_pdf, update_markdown_image_urls, ParseConfig, ParseProgressCallback, ProgressCallback,
    StaticBaseResolver,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders the three pipeline checkpoints as a
/// percentage bar. The library reports fractions up to 0.50; the bar is
/// scaled so 0.50 fills it (this tool has no downstream stages of its own).
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Parsing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ParseProgressCallback for CliProgressCallback {
    fn on_progress(&self, fraction: f32, message: &str) {
        self.bar
            .set_position((fraction * 200.0).clamp(0.0, 100.0) as u64);
        self.bar.set_message(message.to_string());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Parse a local PDF into ./output/
  mineru2md document.pdf

  # Parse into a dedicated job directory
  mineru2md document.pdf --job-dir /tmp/job42

  # Office documents are converted via LibreOffice first
  mineru2md quarterly-report.docx

  # Parse from a URL
  mineru2md https://arxiv.org/pdf/1706.03762 --job-dir /tmp/attn

  # Point at a non-default analysis server
  mineru2md document.pdf --server-url http://mineru.internal:30000

  # Rewrite image references to a content server after parsing
  mineru2md document.pdf --kb-id kb1 --image-base-url http://cdn.internal/kb-images

OUTPUT LAYOUT:
  {job_dir}/output/{name}.md                  generated Markdown
  {job_dir}/output/{name}_content_list.json   flat reading-order content list
  {job_dir}/output/{name}_middle.json         full structured analysis result
  {job_dir}/output/images/                    extracted images

ENVIRONMENT VARIABLES:
  MINERU_SERVER_URL       Analysis server base URL (default http://127.0.0.1:30000)
  MINERU2MD_SOFFICE_BIN   LibreOffice binary for office conversion (default soffice)
"#;

/// Parse PDF and office documents to Markdown via a MinerU analysis server.
#[derive(Parser, Debug)]
#[command(
    name = "mineru2md",
    version,
    about = "Parse PDF and office documents to Markdown via a MinerU analysis server",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF path, office-document path, or HTTP/HTTPS URL.
    input: String,

    /// Job working directory; receives the output/ tree. Defaults to the
    /// current directory.
    #[arg(long, env = "MINERU2MD_JOB_DIR")]
    job_dir: Option<PathBuf>,

    /// Analysis server base URL.
    #[arg(long, env = "MINERU_SERVER_URL")]
    server_url: Option<String>,

    /// Backend identifier forwarded to the server.
    #[arg(long, default_value = "sglang-client")]
    backend: String,

    /// Knowledge-base id for the image-URL rewrite pass. Requires
    /// --image-base-url.
    #[arg(long, requires = "image_base_url")]
    kb_id: Option<String>,

    /// Content-server base URL for rewritten image references.
    #[arg(long, requires = "kb_id")]
    image_base_url: Option<String>,

    /// HTTP download timeout for URL inputs in seconds.
    #[arg(long, default_value_t = 120)]
    download_timeout: u64,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };

    let mut builder = ParseConfig::builder()
        .backend(cli.backend.as_str())
        .download_timeout_secs(cli.download_timeout);
    if let Some(ref url) = cli.server_url {
        builder = builder.server_url(url.as_str());
    }
    if let Some(ref cb) = progress {
        builder = builder.progress_callback(Arc::clone(cb) as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;

    let job_dir = match cli.job_dir {
        Some(d) => d,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    // ── Run the parse job ────────────────────────────────────────────────
    let result = parse_pdf(&cli.input, &job_dir, &config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let output = result.with_context(|| format!("Failed to parse '{}'", cli.input))?;

    // ── Optional image-URL rewrite pass ──────────────────────────────────
    if let (Some(kb_id), Some(base_url)) = (&cli.kb_id, &cli.image_base_url) {
        let resolver = StaticBaseResolver::new(base_url.clone());
        update_markdown_image_urls(&output.markdown_path, kb_id, &resolver)
            .await
            .context("Image-URL rewrite failed")?;
        if !cli.quiet {
            eprintln!(
                "{} image references rewritten for kb {}",
                green("✔"),
                bold(kb_id)
            );
        }
    }

    if !cli.quiet {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&output.markdown_path.display().to_string()),
            dim(&format!(
                "{} images, engine {}ms, total {}ms",
                output.stats.image_count,
                output.stats.engine_duration_ms,
                output.stats.total_duration_ms
            )),
        );
    }

    Ok(())
}
