//! Configuration types for the parse pipeline.
//!
//! All behaviour is controlled through [`ParseConfig`], built via its
//! [`ParseConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across tasks and to diff two runs to understand why
//! their outputs differ.

use crate::error::Mineru2MdError;
use crate::pipeline::engine::AnalysisEngine;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Default analysis-server address when `MINERU_SERVER_URL` is unset.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:30000";

/// Environment variable naming the analysis-server base URL.
pub const SERVER_URL_ENV: &str = "MINERU_SERVER_URL";

/// Backend identifier sent with every analysis request.
///
/// The server multiplexes several inference backends; this library always
/// requests the sglang client path, matching the deployment it is paired with.
pub const ENGINE_BACKEND: &str = "sglang-client";

/// Resolve the analysis-server base URL from the environment.
///
/// Reads `MINERU_SERVER_URL`, falling back to `http://127.0.0.1:30000`.
pub fn configured_server_url() -> String {
    std::env::var(SERVER_URL_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
}

/// Configuration for one parse run.
///
/// Built via [`ParseConfig::builder()`] or [`ParseConfig::default()`].
///
/// # Example
/// ```rust
/// use mineru2md::ParseConfig;
///
/// let config = ParseConfig::builder()
///     .server_url("http://mineru.internal:30000")
///     .download_timeout_secs(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ParseConfig {
    /// Base URL of the analysis server. Default: [`configured_server_url`].
    ///
    /// The engine call itself carries no timeout: layout analysis of a large
    /// scanned document can legitimately run for minutes, and the server is
    /// the right place to bound that. Only the URL download step is bounded
    /// client-side.
    pub server_url: String,

    /// Backend identifier forwarded to the server. Default: [`ENGINE_BACKEND`].
    pub backend: String,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Pre-constructed analysis engine. Takes precedence over `server_url`.
    ///
    /// The main use is tests and callers that need custom middleware around
    /// the engine call (caching, recording, fault injection).
    pub engine: Option<Arc<dyn AnalysisEngine>>,

    /// Progress callback invoked at the fixed pipeline checkpoints.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            server_url: configured_server_url(),
            backend: ENGINE_BACKEND.to_string(),
            download_timeout_secs: 120,
            engine: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConfig")
            .field("server_url", &self.server_url)
            .field("backend", &self.backend)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("engine", &self.engine.as_ref().map(|_| "<dyn AnalysisEngine>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ParseProgressCallback>"),
            )
            .finish()
    }
}

impl ParseConfig {
    /// Create a new builder for `ParseConfig`.
    pub fn builder() -> ParseConfigBuilder {
        ParseConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ParseConfig`].
pub struct ParseConfigBuilder {
    config: ParseConfig,
}

impl ParseConfigBuilder {
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn backend(mut self, backend: impl Into<String>) -> Self {
        self.config.backend = backend.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn AnalysisEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ParseConfig, Mineru2MdError> {
        let c = &self.config;
        if !c.server_url.starts_with("http://") && !c.server_url.starts_with("https://") {
            return Err(Mineru2MdError::InvalidConfig(format!(
                "server_url must be an http(s) URL, got '{}'",
                c.server_url
            )));
        }
        if c.backend.is_empty() {
            return Err(Mineru2MdError::InvalidConfig(
                "backend identifier must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_url_without_env() {
        // Only meaningful when the env var is unset in the test environment;
        // assert the fallback rather than mutating process-global state.
        if std::env::var(SERVER_URL_ENV).is_err() {
            assert_eq!(configured_server_url(), DEFAULT_SERVER_URL);
        }
    }

    #[test]
    fn builder_rejects_non_http_url() {
        let err = ParseConfig::builder()
            .server_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Mineru2MdError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_empty_backend() {
        let err = ParseConfig::builder().backend("").build().unwrap_err();
        assert!(matches!(err, Mineru2MdError::InvalidConfig(_)));
    }

    #[test]
    fn builder_defaults_are_valid() {
        let config = ParseConfig::builder().build().unwrap();
        assert_eq!(config.backend, ENGINE_BACKEND);
        assert!(config.engine.is_none());
    }

    #[test]
    fn download_timeout_floor_is_one_second() {
        let config = ParseConfig::builder()
            .download_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(config.download_timeout_secs, 1);
    }
}
