//! Shared tracing configuration utilities for the remote-processor workspace.
//!
//! The helpers in this crate centralise how binaries, integration tests,
//! and demos install `tracing` subscribers. By routing setup through a
//! single crate we avoid copy-pasting builder logic and keep the logging
//! surface consistent across the workspace.

pub use tracing::{debug, error, info, trace, warn};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter, Registry};

/// Output format for the formatter layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingOutput {
    /// Human-oriented multi-line output for local terminals.
    Pretty,
    /// Single-line JSON events for CI and log collection.
    Json,
}

/// Configuration describing how the shared tracing subscriber should behave.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    /// Optional tracing directives (e.g. `rproc_core=debug,info`). When
    /// absent the crate falls back to `RUST_LOG` and finally to
    /// [`TracingConfig::default_directive`].
    pub directives: Option<String>,
    /// Fallback directive used when neither [`TracingConfig::directives`]
    /// nor `RUST_LOG` resolve to a valid filter.
    pub default_directive: String,
    /// Controls whether event targets (module paths) appear in output.
    pub include_targets: bool,
    /// Controls ANSI formatting. Disable for CI logs that strip colour codes.
    pub ansi: bool,
    /// Output format for the formatter layer.
    pub output: TracingOutput,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_local()
    }
}

impl TracingConfig {
    /// Returns a configuration tuned for local development (pretty,
    /// ANSI-enabled output).
    pub fn for_local() -> Self {
        Self {
            directives: None,
            default_directive: "info".to_string(),
            include_targets: true,
            ansi: true,
            output: TracingOutput::Pretty,
        }
    }

    /// Returns a configuration tuned for CI or log collection environments
    /// (JSON, no ANSI).
    pub fn for_ci() -> Self {
        Self {
            directives: None,
            default_directive: "info".to_string(),
            include_targets: true,
            ansi: false,
            output: TracingOutput::Json,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        if let Some(directives) = &self.directives {
            if let Ok(filter) = EnvFilter::try_new(directives) {
                return filter;
            }
        }
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive.clone()))
    }

    /// Install the subscriber globally.
    ///
    /// Panics if a global subscriber is already set; prefer
    /// [`TracingConfig::try_init`] in tests, where several harness
    /// processes may race to install one.
    pub fn init(self) {
        self.build().init();
    }

    /// Install the subscriber globally, ignoring an already-installed one.
    pub fn try_init(self) {
        let _ = self.build().try_init();
    }

    fn build(self) -> Box<dyn tracing::Subscriber + Send + Sync> {
        let filter = self.env_filter();
        match self.output {
            TracingOutput::Pretty => Box::new(
                Registry::default().with(filter).with(
                    tracing_fmt::layer()
                        .with_target(self.include_targets)
                        .with_ansi(self.ansi),
                ),
            ),
            TracingOutput::Json => Box::new(
                Registry::default().with(filter).with(
                    tracing_fmt::layer()
                        .json()
                        .with_target(self.include_targets)
                        .with_ansi(false),
                ),
            ),
        }
    }
}

/// Initialise tracing with local-development defaults.
///
/// Convenience for demos and small tools:
///
/// ```no_run
/// rproc_tracing::init();
/// tracing::info!("subscriber installed");
/// ```
pub fn init() {
    TracingConfig::for_local().init();
}

/// Initialise tracing for tests; safe to call from every test.
pub fn init_for_tests() {
    TracingConfig::for_local().try_init();
}
