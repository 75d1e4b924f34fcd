//! Logging setup for Stash harnesses.
//!
//! Provides [`TracingSetup`], which installs a `tracing` subscriber, and
//! [`TracingConfig`], the settings it resolved to.
//!
//! `stash_store` only emits `tracing` events; binaries and test harnesses
//! decide where they go by calling [`TracingSetup::init`] once at startup.
//!
//! # Filter Precedence
//!
//! 1. An explicit filter set with [`TracingSetup::with_env_filter`]
//! 2. The `RUST_LOG` environment variable, if [`TracingSetup::with_rust_log`]
//!    is enabled (the default)
//! 3. The maximum level set with [`TracingSetup::with_level`]
//!
//! # Example
//!
//! ```
//! use stash_tracing::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! let config = TracingSetup::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .with_env_filter("stash_store=trace,demo=info")
//!     .init();
//!
//! assert_eq!(config.format, TracingFormat::Compact);
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Settings a [`TracingSetup`] was initialized with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured maximum log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
    /// The filter directives that were installed.
    pub filter: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingSetup
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for the process-wide `tracing` subscriber.
///
/// ```
/// use stash_tracing::{TracingFormat, TracingSetup};
/// use tracing::Level;
///
/// // Local debugging: pretty output, store operations at trace level
/// let dev = TracingSetup::new()
///     .with_level(Level::DEBUG)
///     .with_env_filter("stash_store=trace")
///     .with_span_events(true);
///
/// // CI: JSON lines, ignore RUST_LOG from the runner
/// let ci = TracingSetup::new()
///     .with_format(TracingFormat::Json)
///     .with_rust_log(false);
/// ```
#[derive(Debug, Clone)]
pub struct TracingSetup {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Explicit filter directives (e.g., "stash_store=trace").
    env_filter: Option<String>,
    /// Whether `RUST_LOG` is consulted when no explicit filter is set.
    rust_log: bool,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            rust_log: true,
            span_events: false,
        }
    }
}

impl TracingSetup {
    /// Creates a new `TracingSetup` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets explicit filter directives.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables or disables reading `RUST_LOG`.
    #[must_use]
    pub fn with_rust_log(mut self, enabled: bool) -> Self {
        self.rust_log = enabled;
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Resolves the filter according to the precedence rules.
    fn filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.as_str());
        match &self.env_filter {
            Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| fallback()),
            None if self.rust_log => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
            None => fallback(),
        }
    }

    /// Installs the subscriber and returns the resolved settings.
    ///
    /// Safe to call more than once: if a global subscriber is already set
    /// (e.g. by an earlier test), the existing one is kept.
    pub fn init(&self) -> TracingConfig {
        let env_filter = self.filter();
        let filter = env_filter.to_string();

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init().ok() ignores errors if already initialized
        match self.format {
            TracingFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Compact => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
        }

        tracing::debug!(level = %self.level, format = ?self.format, %filter, "tracing initialized");

        TracingConfig {
            level: self.level,
            format: self.format,
            filter,
        }
    }
}
