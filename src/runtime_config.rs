//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for dispatch-time behavior.
//!
//! ## Environment Variables
//!
//! ### `MIDSTACK_QUIET`
//!
//! Suppresses the operator error channel (the `tracing::error!` emitted when
//! an error reaches the end of a stack with no parent delegate). Accepts
//! `1`, `true`, or `yes`. Intended for test runs and embedding hosts that do
//! their own terminal-error reporting.
//!
//! Diagnostic suppression is a deployment concern, so it is injected here
//! rather than hard-coded into the dispatch loop: construct an [`crate::App`]
//! with [`crate::App::with_config`] to set it explicitly, or rely on
//! [`RuntimeConfig::from_env`] via [`crate::App::new`].

use std::env;

/// Runtime configuration for a dispatcher instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeConfig {
    /// Suppress operator-channel diagnostics for unhandled errors.
    pub quiet: bool,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let quiet = matches!(
            env::var("MIDSTACK_QUIET").ok().as_deref(),
            Some("1") | Some("true") | Some("yes")
        );
        RuntimeConfig { quiet }
    }

    /// Configuration with the operator error channel disabled.
    #[must_use]
    pub fn silent() -> Self {
        RuntimeConfig { quiet: true }
    }
}
