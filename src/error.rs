//! Error type for the whitepaper-factory library.
//!
//! Every stage of the wizard is a single request/response transform, so one
//! flat enum is enough. The variants follow the failure modes a caller can
//! act on:
//!
//! * **Client errors**: [`WizardError::InvalidInput`]: the request itself is
//!   malformed. Always a 4xx.
//! * **Configuration errors**: [`WizardError::UpstreamUnavailable`],
//!   [`WizardError::InvalidConfig`], [`WizardError::TemplateMissing`]: the
//!   process is missing a credential or an asset. Not transient.
//! * **Upstream errors**: [`WizardError::Gateway`], [`WizardError::Backend`],
//!   [`WizardError::ModelFailure`], [`WizardError::RenderFailure`]: the
//!   extraction service, the LLM or the browser failed for this call.
//!
//! The HTTP layer converts every variant into `{"error": "<Display>"}` using
//! [`WizardError::status_code`]; nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the whitepaper-factory library.
#[derive(Debug, Error)]
pub enum WizardError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// A required request field is missing, blank or of the wrong type.
    #[error("{0}")]
    InvalidInput(String),

    // ── Configuration errors ──────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A credential or backend the call depends on is not configured.
    #[error("{what} is not configured.\n{hint}")]
    UpstreamUnavailable { what: String, hint: String },

    /// The HTML template used for PDF rendering could not be read.
    #[error("Whitepaper template not found at '{path}': {source}")]
    TemplateMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The extraction backend could not be reached at all.
    #[error("{message}")]
    Gateway { message: String },

    /// The extraction backend answered with a non-success status.
    ///
    /// `status` is forwarded to the wizard's own caller unchanged.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// The LLM call itself failed.
    #[error("{message}")]
    ModelFailure { message: String },

    /// Launching the browser, loading the page or printing the PDF failed.
    #[error("{0}")]
    RenderFailure(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WizardError {
    /// HTTP status code this error maps to at the handler boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            WizardError::InvalidInput(_) => 400,
            WizardError::Backend { status, .. } if (400..=599).contains(status) => *status,
            WizardError::Backend { .. } | WizardError::Gateway { .. } => 502,
            WizardError::InvalidConfig(_)
            | WizardError::UpstreamUnavailable { .. }
            | WizardError::TemplateMissing { .. }
            | WizardError::ModelFailure { .. }
            | WizardError::RenderFailure(_)
            | WizardError::Internal(_) => 500,
        }
    }

    /// Shorthand for [`WizardError::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        WizardError::InvalidInput(msg.into())
    }
}
