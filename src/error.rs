use std::fmt;
use thiserror::Error;

/// The raw reference could not be turned into an entity identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("unrecognized reference: {0:?}")]
    Unrecognized(String),

    #[error("reference has an empty identifier: {0:?}")]
    EmptyIdentifier(String),
}

/// Why the platform refused to enumerate a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDeniedReason {
    /// The scanning account is not a participant of the entity.
    NotParticipant,
    /// Enumerating members requires admin rights the account lacks.
    AdminRequired,
    /// The entity hides its member list.
    PrivateRoster,
}

impl fmt::Display for AccessDeniedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessDeniedReason::NotParticipant => "not a participant",
            AccessDeniedReason::AdminRequired => "admin rights required",
            AccessDeniedReason::PrivateRoster => "member list is private",
        };
        f.write_str(s)
    }
}

/// Failures reported by a [`crate::directory::MemberDirectory`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(AccessDeniedReason),

    #[error("platform error: {0}")]
    Transport(String),
}

/// Terminal outcome of a scan that produced no report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(AccessDeniedReason),

    #[error("no members were observed")]
    EmptyRoster,

    #[error("platform failure: {0}")]
    Platform(String),
}

impl From<PlatformError> for ScanError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::NotFound(what) => ScanError::NotFound(what),
            PlatformError::AccessDenied(reason) => ScanError::AccessDenied(reason),
            PlatformError::Transport(msg) => ScanError::Platform(msg),
        }
    }
}

/// Error returned by [`crate::scanner::run_scan`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Invalid heuristic configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    ZeroThreshold { field: &'static str },

    #[error("suspicious_score ({suspicious}) must not exceed fake_score ({fake})")]
    InvertedScores { suspicious: u32, fake: u32 },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
