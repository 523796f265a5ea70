use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the plan/apply/revert engine and its state accessors.
///
/// Only [`Error::is_fatal`] kinds ever abort a run. Everything else is
/// caught at the executor/reverter boundary and recorded against a single
/// action.
#[derive(Debug, Error)]
pub enum Error {
    /// The target key, service or scheme cannot be read at all.
    ///
    /// This is not the same as "value does not exist".
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The accessor rejected a write
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A write was attempted while applying and failed
    #[error("apply failed: {0}")]
    ApplyFailure(String),

    /// A write was attempted while reverting and failed
    #[error("revert failed: {0}")]
    RevertFailure(String),

    /// No manifest at the resolved run location
    #[error("no run manifest found at {0}")]
    ManifestMissing(PathBuf),

    /// Manifest exists but cannot be parsed
    #[error("run manifest {path} is unreadable: {reason}")]
    ManifestCorrupt { path: PathBuf, reason: String },

    /// Host does not meet the operating assumptions (privilege, platform)
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this error must abort the run before any mutation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::PreconditionFailed(_) | Error::ManifestMissing(_) | Error::ManifestCorrupt { .. }
        )
    }

    /// Short stable label, used in logs and the transcript
    pub fn kind(&self) -> &'static str {
        match self {
            Error::CapabilityUnavailable(_) => "capability_unavailable",
            Error::PermissionDenied(_) => "permission_denied",
            Error::ApplyFailure(_) => "apply_failure",
            Error::RevertFailure(_) => "revert_failure",
            Error::ManifestMissing(_) => "manifest_missing",
            Error::ManifestCorrupt { .. } => "manifest_corrupt",
            Error::PreconditionFailed(_) => "precondition_failed",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let missing = Error::ManifestMissing(PathBuf::from("/runs/x"));
        assert!(missing.is_fatal());

        let corrupt = Error::ManifestCorrupt {
            path: PathBuf::from("/runs/x/manifest.json"),
            reason: "EOF".into(),
        };
        assert!(corrupt.is_fatal());
        assert!(Error::PreconditionFailed("not elevated".into()).is_fatal());

        let denied = Error::PermissionDenied("HKLM\\SOFTWARE".into());
        assert!(!denied.is_fatal());
        assert_eq!(denied.kind(), "permission_denied");
        assert!(!Error::ApplyFailure("x".into()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = Error::CapabilityUnavailable("reg.exe not found".into());
        assert_eq!(err.to_string(), "capability unavailable: reg.exe not found");
    }
}
