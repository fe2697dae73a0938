/*!
This module contains the error types returned by every file system implementation as well as
wrappers and `From` implementations for common errors to enable error propagation.

All backends and decorators report failures through the same [`FsError`] so that callers can tell
"does not exist" apart from "not allowed", "would exceed capacity" and "the medium failed" without
knowing which implementation they are talking to.
*/

use std::fmt;
use std::io;

/// Result that wraps [`FsError`].
pub type FsResult<T> = Result<T, FsError>;

/// Errors that can result from a file system operation.
#[derive(Debug)]
pub enum FsError {
    /// Variant for operations targeting a path that does not exist.
    NotFound(String),

    /**
    Variant for writes that would push the cumulative stored bytes past the configured ceiling.

    The write is fully rejected and no state is changed.
    */
    QuotaExceeded {
        /// The path that was being written.
        path: String,
        /// The number of additional bytes the write would have needed.
        requested_bytes: u64,
        /// The number of bytes stored at the time of the rejection.
        current_bytes: u64,
        /// The configured ceiling.
        max_bytes: u64,
    },

    /**
    Variant for mutating operations attempted against a read-only file system.

    Permission errors reported by the host are failures of the medium and surface as
    [`FsError::Medium`] instead.
    */
    PermissionDenied(String),

    /// Variant for failures of the underlying disk or network medium.
    Medium(io::Error),

    /// Variant for glob patterns that could not be compiled.
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },
}

/// The kind of an [`FsError`] without any of its payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FsErrorKind {
    /// See [`FsError::NotFound`].
    NotFound,
    /// See [`FsError::QuotaExceeded`].
    QuotaExceeded,
    /// See [`FsError::PermissionDenied`].
    PermissionDenied,
    /// See [`FsError::Medium`].
    Medium,
    /// See [`FsError::InvalidPattern`].
    InvalidPattern,
}

/// Public methods
impl FsError {
    /// Create a [`FsError::NotFound`] error for the provided path.
    pub fn not_found(path: &str) -> Self {
        FsError::NotFound(format!("Could not find the file with path {path}"))
    }

    /// Create a [`FsError::PermissionDenied`] error for an operation on the provided path.
    pub fn permission_denied(operation: &str, path: &str) -> Self {
        FsError::PermissionDenied(format!(
            "The {operation} operation on {path} is not permitted on a read-only file system"
        ))
    }

    /// Create a [`FsError::InvalidPattern`] error.
    pub fn invalid_pattern(pattern: &str, reason: &str) -> Self {
        FsError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get the kind of this error.
    pub fn kind(&self) -> FsErrorKind {
        match self {
            FsError::NotFound(_) => FsErrorKind::NotFound,
            FsError::QuotaExceeded { .. } => FsErrorKind::QuotaExceeded,
            FsError::PermissionDenied(_) => FsErrorKind::PermissionDenied,
            FsError::Medium(_) => FsErrorKind::Medium,
            FsError::InvalidPattern { .. } => FsErrorKind::InvalidPattern,
        }
    }

    /// Returns true if this is a [`FsError::NotFound`] error.
    pub fn is_not_found(&self) -> bool {
        self.kind() == FsErrorKind::NotFound
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::Medium(base_err) => Some(base_err),
            _ => None,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::NotFound(msg) => write!(f, "{}", msg),
            FsError::QuotaExceeded {
                path,
                requested_bytes,
                current_bytes,
                max_bytes,
            } => write!(
                f,
                "Writing {path} needs {requested_bytes} more bytes but {current_bytes} of \
                {max_bytes} bytes are already in use"
            ),
            FsError::PermissionDenied(msg) => write!(f, "{}", msg),
            FsError::Medium(base_err) => write!(f, "{}", base_err),
            FsError::InvalidPattern { pattern, reason } => {
                write!(f, "The glob pattern {pattern:?} is invalid: {reason}")
            }
        }
    }
}

/**
A missing file on the medium is reported the same way as a missing file in memory. Every other
error, including a host permission error, is a failure of the medium.
*/
impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(err.to_string()),
            _ => FsError::Medium(err),
        }
    }
}

impl From<FsError> for io::Error {
    fn from(err: FsError) -> Self {
        match err {
            FsError::Medium(base_err) => base_err,
            FsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            FsError::PermissionDenied(msg) => io::Error::new(io::ErrorKind::PermissionDenied, msg),
            FsError::InvalidPattern { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
            }
            FsError::QuotaExceeded { .. } => io::Error::new(io::ErrorKind::Other, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn io_errors_other_than_not_found_are_medium_errors() {
        let not_found: FsError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(not_found.kind(), FsErrorKind::NotFound);

        // Only the read-only decorator reports permission denied
        let denied: FsError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert_eq!(denied.kind(), FsErrorKind::Medium);

        let broken: FsError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert_eq!(broken.kind(), FsErrorKind::Medium);
    }

    #[test]
    fn fs_errors_convert_back_into_io_errors() {
        let io_err: io::Error = FsError::not_found("/missing").into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);

        let io_err: io::Error = FsError::invalid_pattern("[", "unterminated").into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn quota_errors_describe_the_rejected_write() {
        let err = FsError::QuotaExceeded {
            path: "/a.ts".to_string(),
            requested_bytes: 10,
            current_bytes: 95,
            max_bytes: 100,
        };

        assert_eq!(
            err.to_string(),
            "Writing /a.ts needs 10 more bytes but 95 of 100 bytes are already in use"
        );
    }
}
