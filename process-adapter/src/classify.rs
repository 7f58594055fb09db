//! Classification of process-spawn failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Coarse category of a spawn failure, used to drive retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Name resolution, refused/reset connections, timeouts.
    Network,
    /// Missing paths, permission denial, directories, descriptor exhaustion.
    Filesystem,
    /// Anything else.
    General,
}

impl ErrorKind {
    /// Returns `true` for the kinds the executor retries.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::Filesystem)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Filesystem => "filesystem",
            Self::General => "general",
        };
        f.write_str(s)
    }
}

/// Classifies a raw OS error code.
#[cfg(unix)]
#[must_use]
pub fn classify_errno(code: i32) -> ErrorKind {
    use nix::errno::Errno;

    match Errno::from_raw(code) {
        Errno::ECONNREFUSED
        | Errno::ECONNRESET
        | Errno::ECONNABORTED
        | Errno::ETIMEDOUT
        | Errno::EHOSTUNREACH
        | Errno::ENETUNREACH
        | Errno::ENETDOWN => ErrorKind::Network,
        Errno::ENOENT
        | Errno::ENOTDIR
        | Errno::EACCES
        | Errno::EPERM
        | Errno::EISDIR
        | Errno::EMFILE
        | Errno::ENFILE
        | Errno::ETXTBSY => ErrorKind::Filesystem,
        _ => ErrorKind::General,
    }
}

/// Classifies a raw OS error code.
#[cfg(not(unix))]
#[must_use]
pub fn classify_errno(code: i32) -> ErrorKind {
    classify_kind(io::Error::from_raw_os_error(code).kind())
}

/// Classifies an I/O error returned by a spawn attempt.
///
/// The raw OS code wins when present; synthetic errors fall back to their
/// [`io::ErrorKind`].
#[must_use]
pub fn classify_io_error(err: &io::Error) -> ErrorKind {
    match err.raw_os_error() {
        Some(code) => classify_errno(code),
        None => classify_kind(err.kind()),
    }
}

fn classify_kind(kind: io::ErrorKind) -> ErrorKind {
    match kind {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::TimedOut => ErrorKind::Network,
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => ErrorKind::Filesystem,
        _ => ErrorKind::General,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_errno_categories() {
        use nix::errno::Errno;

        assert_eq!(classify_errno(Errno::ECONNREFUSED as i32), ErrorKind::Network);
        assert_eq!(classify_errno(Errno::ETIMEDOUT as i32), ErrorKind::Network);
        assert_eq!(classify_errno(Errno::ENOENT as i32), ErrorKind::Filesystem);
        assert_eq!(classify_errno(Errno::EACCES as i32), ErrorKind::Filesystem);
        assert_eq!(classify_errno(Errno::EISDIR as i32), ErrorKind::Filesystem);
        assert_eq!(classify_errno(Errno::EMFILE as i32), ErrorKind::Filesystem);
        assert_eq!(classify_errno(Errno::E2BIG as i32), ErrorKind::General);
        assert_eq!(classify_errno(Errno::ENOMEM as i32), ErrorKind::General);
    }

    #[test]
    fn test_classifier_is_total() {
        for code in -5..200 {
            let first = classify_errno(code);
            assert_eq!(first, classify_errno(code), "code {code} not deterministic");
        }
        assert_eq!(classify_errno(i32::MAX), ErrorKind::General);
    }

    #[test]
    fn test_synthetic_io_errors() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(classify_io_error(&err), ErrorKind::Filesystem);

        let err = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert_eq!(classify_io_error(&err), ErrorKind::Network);

        let err = io::Error::new(io::ErrorKind::InvalidInput, "nul byte");
        assert_eq!(classify_io_error(&err), ErrorKind::General);
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::Network.is_transient());
        assert!(ErrorKind::Filesystem.is_transient());
        assert!(!ErrorKind::General.is_transient());
        assert_eq!(ErrorKind::Filesystem.to_string(), "filesystem");
    }
}
