use std::io;
use std::path::PathBuf;

/// Boxed cause of a transport failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of a whole page download. Per-asset failures never end up here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Destination directory is missing; raised before any request is sent
    #[error("output directory '{}' does not exist", path.display())]
    Directory { path: PathBuf },

    #[error("HTTP {status} while fetching '{url}'")]
    Http { url: String, status: u16 },

    #[error("request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: BoxError,
    },

    /// Writing the page (or checking we may write it) failed
    #[error("failed to save page to '{}': {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid page URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Process exit codes, BSD sysexits style.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const USAGE: i32 = 64;
    pub const UNAVAILABLE: i32 = 69;
    pub const SOFTWARE: i32 = 70;
    pub const OS_FILE: i32 = 72;
    pub const IO: i32 = 74;
    pub const PROTOCOL: i32 = 76;
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Http { .. } => exit_code::PROTOCOL,
            Error::Request { .. } => exit_code::UNAVAILABLE,
            Error::Save { .. } => exit_code::OS_FILE,
            Error::Directory { .. } => exit_code::IO,
            Error::InvalidUrl { .. } => exit_code::USAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            Error::Directory { path: PathBuf::from("/no/such/dir") },
            Error::Http { url: "https://example.test".into(), status: 404 },
            Error::Request {
                url: "https://example.test".into(),
                source: Box::new(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
            },
            Error::Save {
                path: PathBuf::from("page.html"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            },
            Error::InvalidUrl { url: "nope".into(), reason: "no host".into() },
        ];

        let mut codes: HashSet<i32> = errors.iter().map(Error::exit_code).collect();
        assert_eq!(codes.len(), errors.len());
        codes.insert(exit_code::SUCCESS);
        codes.insert(exit_code::SOFTWARE);
        assert_eq!(codes.len(), errors.len() + 2);
    }

    #[test]
    fn test_messages_name_the_cause() {
        let err = Error::Http { url: "https://example.test/courses".into(), status: 404 };
        assert_eq!(err.to_string(), "HTTP 404 while fetching 'https://example.test/courses'");

        let err = Error::Directory { path: PathBuf::from("/no/such/dir") };
        assert_eq!(err.to_string(), "output directory '/no/such/dir' does not exist");
    }
}
