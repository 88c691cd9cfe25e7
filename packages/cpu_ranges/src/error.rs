use thiserror::Error;

/// Errors that can occur when decoding or merging CPU range strings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A token that should have been a single CPU identifier was not an integer.
    #[error("malformed CPU identifier '{token}': {problem}")]
    MalformedCpu {
        /// The raw token, exactly as it appeared in the input (minus surrounding whitespace).
        token: String,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// A `start-end` token was ill-formed, or a merge input could not be decoded.
    #[error("malformed CPU range '{token}': {problem}")]
    MalformedRange {
        /// The raw token, exactly as it appeared in the input (minus surrounding whitespace).
        token: String,

        /// A human-readable description of the problem.
        problem: String,
    },
}

impl Error {
    /// The raw token that caused the error.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::MalformedCpu { token, .. } | Self::MalformedRange { token, .. } => token,
        }
    }
}

/// A specialized `Result` type for range operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn display_names_the_token() {
        let error = Error::MalformedRange {
            token: "3-1".to_string(),
            problem: "range start must be <= end".to_string(),
        };

        assert!(error.to_string().contains("'3-1'"));
        assert_eq!(error.token(), "3-1");

        let error = Error::MalformedCpu {
            token: "abc".to_string(),
            problem: "not a number".to_string(),
        };

        assert!(error.to_string().contains("'abc'"));
        assert_eq!(error.token(), "abc");
    }
}
