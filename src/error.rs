//! Error types for policy compilation.
//!
//! Parse-level failures are recoverable: the builder skips the offending
//! clause with a warning and keeps compiling. Configuration failures are
//! fatal to the session that hit them and nothing else.

use std::path::PathBuf;

use thiserror::Error;

/// A clause or document fragment that could not be parsed.
///
/// Never aborts compilation; the builder logs it and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("malformed clause: {0}")]
    MalformedClause(String),

    #[error("malformed JSON policy: {0}")]
    MalformedJson(String),

    #[error("unsupported JSON value for key '{key}'")]
    UnsupportedJsonValue { key: String },

    #[error("unbalanced braces in rule block starting at offset {offset}")]
    UnbalancedBraces { offset: usize },
}

/// A failure that ends the current compilation session.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("cannot read principles file {path}: {source}")]
    PrinciplesUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid principles document {path}: {source}")]
    PrinciplesInvalid {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::MalformedClause("foo(".to_string());
        assert!(err.to_string().contains("foo("));

        let err = ParseError::UnbalancedBraces { offset: 12 };
        assert!(err.to_string().contains("12"));
    }

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::PrinciplesUnreadable {
            path: PathBuf::from("/nonexistent/principles.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let s = err.to_string();
        assert!(s.contains("principles.yaml"));
    }
}
