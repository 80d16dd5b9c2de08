//! Unified error types for the psc ecosystem
//!
//! This module provides a common error type [`PscError`] shared by the
//! conversion pipeline and the CLI. Every stage fails fast with the first
//! violation; errors carry enough context (component kind, name, attribute,
//! value) to diagnose a failing conversion without re-running it.

use thiserror::Error;

/// Unified error type for all psc operations.
#[derive(Error, Debug)]
pub enum PscError {
    /// An attribute value outside the supported restriction set.
    #[error("unsupported configuration: {kind} '{name}': {attribute} = {value}: {reason}")]
    UnsupportedConfiguration {
        kind: String,
        name: String,
        attribute: String,
        value: String,
        reason: String,
    },

    /// A component or constraint type the converter does not handle.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A port or carrier reference to a component that does not exist.
    #[error("dangling reference: {kind} '{name}' references unknown {target_kind} '{target}'")]
    DanglingReference {
        kind: String,
        name: String,
        target_kind: String,
        target: String,
    },

    /// A study-manifest invariant violated just before write.
    #[error("integrity error: {0}")]
    IntegrityError(String),

    /// Filesystem failure while writing the study.
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid series file format flag (only `.csv` and `.tsv` are valid).
    #[error("unsupported series file format '{0}'; use .csv or .tsv")]
    UnsupportedFormat(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

impl PscError {
    /// Build an `UnsupportedConfiguration` with display-formatted value.
    pub fn unsupported(
        kind: impl Into<String>,
        name: impl Into<String>,
        attribute: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        PscError::UnsupportedConfiguration {
            kind: kind.into(),
            name: name.into(),
            attribute: attribute.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path or action that produced it.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PscError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using PscError.
pub type PscResult<T> = Result<T, PscError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for PscError {
    fn from(err: anyhow::Error) -> Self {
        PscError::Other(err.to_string())
    }
}

impl From<String> for PscError {
    fn from(s: String) -> Self {
        PscError::Other(s)
    }
}

impl From<&str> for PscError {
    fn from(s: &str) -> Self {
        PscError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let err = PscError::unsupported("generator", "gen_1", "committable", 1.0, "must be 0");
        let msg = err.to_string();
        assert!(msg.contains("generator"));
        assert!(msg.contains("gen_1"));
        assert!(msg.contains("committable"));
        assert!(msg.contains("must be 0"));
    }

    #[test]
    fn test_io_error_keeps_context() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = PscError::io("writing system.yml", io_err);
        assert!(err.to_string().contains("writing system.yml"));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> PscResult<()> {
            Err(PscError::IntegrityError("test".into()))
        }

        fn outer() -> PscResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }

    #[test]
    fn test_format_error_display() {
        let err = PscError::UnsupportedFormat(".parquet".into());
        assert!(err.to_string().contains(".csv or .tsv"));
    }
}
