//! Unified error type for transformation runs.
//!
//! Domain errors from the loader and the converter are bridged into
//! [`LiftError`] at the crate boundary. Nothing is recovered locally: a
//! failure in one pass aborts the pipeline before the next.

use thiserror::Error;

/// Unified error type for a transformation run.
#[derive(Debug, Error)]
pub enum LiftError {
    /// Upstream load failure: I/O, parse error, or type error in the
    /// subject code. Propagated unchanged; the run is aborted.
    #[error("load: {message}")]
    Load { message: String },

    /// A package-level variable name without a definition symbol. This is
    /// a loader inconsistency, never expected on well-formed input.
    #[error("no definition symbol for package-level variable `{name}`")]
    MissingSymbol { name: String },

    /// The type-to-syntax converter met a type outside the supported set
    /// (unsafe pointer, tuple, untyped nil).
    #[error("unsupported type in generated state: {describe}")]
    UnsupportedType { describe: String },

    /// The run observed its cancellation token.
    #[error("canceled")]
    Canceled,

    /// I/O failure during emission.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LiftError {
    /// Create a load failure from any displayable cause.
    pub fn load(message: impl std::fmt::Display) -> Self {
        LiftError::Load {
            message: message.to_string(),
        }
    }
}

/// Result type for transformation runs.
pub type LiftResult<T> = Result<T, LiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_display() {
        let err = LiftError::load("parse: 3:1: expected declaration");
        assert_eq!(err.to_string(), "load: parse: 3:1: expected declaration");
    }

    #[test]
    fn missing_symbol_carries_the_name() {
        let err = LiftError::MissingSymbol {
            name: "B".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no definition symbol for package-level variable `B`"
        );
    }
}
