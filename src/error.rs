//! Error kinds for the circuit/garbling/TLP core.
//!
//! The core distinguishes four failure classes (see the error-handling design):
//! malformed circuit text, bad caller input, incompatible puzzle/public-parameter
//! pairings, and fatal randomness failures. Everything else (I/O while reading a
//! Bristol or RGC file, CLI argument errors) stays in `anyhow` at the boundary.

use thiserror::Error;

/// Errors raised by the circuit, garbling, and TLP core.
#[derive(Debug, Error)]
pub enum CrgcError {
    /// The circuit text or in-memory circuit violates a structural invariant:
    /// header/body mismatch, non-topological gate order, a wire written twice,
    /// an unknown operator, or an arity mismatch.
    #[error("malformed circuit{}: {message}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    MalformedCircuit {
        /// Human-readable description of the violation.
        message: String,
        /// 1-based source line, when the fault can be localized.
        line: Option<usize>,
    },

    /// A caller-supplied value doesn't match what the circuit or algorithm expects:
    /// wrong input bit-vector length, or a secret bit outside {0,1}.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Human-readable description.
        message: String,
    },

    /// A `Puzzle` (or other derived artifact) was presented against public
    /// parameters whose dimensions it does not match.
    #[error("incompatible state: {message}")]
    IncompatibleState {
        /// Human-readable description.
        message: String,
    },

    /// The secure randomness source failed. Fatal; never retried internally.
    #[error("secure randomness unavailable: {0}")]
    RandomnessUnavailable(#[from] rand::Error),
}

impl CrgcError {
    /// Build a [`CrgcError::MalformedCircuit`] with no specific line.
    pub fn malformed(message: impl Into<String>) -> Self {
        CrgcError::MalformedCircuit {
            message: message.into(),
            line: None,
        }
    }

    /// Build a [`CrgcError::MalformedCircuit`] anchored to a source line.
    pub fn malformed_at(message: impl Into<String>, line: usize) -> Self {
        CrgcError::MalformedCircuit {
            message: message.into(),
            line: Some(line),
        }
    }

    /// Build a [`CrgcError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CrgcError::InvalidInput {
            message: message.into(),
        }
    }

    /// Build a [`CrgcError::IncompatibleState`].
    pub fn incompatible(message: impl Into<String>) -> Self {
        CrgcError::IncompatibleState {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the core modules.
pub type Result<T> = std::result::Result<T, CrgcError>;
