//! Error types for the engine.
//!
//! Fatal analysis and stepping failures idle the engine: the factored matrix
//! is discarded and `Circuit::update` keeps returning the recorded error
//! until an edit retriggers analysis.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A zero-resistance loop through wires and voltage sources.
    #[error("Voltage source/wire loop with no resistance!")]
    VoltageSourceLoop,

    /// A current source with no closed path to carry its current.
    #[error("No path for current source!")]
    NoCurrentSourcePath,

    /// A capacitor in a loop of wires, capacitors and voltage sources with
    /// no resistance to limit the charging current.
    #[error("Capacitor loop with no resistance!")]
    CapacitorLoop,

    /// LU factorization failed.
    #[error("Singular matrix!")]
    SingularMatrix,

    /// An element stamped a NaN or infinite value.
    #[error("NaN/Infinite matrix!")]
    NonFiniteMatrix,

    /// Newton iteration exhausted its sub-iteration budget.
    #[error("Convergence failed!")]
    ConvergenceFailed,

    /// Simplification found a row with no usable entries.
    #[error("Matrix error")]
    MatrixError,
}

pub type Result<T> = std::result::Result<T, Error>;
