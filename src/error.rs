//! The error taxonomy of the encoder.
//!
//! External-solver UNSAT and interruption are *statuses*, not errors; they
//! are reported through [`crate::optimisation::SolveStatus`]. The variants
//! here cover configuration and input rejection, child-process failures and
//! violated internal invariants.

use thiserror::Error;

/// Errors surfaced by the encoder.
#[derive(Debug, Error)]
pub enum LeximaxError {
    /// A setter or `solve()` precondition received a value outside its
    /// domain. The encoder state is unchanged.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `set_problem` received malformed clauses (for instance an empty
    /// clause). The call is rejected and any previous problem is reset.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external solver child process could not be launched. The partial
    /// encoding is retained.
    #[error("failed to launch external solver `{command}`: {source}")]
    SolverSpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The child exited abnormally or produced unparseable output.
    #[error("external solver failed: {0}")]
    SolverError(String),

    /// An assertion about the encoding failed. Fatal; indicates a bug.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    /// I/O failed while preparing, supervising or reading a solver call.
    #[error("i/o failure during a solver call: {0}")]
    Io(#[from] std::io::Error),
}
