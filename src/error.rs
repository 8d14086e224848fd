//! The closed set of errors that can escape a public entry point.

use thiserror::Error;

/// An error produced by parsing input, dispatching a solver, or running the
/// underlying BDD engine.
///
/// Every fallible public entry point in this crate returns `Result<T,
/// SynthesisError>`. Internal invariant violations (an ill-formed Zielonka
/// tree, a DAG node closed with an incompatible child set) are bugs and
/// `panic!` instead of being represented here.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The color formula, partition file or explicit DFA table could not be
    /// parsed, or referred to a name/state that does not exist.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// An obligation-fragment-only solver path (the weak-game solver) was
    /// invoked on a specification whose outer formula uses `ForallExists` or
    /// `ExistsForall` quantifiers.
    #[error("fragment mismatch: {0}")]
    FragmentMismatch(String),

    /// The BDD allocator ran out of memory. Fatal: the caller should not
    /// retry with the same engine instance.
    #[error("BDD engine exhausted: {0}")]
    EngineExhausted(String),

    /// A caller-supplied deadline or cancellation token fired while a
    /// fixpoint was iterating.
    #[error("synthesis cancelled")]
    Cancelled,

    /// An underlying I/O error, e.g. while reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cudd::CuddError> for SynthesisError {
    fn from(error: cudd::CuddError) -> Self {
        Self::EngineExhausted(error.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SynthesisError>;
