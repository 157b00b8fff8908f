use thiserror::Error;

/// Rejections raised by the session ledger.
///
/// All variants are local and synchronous; retrying the same call against the
/// same state fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The caller broke a ledger precondition, e.g. opening a second session.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// The operation is not valid for the current session or break state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The referenced session or break does not exist under the expected parent.
    #[error("not found: {0}")]
    NotFound(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
