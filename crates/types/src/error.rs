use thiserror::Error;

/// Error kinds per the error handling design: transient failures are
/// retried, permanent failures are discarded as "validly invalid", reorgs
/// divert into the revert path, and the remaining two are fatal.
#[derive(Error, Debug)]
pub enum AnchorError {
    #[error("transient I/O error: {0}")]
    TransientIo(String),

    #[error("permanently invalid: {0}")]
    PermanentInvalid(String),

    #[error("reorg detected, fork point at transaction number {fork_point}")]
    ReorgDetected { fork_point: i64 },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("logic invariant violated: {0}")]
    LogicInvariantViolation(String),
}

impl AnchorError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::TransientIo(msg.into())
    }

    pub fn permanent(msg: impl Into<String>) -> Self {
        Self::PermanentInvalid(msg.into())
    }

    /// Whether a caught error should produce a retryable `UnresolvableTransaction`
    /// (as opposed to a permanent, discard-and-move-on outcome).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo(_))
    }
}

pub type AnchorResult<T> = Result<T, AnchorError>;
