use chainio_device::{Category, DeviceError, Mode};

/// Errors that can occur while composing or driving a chain.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// A device or filter reported an I/O failure.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Seek was requested but some link in the chain cannot seek.
    #[error("chain is not seekable")]
    NotSeekable,

    /// A component cannot take part in the chain as requested.
    #[error("invalid capability for {component} ({category}): {reason}")]
    InvalidCapability {
        component: &'static str,
        category: Category,
        reason: String,
    },

    /// The requested operation is not available in the chain's mode.
    #[error("operation {op} not available on a {mode} chain")]
    WrongMode { op: &'static str, mode: Mode },

    /// The chain has no device yet.
    #[error("chain incomplete (no device)")]
    Incomplete,

    /// The chain was closed.
    #[error("chain closed")]
    Closed,

    /// Nothing to pop.
    #[error("chain is empty")]
    Empty,

    /// No room left to push a byte back.
    #[error("pushback buffer exhausted")]
    PutbackExhausted,
}

impl ChainError {
    /// True for failures of the underlying I/O rather than misuse of the chain.
    pub fn is_io_failure(&self) -> bool {
        matches!(self, Self::Device(err) if err.is_io_failure())
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
