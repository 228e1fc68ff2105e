use std::io;

use chainio_chain::ChainError;
use chainio_device::DeviceError;

use crate::state::IoState;

/// Errors surfaced by a [`Stream`](crate::Stream).
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A status flag in the exception mask was set.
    ///
    /// The stream's flags already reflect `state` when this is returned.
    #[error("stream failure ({state})")]
    Failure {
        state: IoState,
        #[source]
        source: Option<ChainError>,
    },

    /// Reported directly, without going through the status flags.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
}

impl StreamError {
    /// Flags at the time of the failure, if this is a flag failure.
    pub fn state(&self) -> Option<IoState> {
        match self {
            StreamError::Failure { state, .. } => Some(*state),
            StreamError::Chain(_) => None,
        }
    }

    /// The chain error behind this failure, if any.
    pub fn chain_error(&self) -> Option<&ChainError> {
        match self {
            StreamError::Failure { source, .. } => source.as_ref(),
            StreamError::Chain(err) => Some(err),
        }
    }
}

pub(crate) fn io_kind(err: &ChainError) -> io::ErrorKind {
    match err {
        ChainError::Device(
            DeviceError::BadRead(cause)
            | DeviceError::BadWrite(cause)
            | DeviceError::BadSeek(cause)
            | DeviceError::BadClose(cause)
            | DeviceError::Io(cause),
        ) => cause.kind(),
        ChainError::Device(DeviceError::Unsupported(_))
        | ChainError::NotSeekable
        | ChainError::WrongMode { .. }
        | ChainError::InvalidCapability { .. } => io::ErrorKind::Unsupported,
        ChainError::Device(DeviceError::Closed) | ChainError::Closed | ChainError::Incomplete => {
            io::ErrorKind::NotConnected
        }
        ChainError::Empty | ChainError::PutbackExhausted => io::ErrorKind::Other,
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match err.chain_error() {
            Some(cause) => io_kind(cause),
            None if err.state().is_some_and(|s| s.contains(IoState::EOF)) => {
                io::ErrorKind::UnexpectedEof
            }
            None => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_keeps_device_kind() {
        let err = StreamError::Failure {
            state: IoState::BAD,
            source: Some(DeviceError::BadRead(io::Error::from(io::ErrorKind::BrokenPipe)).into()),
        };
        let io_err = io::Error::from(err);
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn io_error_for_contract_violations() {
        let err = StreamError::Chain(ChainError::NotSeekable);
        assert_eq!(io::Error::from(err).kind(), io::ErrorKind::Unsupported);

        let err = StreamError::Failure {
            state: IoState::EOF | IoState::FAIL,
            source: None,
        };
        assert_eq!(io::Error::from(err).kind(), io::ErrorKind::UnexpectedEof);
    }
}
