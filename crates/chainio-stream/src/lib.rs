//! Buffered stream front-end for chainio.
//!
//! A [`Stream`] drives a [`Chain`](chainio_chain::Chain) and tracks the
//! outcome of every operation in [`IoState`] flags. Failures are recorded
//! rather than returned unless their flag is in the stream's exception
//! mask, in which case the same call returns [`StreamError::Failure`].
//!
//! `Stream` also implements `std::io::{Read, Write, Seek}`; through those
//! traits every failure is an `io::Error`.

pub mod error;
pub mod state;
pub mod stream;

pub use error::{Result, StreamError};
pub use state::IoState;
pub use stream::Stream;
