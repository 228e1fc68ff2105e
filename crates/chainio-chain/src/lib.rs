//! Filter chains over capability-tagged devices.
//!
//! A [`Chain`] stacks zero or more [`Filter`]s on top of exactly one
//! device. Every link owns its own buffers, so filters can work a byte at
//! a time through [`Next`] without paying for a device call per byte.
//!
//! Capabilities are checked when a component is pushed, never during I/O:
//! - every component must support the chain's [`Mode`](chainio_device::Mode)
//! - a seekable filter needs a seekable device
//! - seeking needs every link to be seekable
//!
//! Closing is governed by [`lifecycle`]: explicit calls always close,
//! implicit events close only while auto-close is on.

pub mod buffer;
pub mod chain;
pub mod config;
pub mod error;
pub mod filter;
pub mod filters;
pub mod lifecycle;
mod link;

pub use buffer::Buffer;
pub use chain::Chain;
pub use config::{
    ChainConfig, PushOptions, DEFAULT_DEVICE_BUFFER_SIZE, DEFAULT_FILTER_BUFFER_SIZE,
    DEFAULT_PBACK_SIZE, MIN_PBACK_SIZE,
};
pub use error::{ChainError, Result};
pub use filter::{Filter, Next};
pub use filters::{Newline, NewlineStyle, Uppercase};
pub use lifecycle::{closes, LifecycleEvent};
