//! Composable filter chains and buffered streams over pluggable I/O devices.
//!
//! Data sources and sinks (files, memory, sockets, anything implementing
//! `std::io`) become capability-tagged devices. Filters stack on top of a
//! device to form a chain, and a stream presents the chain with status
//! flags and an opt-in exception mask.
//!
//! # Crate Structure
//!
//! - [`device`]: capability descriptors, the `Device` trait and concrete devices
//! - [`chain`]: buffering, the `Filter` trait, chain composition and lifecycle
//! - [`stream`]: the stream front-end with status flags and `std::io` impls
//! - [`logging`]: `tracing` subscriber setup (behind the default `logging` feature)

/// Re-export device types.
pub mod device {
    pub use chainio_device::*;
}

/// Re-export chain types.
pub mod chain {
    pub use chainio_chain::*;
}

/// Re-export stream types.
pub mod stream {
    pub use chainio_stream::*;
}

#[cfg(feature = "logging")]
pub mod logging;
