//! Capability-tagged I/O devices.
//!
//! A device is the terminal endpoint of a chain: a file, a memory buffer,
//! a socket or anything else that can produce or consume bytes. Every
//! device declares a [`Category`] describing which operations it supports,
//! so the chain engine can validate a pipeline before any I/O happens.
//!
//! This is the lowest layer of chainio. Everything else builds on top of
//! the [`Device`] trait provided here.

pub mod adapter;
pub mod category;
pub mod error;
pub mod file;
pub mod memory;
pub mod null;
pub mod tee;
pub mod traits;

pub use adapter::{BidirectionalIo, ReadSource, SeekableIo, WriteSink};
pub use category::{Category, Mode};
pub use error::{DeviceError, Result};
pub use file::{FileDevice, OpenMode};
pub use memory::{ContainerSink, SharedBuffer, SliceSource, VecDevice};
pub use null::NullDevice;
pub use tee::TeeDevice;
pub use traits::Device;
