use std::io;

/// Errors that can occur in device operations.
///
/// End of input is not an error: devices report it by returning `Ok(0)`
/// from a read into a non-empty buffer.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Reading from the device failed.
    #[error("bad read: {0}")]
    BadRead(#[source] io::Error),

    /// Writing to the device failed or made no progress.
    #[error("bad write: {0}")]
    BadWrite(#[source] io::Error),

    /// Repositioning the device failed.
    #[error("bad seek: {0}")]
    BadSeek(#[source] io::Error),

    /// Closing the device failed.
    #[error("bad close: {0}")]
    BadClose(#[source] io::Error),

    /// A generic I/O error that does not map onto a specific operation.
    #[error("device I/O error: {0}")]
    Io(#[from] io::Error),

    /// The device does not implement the requested operation.
    #[error("operation not supported by device: {0}")]
    Unsupported(&'static str),

    /// The device has already been closed.
    #[error("device closed")]
    Closed,
}

impl DeviceError {
    /// A read failure without further detail.
    pub fn bad_read() -> Self {
        Self::BadRead(io::Error::other("bad read"))
    }

    /// A write failure without further detail.
    pub fn bad_write() -> Self {
        Self::BadWrite(io::Error::other("bad write"))
    }

    /// A seek failure without further detail.
    pub fn bad_seek() -> Self {
        Self::BadSeek(io::Error::other("bad seek"))
    }

    /// A close failure without further detail.
    pub fn bad_close() -> Self {
        Self::BadClose(io::Error::other("bad close"))
    }

    /// A write that accepted zero bytes.
    pub fn write_zero() -> Self {
        Self::BadWrite(io::Error::new(
            io::ErrorKind::WriteZero,
            "write made no progress",
        ))
    }

    /// True for failures of the underlying I/O, as opposed to misuse of the
    /// device (`Unsupported`, `Closed`).
    pub fn is_io_failure(&self) -> bool {
        !matches!(self, Self::Unsupported(_) | Self::Closed)
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
