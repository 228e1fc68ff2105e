//! Devices built from `std::io` types.
//!
//! Sockets, pipes, cursors and anything else implementing the standard
//! traits can sit at the bottom of a chain through these wrappers.
//! Interrupted calls are retried; every other error is mapped onto the
//! device error taxonomy.

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use crate::category::Category;
use crate::error::{DeviceError, Result};
use crate::traits::Device;

fn read_retrying<R: Read + ?Sized>(inner: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match inner.read(buf) {
            Ok(n) => return Ok(n),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(DeviceError::BadRead(err)),
        }
    }
}

fn write_retrying<W: Write + ?Sized>(inner: &mut W, buf: &[u8]) -> Result<usize> {
    loop {
        match inner.write(buf) {
            Ok(n) => return Ok(n),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(DeviceError::BadWrite(err)),
        }
    }
}

fn flush_retrying<W: Write + ?Sized>(inner: &mut W) -> Result<()> {
    loop {
        match inner.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(DeviceError::BadWrite(err)),
        }
    }
}

/// An input-only device over any [`Read`].
#[derive(Debug)]
pub struct ReadSource<R> {
    inner: R,
}

impl<R: Read + Send> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the device and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Send> Device for ReadSource<R> {
    fn category(&self) -> Category {
        Category::SOURCE
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        read_retrying(&mut self.inner, buf)
    }
}

/// An output-only device over any [`Write`].
#[derive(Debug)]
pub struct WriteSink<W> {
    inner: W,
}

impl<W: Write + Send> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the device and return the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> Device for WriteSink<W> {
    fn category(&self) -> Category {
        Category::SINK
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        write_retrying(&mut self.inner, buf)
    }

    fn flush(&mut self) -> Result<()> {
        flush_retrying(&mut self.inner)
    }
}

/// A device with independent read and write channels, such as a connected socket.
#[derive(Debug)]
pub struct BidirectionalIo<T> {
    inner: T,
}

impl<T: Read + Write + Send> BidirectionalIo<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + Send> Device for BidirectionalIo<T> {
    fn category(&self) -> Category {
        Category::BIDIRECTIONAL_DEVICE
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        read_retrying(&mut self.inner, buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        write_retrying(&mut self.inner, buf)
    }

    fn flush(&mut self) -> Result<()> {
        flush_retrying(&mut self.inner)
    }
}

/// A random-access device over any `Read + Write + Seek`, such as a `Cursor`.
#[derive(Debug)]
pub struct SeekableIo<T> {
    inner: T,
}

impl<T: Read + Write + Seek + Send> SeekableIo<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + Seek + Send> Device for SeekableIo<T> {
    fn category(&self) -> Category {
        Category::SEEKABLE_DEVICE
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        read_retrying(&mut self.inner, buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        write_retrying(&mut self.inner, buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.inner.seek(pos).map_err(DeviceError::BadSeek)
    }

    fn flush(&mut self) -> Result<()> {
        flush_retrying(&mut self.inner)
    }
}
