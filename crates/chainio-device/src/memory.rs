//! In-memory devices.

use std::io::{self, SeekFrom};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::{BufMut, BytesMut};

use crate::category::Category;
use crate::error::{DeviceError, Result};
use crate::traits::{resolve_seek, Device};

/// An input device over a borrowed byte slice.
///
/// Peekable: the byte most recently read can be pushed back.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Device for SliceSource<'_> {
    fn category(&self) -> Category {
        Category::SOURCE.with(Category::PEEKABLE)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let rest = &self.data[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }

    fn putback(&mut self, byte: u8) -> Result<()> {
        match self.pos.checked_sub(1) {
            Some(prev) if self.data[prev] == byte => {
                self.pos = prev;
                Ok(())
            }
            _ => Err(DeviceError::Unsupported(
                "putback of a byte the slice did not just produce",
            )),
        }
    }
}

/// A growable, seekable device backed by a `Vec<u8>`.
///
/// Writes past the end extend the vector; writes inside it overwrite.
#[derive(Debug, Clone, Default)]
pub struct VecDevice {
    data: Vec<u8>,
    pos: usize,
    closed: bool,
}

impl VecDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing contents, positioned at the beginning.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            closed: false,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(DeviceError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Device for VecDevice {
    fn category(&self) -> Category {
        Category::SEEKABLE_DEVICE.with(Category::CLOSABLE)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        // Past the end: nothing to read, and the sought position stands.
        let Some(rest) = self.data.get(self.pos..) else {
            return Ok(0);
        };
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        let end = self.pos.checked_add(buf.len()).ok_or_else(|| {
            DeviceError::BadWrite(io::Error::new(
                io::ErrorKind::InvalidInput,
                "write past the addressable end",
            ))
        })?;
        if self.data.len() < end {
            self.data.try_reserve(end - self.data.len()).map_err(|err| {
                DeviceError::BadWrite(io::Error::new(io::ErrorKind::OutOfMemory, err))
            })?;
            self.data.resize(end, 0);
        }
        self.data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.ensure_open()?;
        let next = resolve_seek(pos, self.pos as u64, self.data.len() as u64)?;
        self.pos = usize::try_from(next).map_err(|_| DeviceError::bad_seek())?;
        Ok(next)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// A byte container shared between a [`ContainerSink`] and its owner.
///
/// The sink is usually moved into a chain; the owner keeps a clone of the
/// buffer to inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<BytesMut>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new sink appending to this buffer.
    pub fn sink(&self) -> ContainerSink {
        ContainerSink {
            buffer: self.clone(),
            open: true,
        }
    }

    /// Copy of the current contents.
    pub fn to_vec(&self) -> Vec<u8> {
        self.lock().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, BytesMut> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An output device appending everything written to a [`SharedBuffer`].
#[derive(Debug)]
pub struct ContainerSink {
    buffer: SharedBuffer,
    open: bool,
}

impl ContainerSink {
    /// A sink over a fresh buffer, returned alongside it.
    pub fn new() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::new();
        (buffer.sink(), buffer)
    }

    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Device for ContainerSink {
    fn category(&self) -> Category {
        Category::SINK.with(Category::CLOSABLE)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if !self.open {
            return Err(DeviceError::Closed);
        }
        self.buffer.lock().put_slice(buf);
        Ok(buf.len())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}
