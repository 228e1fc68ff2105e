use std::io::SeekFrom;

use chainio_device::{Category, DeviceError, Mode};

use crate::error::Result;
use crate::link::{self, Link};

/// A capability-tagged transform between the stream and a device.
///
/// Filters never see the device directly. Every call receives a [`Next`]
/// handle to the (buffered) link below, which may itself be another filter.
/// Only the operations the filter's [`category`](Filter::category) names
/// are invoked; the defaults report [`DeviceError::Unsupported`].
pub trait Filter: Send {
    fn category(&self) -> Category;

    /// Fill `buf` with filtered bytes read from `next`. Zero means end of stream.
    fn read(&mut self, next: &mut Next<'_, '_>, buf: &mut [u8]) -> Result<usize> {
        let _ = (next, buf);
        Err(DeviceError::Unsupported("read").into())
    }

    /// Filter some prefix of `buf` into `next`, returning how many bytes were consumed.
    fn write(&mut self, next: &mut Next<'_, '_>, buf: &[u8]) -> Result<usize> {
        let _ = (next, buf);
        Err(DeviceError::Unsupported("write").into())
    }

    fn seek(&mut self, next: &mut Next<'_, '_>, pos: SeekFrom) -> Result<u64> {
        let _ = (next, pos);
        Err(DeviceError::Unsupported("seek").into())
    }

    /// Called once the chain below the filter is complete.
    fn open(&mut self, next: &mut Next<'_, '_>) -> Result<()> {
        let _ = next;
        Ok(())
    }

    /// Called when the filter is closed; may write trailing output to `next`.
    fn close(&mut self, next: &mut Next<'_, '_>) -> Result<()> {
        let _ = next;
        Ok(())
    }
}

impl<F: Filter + ?Sized> Filter for &mut F {
    fn category(&self) -> Category {
        (**self).category()
    }

    fn read(&mut self, next: &mut Next<'_, '_>, buf: &mut [u8]) -> Result<usize> {
        (**self).read(next, buf)
    }

    fn write(&mut self, next: &mut Next<'_, '_>, buf: &[u8]) -> Result<usize> {
        (**self).write(next, buf)
    }

    fn seek(&mut self, next: &mut Next<'_, '_>, pos: SeekFrom) -> Result<u64> {
        (**self).seek(next, pos)
    }

    fn open(&mut self, next: &mut Next<'_, '_>) -> Result<()> {
        (**self).open(next)
    }

    fn close(&mut self, next: &mut Next<'_, '_>) -> Result<()> {
        (**self).close(next)
    }
}

impl<F: Filter + ?Sized> Filter for Box<F> {
    fn category(&self) -> Category {
        (**self).category()
    }

    fn read(&mut self, next: &mut Next<'_, '_>, buf: &mut [u8]) -> Result<usize> {
        (**self).read(next, buf)
    }

    fn write(&mut self, next: &mut Next<'_, '_>, buf: &[u8]) -> Result<usize> {
        (**self).write(next, buf)
    }

    fn seek(&mut self, next: &mut Next<'_, '_>, pos: SeekFrom) -> Result<u64> {
        (**self).seek(next, pos)
    }

    fn open(&mut self, next: &mut Next<'_, '_>) -> Result<()> {
        (**self).open(next)
    }

    fn close(&mut self, next: &mut Next<'_, '_>) -> Result<()> {
        (**self).close(next)
    }
}

/// Handle to the part of the chain below a filter.
///
/// All operations go through the next link's buffer, so single-byte
/// `get`/`put` calls are cheap.
pub struct Next<'n, 'a> {
    links: &'n mut [Link<'a>],
    mode: Mode,
}

impl<'n, 'a> Next<'n, 'a> {
    pub(crate) fn new(links: &'n mut [Link<'a>], mode: Mode) -> Self {
        Self { links, mode }
    }

    /// Mode of the chain this filter belongs to.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Effective capability of everything below the filter.
    pub fn category(&self) -> Category {
        link::effective_category(self.links)
    }

    /// Read up to `buf.len()` bytes. Zero means end of stream.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        link::read(self.links, self.mode, buf)
    }

    /// Write all of `buf`, returning its length.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        link::write(self.links, self.mode, buf)?;
        Ok(buf.len())
    }

    /// Read one byte, `None` at end of stream.
    pub fn get(&mut self) -> Result<Option<u8>> {
        link::get(self.links, self.mode)
    }

    pub fn put(&mut self, byte: u8) -> Result<()> {
        link::write(self.links, self.mode, &[byte])
    }

    /// Un-read a byte obtained from [`get`](Self::get) or [`read`](Self::read).
    pub fn putback(&mut self, byte: u8) -> Result<()> {
        link::putback(self.links, byte)
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        link::seek(self.links, self.mode, pos)
    }

    /// Push buffered output all the way down to the device.
    pub fn flush(&mut self) -> Result<()> {
        link::flush(self.links, self.mode)
    }
}
