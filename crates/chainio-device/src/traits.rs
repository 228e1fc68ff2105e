use std::io::SeekFrom;

use crate::category::Category;
use crate::error::{DeviceError, Result};

/// A capability-tagged I/O endpoint.
///
/// Only the operations named by [`category`](Device::category) are ever
/// invoked by the chain; the defaults for everything else report
/// [`DeviceError::Unsupported`].
pub trait Device: Send {
    /// Which operations this device supports.
    fn category(&self) -> Category;

    /// Read up to `buf.len()` bytes. `Ok(0)` for a non-empty buffer means end of input.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let _ = buf;
        Err(DeviceError::Unsupported("read"))
    }

    /// Write some prefix of `buf`, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let _ = buf;
        Err(DeviceError::Unsupported("write"))
    }

    /// Reposition the device, returning the new absolute offset.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let _ = pos;
        Err(DeviceError::Unsupported("seek"))
    }

    /// Push any device-internal buffering to the backing store.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the underlying resource.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Return the byte most recently read to the device (peekable devices only).
    fn putback(&mut self, byte: u8) -> Result<()> {
        let _ = byte;
        Err(DeviceError::Unsupported("putback"))
    }

    /// Preferred buffer size for optimally buffered devices.
    fn optimal_buffer_size(&self) -> Option<usize> {
        None
    }
}

impl<D: Device + ?Sized> Device for &mut D {
    fn category(&self) -> Category {
        (**self).category()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        (**self).seek(pos)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn putback(&mut self, byte: u8) -> Result<()> {
        (**self).putback(byte)
    }

    fn optimal_buffer_size(&self) -> Option<usize> {
        (**self).optimal_buffer_size()
    }
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn category(&self) -> Category {
        (**self).category()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        (**self).seek(pos)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn putback(&mut self, byte: u8) -> Result<()> {
        (**self).putback(byte)
    }

    fn optimal_buffer_size(&self) -> Option<usize> {
        (**self).optimal_buffer_size()
    }
}

/// Resolve a [`SeekFrom`] against the current position and length of an
/// in-memory device, rejecting positions before the start.
pub(crate) fn resolve_seek(pos: SeekFrom, current: u64, len: u64) -> Result<u64> {
    let (base, offset) = match pos {
        SeekFrom::Start(n) => return Ok(n),
        SeekFrom::Current(off) => (current, off),
        SeekFrom::End(off) => (len, off),
    };
    base.checked_add_signed(offset).ok_or_else(|| {
        DeviceError::BadSeek(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "seek to a negative or overflowing position",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly;

    impl Device for ReadOnly {
        fn category(&self) -> Category {
            Category::SOURCE
        }

        fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn defaults_report_unsupported() {
        let mut dev = ReadOnly;
        assert!(matches!(
            dev.write(b"x"),
            Err(DeviceError::Unsupported("write"))
        ));
        assert!(matches!(
            dev.seek(SeekFrom::Start(0)),
            Err(DeviceError::Unsupported("seek"))
        ));
        assert!(matches!(
            dev.putback(b'x'),
            Err(DeviceError::Unsupported("putback"))
        ));
        assert!(dev.flush().is_ok());
        assert!(dev.close().is_ok());
        assert_eq!(dev.optimal_buffer_size(), None);
    }

    #[test]
    fn references_and_boxes_forward() {
        let mut dev = ReadOnly;
        let by_ref: &mut ReadOnly = &mut dev;
        assert_eq!(Device::category(&by_ref), Category::SOURCE);

        let mut boxed: Box<dyn Device> = Box::new(ReadOnly);
        let mut buf = [0u8; 4];
        assert_eq!(boxed.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn resolve_seek_bounds() {
        assert_eq!(resolve_seek(SeekFrom::Start(7), 3, 10).unwrap(), 7);
        assert_eq!(resolve_seek(SeekFrom::Current(-2), 3, 10).unwrap(), 1);
        assert_eq!(resolve_seek(SeekFrom::End(-4), 3, 10).unwrap(), 6);
        assert!(matches!(
            resolve_seek(SeekFrom::Current(-4), 3, 10),
            Err(DeviceError::BadSeek(_))
        ));
    }
}
