//! Per-link byte buffer.
//!
//! Layout of the backing storage:
//!
//! ```text
//! 0            pback          get            put            end
//! ├─ pushback ──┼── consumed ───┼── readable ───┼──── spare ────┤
//! ```
//!
//! `get <= put <= end` always holds. Input buffers refill the region after
//! `pback`, first copying up to `pback` already consumed bytes in front of
//! it so they can be pushed back. Output buffers use `pback == 0`: bytes in
//! `get..put` are pending delivery downstream.

use chainio_device::DeviceError;
use tracing::trace;

use crate::error::{ChainError, Result};

#[derive(Debug, Clone, Default)]
pub struct Buffer {
    data: Vec<u8>,
    pback: usize,
    get: usize,
    put: usize,
}

impl Buffer {
    /// A buffer holding `size` bytes plus a `pback` byte pushback region.
    ///
    /// A zero `size` produces a direct buffer with no storage at all.
    pub fn new(size: usize, pback: usize) -> Self {
        let pback = if size == 0 { 0 } else { pback };
        Self {
            data: vec![0; size + pback],
            pback,
            get: pback,
            put: pback,
        }
    }

    /// Usable size excluding the pushback region.
    pub fn capacity(&self) -> usize {
        self.data.len() - self.pback
    }

    /// True when the link has no buffer and talks to its component directly.
    pub fn is_direct(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes between the get and put cursors.
    pub fn available(&self) -> &[u8] {
        &self.data[self.get..self.put]
    }

    pub fn is_empty(&self) -> bool {
        self.get == self.put
    }

    /// True when no more bytes can be appended.
    pub fn is_full(&self) -> bool {
        self.put == self.data.len()
    }

    /// Copy buffered bytes into `dst`, returning how many were copied.
    pub fn read_into(&mut self, dst: &mut [u8]) -> usize {
        let n = (self.put - self.get).min(dst.len());
        dst[..n].copy_from_slice(&self.data[self.get..self.get + n]);
        self.get += n;
        n
    }

    /// Take one buffered byte.
    pub fn next_byte(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.data[self.get];
        self.get += 1;
        Some(byte)
    }

    /// Un-read `byte`, moving the get cursor back by one.
    pub fn putback(&mut self, byte: u8) -> Result<()> {
        if self.get == 0 {
            return Err(ChainError::PutbackExhausted);
        }
        self.get -= 1;
        self.data[self.get] = byte;
        Ok(())
    }

    /// Refill the get area from `produce`.
    ///
    /// Keeps up to `pback` consumed bytes in front of the new data. Returns
    /// the number of bytes produced; zero means end of stream.
    pub fn fill<F>(&mut self, produce: F) -> Result<usize>
    where
        F: FnOnce(&mut [u8]) -> Result<usize>,
    {
        let keep = self.pback.min(self.get);
        self.data
            .copy_within(self.get - keep..self.get, self.pback - keep);
        self.get = self.pback;
        self.put = self.pback;

        let n = produce(&mut self.data[self.pback..])?;
        debug_assert!(n <= self.capacity());
        self.put = self.pback + n.min(self.capacity());
        trace!(bytes = n, "filled buffer");
        Ok(n)
    }

    /// Append as much of `src` as fits, returning the number of bytes taken.
    pub fn push_slice(&mut self, src: &[u8]) -> usize {
        let n = (self.data.len() - self.put).min(src.len());
        self.data[self.put..self.put + n].copy_from_slice(&src[..n]);
        self.put += n;
        n
    }

    /// Deliver every pending byte to `consume`, retrying partial writes.
    ///
    /// A write that accepts zero bytes is a [`DeviceError::BadWrite`]. On
    /// error the undelivered bytes stay pending.
    pub fn flush<F>(&mut self, mut consume: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<usize>,
    {
        let pending = self.put - self.get;
        while self.get < self.put {
            match consume(&self.data[self.get..self.put])? {
                0 => return Err(DeviceError::write_zero().into()),
                n => self.get += n.min(self.put - self.get),
            }
        }
        if pending > 0 {
            trace!(bytes = pending, "flushed buffer");
        }
        self.clear();
        Ok(())
    }

    /// Drop any buffered bytes and rewind both cursors.
    pub fn clear(&mut self) {
        self.get = self.pback;
        self.put = self.pback;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source<'a>(data: &'a [u8], pos: &'a mut usize) -> impl FnOnce(&mut [u8]) -> Result<usize> + 'a {
        move |dst| {
            let n = (data.len() - *pos).min(dst.len());
            dst[..n].copy_from_slice(&data[*pos..*pos + n]);
            *pos += n;
            Ok(n)
        }
    }

    #[test]
    fn fill_and_read() {
        let data = b"abcdefgh";
        let mut pos = 0;
        let mut buf = Buffer::new(4, 4);

        assert_eq!(buf.fill(source(data, &mut pos)).unwrap(), 4);
        assert_eq!(buf.available(), b"abcd");

        let mut out = [0u8; 3];
        assert_eq!(buf.read_into(&mut out), 3);
        assert_eq!(&out, b"abc");
        assert_eq!(buf.next_byte(), Some(b'd'));
        assert_eq!(buf.next_byte(), None);

        assert_eq!(buf.fill(source(data, &mut pos)).unwrap(), 4);
        assert_eq!(buf.available(), b"efgh");
        assert_eq!(buf.fill(source(data, &mut pos)).unwrap(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn pushback_survives_refill() {
        let data = b"abcdefgh";
        let mut pos = 0;
        let mut buf = Buffer::new(4, 4);

        buf.fill(source(data, &mut pos)).unwrap();
        let mut out = [0u8; 4];
        buf.read_into(&mut out);
        buf.fill(source(data, &mut pos)).unwrap();

        buf.putback(b'd').unwrap();
        buf.putback(b'c').unwrap();
        assert_eq!(buf.available(), b"cdefgh");
    }

    #[test]
    fn pushback_is_bounded() {
        let mut buf = Buffer::new(8, 4);
        for byte in *b"wxyz" {
            buf.putback(byte).unwrap();
        }
        assert_eq!(buf.available(), b"zyxw");
        assert!(matches!(buf.putback(b'v'), Err(ChainError::PutbackExhausted)));
    }

    #[test]
    fn fill_error_propagates() {
        let mut buf = Buffer::new(4, 4);
        let err = buf
            .fill(|_| Err(DeviceError::bad_read().into()))
            .unwrap_err();
        assert!(matches!(err, ChainError::Device(DeviceError::BadRead(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn push_slice_until_full() {
        let mut buf = Buffer::new(4, 0);
        assert_eq!(buf.push_slice(b"abc"), 3);
        assert!(!buf.is_full());
        assert_eq!(buf.push_slice(b"def"), 1);
        assert!(buf.is_full());
        assert_eq!(buf.available(), b"abcd");
    }

    #[test]
    fn flush_retries_partial_writes() {
        let mut buf = Buffer::new(8, 0);
        buf.push_slice(b"abcdef");

        let mut sink = Vec::new();
        buf.flush(|pending| {
            let n = pending.len().min(2);
            sink.extend_from_slice(&pending[..n]);
            Ok(n)
        })
        .unwrap();

        assert_eq!(sink, b"abcdef");
        assert!(buf.is_empty());
    }

    #[test]
    fn flush_without_progress_is_bad_write() {
        let mut buf = Buffer::new(8, 0);
        buf.push_slice(b"abc");

        let err = buf.flush(|_| Ok(0)).unwrap_err();
        assert!(matches!(err, ChainError::Device(DeviceError::BadWrite(_))));
        assert_eq!(buf.available(), b"abc");
    }

    #[test]
    fn direct_buffer_has_no_storage() {
        let buf = Buffer::new(0, 4);
        assert!(buf.is_direct());
        assert_eq!(buf.capacity(), 0);
        assert!(buf.is_full());
    }
}
