use std::io::{self, SeekFrom};

use chainio_chain::{Chain, ChainConfig, ChainError, Filter, PushOptions};
use chainio_device::{Device, Mode};
use tracing::debug;

use crate::error::{Result, StreamError};
use crate::state::IoState;

/// A chain presented as a stream with status flags and an exception mask.
///
/// I/O methods never fail just because the chain did: they record the
/// failure in the flags (see [`rdstate`](Stream::rdstate)) and return a
/// neutral value (`0`, `None`, `()`). Only when a newly set flag is in the
/// [exception mask](Stream::set_exceptions) does the call return
/// [`StreamError::Failure`]. Once the stream is not good, further I/O sets
/// `FAIL` and does nothing until [`clear`](Stream::clear).
///
/// ```
/// use chainio_chain::filters::Uppercase;
/// use chainio_device::{ContainerSink, Mode};
/// use chainio_stream::Stream;
///
/// let (sink, contents) = ContainerSink::new();
/// let mut out = Stream::new(Mode::Output);
/// out.push_filter(Uppercase).unwrap();
/// out.push_device(sink).unwrap();
/// out.write(b"hello").unwrap();
/// out.flush().unwrap();
///
/// assert!(out.good());
/// assert_eq!(contents.to_vec(), b"HELLO");
/// ```
#[derive(Debug)]
pub struct Stream<'a> {
    chain: Chain<'a>,
    state: IoState,
    exceptions: IoState,
    last_error: Option<ChainError>,
}

impl<'a> Stream<'a> {
    /// An empty stream; push filters and a device before doing I/O.
    pub fn new(mode: Mode) -> Self {
        Self::from_chain(Chain::new(mode))
    }

    pub fn with_config(mode: Mode, config: ChainConfig) -> Self {
        Self::from_chain(Chain::with_config(mode, config))
    }

    pub fn from_chain(chain: Chain<'a>) -> Self {
        Self {
            chain,
            state: IoState::GOOD,
            exceptions: IoState::GOOD,
            last_error: None,
        }
    }

    /// A stream over a single device, in the mode its category implies.
    pub fn from_device<D: Device + 'a>(device: D) -> Result<Self> {
        Ok(Self::from_chain(Chain::from_device(device)?))
    }

    // Status flags

    pub fn good(&self) -> bool {
        self.state.is_good()
    }

    pub fn eof(&self) -> bool {
        self.state.contains(IoState::EOF)
    }

    /// True if `FAIL` or `BAD` is set.
    pub fn fail(&self) -> bool {
        self.state.intersects(IoState::FAIL | IoState::BAD)
    }

    pub fn bad(&self) -> bool {
        self.state.contains(IoState::BAD)
    }

    pub fn rdstate(&self) -> IoState {
        self.state
    }

    /// Add `flags` to the current state, honoring the exception mask.
    pub fn setstate(&mut self, flags: IoState) -> Result<()> {
        self.raise(flags, None)
    }

    /// Reset the flags to good.
    pub fn clear(&mut self) {
        self.state = IoState::GOOD;
    }

    pub fn exceptions(&self) -> IoState {
        self.exceptions
    }

    /// Set the exception mask.
    ///
    /// Fails right away if the mask covers a flag that is already set; the
    /// failure carries the last recorded error.
    pub fn set_exceptions(&mut self, mask: IoState) -> Result<()> {
        self.exceptions = mask;
        if self.state.intersects(mask) {
            return Err(StreamError::Failure {
                state: self.state,
                source: self.last_error.take(),
            });
        }
        Ok(())
    }

    /// The most recent chain error recorded in the flags instead of being returned.
    pub fn last_error(&self) -> Option<&ChainError> {
        self.last_error.as_ref()
    }

    pub fn take_last_error(&mut self) -> Option<ChainError> {
        self.last_error.take()
    }

    // Input

    /// Read up to `buf.len()` bytes. Zero bytes for a non-empty buffer sets `EOF`.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.sentry()? {
            return Ok(0);
        }
        match self.chain.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.raise(IoState::EOF, None)?;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(err) => {
                self.record(err)?;
                Ok(0)
            }
        }
    }

    /// Fill `buf` completely. Stopping short sets `EOF` and `FAIL`.
    ///
    /// Returns the number of bytes actually read.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.sentry()? {
            return Ok(0);
        }
        let mut filled = 0;
        while filled < buf.len() {
            match self.chain.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.raise(IoState::EOF | IoState::FAIL, None)?;
                    break;
                }
                Ok(n) => filled += n,
                Err(err) => {
                    self.record(err)?;
                    break;
                }
            }
        }
        Ok(filled)
    }

    /// Extract one byte. At end of input sets `EOF` and `FAIL` and returns `None`.
    pub fn get(&mut self) -> Result<Option<u8>> {
        if !self.sentry()? {
            return Ok(None);
        }
        match self.chain.get() {
            Ok(Some(byte)) => Ok(Some(byte)),
            Ok(None) => {
                self.raise(IoState::EOF | IoState::FAIL, None)?;
                Ok(None)
            }
            Err(err) => {
                self.record(err)?;
                Ok(None)
            }
        }
    }

    /// Look at the next byte. At end of input sets `EOF` and returns `None`.
    pub fn peek(&mut self) -> Result<Option<u8>> {
        if !self.sentry()? {
            return Ok(None);
        }
        match self.chain.peek() {
            Ok(Some(byte)) => Ok(Some(byte)),
            Ok(None) => {
                self.raise(IoState::EOF, None)?;
                Ok(None)
            }
            Err(err) => {
                self.record(err)?;
                Ok(None)
            }
        }
    }

    /// Return a byte to the input. Clears `EOF` first.
    pub fn putback(&mut self, byte: u8) -> Result<()> {
        self.state = self.state.without(IoState::EOF);
        if !self.sentry()? {
            return Ok(());
        }
        match self.chain.putback(byte) {
            Ok(()) => Ok(()),
            Err(err) => self.record(err),
        }
    }

    // Output

    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        if !self.sentry()? {
            return Ok(());
        }
        match self.chain.write(buf) {
            Ok(()) => Ok(()),
            Err(err) => self.record(err),
        }
    }

    pub fn put(&mut self, byte: u8) -> Result<()> {
        self.write(&[byte])
    }

    pub fn flush(&mut self) -> Result<()> {
        if !self.sentry()? {
            return Ok(());
        }
        match self.chain.flush() {
            Ok(()) => Ok(()),
            Err(err) => self.record(err),
        }
    }

    // Positioning

    /// Reposition the stream. Clears `EOF` first.
    ///
    /// Returns `None` if the seek failed and the failure was only recorded.
    /// Seeking a chain that cannot seek sets `FAIL` and always returns
    /// [`StreamError::Chain`] with [`ChainError::NotSeekable`].
    pub fn seek(&mut self, pos: SeekFrom) -> Result<Option<u64>> {
        self.state = self.state.without(IoState::EOF);
        if !self.sentry()? {
            return Ok(None);
        }
        match self.chain.seek(pos) {
            Ok(offset) => Ok(Some(offset)),
            Err(ChainError::NotSeekable) => {
                self.state |= IoState::FAIL;
                Err(ChainError::NotSeekable.into())
            }
            Err(err) => {
                self.record(err)?;
                Ok(None)
            }
        }
    }

    // Lifecycle and composition

    /// Close every component. A close failure is recorded in the flags.
    pub fn close(&mut self) -> Result<()> {
        match self.chain.close() {
            Ok(()) => Ok(()),
            Err(err) => self.record(err),
        }
    }

    pub fn push_filter<F: Filter + 'a>(&mut self, filter: F) -> Result<()> {
        Ok(self.chain.push_filter(filter)?)
    }

    pub fn push_filter_with<F: Filter + 'a>(&mut self, filter: F, options: PushOptions) -> Result<()> {
        Ok(self.chain.push_filter_with(filter, options)?)
    }

    pub fn push_device<D: Device + 'a>(&mut self, device: D) -> Result<()> {
        Ok(self.chain.push_device(device)?)
    }

    pub fn push_device_with<D: Device + 'a>(&mut self, device: D, options: PushOptions) -> Result<()> {
        Ok(self.chain.push_device_with(device, options)?)
    }

    pub fn pop(&mut self) -> Result<()> {
        Ok(self.chain.pop()?)
    }

    /// Close everything and empty the chain. Flags are left as they are.
    pub fn reset(&mut self) -> Result<()> {
        Ok(self.chain.reset()?)
    }

    pub fn auto_close(&self) -> bool {
        self.chain.auto_close()
    }

    pub fn set_auto_close(&mut self, auto_close: bool) {
        self.chain.set_auto_close(auto_close);
    }

    pub fn is_complete(&self) -> bool {
        self.chain.is_complete()
    }

    pub fn is_open(&self) -> bool {
        self.chain.is_open()
    }

    pub fn mode(&self) -> Mode {
        self.chain.mode()
    }

    pub fn chain(&self) -> &Chain<'a> {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut Chain<'a> {
        &mut self.chain
    }

    pub fn into_chain(self) -> Chain<'a> {
        self.chain
    }

    /// Gate for every I/O operation: a stream that is not good only gains `FAIL`.
    fn sentry(&mut self) -> Result<bool> {
        if self.state.is_good() {
            return Ok(true);
        }
        self.raise(IoState::FAIL, None)?;
        Ok(false)
    }

    fn record(&mut self, err: ChainError) -> Result<()> {
        let flag = if err.is_io_failure() {
            IoState::BAD
        } else {
            IoState::FAIL
        };
        debug!(error = %err, state = %(self.state | flag), "stream operation failed");
        self.raise(flag, Some(err))
    }

    fn raise(&mut self, flags: IoState, cause: Option<ChainError>) -> Result<()> {
        self.state |= flags;
        if self.state.intersects(self.exceptions) {
            return Err(StreamError::Failure {
                state: self.state,
                source: cause,
            });
        }
        if cause.is_some() {
            self.last_error = cause;
        }
        Ok(())
    }

    /// The recorded failure as an `io::Error`, for the std trait impls.
    fn failure(&mut self) -> io::Error {
        StreamError::Failure {
            state: self.state,
            source: self.last_error.take(),
        }
        .into()
    }
}

impl io::Read for Stream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.state == IoState::EOF {
            return Ok(0);
        }
        let n = Stream::read(self, buf)?;
        if self.fail() {
            return Err(self.failure());
        }
        Ok(n)
    }
}

impl io::Write for Stream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Stream::write(self, buf)?;
        if self.fail() {
            return Err(self.failure());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Stream::flush(self)?;
        if self.fail() {
            return Err(self.failure());
        }
        Ok(())
    }
}

impl io::Seek for Stream<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match Stream::seek(self, pos)? {
            Some(offset) => Ok(offset),
            None => Err(self.failure()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read as _, Seek as _, Write as _};

    use chainio_chain::filters::Uppercase;
    use chainio_device::{Category, ContainerSink, DeviceError, SliceSource, VecDevice};

    use super::*;

    struct Failing;

    impl Device for Failing {
        fn category(&self) -> Category {
            Category::SEEKABLE_DEVICE
        }

        fn read(&mut self, _buf: &mut [u8]) -> chainio_device::Result<usize> {
            Err(DeviceError::bad_read())
        }

        fn write(&mut self, _buf: &[u8]) -> chainio_device::Result<usize> {
            Err(DeviceError::bad_write())
        }

        fn seek(&mut self, _pos: SeekFrom) -> chainio_device::Result<u64> {
            Err(DeviceError::bad_seek())
        }
    }

    #[test]
    fn eof_then_fail() {
        let mut stream = Stream::from_device(SliceSource::new(b"ab")).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert!(stream.good());

        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert!(stream.eof());
        assert!(!stream.fail());

        assert_eq!(stream.get().unwrap(), None);
        assert_eq!(stream.rdstate(), IoState::EOF | IoState::FAIL);

        stream.clear();
        assert!(stream.good());
    }

    #[test]
    fn read_exact_short() {
        let mut stream = Stream::from_device(SliceSource::new(b"abc")).unwrap();
        let mut buf = [0u8; 5];
        assert_eq!(stream.read_exact(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert!(stream.eof() && stream.fail() && !stream.bad());
    }

    #[test]
    fn device_failure_sets_bad() {
        let mut stream = Stream::new(Mode::Seekable);
        stream.push_device(Failing).unwrap();
        assert_eq!(stream.get().unwrap(), None);
        assert!(stream.bad() && stream.fail() && !stream.good());
        assert!(matches!(
            stream.last_error(),
            Some(ChainError::Device(DeviceError::BadRead(_)))
        ));

        // Not good: further I/O is skipped.
        stream.write(b"x").unwrap();
        assert!(matches!(
            stream.last_error(),
            Some(ChainError::Device(DeviceError::BadRead(_)))
        ));
    }

    #[test]
    fn exception_mask_returns_failure() {
        let mut stream = Stream::from_device(Failing).unwrap();
        stream.set_exceptions(IoState::BAD).unwrap();

        let err = stream.write(b"x").and_then(|()| stream.flush()).unwrap_err();
        match err {
            StreamError::Failure { state, source } => {
                assert!(state.contains(IoState::BAD));
                assert!(matches!(
                    source,
                    Some(ChainError::Device(DeviceError::BadWrite(_)))
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(stream.bad());
    }

    #[test]
    fn late_mask_fails_immediately() {
        let mut stream = Stream::from_device(Failing).unwrap();
        assert_eq!(stream.seek(SeekFrom::Start(1)).unwrap(), None);
        assert!(stream.bad());

        let err = stream.set_exceptions(IoState::BAD).unwrap_err();
        assert!(matches!(
            err.chain_error(),
            Some(ChainError::Device(DeviceError::BadSeek(_)))
        ));
        assert_eq!(stream.exceptions(), IoState::BAD);
    }

    #[test]
    fn setstate_honors_mask() {
        let mut stream = Stream::new(Mode::Output);
        stream.set_exceptions(IoState::EOF).unwrap();
        stream.setstate(IoState::FAIL).unwrap();
        assert!(stream.setstate(IoState::EOF).is_err());
        assert_eq!(stream.rdstate(), IoState::EOF | IoState::FAIL);
    }

    #[test]
    fn unseekable_seek_always_errors() {
        let mut stream = Stream::from_device(SliceSource::new(b"abc")).unwrap();
        let err = stream.seek(SeekFrom::Start(0)).unwrap_err();
        assert!(matches!(err, StreamError::Chain(ChainError::NotSeekable)));
        assert!(stream.fail() && !stream.bad());
    }

    #[test]
    fn seek_clears_eof() {
        let mut dev = VecDevice::from_vec(b"xyz".to_vec());
        let mut stream = Stream::from_device(&mut dev).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert!(stream.eof());

        assert_eq!(stream.seek(SeekFrom::Start(1)).unwrap(), Some(1));
        assert!(stream.good());
        assert_eq!(stream.get().unwrap(), Some(b'y'));
    }

    #[test]
    fn incomplete_stream_records_fail() {
        let mut stream = Stream::new(Mode::Output);
        stream.push_filter(Uppercase).unwrap();
        stream.write(b"x").unwrap();
        assert!(stream.fail() && !stream.bad());
        assert!(matches!(stream.last_error(), Some(ChainError::Incomplete)));
    }

    #[test]
    fn std_traits() {
        let (sink, contents) = ContainerSink::new();
        let mut out = Stream::new(Mode::Output);
        out.push_filter(Uppercase).unwrap();
        out.push_device(sink).unwrap();
        write!(out, "{}-{}", "abc", 42).unwrap();
        out.flush().unwrap();
        assert_eq!(contents.to_vec(), b"ABC-42");

        let mut input = Stream::from_device(SliceSource::new(b"read all of it")).unwrap();
        let mut text = String::new();
        input.read_to_string(&mut text).unwrap();
        assert_eq!(text, "read all of it");

        let mut failing = Stream::from_device(Failing).unwrap();
        let err = io::Read::read(&mut failing, &mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(failing.rewind().is_err());
    }
}
