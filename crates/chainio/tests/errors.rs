//! Device failures as seen through stream status flags and exception masks.

use std::io::{self, SeekFrom, Write as _};

use chainio::chain::{ChainError, PushOptions};
use chainio::device::{Category, Device, DeviceError, Mode, ReadSource, WriteSink};
use chainio::stream::{IoState, Stream, StreamError};

/// A seekable device whose every operation fails.
struct ErrorDevice;

impl Device for ErrorDevice {
    fn category(&self) -> Category {
        Category::SEEKABLE_DEVICE
    }

    fn read(&mut self, _buf: &mut [u8]) -> chainio::device::Result<usize> {
        Err(DeviceError::bad_read())
    }

    fn write(&mut self, _buf: &[u8]) -> chainio::device::Result<usize> {
        Err(DeviceError::bad_write())
    }

    fn seek(&mut self, _pos: SeekFrom) -> chainio::device::Result<u64> {
        Err(DeviceError::bad_seek())
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Read,
    Get,
    Write,
    Put,
    Seek,
}

const OPS: [Op; 5] = [Op::Read, Op::Get, Op::Write, Op::Put, Op::Seek];

/// Run `op` so that the device is reached; output is flushed.
fn run(stream: &mut Stream<'_>, op: Op) -> chainio::stream::Result<()> {
    match op {
        Op::Read => stream.read(&mut [0u8; 8]).map(drop),
        Op::Get => stream.get().map(drop),
        Op::Write => {
            stream.write(b"data")?;
            stream.flush()
        }
        Op::Put => {
            stream.put(b'x')?;
            stream.flush()
        }
        Op::Seek => stream.seek(SeekFrom::Start(3)).map(drop),
    }
}

fn unbuffered() -> Stream<'static> {
    let mut stream = Stream::new(Mode::Seekable);
    stream
        .push_device_with(ErrorDevice, PushOptions::direct())
        .unwrap();
    stream
}

fn buffered() -> Stream<'static> {
    Stream::from_device(ErrorDevice).unwrap()
}

#[test]
fn failures_set_bad_without_mask() {
    for make in [unbuffered, buffered] {
        for op in OPS {
            let mut stream = make();
            run(&mut stream, op).unwrap_or_else(|err| panic!("{op:?}: {err}"));
            assert!(!stream.good(), "{op:?}");
            assert!(stream.bad(), "{op:?}");
            assert!(stream.fail(), "{op:?}");
            assert!(!stream.eof(), "{op:?}");
            assert!(stream.last_error().is_some_and(ChainError::is_io_failure));
        }
    }
}

#[test]
fn failures_surface_with_mask() {
    for make in [unbuffered, buffered] {
        for op in OPS {
            let mut stream = make();
            stream.set_exceptions(IoState::BAD).unwrap();
            let err = run(&mut stream, op).expect_err("masked failure must be returned");
            assert_eq!(err.state(), Some(IoState::BAD), "{op:?}");
            assert!(err.chain_error().is_some_and(ChainError::is_io_failure));
            assert!(stream.bad() && stream.fail() && !stream.good(), "{op:?}");
        }
    }
}

#[test]
fn delayed_mask_surfaces_recorded_failure() {
    for op in OPS {
        let mut stream = buffered();
        run(&mut stream, op).unwrap();
        assert!(stream.bad());

        let err = stream
            .set_exceptions(IoState::BAD | IoState::FAIL)
            .expect_err("mask covers a set flag");
        assert!(matches!(err, StreamError::Failure { .. }));
        assert!(stream.bad(), "{op:?}");
    }
}

#[test]
fn failed_stream_rejects_io_until_cleared() {
    let mut stream = buffered();
    run(&mut stream, Op::Read).unwrap();
    assert_eq!(stream.rdstate(), IoState::BAD);

    stream.write(b"ignored").unwrap();
    assert_eq!(stream.rdstate(), IoState::BAD | IoState::FAIL);

    stream.clear();
    assert!(stream.good());
    assert_eq!(stream.peek().unwrap(), None);
    assert!(stream.bad());
}

/// A reader that is interrupted before every successful read.
struct Interrupting<'a> {
    data: &'a [u8],
    interrupt: bool,
}

impl io::Read for Interrupting<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.interrupt = !self.interrupt;
        if self.interrupt {
            return Err(io::ErrorKind::Interrupted.into());
        }
        let n = self.data.len().min(buf.len()).min(3);
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

/// A writer that accepts one byte per call and then breaks.
struct Trickle {
    written: Vec<u8>,
    limit: usize,
}

impl io::Write for Trickle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written.len() >= self.limit {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        self.written.push(buf[0]);
        Ok(1)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn interrupted_reads_are_retried() {
    let reader = Interrupting {
        data: b"resilient",
        interrupt: false,
    };
    let mut stream = Stream::from_device(ReadSource::new(reader)).unwrap();
    let mut buf = [0u8; 9];
    assert_eq!(stream.read_exact(&mut buf).unwrap(), 9);
    assert_eq!(&buf, b"resilient");
    assert!(stream.good());
}

#[test]
fn partial_writes_are_completed_until_the_sink_breaks() {
    let mut sink = Trickle {
        written: Vec::new(),
        limit: 4,
    };
    {
        let mut stream = Stream::from_device(WriteSink::new(&mut sink)).unwrap();
        stream.write(b"abc").unwrap();
        stream.flush().unwrap();
        assert!(stream.good());

        stream.write(b"defg").unwrap();
        let err = io::Write::flush(&mut stream).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(stream.bad());
        assert!(stream.write_all(b"more").is_err());
    }
    assert_eq!(sink.written, b"abcd");
}

#[test]
fn misuse_sets_fail_not_bad() {
    let mut stream = Stream::from_device(ReadSource::new(io::empty())).unwrap();
    stream.write(b"x").unwrap();
    assert!(stream.fail() && !stream.bad());
    assert!(matches!(
        stream.last_error(),
        Some(ChainError::WrongMode { op: "write", .. })
    ));
}
