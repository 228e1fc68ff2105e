//! Links of a chain and the traversal engine.
//!
//! A chain is stored as a slice of links, stream-facing end first and the
//! device last. Every operation works on a slice whose first element is
//! the link being driven; the rest of the slice is what that link's
//! component reads from or writes into.

use std::io::SeekFrom;

use chainio_device::{Category, Device, DeviceError, Mode};

use crate::buffer::Buffer;
use crate::error::{ChainError, Result};
use crate::filter::{Filter, Next};

pub(crate) enum Component<'a> {
    Filter(Box<dyn Filter + 'a>),
    Device(Box<dyn Device + 'a>),
}

impl Component<'_> {
    pub(crate) fn is_device(&self) -> bool {
        matches!(self, Component::Device(_))
    }
}

pub(crate) struct Link<'a> {
    pub(crate) component: Component<'a>,
    pub(crate) category: Category,
    pub(crate) name: &'static str,
    pub(crate) input: Buffer,
    pub(crate) output: Buffer,
    /// Push order; `pop` removes the highest.
    pub(crate) seq: u64,
    pub(crate) opened: bool,
    pub(crate) closed: bool,
}

impl<'a> Link<'a> {
    pub(crate) fn new(
        component: Component<'a>,
        category: Category,
        name: &'static str,
        mode: Mode,
        buffer_size: usize,
        pback_size: usize,
        seq: u64,
    ) -> Self {
        let input = if mode.is_readable() {
            Buffer::new(buffer_size, pback_size)
        } else {
            Buffer::default()
        };
        let output = if mode.is_writable() {
            Buffer::new(buffer_size, 0)
        } else {
            Buffer::default()
        };
        Self {
            component,
            category,
            name,
            input,
            output,
            seq,
            opened: false,
            closed: false,
        }
    }

    pub(crate) fn is_device(&self) -> bool {
        self.component.is_device()
    }
}

fn split<'s, 'a>(links: &'s mut [Link<'a>]) -> Result<(&'s mut Link<'a>, &'s mut [Link<'a>])> {
    links.split_first_mut().ok_or(ChainError::Incomplete)
}

fn produce(
    component: &mut Component<'_>,
    rest: &mut [Link<'_>],
    mode: Mode,
    dst: &mut [u8],
) -> Result<usize> {
    match component {
        Component::Device(dev) => Ok(dev.read(dst)?),
        Component::Filter(filter) => filter.read(&mut Next::new(rest, mode), dst),
    }
}

fn consume(
    component: &mut Component<'_>,
    rest: &mut [Link<'_>],
    mode: Mode,
    src: &[u8],
) -> Result<usize> {
    match component {
        Component::Device(dev) => Ok(dev.write(src)?),
        Component::Filter(filter) => filter.write(&mut Next::new(rest, mode), src),
    }
}

fn reposition(
    component: &mut Component<'_>,
    rest: &mut [Link<'_>],
    mode: Mode,
    pos: SeekFrom,
) -> Result<u64> {
    match component {
        Component::Device(dev) => Ok(dev.seek(pos)?),
        Component::Filter(filter) => filter.seek(&mut Next::new(rest, mode), pos),
    }
}

fn drain_output(
    component: &mut Component<'_>,
    output: &mut Buffer,
    rest: &mut [Link<'_>],
    mode: Mode,
) -> Result<()> {
    output.flush(|pending| consume(component, rest, mode, pending))
}

fn write_direct(
    component: &mut Component<'_>,
    rest: &mut [Link<'_>],
    mode: Mode,
    mut src: &[u8],
) -> Result<()> {
    while !src.is_empty() {
        match consume(component, rest, mode, src)? {
            0 => return Err(DeviceError::write_zero().into()),
            n => src = &src[n.min(src.len())..],
        }
    }
    Ok(())
}

/// Read up to `buf.len()` bytes through the first link. Zero means end of stream.
pub(crate) fn read(links: &mut [Link<'_>], mode: Mode, buf: &mut [u8]) -> Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }
    let (head, rest) = split(links)?;
    let Link {
        component,
        input,
        output,
        ..
    } = head;

    // A seekable link shares one head between directions: pending output
    // must land before the device moves on.
    if mode == Mode::Seekable && !output.is_empty() {
        drain_output(component, output, rest, mode)?;
    }

    if input.is_direct() {
        return produce(component, rest, mode, buf);
    }
    if input.is_empty() && input.fill(|dst| produce(component, rest, mode, dst))? == 0 {
        return Ok(0);
    }
    Ok(input.read_into(buf))
}

/// Write all of `buf` through the first link.
pub(crate) fn write(links: &mut [Link<'_>], mode: Mode, buf: &[u8]) -> Result<()> {
    let (head, rest) = split(links)?;
    let Link {
        component,
        input,
        output,
        ..
    } = head;

    // Read-ahead moved the shared head past the logical position.
    if mode == Mode::Seekable && !input.is_empty() {
        let unread = input.available().len() as i64;
        input.clear();
        reposition(component, rest, mode, SeekFrom::Current(-unread))?;
    }

    if output.is_direct() {
        return write_direct(component, rest, mode, buf);
    }
    let mut written = 0;
    while written < buf.len() {
        if output.is_full() {
            drain_output(component, output, rest, mode)?;
        }
        written += output.push_slice(&buf[written..]);
    }
    Ok(())
}

/// Take a single byte, `None` at end of stream.
pub(crate) fn get(links: &mut [Link<'_>], mode: Mode) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    match read(links, mode, &mut byte)? {
        0 => Ok(None),
        _ => Ok(Some(byte[0])),
    }
}

/// True if the first link can take back a byte it has just produced.
pub(crate) fn can_putback(links: &[Link<'_>]) -> bool {
    links.first().is_some_and(|head| {
        !head.input.is_direct() || (head.is_device() && head.category.is_peekable())
    })
}

/// Return `byte` to the unread region of the first link.
pub(crate) fn putback(links: &mut [Link<'_>], byte: u8) -> Result<()> {
    let (head, _) = split(links)?;
    if !head.input.is_direct() {
        return head.input.putback(byte);
    }
    match &mut head.component {
        Component::Device(dev) if head.category.is_peekable() => Ok(dev.putback(byte)?),
        _ => Err(ChainError::PutbackExhausted),
    }
}

/// Reposition the first link, accounting for bytes it still buffers.
pub(crate) fn seek(links: &mut [Link<'_>], mode: Mode, pos: SeekFrom) -> Result<u64> {
    let (head, rest) = split(links)?;
    let Link {
        component,
        category,
        input,
        output,
        ..
    } = head;
    if !category.is_seekable() {
        return Err(ChainError::NotSeekable);
    }
    if !output.is_empty() {
        drain_output(component, output, rest, mode)?;
    }
    let pos = match pos {
        SeekFrom::Current(off) => SeekFrom::Current(off - input.available().len() as i64),
        other => other,
    };
    input.clear();
    reposition(component, rest, mode, pos)
}

/// Deliver pending output of every link, top-down, then flush the device.
pub(crate) fn flush(links: &mut [Link<'_>], mode: Mode) -> Result<()> {
    for i in 0..links.len() {
        let (head, rest) = split(&mut links[i..])?;
        let Link {
            component, output, ..
        } = head;
        drain_output(component, output, rest, mode)?;
        if let Component::Device(dev) = component {
            dev.flush()?;
        }
    }
    Ok(())
}

/// Deliver pending output of the first link only.
pub(crate) fn flush_head(links: &mut [Link<'_>], mode: Mode) -> Result<()> {
    let (head, rest) = split(links)?;
    let Link {
        component, output, ..
    } = head;
    drain_output(component, output, rest, mode)
}

/// Run the open hook of the first link if it has not run yet.
pub(crate) fn open_head(links: &mut [Link<'_>], mode: Mode) -> Result<()> {
    let (head, rest) = split(links)?;
    if head.opened {
        return Ok(());
    }
    if let Component::Filter(filter) = &mut head.component {
        filter.open(&mut Next::new(rest, mode))?;
    }
    head.opened = true;
    head.closed = false;
    Ok(())
}

/// Close the first link at most once: deliver its pending output, then run
/// its close hook. Both steps run even if the first fails.
pub(crate) fn close_head(links: &mut [Link<'_>], mode: Mode) -> Result<()> {
    let (head, rest) = split(links)?;
    if head.closed {
        return Ok(());
    }
    head.closed = true;
    head.opened = false;
    let Link {
        component,
        category,
        input,
        output,
        ..
    } = head;

    let flushed = if mode.is_writable() {
        drain_output(component, output, rest, mode)
    } else {
        Ok(())
    };
    input.clear();
    output.clear();

    let closed = match component {
        Component::Filter(filter) => filter.close(&mut Next::new(rest, mode)),
        Component::Device(dev) => {
            let synced = if mode.is_writable() {
                dev.flush()
            } else {
                Ok(())
            };
            let released = if category.is_closable() {
                dev.close()
            } else {
                Ok(())
            };
            synced.and(released).map_err(ChainError::from)
        }
    };
    flushed.and(closed)
}

/// Intersection of the categories of `links`.
pub(crate) fn effective_category(links: &[Link<'_>]) -> Category {
    links
        .iter()
        .fold(None, |acc: Option<Category>, link| {
            Some(acc.map_or(link.category, |c| c & link.category))
        })
        .unwrap_or(Category::NONE)
}
