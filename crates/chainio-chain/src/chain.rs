use std::io::SeekFrom;

use chainio_device::{Category, Device, Mode};
use tracing::{debug, warn};

use crate::config::{ChainConfig, PushOptions, MIN_PBACK_SIZE};
use crate::error::{ChainError, Result};
use crate::filter::Filter;
use crate::lifecycle::{closes, LifecycleEvent};
use crate::link::{self, Component, Link};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// An ordered stack of filters terminated by one device.
///
/// Filters are pushed first, stream-facing end first; pushing a device
/// completes the chain and opens it. Components may be pushed by value
/// (owned by the chain) or as `&mut` borrows.
///
/// ```
/// use chainio_chain::{filters::Uppercase, Chain};
/// use chainio_device::{ContainerSink, Mode};
///
/// let (sink, contents) = ContainerSink::new();
/// let mut chain = Chain::new(Mode::Output);
/// chain.push_filter(Uppercase).unwrap();
/// chain.push_device(sink).unwrap();
///
/// chain.write(b"hello").unwrap();
/// chain.flush().unwrap();
/// assert_eq!(contents.to_vec(), b"HELLO");
/// ```
pub struct Chain<'a> {
    links: Vec<Link<'a>>,
    mode: Mode,
    config: ChainConfig,
    auto_close: bool,
    open: bool,
    next_seq: u64,
}

impl<'a> Chain<'a> {
    /// Create an empty chain with default configuration.
    pub fn new(mode: Mode) -> Self {
        Self::with_config(mode, ChainConfig::default())
    }

    /// Create an empty chain with explicit configuration.
    pub fn with_config(mode: Mode, config: ChainConfig) -> Self {
        Self {
            links: Vec::new(),
            mode,
            config,
            auto_close: config.auto_close,
            open: false,
            next_seq: 0,
        }
    }

    /// A complete chain consisting of a single device, in the mode its category implies.
    pub fn from_device<D: Device + 'a>(device: D) -> Result<Self> {
        let mode = Mode::for_device(device.category())?;
        let mut chain = Self::new(mode);
        chain.push_device(device)?;
        Ok(chain)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Effective capability: the intersection of every link's category.
    pub fn category(&self) -> Category {
        link::effective_category(&self.links)
    }

    /// Number of components, device included.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// True once a device terminates the chain.
    pub fn is_complete(&self) -> bool {
        self.links.last().is_some_and(Link::is_device)
    }

    /// True when complete and not closed.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn auto_close(&self) -> bool {
        self.auto_close
    }

    pub fn set_auto_close(&mut self, auto_close: bool) {
        self.auto_close = auto_close;
    }

    /// Type names of the components, stream-facing end first.
    pub fn component_names(&self) -> Vec<&'static str> {
        self.links.iter().map(|link| link.name).collect()
    }

    /// Push a filter with default buffering.
    pub fn push_filter<F: Filter + 'a>(&mut self, filter: F) -> Result<()> {
        self.push_filter_with(filter, PushOptions::default())
    }

    /// Push a filter.
    ///
    /// On a complete chain the filter is inserted directly above the device
    /// and opened right away.
    pub fn push_filter_with<F: Filter + 'a>(&mut self, filter: F, options: PushOptions) -> Result<()> {
        let name = std::any::type_name::<F>();
        let category = filter.category();
        self.check_mode(name, category)?;
        if category.is_seekable() {
            if let Some(device) = self.links.last().filter(|link| link.is_device()) {
                if !device.category.is_seekable() {
                    return Err(ChainError::InvalidCapability {
                        component: name,
                        category,
                        reason: format!("requires a seekable device, {} is not", device.name),
                    });
                }
            }
        }

        let size = options
            .buffer_size
            .unwrap_or(self.config.filter_buffer_size);
        let new_link = self.make_link(Component::Filter(Box::new(filter)), category, name, size, options);

        if self.is_complete() {
            let idx = self.links.len() - 1;
            self.links.insert(idx, new_link);
            if self.open {
                if let Err(err) = link::open_head(&mut self.links[idx..], self.mode) {
                    self.links.remove(idx);
                    return Err(err);
                }
            }
            debug!(component = name, %category, position = idx, "inserted filter above device");
        } else {
            self.links.push(new_link);
            debug!(component = name, %category, position = self.links.len() - 1, "pushed filter");
        }
        Ok(())
    }

    /// Push a device with default buffering.
    pub fn push_device<D: Device + 'a>(&mut self, device: D) -> Result<()> {
        self.push_device_with(device, PushOptions::default())
    }

    /// Push a device, completing the chain.
    ///
    /// If the chain already has a device, pending output is flushed into the
    /// old one, which is then closed (auto-close permitting) and replaced. A
    /// failure to close the old device is reported after the new one is in
    /// place.
    pub fn push_device_with<D: Device + 'a>(&mut self, device: D, options: PushOptions) -> Result<()> {
        let name = std::any::type_name::<D>();
        let category = device.category();
        self.check_mode(name, category)?;
        if !category.is_seekable() {
            if let Some(filter) = self
                .links
                .iter()
                .find(|link| !link.is_device() && link.category.is_seekable())
            {
                return Err(ChainError::InvalidCapability {
                    component: name,
                    category,
                    reason: format!("{} requires a seekable device", filter.name),
                });
            }
        }

        let size = options
            .buffer_size
            .or_else(|| {
                category
                    .is_optimally_buffered()
                    .then(|| device.optimal_buffer_size())
                    .flatten()
            })
            .unwrap_or(self.config.device_buffer_size);
        let new_link = self.make_link(Component::Device(Box::new(device)), category, name, size, options);

        let mut replaced = Ok(());
        if self.is_complete() {
            if self.open && self.mode.is_writable() {
                link::flush(&mut self.links, self.mode)?;
            }
            let idx = self.links.len() - 1;
            if closes(LifecycleEvent::ReplaceDevice, self.auto_close) {
                replaced = link::close_head(&mut self.links[idx..], self.mode);
            }
            if let Some(old) = self.links.pop() {
                debug!(old = old.name, new = name, "replacing device");
            }
        }

        // Read-ahead came from whatever was below before.
        for link in &mut self.links {
            link.input.clear();
        }
        self.links.push(new_link);
        self.open = true;
        debug!(component = name, %category, links = self.links.len(), "chain complete");

        self.open_links()?;
        replaced
    }

    /// Remove the most recently pushed component.
    ///
    /// Output pending above it is delivered first. The removed component is
    /// closed only if auto-close is enabled.
    pub fn pop(&mut self) -> Result<()> {
        let idx = self
            .links
            .iter()
            .enumerate()
            .max_by_key(|(_, link)| link.seq)
            .map(|(idx, _)| idx)
            .ok_or(ChainError::Empty)?;

        let mut result = Ok(());
        let deliver = self.open && self.mode.is_writable();
        if deliver {
            for i in 0..idx {
                result = result.and(link::flush_head(&mut self.links[i..], self.mode));
            }
        }
        if closes(LifecycleEvent::Pop, self.auto_close) {
            result = result.and(link::close_head(&mut self.links[idx..], self.mode));
        } else if deliver {
            result = result.and(link::flush_head(&mut self.links[idx..], self.mode));
        }

        let removed = self.links.remove(idx);
        if removed.is_device() {
            self.open = false;
        }
        debug!(component = removed.name, remaining = self.links.len(), "popped component");
        result
    }

    /// Close every component, then empty the chain.
    pub fn reset(&mut self) -> Result<()> {
        let result = self.close_links();
        self.links.clear();
        self.open = false;
        debug!("chain reset");
        result
    }

    /// Close every component, top-down, regardless of auto-close.
    ///
    /// Every link is closed even if an earlier one fails; the first failure
    /// is returned. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        self.close_links()
    }

    /// Read up to `buf.len()` bytes. Zero means end of stream.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ready("read", Access::Read)?;
        link::read(&mut self.links, self.mode, buf)
    }

    /// Read one byte, `None` at end of stream.
    pub fn get(&mut self) -> Result<Option<u8>> {
        self.ready("get", Access::Read)?;
        link::get(&mut self.links, self.mode)
    }

    /// Look at the next byte without consuming it.
    ///
    /// Fails with [`ChainError::PutbackExhausted`], consuming nothing, when
    /// the stream-facing link is direct and its component cannot take a
    /// byte back.
    pub fn peek(&mut self) -> Result<Option<u8>> {
        self.ready("peek", Access::Read)?;
        if !link::can_putback(&self.links) {
            return Err(ChainError::PutbackExhausted);
        }
        let byte = link::get(&mut self.links, self.mode)?;
        if let Some(byte) = byte {
            link::putback(&mut self.links, byte)?;
        }
        Ok(byte)
    }

    /// Return a byte to the unread region of the stream-facing buffer.
    pub fn putback(&mut self, byte: u8) -> Result<()> {
        self.ready("putback", Access::Read)?;
        link::putback(&mut self.links, byte)
    }

    /// Write all of `buf` (buffered).
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.ready("write", Access::Write)?;
        link::write(&mut self.links, self.mode, buf)
    }

    pub fn put(&mut self, byte: u8) -> Result<()> {
        self.write(&[byte])
    }

    /// Deliver all buffered output to the device and flush it.
    pub fn flush(&mut self) -> Result<()> {
        self.ready("flush", Access::Write)?;
        link::flush(&mut self.links, self.mode)
    }

    /// Reposition the chain. Fails with [`ChainError::NotSeekable`] unless every link can seek.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        if !self.is_complete() {
            return Err(ChainError::Incomplete);
        }
        if !self.category().is_seekable() {
            return Err(ChainError::NotSeekable);
        }
        if !self.open {
            return Err(ChainError::Closed);
        }
        link::seek(&mut self.links, self.mode, pos)
    }

    fn ready(&self, op: &'static str, access: Access) -> Result<()> {
        if !self.is_complete() {
            return Err(ChainError::Incomplete);
        }
        if !self.open {
            return Err(ChainError::Closed);
        }
        let allowed = match access {
            Access::Read => self.mode.is_readable(),
            Access::Write => self.mode.is_writable(),
        };
        if allowed {
            Ok(())
        } else {
            Err(ChainError::WrongMode {
                op,
                mode: self.mode,
            })
        }
    }

    fn check_mode(&self, name: &'static str, category: Category) -> Result<()> {
        if category.supports(self.mode) {
            Ok(())
        } else {
            Err(ChainError::InvalidCapability {
                component: name,
                category,
                reason: format!("cannot be used in a {} chain", self.mode),
            })
        }
    }

    fn make_link(
        &mut self,
        component: Component<'a>,
        category: Category,
        name: &'static str,
        size: usize,
        options: PushOptions,
    ) -> Link<'a> {
        let pback = options
            .pback_size
            .unwrap_or(self.config.pback_size)
            .max(MIN_PBACK_SIZE);
        let seq = self.next_seq;
        self.next_seq += 1;
        Link::new(component, category, name, self.mode, size, pback, seq)
    }

    fn open_links(&mut self) -> Result<()> {
        for i in 0..self.links.len() {
            link::open_head(&mut self.links[i..], self.mode)?;
        }
        Ok(())
    }

    fn close_links(&mut self) -> Result<()> {
        let mut first = Ok(());
        for i in 0..self.links.len() {
            let closed = link::close_head(&mut self.links[i..], self.mode);
            if let Err(err) = closed {
                debug!(component = self.links[i].name, error = %err, "close failed");
                if first.is_ok() {
                    first = Err(err);
                }
            }
        }
        if self.open {
            debug!(links = self.links.len(), "chain closed");
        }
        self.open = false;
        first
    }
}

impl Drop for Chain<'_> {
    fn drop(&mut self) {
        if self.links.is_empty() {
            return;
        }
        if closes(LifecycleEvent::Drop, self.auto_close) {
            if let Err(err) = self.close_links() {
                warn!(error = %err, "failed closing chain on drop");
            }
        } else if self.open && self.mode.is_writable() {
            if let Err(err) = link::flush(&mut self.links, self.mode) {
                warn!(error = %err, "failed flushing chain on drop");
            }
        }
    }
}

impl std::fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("mode", &self.mode)
            .field("components", &self.component_names())
            .field("open", &self.open)
            .field("auto_close", &self.auto_close)
            .finish()
    }
}
