use chainio_device::Category;

use crate::error::Result;
use crate::filter::{Filter, Next};

/// Line ending produced by [`Newline`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NewlineStyle {
    #[default]
    Lf,
    CrLf,
    Cr,
}

impl NewlineStyle {
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            NewlineStyle::Lf => b"\n",
            NewlineStyle::CrLf => b"\r\n",
            NewlineStyle::Cr => b"\r",
        }
    }
}

/// Rewrites `\r\n`, `\r` and `\n` line endings into one target style.
///
/// A `\r` at the end of a write is held back until the next byte shows
/// whether it starts a `\r\n` pair; closing the filter releases it.
#[derive(Debug, Clone, Default)]
pub struct Newline {
    target: NewlineStyle,
    pending_cr: bool,
    pending_lf: bool,
}

impl Newline {
    pub fn new(target: NewlineStyle) -> Self {
        Self {
            target,
            pending_cr: false,
            pending_lf: false,
        }
    }

    pub fn target(&self) -> NewlineStyle {
        self.target
    }
}

impl Filter for Newline {
    fn category(&self) -> Category {
        Category::DUAL_USE_FILTER.with(Category::CLOSABLE)
    }

    fn read(&mut self, next: &mut Next<'_, '_>, buf: &mut [u8]) -> Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            if self.pending_lf {
                self.pending_lf = false;
                buf[n] = b'\n';
                n += 1;
                continue;
            }
            let Some(byte) = next.get()? else {
                break;
            };
            match byte {
                b'\r' => {
                    if let Some(following) = next.get()? {
                        if following != b'\n' {
                            next.putback(following)?;
                        }
                    }
                }
                b'\n' => {}
                other => {
                    buf[n] = other;
                    n += 1;
                    continue;
                }
            }
            let ending = self.target.as_bytes();
            buf[n] = ending[0];
            n += 1;
            self.pending_lf = ending.len() > 1;
        }
        Ok(n)
    }

    fn write(&mut self, next: &mut Next<'_, '_>, buf: &[u8]) -> Result<usize> {
        let ending = self.target.as_bytes();
        for &byte in buf {
            if self.pending_cr {
                self.pending_cr = false;
                next.write(ending)?;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\r' => self.pending_cr = true,
                b'\n' => {
                    next.write(ending)?;
                }
                other => next.put(other)?,
            }
        }
        Ok(buf.len())
    }

    fn close(&mut self, next: &mut Next<'_, '_>) -> Result<()> {
        self.pending_lf = false;
        if std::mem::take(&mut self.pending_cr) {
            next.write(self.target.as_bytes())?;
        }
        Ok(())
    }
}
