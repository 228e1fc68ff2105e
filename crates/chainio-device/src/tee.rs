use crate::category::Category;
use crate::error::{DeviceError, Result};
use crate::traits::Device;

/// Duplicates everything written into two sinks.
///
/// Closing a tee closes both sinks, even if the first one fails; the first
/// failure is reported.
#[derive(Debug)]
pub struct TeeDevice<A, B> {
    first: A,
    second: B,
}

impl<A: Device, B: Device> TeeDevice<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn into_inner(self) -> (A, B) {
        (self.first, self.second)
    }
}

fn write_all<D: Device>(dev: &mut D, mut buf: &[u8]) -> Result<()> {
    while !buf.is_empty() {
        match dev.write(buf)? {
            0 => return Err(DeviceError::write_zero()),
            n => buf = &buf[n.min(buf.len())..],
        }
    }
    Ok(())
}

impl<A: Device, B: Device> Device for TeeDevice<A, B> {
    fn category(&self) -> Category {
        Category::SINK.with(Category::CLOSABLE)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        write_all(&mut self.first, buf)?;
        write_all(&mut self.second, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        let first = self.first.flush();
        let second = self.second.flush();
        first.and(second)
    }

    fn close(&mut self) -> Result<()> {
        let first = if self.first.category().is_closable() {
            self.first.close()
        } else {
            self.first.flush()
        };
        let second = if self.second.category().is_closable() {
            self.second.close()
        } else {
            self.second.flush()
        };
        first.and(second)
    }
}
