use crate::category::Category;
use crate::error::Result;
use crate::traits::Device;

/// Reads nothing and discards everything written.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDevice;

impl Device for NullDevice {
    fn category(&self) -> Category {
        Category::BIDIRECTIONAL_DEVICE
    }

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Ok(0)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(buf.len())
    }
}
