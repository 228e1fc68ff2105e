use chainio_device::Category;

use crate::error::Result;
use crate::filter::{Filter, Next};

/// Maps ASCII lowercase letters to uppercase, in either direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uppercase;

const CHUNK: usize = 256;

impl Filter for Uppercase {
    fn category(&self) -> Category {
        Category::DUAL_USE_FILTER
    }

    fn read(&mut self, next: &mut Next<'_, '_>, buf: &mut [u8]) -> Result<usize> {
        let n = next.read(buf)?;
        buf[..n].make_ascii_uppercase();
        Ok(n)
    }

    fn write(&mut self, next: &mut Next<'_, '_>, buf: &[u8]) -> Result<usize> {
        let mut chunk = [0u8; CHUNK];
        let n = buf.len().min(CHUNK);
        chunk[..n].copy_from_slice(&buf[..n]);
        chunk[..n].make_ascii_uppercase();
        next.write(&chunk[..n])
    }
}

#[cfg(test)]
mod tests {
    use chainio_device::{ContainerSink, Mode, SliceSource};

    use super::*;
    use crate::Chain;

    #[test]
    fn uppercases_long_writes() {
        let text = "mixed Case text ".repeat(40);
        let (sink, contents) = ContainerSink::new();
        let mut chain = Chain::new(Mode::Output);
        chain.push_filter(Uppercase).unwrap();
        chain.push_device(sink).unwrap();

        chain.write(text.as_bytes()).unwrap();
        chain.flush().unwrap();
        assert_eq!(contents.to_vec(), text.to_ascii_uppercase().as_bytes());
    }

    #[test]
    fn leaves_non_ascii_alone() {
        let mut chain = Chain::new(Mode::Input);
        chain.push_filter(Uppercase).unwrap();
        chain.push_device(SliceSource::new("ß-ok".as_bytes())).unwrap();

        let mut buf = [0u8; 16];
        let n = chain.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], "ß-OK".as_bytes());
    }
}
