use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::category::Category;
use crate::error::{DeviceError, Result};
use crate::traits::Device;

/// Default buffer size reported to the chain for files.
pub const FILE_BUFFER_SIZE: usize = 8 * 1024;

/// How a [`FileDevice`] opens its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
}

impl OpenMode {
    /// Open an existing file for reading.
    pub const fn read() -> Self {
        Self {
            read: true,
            write: false,
            append: false,
            truncate: false,
            create: false,
        }
    }

    /// Create or truncate a file for writing.
    pub const fn write() -> Self {
        Self {
            read: false,
            write: true,
            append: false,
            truncate: true,
            create: true,
        }
    }

    /// Open a file for reading and writing, creating it if needed.
    pub const fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            append: false,
            truncate: false,
            create: true,
        }
    }

    /// Append every write to the end of the file.
    pub const fn append(mut self) -> Self {
        self.append = true;
        self.truncate = false;
        self
    }

    /// Truncate the file on open.
    pub const fn truncate(mut self) -> Self {
        self.truncate = true;
        self
    }

    fn options(self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        opts.read(self.read)
            .write(self.write || self.append)
            .append(self.append)
            .truncate(self.truncate && !self.append)
            .create(self.create);
        opts
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::read_write()
    }
}

/// A seekable, closable device over a filesystem path.
#[derive(Debug)]
pub struct FileDevice {
    file: Option<File>,
    path: PathBuf,
    mode: OpenMode,
}

impl FileDevice {
    /// Open `path` with the given mode.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = mode.options().open(&path)?;
        debug!(?path, ?mode, "opened file device");
        Ok(Self {
            file: Some(file),
            path,
            mode,
        })
    }

    /// Wrap an already open file.
    pub fn from_file(file: File, path: impl Into<PathBuf>, mode: OpenMode) -> Self {
        Self {
            file: Some(file),
            path: path.into(),
            mode,
        }
    }

    /// Close the current file (if any) and open `path` in its place.
    pub fn reopen(&mut self, path: impl AsRef<Path>, mode: OpenMode) -> Result<()> {
        if self.file.is_some() {
            Device::close(self)?;
        }
        let path = path.as_ref().to_path_buf();
        let file = mode.options().open(&path)?;
        debug!(?path, ?mode, "reopened file device");
        self.file = Some(file);
        self.path = path;
        self.mode = mode;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Path this device was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(DeviceError::Closed)
    }
}

impl Device for FileDevice {
    fn category(&self) -> Category {
        Category::SEEKABLE_DEVICE
            .with(Category::CLOSABLE)
            .with(Category::OPTIMALLY_BUFFERED)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let file = self.file_mut()?;
        loop {
            match file.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(DeviceError::BadRead(err)),
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let file = self.file_mut()?;
        loop {
            match file.write(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(DeviceError::BadWrite(err)),
            }
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.file_mut()?.seek(pos).map_err(DeviceError::BadSeek)
    }

    fn flush(&mut self) -> Result<()> {
        self.file_mut()?.flush().map_err(DeviceError::BadWrite)
    }

    fn close(&mut self) -> Result<()> {
        match self.file.take() {
            Some(mut file) => {
                debug!(path = ?self.path, "closing file device");
                file.flush().map_err(DeviceError::BadClose)
            }
            None => Ok(()),
        }
    }

    fn optimal_buffer_size(&self) -> Option<usize> {
        Some(FILE_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_temp_path(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "chainio-file-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir.join("data.bin")
    }

    #[test]
    fn write_then_read_back() {
        let path = unique_temp_path("rw");
        let mut dev = FileDevice::open(&path, OpenMode::write()).unwrap();
        assert_eq!(dev.write(b"hello file").unwrap(), 10);
        dev.close().unwrap();
        assert!(!dev.is_open());

        dev.reopen(&path, OpenMode::read()).unwrap();
        let mut buf = [0u8; 32];
        let n = dev.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello file");
        assert_eq!(dev.read(&mut buf).unwrap(), 0);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn seek_within_file() {
        let path = unique_temp_path("seek");
        std::fs::write(&path, b"0123456789").unwrap();

        let mut dev = FileDevice::open(&path, OpenMode::read()).unwrap();
        assert_eq!(dev.seek(SeekFrom::End(-3)).unwrap(), 7);
        let mut buf = [0u8; 3];
        assert_eq!(dev.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"789");
        assert!(matches!(
            dev.seek(SeekFrom::Current(-100)),
            Err(DeviceError::BadSeek(_))
        ));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn append_mode_appends() {
        let path = unique_temp_path("append");
        std::fs::write(&path, b"abc").unwrap();

        let mut dev = FileDevice::open(&path, OpenMode::write().append()).unwrap();
        dev.write(b"def").unwrap();
        dev.close().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn closed_device_reports_closed() {
        let path = unique_temp_path("closed");
        let mut dev = FileDevice::open(&path, OpenMode::read_write()).unwrap();
        dev.close().unwrap();
        dev.close().unwrap();

        let mut buf = [0u8; 1];
        assert!(matches!(dev.read(&mut buf), Err(DeviceError::Closed)));
        assert!(matches!(dev.write(b"x"), Err(DeviceError::Closed)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn open_missing_file_fails() {
        let path = unique_temp_path("missing").with_file_name("does-not-exist");
        let err = FileDevice::open(&path, OpenMode::read()).unwrap_err();
        assert!(matches!(err, DeviceError::Io(e) if e.kind() == ErrorKind::NotFound));
    }

    #[test]
    fn category_is_seekable_and_closable() {
        let path = unique_temp_path("category");
        let dev = FileDevice::open(&path, OpenMode::read_write()).unwrap();
        let cat = dev.category();
        assert!(cat.is_seekable());
        assert!(cat.is_closable());
        assert!(cat.is_optimally_buffered());
        assert_eq!(dev.optimal_buffer_size(), Some(FILE_BUFFER_SIZE));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
