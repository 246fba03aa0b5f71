use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

/// Filesystem operations used by the benchmark phases
pub trait DiskIO {
    /// Open (create or truncate) a file for unbuffered writing
    fn open_write(&self, path: &Path) -> io::Result<Box<dyn DirectFile>>;

    /// Open an existing file for unbuffered reading
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn DirectFile>>;

    /// Ask the OS to drop cached pages of the file.
    ///
    /// Returns `false` when the platform has no way to do it.
    fn evict_cache(&self, path: &Path) -> io::Result<bool>;

    /// Delete the file
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Single-call file operations; no userspace buffering in between
pub trait DirectFile {
    /// One write call; may transfer fewer bytes than `buf.len()`
    fn write_direct(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// One read call; `Ok(0)` means end of file
    fn read_direct(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Force written data to the device
    fn sync_all(&mut self) -> io::Result<()>;
}

/// Plain `std::fs::File` handle. Closed on drop.
pub struct RawFile {
    file: File,
}

impl RawFile {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl DirectFile for RawFile {
    fn write_direct(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn read_direct(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn sync_all(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

/// Platform-specific disk I/O implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformDiskIO;

impl PlatformDiskIO {
    pub fn new() -> Self {
        Self
    }
}

impl DiskIO for PlatformDiskIO {
    fn open_write(&self, path: &Path) -> io::Result<Box<dyn DirectFile>> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }

        let file = options.open(path)?;
        Ok(Box::new(RawFile::new(file)))
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn DirectFile>> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Box::new(RawFile::new(file)))
    }

    #[cfg(target_os = "linux")]
    fn evict_cache(&self, path: &Path) -> io::Result<bool> {
        use std::os::unix::io::AsRawFd;

        let file = File::open(path)?;
        // Dirty pages are skipped by DONTNEED, so flush first.
        file.sync_all()?;
        let rc = unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_DONTNEED) };
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc));
        }
        Ok(true)
    }

    #[cfg(not(target_os = "linux"))]
    fn evict_cache(&self, _path: &Path) -> io::Result<bool> {
        Ok(false)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}
