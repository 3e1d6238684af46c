//! Frame sources for the send loop.
//!
//! Any application can feed the matrix by writing packed RGB frames to
//! one of these backends; the daemon polls at the configured rate and
//! resends the last frame it saw.

use std::fs;
use std::io::{self, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::info;

/// A provider of raw RGB frames.
pub trait FrameSource {
    /// Prepares the source, creating backing files where needed.
    fn open(&mut self) -> io::Result<()>;

    /// Returns the next frame, or `None` when nothing changed since the
    /// last call. Frames are padded or truncated to exactly
    /// `width * height * 3` bytes.
    fn next_frame(&mut self) -> io::Result<Option<Vec<u8>>>;
}

/// Reads frames from a plain file, skipping reads while the file is
/// unmodified.
pub struct FileSource {
    path: PathBuf,
    frame_size: usize,
    last_mtime: Option<SystemTime>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, width: u16, height: u16) -> Self {
        Self {
            path: path.into(),
            frame_size: width as usize * height as usize * 3,
            last_mtime: None,
        }
    }
}

impl FrameSource for FileSource {
    fn open(&mut self) -> io::Result<()> {
        if !self.path.exists() {
            fs::write(&self.path, vec![0u8; self.frame_size])?;
            // Any local user may feed the display.
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o666))?;
            info!(
                "created framebuffer file {} ({} bytes)",
                self.path.display(),
                self.frame_size
            );
        }
        Ok(())
    }

    fn next_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mtime = fs::metadata(&self.path)?.modified()?;
        if self.last_mtime == Some(mtime) {
            return Ok(None);
        }
        self.last_mtime = Some(mtime);

        let mut data = fs::read(&self.path)?;
        data.resize(self.frame_size, 0);
        Ok(Some(data))
    }
}

/// Reads frames from POSIX shared memory (a file under /dev/shm),
/// re-reading on every tick.
pub struct ShmSource {
    path: PathBuf,
    frame_size: usize,
}

impl ShmSource {
    pub fn new(name: &str, width: u16, height: u16) -> Self {
        Self {
            path: Path::new("/dev/shm").join(name),
            frame_size: width as usize * height as usize * 3,
        }
    }
}

impl FrameSource for ShmSource {
    fn open(&mut self) -> io::Result<()> {
        if !self.path.exists() {
            fs::write(&self.path, vec![0u8; self.frame_size])?;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o666))?;
            info!("created shared memory {}", self.path.display());
        }
        Ok(())
    }

    fn next_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut data = fs::read(&self.path)?;
        data.resize(self.frame_size, 0);
        Ok(Some(data))
    }
}

/// Reads frames from a Linux framebuffer device, re-reading on every
/// tick.
pub struct FbSource {
    device: PathBuf,
    frame_size: usize,
}

impl FbSource {
    pub fn new(device: impl Into<PathBuf>, width: u16, height: u16) -> Self {
        Self {
            device: device.into(),
            frame_size: width as usize * height as usize * 3,
        }
    }
}

impl FrameSource for FbSource {
    fn open(&mut self) -> io::Result<()> {
        fs::File::open(&self.device)?;
        info!("opened framebuffer device {}", self.device.display());
        Ok(())
    }

    fn next_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut data = Vec::with_capacity(self.frame_size);
        fs::File::open(&self.device)?
            .take(self.frame_size as u64)
            .read_to_end(&mut data)?;
        data.resize(self.frame_size, 0);
        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_source_reads_and_skips_unchanged() {
        let path = std::env::temp_dir().join(format!("ledmatrix-test-{}", std::process::id()));
        let _ = fs::remove_file(&path);

        let mut source = FileSource::new(&path, 4, 2);
        source.open().unwrap();

        let first = source.next_frame().unwrap();
        assert_eq!(first.map(|f| f.len()), Some(4 * 2 * 3));
        // Unmodified file means no new frame.
        assert!(source.next_frame().unwrap().is_none());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_source_pads_short_frames() {
        let path =
            std::env::temp_dir().join(format!("ledmatrix-short-{}", std::process::id()));
        fs::write(&path, [7u8; 5]).unwrap();

        let mut source = FileSource::new(&path, 4, 2);
        source.open().unwrap();
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.len(), 24);
        assert_eq!(&frame[..5], &[7u8; 5]);
        assert!(frame[5..].iter().all(|&b| b == 0));

        fs::remove_file(&path).unwrap();
    }
}
