//! Log file handle
//!
//! Shared open/read/append/close plumbing for the file backends.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::AccessMode;
use crate::error::{DocStoreError, Result};

/// An open database file plus the mode it was opened with
///
/// Writable handles are opened in append mode, so every write lands at
/// the end of the file regardless of where the last read left the cursor.
#[derive(Debug)]
pub(crate) struct LogFile {
    path: PathBuf,
    mode: AccessMode,
    /// `None` once closed
    file: Option<File>,
}

impl LogFile {
    pub(crate) fn open(path: &Path, mode: AccessMode) -> Result<Self> {
        let file = Self::open_handle(path, mode)?;
        Ok(Self {
            path: path.to_path_buf(),
            mode,
            file: Some(file),
        })
    }

    fn open_handle(path: &Path, mode: AccessMode) -> Result<File> {
        let mut options = OpenOptions::new();
        options.read(true);
        if mode.is_writable() {
            options.append(true);
        }
        Ok(options.open(path)?)
    }

    /// Reopen after the file was replaced on disk
    pub(crate) fn reopen(&mut self) -> Result<()> {
        self.file = Some(Self::open_handle(&self.path, self.mode)?);
        Ok(())
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn mode(&self) -> AccessMode {
        self.mode
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn handle(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(DocStoreError::Closed)
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.file.is_none() {
            return Err(DocStoreError::Closed);
        }
        if !self.mode.is_writable() {
            return Err(DocStoreError::Mode {
                mode: self.mode.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn len(&mut self) -> Result<u64> {
        Ok(self.handle()?.metadata()?.len())
    }

    /// Read everything from `offset` to the end of the file
    pub(crate) fn read_from(&mut self, offset: u64) -> Result<Vec<u8>> {
        let file = self.handle()?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Fill `buf` from `offset`
    pub(crate) fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let file = self.handle()?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    /// Append `bytes`, then flush and sync before returning
    pub(crate) fn append_durable(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        let file = self.handle()?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            if self.mode.is_writable() {
                file.sync_all()?;
            }
        }
        Ok(())
    }
}

/// Create missing parent directories when asked to
pub(crate) fn prepare_parent(path: &Path, create_dirs: bool) -> Result<()> {
    if !create_dirs {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Create `path` if missing without touching existing content
pub(crate) fn touch(path: &Path, create_dirs: bool) -> Result<()> {
    prepare_parent(path, create_dirs)?;
    OpenOptions::new().append(true).create(true).open(path)?;
    Ok(())
}
