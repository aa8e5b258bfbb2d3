//! File helpers (spec §4.5 "File close (synchronous inside await_ready; no
//! reactor involvement)", §13 resolution 1: the whole file surface is kept
//! fully synchronous rather than half-async, since none of it needs a
//! readiness wait on any backend this crate targets).
//!
//! Grounded on `original_source/galay/kernel/async/File.h`'s `OpenFlags`
//! builder.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{self, Error};

/// Builder mirroring the original's flag-setting methods.
#[derive(Default, Clone, Copy)]
pub struct OpenFlags {
    append: bool,
    create: bool,
    truncate: bool,
    read: bool,
    write: bool,
}

impl OpenFlags {
    pub fn new() -> Self {
        OpenFlags::default()
    }

    pub fn append(mut self) -> Self {
        self.append = true;
        self
    }
    pub fn create(mut self) -> Self {
        self.create = true;
        self
    }
    pub fn truncate(mut self) -> Self {
        self.truncate = true;
        self
    }
    pub fn read(mut self) -> Self {
        self.read = true;
        self
    }
    pub fn write(mut self) -> Self {
        self.write = true;
        self
    }
    pub fn read_write(mut self) -> Self {
        self.read = true;
        self.write = true;
        self
    }

    fn to_options(self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        opts.read(self.read)
            .write(self.write)
            .append(self.append)
            .create(self.create)
            .truncate(self.truncate);
        opts
    }
}

/// A plain file handle. `close` is implicit on `Drop`, matching the
/// synchronous-close resolution — there is no separate async close path.
pub struct File {
    inner: std::fs::File,
}

impl File {
    pub fn open(path: impl AsRef<Path>, flags: OpenFlags) -> error::Result<Self> {
        let inner = flags
            .to_options()
            .open(path)
            .map_err(|_| Error::from_errno(Error::CallOpen))?;
        Ok(File { inner })
    }

    pub fn read(&mut self, buf: &mut [u8]) -> error::Result<usize> {
        if buf.is_empty() {
            return Err(Error::FileReadEmpty);
        }
        self.inner
            .read(buf)
            .map_err(|_| Error::from_errno(Error::CallFileRead))
    }

    pub fn write(&mut self, buf: &[u8]) -> error::Result<usize> {
        if buf.is_empty() {
            return Err(Error::FileWriteEmpty);
        }
        self.inner
            .write(buf)
            .map_err(|_| Error::from_errno(Error::CallFileWrite))
    }

    pub fn seek(&mut self, pos: SeekFrom) -> error::Result<u64> {
        self.inner
            .seek(pos)
            .map_err(|_| Error::from_errno(Error::CallLSeek))
    }

    /// Runs entirely synchronously; present for callers that want an
    /// explicit close point rather than relying on `Drop` (§4.5, §13
    /// resolution 1).
    pub fn close(self) -> error::Result<()> {
        drop(self);
        Ok(())
    }
}

pub fn remove(path: impl AsRef<Path>) -> error::Result<()> {
    std::fs::remove_file(path).map_err(|_| Error::from_errno(Error::CallRemove))
}
