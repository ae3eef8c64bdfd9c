//! Cross-process exclusive access to the store file.

use std::{
  fs::{self, File, OpenOptions},
  io::{self, Read, Seek, SeekFrom, Write},
  path::{Path, PathBuf},
};

use fs2::FileExt;

use crate::{Error, Result};

/// An open store file holding an exclusive advisory lock.
///
/// The lock is released by [`LockedFile::release`], or on drop if the
/// holder bailed out early (error or panic). If the process dies the kernel
/// drops the lock with the descriptor.
#[derive(Debug)]
pub struct LockedFile {
  file:     File,
  path:     PathBuf,
  released: bool,
}

impl LockedFile {
  /// Open (creating parents and the file as needed) and block until the
  /// exclusive lock is granted.
  pub fn acquire(path: &Path) -> io::Result<Self> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
      .create(true)
      .read(true)
      .write(true)
      .truncate(false)
      .open(path)?;
    FileExt::lock_exclusive(&file)?;
    Ok(Self { file, path: path.to_path_buf(), released: false })
  }

  pub fn path(&self) -> &Path { &self.path }

  /// Read the whole file. Invalid UTF-8 is replaced rather than rejected so
  /// one corrupt byte cannot wedge the hook.
  pub fn read_all(&mut self) -> io::Result<String> {
    self.file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    self.file.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
  }

  /// Replace the file contents.
  pub fn rewrite(&mut self, contents: &str) -> io::Result<()> {
    self.file.set_len(0)?;
    self.file.seek(SeekFrom::Start(0))?;
    self.file.write_all(contents.as_bytes())?;
    self.file.sync_data()
  }

  /// Add `contents` at the end of the file.
  pub fn append(&mut self, contents: &str) -> io::Result<()> {
    self.file.seek(SeekFrom::End(0))?;
    self.file.write_all(contents.as_bytes())?;
    self.file.sync_data()
  }

  /// Release the lock, reporting failure.
  pub fn release(mut self) -> io::Result<()> {
    self.released = true;
    FileExt::unlock(&self.file)
  }
}

impl Drop for LockedFile {
  fn drop(&mut self) {
    if !self.released
      && let Err(e) = FileExt::unlock(&self.file)
    {
      tracing::warn!(path = %self.path.display(), error = %e, "failed to release store lock");
    }
  }
}

/// Run `f` with exclusive access to the file at `path`.
///
/// Any I/O failure, including failing to take or drop the lock, surfaces as
/// [`Error::Unavailable`].
pub fn with_exclusive_access<T, F>(path: &Path, f: F) -> Result<T>
where
  F: FnOnce(&mut LockedFile) -> io::Result<T>,
{
  let mut locked = LockedFile::acquire(path).map_err(|e| Error::unavailable(path, e))?;
  let value = f(&mut locked).map_err(|e| Error::unavailable(path, e))?;
  locked.release().map_err(|e| Error::unavailable(path, e))?;
  Ok(value)
}
