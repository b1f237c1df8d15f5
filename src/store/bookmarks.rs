use std::{
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use fs2::FileExt;
use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::domain::{AddOutcome, BookmarkRecord};

use super::{
    format::{parse_document, render_document},
    StoreError,
};

/// File-backed bookmark list. Every mutation re-reads the file, applies the change and
/// rewrites it in full before returning.
///
/// Mutations hold an exclusive lock on `<file>.lock`, so handles in other processes never
/// interleave a load and a save.
pub struct BookmarkStore {
    path: PathBuf,
    lock_path: PathBuf,
    write_lock: Mutex<()>,
}

/// Exclusive lock on the store's sidecar lock file, released on drop.
struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl BookmarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_name),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<BookmarkRecord>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => parse_document(&text),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    target: "store",
                    path = %self.path.display(),
                    "bookmark file not found; treating as empty"
                );
                Ok(Vec::new())
            }
            Err(err) => Err(self.io_error(err)),
        }
    }

    /// Replaces the file contents through a rename so readers never see a partial write.
    pub fn save(&self, records: &[BookmarkRecord]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|err| self.io_error(err))?;
        tmp.write_all(render_document(records).as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|err| self.io_error(err))?;
        tmp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }

    pub fn add(&self, url: &str, date_added: NaiveDateTime) -> Result<AddOutcome, StoreError> {
        if url.contains(',') {
            return Err(StoreError::UnsupportedUrl(url.to_string()));
        }

        let _guard = self.write_lock.lock();
        let _file_lock = self.lock_file()?;
        let mut records = self.load()?;
        if records.iter().any(|record| record.url == url) {
            return Ok(AddOutcome::Duplicate);
        }
        records.push(BookmarkRecord::new(url, date_added));
        self.save(&records)?;
        tracing::info!(target: "store", url = %url, "bookmark added");
        Ok(AddOutcome::Added)
    }

    /// Removes the first record for `url`. Returns false, leaving the file untouched, when absent.
    pub fn remove(&self, url: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let _file_lock = self.lock_file()?;
        let mut records = self.load()?;
        let Some(index) = records.iter().position(|record| record.url == url) else {
            return Ok(false);
        };
        records.remove(index);
        self.save(&records)?;
        tracing::debug!(target: "store", url = %url, "bookmark removed");
        Ok(true)
    }

    pub fn set_flag(&self, url: &str, too_large: bool) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let _file_lock = self.lock_file()?;
        let mut records = self.load()?;
        let Some(record) = records.iter_mut().find(|record| record.url == url) else {
            return Ok(false);
        };
        record.too_large = too_large;
        self.save(&records)?;
        tracing::debug!(target: "store", url = %url, too_large, "bookmark flag updated");
        Ok(true)
    }

    fn lock_file(&self) -> Result<FileLock, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|err| self.io_error(err))?;
        file.lock_exclusive().map_err(|err| self.io_error(err))?;
        Ok(FileLock { file })
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
