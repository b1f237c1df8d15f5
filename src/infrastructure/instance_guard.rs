use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    process, thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

const LOCK_FILENAME: &str = ".digest.lock";
const WAIT_INTERVAL: Duration = Duration::from_millis(500);
const MAX_WAIT: Duration = Duration::from_secs(20);

/// Exclusive lock on the data directory, so only one process drains the bookmark store at a time.
/// Released when dropped or when the process dies.
#[derive(Debug)]
pub struct InstanceGuard {
    file: File,
    path: PathBuf,
}

impl InstanceGuard {
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        Self::acquire_within(data_dir, MAX_WAIT)
    }

    fn acquire_within(data_dir: &Path, max_wait: Duration) -> Result<Self> {
        let lock_path = data_dir.join(LOCK_FILENAME);
        let start = Instant::now();
        let mut announced = false;

        loop {
            let mut file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)
                .with_context(|| format!("failed to open lock file {}", lock_path.display()))?;

            match file.try_lock_exclusive() {
                Ok(()) => {
                    write_lock_info(&mut file, process::id())?;
                    tracing::debug!(
                        target: "lifecycle",
                        pid = process::id(),
                        path = %lock_path.display(),
                        "acquired store lock"
                    );
                    return Ok(Self {
                        file,
                        path: lock_path,
                    });
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if !announced {
                        announced = true;
                        tracing::info!(
                            target: "lifecycle",
                            holder = ?read_lock_info(&lock_path).map(|info| info.pid),
                            "another run holds the store lock; waiting"
                        );
                    }
                }
                Err(err) => return Err(err.into()),
            }

            if start.elapsed() >= max_wait {
                let holder = read_lock_info(&lock_path)
                    .map(|info| format!(" by pid {}", info.pid))
                    .unwrap_or_default();
                return Err(anyhow!(
                    "store lock {} is held{}; waited {:?}",
                    lock_path.display(),
                    holder,
                    max_wait
                ));
            }

            drop(file);
            thread::sleep(WAIT_INTERVAL);
        }
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::warn!(
                target: "lifecycle",
                path = %self.path.display(),
                error = %err,
                "failed to release store lock"
            );
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    started_at: i64,
}

fn write_lock_info(file: &mut File, pid: u32) -> Result<()> {
    let info = LockInfo {
        pid,
        started_at: Utc::now().timestamp_millis(),
    };
    let payload = serde_json::to_vec(&info)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&payload)?;
    file.sync_all()?;
    Ok(())
}

fn read_lock_info(lock_path: &Path) -> Option<LockInfo> {
    let contents = fs::read_to_string(lock_path).ok()?;
    serde_json::from_str(contents.trim()).ok()
}
