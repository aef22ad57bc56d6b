//! File-based storage
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/
//!   <project-id>/
//!     project.json        project record
//!     graph.json          module graph
//!     artifacts/<type>.json
//!     .lock               advisory lock for read-increment-write cycles
//! ```

pub mod artifacts;

pub use artifacts::FileArtifactStore;

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Common file operations result type
pub type FileResult<T> = Result<T, String>;

/// Per-project configuration directory
pub fn get_specforge_dir(project_path: &Path) -> PathBuf {
    project_path.join(".specforge")
}

/// Default storage root when none is configured
pub fn default_storage_root() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("specforge")
        .join("projects")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> FileResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| format!("Failed to create directory {:?}: {}", path, e))?;
    }
    Ok(())
}

/// Write data to a file atomically (temp file + rename)
pub fn atomic_write(path: &Path, content: &str) -> FileResult<()> {
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    fs::write(&temp_path, content)
        .map_err(|e| format!("Failed to write temp file {:?}: {}", temp_path, e))?;

    fs::rename(&temp_path, path)
        .map_err(|e| format!("Failed to rename {:?} to {:?}: {}", temp_path, path, e))?;

    Ok(())
}

/// Read a JSON file and deserialize it
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> FileResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file {:?}: {}", path, e))?;

    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse JSON from {:?}: {}", path, e))
}

/// Write data as pretty-printed JSON atomically
pub fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> FileResult<()> {
    let content = serde_json::to_string_pretty(data)
        .map_err(|e| format!("Failed to serialize to JSON: {}", e))?;

    atomic_write(path, &content)
}

/// How long [`FileLock::acquire`] keeps retrying a lock held elsewhere
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY_START: Duration = Duration::from_millis(5);
const LOCK_RETRY_MAX: Duration = Duration::from_millis(100);

/// Exclusive advisory lock held until dropped
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquire the lock at `path`, waiting at most [`LOCK_TIMEOUT`]
    pub fn acquire(path: &Path) -> FileResult<Self> {
        Self::acquire_with_timeout(path, LOCK_TIMEOUT)
    }

    /// Poll a non-blocking lock with exponential backoff. The calling thread
    /// sleeps between polls, never longer than `timeout` in total.
    pub fn acquire_with_timeout(path: &Path, timeout: Duration) -> FileResult<Self> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| format!("Failed to open lock file {:?}: {}", path, e))?;

        let contended = fs2::lock_contended_error().raw_os_error();
        let deadline = Instant::now() + timeout;
        let mut delay = LOCK_RETRY_START;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(Self { file }),
                Err(e) if e.raw_os_error() == contended => {}
                Err(e) => return Err(format!("Failed to lock {:?}: {}", path, e)),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(format!(
                    "Timed out after {:?} waiting for lock {:?}",
                    timeout, path
                ));
            }
            log::debug!("[FileStorage] Lock {:?} is held, retrying in {:?}", path, delay);
            std::thread::sleep(delay.min(deadline - now));
            delay = (delay * 2).min(LOCK_RETRY_MAX);
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::warn!("[FileStorage] Failed to release lock: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_specforge_dir() {
        let dir = get_specforge_dir(Path::new("/home/user/my-app"));
        assert_eq!(dir, PathBuf::from("/home/user/my-app/.specforge"));
    }

    #[test]
    fn test_ensure_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b").join("c");

        assert!(!nested_path.exists());
        ensure_dir(&nested_path).unwrap();
        assert!(nested_path.exists());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("graph.json");

        atomic_write(&file_path, "{}").unwrap();
        atomic_write(&file_path, "{\"nodes\": []}").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{\"nodes\": []}");
        assert!(!temp_dir.path().join("graph.tmp").exists());
    }

    #[test]
    fn test_read_write_json() {
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
        struct TestData {
            name: String,
            value: i32,
        }

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nested").join("test.json");
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        write_json(&file_path, &data).unwrap();
        let read_data: TestData = read_json(&file_path).unwrap();
        assert_eq!(data, read_data);
    }

    #[test]
    fn test_read_json_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");
        let err = read_json::<serde_json::Value>(&missing).unwrap_err();
        assert!(err.contains("missing.json"));
    }

    #[test]
    fn test_lock_is_reentrant_after_drop() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".lock");
        {
            let _lock = FileLock::acquire(&lock_path).unwrap();
        }
        let _again = FileLock::acquire(&lock_path).unwrap();
    }

    #[test]
    fn test_held_lock_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".lock");
        let _held = FileLock::acquire(&lock_path).unwrap();

        let started = Instant::now();
        let err = FileLock::acquire_with_timeout(&lock_path, Duration::from_millis(60))
            .err()
            .unwrap();
        assert!(err.contains("Timed out"), "{}", err);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_waiter_gets_lock_once_released() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".lock");
        let held = FileLock::acquire(&lock_path).unwrap();

        let releaser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            drop(held);
        });
        let _lock = FileLock::acquire_with_timeout(&lock_path, Duration::from_secs(5)).unwrap();
        releaser.join().unwrap();
    }
}
