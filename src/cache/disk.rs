//! Disk Store Module
//!
//! Best-effort persistence of raw payloads, one file per cache key.
//!
//! Staleness is encoded in each file's modification time: a fresh write stamps
//! "now", and invalidation rewinds the stamp so that readers with a typical
//! expiration age see the entry as stale while the bytes stay available.
//! [`DiskStore`] hides that encoding so a different backend can be swapped in.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use filetime::FileTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;

// == Disk Store Trait ==
/// Synchronous, thread-safe storage of byte blobs at derived paths.
///
/// Every method blocks on the filesystem. Callers on latency-sensitive threads
/// should dispatch to a blocking pool.
pub trait DiskStore: Send + Sync {
    /// Returns true if a regular file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Reads the whole entry, or `None` if it is missing or unreadable.
    fn read(&self, path: &Path) -> Option<Vec<u8>>;

    /// Reads the entry along with its timestamp if it is no older than
    /// `max_age`. `None` or a zero age never expires.
    fn read_if_fresh(&self, path: &Path, max_age: Option<Duration>)
        -> Option<(Vec<u8>, SystemTime)>;

    /// Replaces the entry at `path` with `bytes`, all or nothing.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Removes the entry. Missing entries are not an error.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Removes everything under `root`, keeping `root` itself.
    fn remove_all(&self, root: &Path) -> Result<()>;

    /// Marks the entry as `age` old without touching its bytes.
    fn invalidate(&self, path: &Path, age: Duration) -> Result<()>;

    /// Invalidates every entry under `root`, returning how many were touched.
    fn invalidate_all(&self, root: &Path, age: Duration) -> Result<usize>;

    /// Relocates an entry, replacing whatever is at `to`.
    fn move_entry(&self, from: &Path, to: &Path) -> Result<()>;
}

// == Filesystem Disk Store ==
/// [`DiskStore`] backed by plain files and their modification times.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDiskStore;

impl FsDiskStore {
    /// Creates a new filesystem store.
    pub fn new() -> Self {
        Self
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl DiskStore for FsDiskStore {
    fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
    }

    fn read(&self, path: &Path) -> Option<Vec<u8>> {
        match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                // Misses are expected; only unexpected failures are worth a log line.
                if err.kind() != io::ErrorKind::NotFound {
                    debug!(path = %path.display(), error = %err, "failed to read cache file");
                }
                None
            }
        }
    }

    fn read_if_fresh(
        &self,
        path: &Path,
        max_age: Option<Duration>,
    ) -> Option<(Vec<u8>, SystemTime)> {
        let meta = match fs::metadata(path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return None,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    debug!(path = %path.display(), error = %err, "failed to stat cache file");
                }
                return None;
            }
        };
        let modified = meta.modified().ok()?;

        if let Some(max_age) = max_age.filter(|age| !age.is_zero()) {
            // An mtime in the future counts as brand new.
            let age = SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO);
            if age > max_age {
                debug!(path = %path.display(), ?age, ?max_age, "cache file is stale");
                return None;
            }
        }

        self.read(path).map(|bytes| (bytes, modified))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        atomic_write(path, bytes)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn remove_all(&self, root: &Path) -> Result<()> {
        if !root.exists() {
            return Ok(());
        }

        let mut failures = 0usize;
        // Children before parents so directories are empty when we reach them.
        for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
            let entry = match entry {
                Ok(entry) => entry,
                // Vanished mid-walk or unreadable; carry on with the rest.
                Err(_) => continue,
            };
            let result = if entry.file_type().is_dir() {
                fs::remove_dir(entry.path())
            } else {
                fs::remove_file(entry.path())
            };
            match result {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    failures += 1;
                    debug!(path = %entry.path().display(), error = %err, "failed to remove cache entry");
                }
            }
        }

        if failures > 0 {
            warn!(root = %root.display(), failures, "disk cache was only partially cleared");
        }
        Ok(())
    }

    fn invalidate(&self, path: &Path, age: Duration) -> Result<()> {
        let stamp = FileTime::from_system_time(rewound_now(age));
        match filetime::set_file_mtime(path, stamp) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn invalidate_all(&self, root: &Path, age: Duration) -> Result<usize> {
        let stamp = FileTime::from_system_time(rewound_now(age));
        let mut touched = 0usize;

        for entry in WalkDir::new(root).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match filetime::set_file_mtime(entry.path(), stamp) {
                Ok(()) => touched += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    debug!(path = %entry.path().display(), error = %err, "failed to invalidate cache file");
                }
            }
        }

        Ok(touched)
    }

    fn move_entry(&self, from: &Path, to: &Path) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        match rename_replacing(from, to) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound && !from.exists() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Current time minus `age`, clamped to the Unix epoch.
fn rewound_now(age: Duration) -> SystemTime {
    SystemTime::now()
        .checked_sub(age)
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

// == Atomic Write ==
/// Writes `bytes` to a unique sibling temp file, syncs it, then renames it over
/// `path`. Readers see either the previous entry or the new one.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let (tmp_path, mut file) = open_unique_tmp_file(path, parent)?;
    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    drop(file);

    if let Err(err) = written.and_then(|()| rename_replacing(&tmp_path, path)) {
        if let Err(remove_err) = fs::remove_file(&tmp_path) {
            if remove_err.kind() != io::ErrorKind::NotFound {
                debug!(path = %tmp_path.display(), error = %remove_err, "failed to remove temporary file");
            }
        }
        return Err(err.into());
    }
    Ok(())
}

fn open_unique_tmp_file(dest: &Path, parent: &Path) -> io::Result<(PathBuf, fs::File)> {
    let file_name = dest
        .file_name()
        .ok_or_else(|| io::Error::other("destination path has no file name"))?;
    let pid = std::process::id();

    loop {
        let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(format!(".tmp.{}.{}", pid, counter));
        let tmp_path = parent.join(tmp_name);

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
        {
            Ok(file) => return Ok((tmp_path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
}

/// `fs::rename` that also replaces an existing destination on Windows.
fn rename_replacing(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(err) if cfg!(windows) && to.exists() => {
            match fs::remove_file(to) {
                Ok(()) => {}
                Err(remove_err) if remove_err.kind() == io::ErrorKind::NotFound => {}
                Err(_) => return Err(err),
            }
            fs::rename(from, to)
        }
        other => other,
    }
}
