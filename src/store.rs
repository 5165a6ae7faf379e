//! One-shot thumbnail storage.
//!
//! A rendered thumbnail is parked under a numeric id until it is downloaded,
//! and downloading it removes it. [`ThumbnailStore`] is the seam; [`DiskStore`]
//! keeps each thumbnail as `<dir>/<id>.jpg`.
//!
//! `take_once` claims a file by renaming it before reading, so when two
//! downloads race for the same id exactly one of them gets the bytes.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No thumbnail with id {0}")]
    NotFound(ThumbnailId),
}

/// Identifier a client uses to fetch its thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThumbnailId(pub u64);

impl fmt::Display for ThumbnailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ThumbnailId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Hands out ids based on the wall clock in milliseconds.
///
/// Two requests in the same millisecond would collide, so an id is never
/// smaller than `last + 1`.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> ThumbnailId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return ThumbnailId(candidate),
                Err(actual) => last = actual,
            }
        }
    }
}

/// Storage for rendered thumbnails that can each be read exactly once.
pub trait ThumbnailStore: Send + Sync {
    /// Persist `bytes` under `id`, replacing anything already there.
    fn store(&self, id: ThumbnailId, bytes: &[u8]) -> Result<(), StoreError>;

    /// Return the bytes stored under `id` and forget them.
    fn take_once(&self, id: ThumbnailId) -> Result<Vec<u8>, StoreError>;
}

/// Thumbnails as files in a single directory.
#[derive(Debug)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Open the store, creating `dir` if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: ThumbnailId) -> PathBuf {
        self.dir.join(format!("{id}.jpg"))
    }
}

impl ThumbnailStore for DiskStore {
    fn store(&self, id: ThumbnailId, bytes: &[u8]) -> Result<(), StoreError> {
        // Write then rename, so a half-written file is never served
        let partial = self.dir.join(format!("{id}.jpg.partial"));
        let written =
            fs::write(&partial, bytes).and_then(|()| fs::rename(&partial, self.path_for(id)));
        if let Err(e) = written {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        Ok(())
    }

    fn take_once(&self, id: ThumbnailId) -> Result<Vec<u8>, StoreError> {
        let claimed = self.dir.join(format!("{id}.jpg.taken"));
        match fs::rename(self.path_for(id), &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(id)),
            Err(e) => return Err(e.into()),
        }

        let bytes = fs::read(&claimed);
        // A leftover .taken file is never served
        if let Err(e) = fs::remove_file(&claimed) {
            warn!(path = %claimed.display(), error = %e, "could not remove taken thumbnail");
        }
        Ok(bytes?)
    }
}
