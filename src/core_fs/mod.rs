//! Filesystem collaborators: the traits consumed by the command dispatcher,
//! the local-disk adapter and the ls-style listing text.

mod list;
mod local;
mod path;

pub use list::list_line;
pub use local::LocalFileSystem;
pub use path::clean;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;

/// Metadata for one file or directory entry.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    /// Unix permission bits.
    pub mode: u32,
    pub modified: DateTime<Utc>,
    pub is_dir: bool,
}

/// The filesystem surface expected by a `FileHandler`. Implementations
/// should fail with the std::io error kinds (`NotFound`, `PermissionDenied`,
/// `AlreadyExists`) so that failed commands map to informative reply codes.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Create a new file.
    async fn create(&self, path: &str) -> io::Result<Box<dyn File>>;

    /// Open a file or directory.
    async fn open(&self, path: &str) -> io::Result<Box<dyn File>>;

    /// Stat a file or directory.
    async fn stat(&self, path: &str) -> io::Result<FileInfo>;

    /// Make a new directory.
    async fn mkdir(&self, path: &str) -> io::Result<()>;

    /// Remove a file or directory.
    async fn remove(&self, path: &str) -> io::Result<()>;

    /// Rename a file or directory.
    async fn rename(&self, old: &str, new: &str) -> io::Result<()>;
}

/// A handle returned by [`FileSystem::open`] and [`FileSystem::create`].
#[async_trait]
pub trait File: Send {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Read the entries of a directory handle.
    async fn readdir(&mut self) -> io::Result<Vec<FileInfo>>;

    async fn close(&mut self) -> io::Result<()>;
}
