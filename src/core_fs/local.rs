use super::{clean, File, FileInfo, FileSystem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::trace;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A `FileSystem` that serves a directory of the local disk. Every path is
/// cleaned and re-rooted under `root`, so directory traversal cannot escape
/// it.
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> LocalFileSystem {
        LocalFileSystem { root: root.into() }
    }

    fn resolve(&self, p: &str) -> PathBuf {
        let cleaned = clean(&format!("/{p}"));
        self.root.join(cleaned.trim_start_matches('/'))
    }
}

impl Default for LocalFileSystem {
    fn default() -> LocalFileSystem {
        LocalFileSystem::new(".")
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn create(&self, path: &str) -> io::Result<Box<dyn File>> {
        let path = self.resolve(path);
        trace!("create {:?}", path);
        let file = fs::File::create(&path).await?;
        Ok(Box::new(LocalFile {
            path,
            file: Some(file),
        }))
    }

    async fn open(&self, path: &str) -> io::Result<Box<dyn File>> {
        let path = self.resolve(path);
        trace!("open {:?}", path);
        // Directories open fine; reading one fails later, listing works.
        let file = fs::File::open(&path).await?;
        Ok(Box::new(LocalFile {
            path,
            file: Some(file),
        }))
    }

    async fn stat(&self, path: &str) -> io::Result<FileInfo> {
        let path = self.resolve(path);
        let md = fs::metadata(&path).await?;
        Ok(file_info(&path, &md))
    }

    async fn mkdir(&self, path: &str) -> io::Result<()> {
        fs::create_dir(self.resolve(path)).await
    }

    async fn remove(&self, path: &str) -> io::Result<()> {
        let path = self.resolve(path);
        if fs::metadata(&path).await?.is_dir() {
            fs::remove_dir(&path).await
        } else {
            fs::remove_file(&path).await
        }
    }

    async fn rename(&self, old: &str, new: &str) -> io::Result<()> {
        fs::rename(self.resolve(old), self.resolve(new)).await
    }
}

struct LocalFile {
    path: PathBuf,
    file: Option<fs::File>,
}

impl LocalFile {
    fn file(&mut self) -> io::Result<&mut fs::File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "file is closed"))
    }
}

#[async_trait]
impl File for LocalFile {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file()?.read(buf).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file()?.write_all(buf).await
    }

    async fn readdir(&mut self) -> io::Result<Vec<FileInfo>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let md = entry.metadata().await?;
            entries.push(file_info(&entry.path(), &md));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn close(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        Ok(())
    }
}

fn file_info(path: &Path, md: &std::fs::Metadata) -> FileInfo {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string());
    let modified = md
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    FileInfo {
        name,
        size: md.len(),
        mode: unix_mode(md),
        modified,
        is_dir: md.is_dir(),
    }
}

#[cfg(unix)]
fn unix_mode(md: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    md.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn unix_mode(md: &std::fs::Metadata) -> u32 {
    if md.is_dir() {
        0o755
    } else {
        0o644
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_keeps_paths_under_the_root() {
        let fs = LocalFileSystem::new("/srv/ftp");
        assert_eq!(fs.resolve("/a.txt"), PathBuf::from("/srv/ftp/a.txt"));
        assert_eq!(fs.resolve("a.txt"), PathBuf::from("/srv/ftp/a.txt"));
        assert_eq!(
            fs.resolve("/../../etc/passwd"),
            PathBuf::from("/srv/ftp/etc/passwd")
        );
        assert_eq!(fs.resolve(""), PathBuf::from("/srv/ftp"));
    }
}
