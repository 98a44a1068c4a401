//! An in-memory filesystem for the end-to-end tests. Writes are committed
//! when the handle is closed, like a real file would flush.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ferroftp::{clean, File, FileInfo, FileSystem};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct MemEntry {
    data: Vec<u8>,
    mode: u32,
    is_dir: bool,
    modified: DateTime<Utc>,
}

#[derive(Clone)]
pub struct MemFs {
    entries: Arc<Mutex<HashMap<String, MemEntry>>>,
}

#[allow(dead_code)]
impl MemFs {
    pub fn new() -> MemFs {
        let fs = MemFs {
            entries: Arc::new(Mutex::new(HashMap::new())),
        };
        fs.add_dir("/");
        fs
    }

    pub fn add_dir(&self, path: &str) {
        self.entries.lock().unwrap().insert(
            clean(path),
            MemEntry {
                data: Vec::new(),
                mode: 0o755,
                is_dir: true,
                modified: Utc::now(),
            },
        );
    }

    pub fn add_file(&self, path: &str, data: &[u8]) {
        self.entries.lock().unwrap().insert(
            clean(path),
            MemEntry {
                data: data.to_vec(),
                mode: 0o644,
                is_dir: false,
                modified: Utc::now(),
            },
        );
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .unwrap()
            .get(&clean(path))
            .map(|e| e.data.clone())
    }

    fn info(path: &str, entry: &MemEntry) -> FileInfo {
        let name = match path.rsplit('/').next() {
            Some("") | None => "/".to_string(),
            Some(name) => name.to_string(),
        };
        FileInfo {
            name,
            size: entry.data.len() as u64,
            mode: entry.mode,
            modified: entry.modified,
            is_dir: entry.is_dir,
        }
    }
}

#[async_trait]
impl FileSystem for MemFs {
    async fn create(&self, path: &str) -> io::Result<Box<dyn File>> {
        Ok(Box::new(MemFile {
            fs: self.clone(),
            path: clean(path),
            reader: None,
            writer: Some(Vec::new()),
        }))
    }

    async fn open(&self, path: &str) -> io::Result<Box<dyn File>> {
        let path = clean(path);
        let entries = self.entries.lock().unwrap();
        let entry = entries
            .get(&path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        Ok(Box::new(MemFile {
            fs: self.clone(),
            path: path.clone(),
            reader: Some((entry.data.clone(), 0)),
            writer: None,
        }))
    }

    async fn stat(&self, path: &str) -> io::Result<FileInfo> {
        let path = clean(path);
        let entries = self.entries.lock().unwrap();
        let entry = entries
            .get(&path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        Ok(MemFs::info(&path, entry))
    }

    async fn mkdir(&self, path: &str) -> io::Result<()> {
        let path = clean(path);
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&path) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        entries.insert(
            path,
            MemEntry {
                data: Vec::new(),
                mode: 0o755,
                is_dir: true,
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, path: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap();
        match entries.remove(&clean(path)) {
            Some(_) => Ok(()),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }

    async fn rename(&self, old: &str, new: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap();
        match entries.remove(&clean(old)) {
            Some(entry) => {
                entries.insert(clean(new), entry);
                Ok(())
            }
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}

struct MemFile {
    fs: MemFs,
    path: String,
    reader: Option<(Vec<u8>, usize)>,
    writer: Option<Vec<u8>>,
}

#[async_trait]
impl File for MemFile {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some((data, pos)) = self.reader.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::Other, "not open for reading"));
        };
        let n = (data.len() - *pos).min(buf.len());
        buf[..n].copy_from_slice(&data[*pos..*pos + n]);
        *pos += n;
        Ok(n)
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.get_or_insert_with(Vec::new).extend_from_slice(buf);
        Ok(())
    }

    async fn readdir(&mut self) -> io::Result<Vec<FileInfo>> {
        let entries = self.fs.entries.lock().unwrap();
        let prefix = if self.path == "/" {
            "/".to_string()
        } else {
            format!("{}/", self.path)
        };
        let mut out = Vec::new();
        for (key, entry) in entries.iter() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                if !rest.is_empty() && !rest.contains('/') {
                    out.push(MemFs::info(key, entry));
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn close(&mut self) -> io::Result<()> {
        if let Some(data) = self.writer.take() {
            self.fs.entries.lock().unwrap().insert(
                self.path.clone(),
                MemEntry {
                    data,
                    mode: 0o644,
                    is_dir: false,
                    modified: Utc::now(),
                },
            );
        }
        Ok(())
    }
}
