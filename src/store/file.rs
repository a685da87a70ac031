use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::store::Store;

/// A plain file, rewritten in place on every save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for FileStore {
    fn load(&mut self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => {
                debug!("loaded {} bytes from {}", data.len(), self.path.display());
                Ok(Some(data))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&mut self, data: &[u8]) -> io::Result<()> {
        debug!("writing {} bytes to {}", data.len(), self.path.display());
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("absent.bin"));

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn overwrite_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("chunks.bin"));

        store.save(b"Test Data").unwrap();
        store.save(b"Data").unwrap();

        assert_eq!(store.load().unwrap(), Some(b"Data".to_vec()));
        assert_eq!(fs::read(store.path()).unwrap(), b"Data".to_vec());
    }

    #[test]
    fn unreadable_is_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory can't be read as a file
        let mut store = FileStore::new(dir.path());

        assert!(store.load().is_err());
    }
}
