use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use crate::store::Store;

/// In memory store, clones share the same content.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    content: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_content(data: Vec<u8>) -> Self {
        MemoryStore {
            content: Arc::new(Mutex::new(Some(data))),
        }
    }

    pub fn content(&self) -> Option<Vec<u8>> {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Store for MemoryStore {
    fn load(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.content())
    }

    fn save(&mut self, data: &[u8]) -> io::Result<()> {
        *self.content.lock().unwrap_or_else(PoisonError::into_inner) = Some(data.to_vec());
        Ok(())
    }
}
