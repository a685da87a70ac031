pub mod file;
pub mod mem;

use std::io;

pub use file::FileStore;
pub use mem::MemoryStore;

/// Where a [`crate::ChunkFileEditor`] keeps its serialized container.
///
/// Every save replaces the whole content, there is no locking or versioning
/// between two editors bound to the same store.
pub trait Store: Send {
    /// The stored bytes, `None` when nothing was ever stored.
    fn load(&mut self) -> io::Result<Option<Vec<u8>>>;

    fn save(&mut self, data: &[u8]) -> io::Result<()>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn load(&mut self) -> io::Result<Option<Vec<u8>>> {
        (**self).load()
    }

    fn save(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).save(data)
    }
}
