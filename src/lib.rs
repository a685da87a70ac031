//! Reading and writing chunked binary containers
//!
//! Containers like IFF, RIFF, PNG or ICNS are a file header followed by a
//! list of chunks, each chunk being a small header and a payload. This crate
//! describes those layouts with [`ChunkFileSpec`] and reads or writes any
//! container matching one. [`ChunkFileEditor`] adds keyed editing on top.
pub mod checksum;
pub mod chunk;
pub mod chunk_spec;
pub mod editor;
pub mod error;
pub mod field;
pub mod file_spec;
pub mod store;

pub use checksum::{ChunkChecksum, Crc32, XxHash};
pub use chunk::{Chunk, ChunkFile, Header};
pub use chunk_spec::ChunkSpec;
pub use editor::{ChunkFileEditor, CreatePolicy};
pub use error::{Error, Result};
pub use field::{FieldSize, FieldSpec, FieldType};
pub use file_spec::{ChunkEntry, ChunkFileSpec, ChunkIndex, Termination, WELL_KNOWN};
pub use store::{FileStore, MemoryStore, Store};
