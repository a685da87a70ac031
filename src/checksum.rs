//! Checksum algorithms for layouts that declare a checksum field.
//!
//! The engine treats checksum fields as plain integers. Formats that want
//! integrity checks pick one of these (or their own) and hand it to
//! [`crate::ChunkFileSpec::seal`] before writing and
//! [`crate::ChunkFileSpec::verify`] after reading.
use std::hash::Hasher as StdHasher;

use twox_hash::XxHash32;

use crate::chunk::Chunk;
use crate::chunk_spec::ChunkSpec;
use crate::field::FieldType;

pub trait ChunkChecksum {
    fn compute(&self, spec: &ChunkSpec, chunk: &Chunk) -> i64;
}

/// CRC-32 over the type tag bytes and the payload, as PNG does it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl ChunkChecksum for Crc32 {
    fn compute(&self, spec: &ChunkSpec, chunk: &Chunk) -> i64 {
        let mut hash = crc32fast::Hasher::new();
        if let (Some(field), Some(value)) = (
            spec.get_field(FieldType::CharType),
            chunk.header.char_type(),
        ) {
            hash.update(&field.tag_bytes(value));
        }
        hash.update(&chunk.data);
        hash.finalize() as i64
    }
}

/// xxHash32 (seed 0) of the payload only.
#[derive(Debug, Clone, Copy, Default)]
pub struct XxHash;

impl ChunkChecksum for XxHash {
    fn compute(&self, _spec: &ChunkSpec, chunk: &Chunk) -> i64 {
        let mut hash = XxHash32::with_seed(0);
        hash.write(&chunk.data);
        hash.finish() as u32 as i64
    }
}

impl<F> ChunkChecksum for F
where
    F: Fn(&ChunkSpec, &Chunk) -> i64,
{
    fn compute(&self, spec: &ChunkSpec, chunk: &Chunk) -> i64 {
        self(spec, chunk)
    }
}
