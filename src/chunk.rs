use std::fmt;

use crate::field::FieldType;

const SLOTS: usize = FieldType::ALL.len();

/// Decoded header fields, one optional slot per [`FieldType`].
///
/// A missing slot means the layout does not declare that field, which is not
/// the same thing as a declared field holding 0.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Header {
    slots: [Option<i64>; SLOTS],
}

impl Header {
    pub fn new() -> Self {
        Header::default()
    }

    pub fn get(&self, typ: FieldType) -> Option<i64> {
        self.slots[typ.index()]
    }

    pub fn contains(&self, typ: FieldType) -> bool {
        self.slots[typ.index()].is_some()
    }

    pub fn set(&mut self, typ: FieldType, value: i64) {
        self.slots[typ.index()] = Some(value);
    }

    /// Only touches fields that are already present.
    pub fn update(&mut self, typ: FieldType, value: i64) -> bool {
        match &mut self.slots[typ.index()] {
            Some(v) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, typ: FieldType) -> Option<i64> {
        self.slots[typ.index()].take()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldType, i64)> + '_ {
        FieldType::ALL
            .iter()
            .filter_map(move |t| self.get(*t).map(|v| (*t, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn char_type(&self) -> Option<i64> {
        self.get(FieldType::CharType)
    }

    pub fn num_type(&self) -> Option<i64> {
        self.get(FieldType::NumericType)
    }

    pub fn id(&self) -> Option<i64> {
        self.get(FieldType::IdNumber)
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl FromIterator<(FieldType, i64)> for Header {
    fn from_iter<I: IntoIterator<Item = (FieldType, i64)>>(iter: I) -> Self {
        let mut header = Header::new();
        for (typ, value) in iter {
            header.set(typ, value);
        }
        header
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub header: Header,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn new(header: Header, data: Vec<u8>) -> Self {
        Chunk { header, data }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkFile {
    pub header: Header,
    pub chunks: Vec<Chunk>,
}

impl ChunkFile {
    pub fn new(header: Header) -> Self {
        ChunkFile {
            header,
            chunks: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn push(&mut self, chunk: Chunk) {
        self.chunks.push(chunk);
    }

    pub fn insert(&mut self, index: usize, chunk: Chunk) {
        self.chunks.insert(index, chunk);
    }

    pub fn remove(&mut self, index: usize) -> Option<Chunk> {
        if index < self.chunks.len() {
            Some(self.chunks.remove(index))
        } else {
            None
        }
    }

    /// Returns the chunk that was replaced.
    pub fn replace(&mut self, index: usize, chunk: Chunk) -> Option<Chunk> {
        self.chunks
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, chunk))
    }

    pub fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }
}
