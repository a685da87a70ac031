//! Keyed editing of a container
//!
//! Chunks are addressed by `(char type, numeric type, id)`. Any part can be
//! `None` to mean "any". Layouts without an id field address chunks by their
//! position among the chunks matching the type filters instead.
use std::collections::HashSet;
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::chunk::{Chunk, ChunkFile, Header};
use crate::error::{Error, Result};
use crate::field::FieldType;
use crate::file_spec::ChunkFileSpec;
use crate::store::Store;

/// What [`ChunkFileEditor::open`] does about the store's existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePolicy {
    /// Load it, fail if there is nothing to load
    Never,
    /// Load it unless it is absent or empty, then start a fresh container
    IfEmpty,
    /// Start a fresh container no matter what is stored
    Always,
}

type Identity = (Option<i64>, Option<i64>, Option<i64>);

struct Session {
    file: ChunkFile,
    store: Option<Box<dyn Store>>,
}

pub struct ChunkFileEditor {
    spec: ChunkFileSpec,
    session: Mutex<Session>,
}

impl ChunkFileEditor {
    pub fn new(spec: ChunkFileSpec) -> Self {
        let file = spec.create_chunk_file();
        ChunkFileEditor::from_chunk_file(spec, file)
    }

    pub fn from_chunk_file(spec: ChunkFileSpec, file: ChunkFile) -> Self {
        ChunkFileEditor {
            spec,
            session: Mutex::new(Session { file, store: None }),
        }
    }

    pub fn open<S: Store + 'static>(
        spec: ChunkFileSpec,
        mut store: S,
        policy: CreatePolicy,
    ) -> Result<Self> {
        let existing = match policy {
            CreatePolicy::Always => None,
            _ => store.load().map_err(Error::StoreUnavailable)?,
        };

        let file = match (policy, existing) {
            (CreatePolicy::Never, None) => {
                return Err(Error::StoreUnavailable(io::Error::new(
                    io::ErrorKind::NotFound,
                    "store holds no container",
                )))
            }
            (CreatePolicy::Never, Some(data)) => spec.decode(&data)?,
            (_, Some(data)) if !data.is_empty() => spec.decode(&data)?,
            _ => {
                debug!("creating a fresh container ({:?})", policy);
                let file = spec.create_chunk_file();
                store
                    .save(&spec.encode(&file)?)
                    .map_err(Error::StoreUnavailable)?;
                file
            }
        };
        debug!("opened container with {} chunks", file.chunks.len());

        Ok(ChunkFileEditor {
            spec,
            session: Mutex::new(Session {
                file,
                store: Some(Box::new(store)),
            }),
        })
    }

    // Not re-entrant, never call back into a locking method while holding it
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn spec(&self) -> &ChunkFileSpec {
        &self.spec
    }

    fn has_field(&self, typ: FieldType) -> bool {
        self.spec.chunk_spec().contains_type(typ)
    }

    fn matches_types(&self, chunk: &Chunk, char_type: Option<i64>, num_type: Option<i64>) -> bool {
        let check = |typ: FieldType, want: Option<i64>| match want {
            Some(want) if self.has_field(typ) => {
                chunk.header.get(typ) == Some(self.narrow(typ, want))
            }
            _ => true,
        };
        check(FieldType::CharType, char_type) && check(FieldType::NumericType, num_type)
    }

    // Ids of the chunks passing the type filters, paired with their index
    fn filtered<'a>(
        &'a self,
        file: &'a ChunkFile,
        char_type: Option<i64>,
        num_type: Option<i64>,
    ) -> impl Iterator<Item = (usize, i64)> + 'a {
        let has_id = self.has_field(FieldType::IdNumber);
        file.chunks
            .iter()
            .enumerate()
            .filter(move |(_, c)| self.matches_types(c, char_type, num_type))
            .enumerate()
            .map(move |(position, (index, chunk))| {
                let id = if has_id {
                    chunk.header.id().unwrap_or(0)
                } else {
                    position as i64
                };
                (index, id)
            })
    }

    // Values as the field would read them back, ids wider than the field alias
    fn narrow(&self, typ: FieldType, value: i64) -> i64 {
        match self.spec.chunk_spec().get_field(typ) {
            Some(field) => field.size().normalize(value),
            None => value,
        }
    }

    fn index_of(&self, file: &ChunkFile, (char_type, num_type, id): Identity) -> Option<usize> {
        let id = id.map(|id| self.narrow(FieldType::IdNumber, id));
        self.filtered(file, char_type, num_type)
            .find(|(_, chunk_id)| id.map_or(true, |id| id == *chunk_id))
            .map(|(index, _)| index)
    }

    fn identity(&self, header: &Header) -> Identity {
        let declared = |typ: FieldType| header.get(typ).filter(|_| self.has_field(typ));
        (
            declared(FieldType::CharType),
            declared(FieldType::NumericType),
            declared(FieldType::IdNumber),
        )
    }

    // Fills in whatever declared fields the caller left out, narrows the
    // identity to what gets written and derives the sizes
    fn prepare(&self, mut chunk: Chunk) -> Result<Chunk> {
        for (typ, value) in self.spec.chunk_spec().create_header().iter() {
            match chunk.header.get(typ) {
                None => chunk.header.set(typ, value),
                Some(current) => {
                    if matches!(
                        typ,
                        FieldType::CharType | FieldType::NumericType | FieldType::IdNumber
                    ) {
                        chunk.header.set(typ, self.narrow(typ, current));
                    }
                }
            }
        }
        self.spec.update_sizes(&mut chunk)?;
        Ok(chunk)
    }

    // Fails when the chunk's identity is already taken by a chunk other than `except`
    fn check_unique(&self, file: &ChunkFile, chunk: &Chunk, except: Option<usize>) -> Result<()> {
        if !self.has_field(FieldType::IdNumber) {
            return Ok(());
        }
        let identity = self.identity(&chunk.header);
        match self.index_of(file, identity) {
            Some(index) if Some(index) != except => {
                let (char_type, num_type, id) = identity;
                Err(Error::AlreadyExists {
                    char_type,
                    num_type,
                    id,
                })
            }
            _ => Ok(()),
        }
    }

    /// A chunk carrying the given identity, its sizes derived from `data`.
    pub fn new_chunk(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        id: Option<i64>,
        data: Vec<u8>,
    ) -> Chunk {
        let mut chunk = self.spec.create_chunk(data);
        for (typ, value) in [
            (FieldType::CharType, char_type),
            (FieldType::NumericType, num_type),
            (FieldType::IdNumber, id),
        ] {
            if let Some(value) = value {
                chunk.header.update(typ, value);
            }
        }
        chunk
    }

    pub fn chunk_file(&self) -> ChunkFile {
        self.session().file.clone()
    }

    pub fn into_chunk_file(self) -> ChunkFile {
        self.session
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .file
    }

    pub fn header(&self) -> Header {
        self.session().file.header.clone()
    }

    pub fn set_header(&self, header: Header) {
        self.session().file.header = header;
    }

    pub fn get_chunk_count(&self, char_type: Option<i64>, num_type: Option<i64>) -> usize {
        let session = self.session();
        self.filtered(&session.file, char_type, num_type).count()
    }

    pub fn get_chunk_ids(&self, char_type: Option<i64>, num_type: Option<i64>) -> Vec<i64> {
        let session = self.session();
        self.filtered(&session.file, char_type, num_type)
            .map(|(_, id)| id)
            .collect()
    }

    /// Id of the `position`th chunk matching the type filters.
    pub fn get_chunk_id(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        position: usize,
    ) -> Option<i64> {
        let session = self.session();
        let id = self
            .filtered(&session.file, char_type, num_type)
            .nth(position)
            .map(|(_, id)| id);
        id
    }

    pub fn get_chunk_index(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        id: Option<i64>,
    ) -> Option<usize> {
        let session = self.session();
        self.index_of(&session.file, (char_type, num_type, id))
    }

    pub fn get_chunk(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        id: Option<i64>,
    ) -> Option<Chunk> {
        let session = self.session();
        self.index_of(&session.file, (char_type, num_type, id))
            .map(|index| session.file.chunks[index].clone())
    }

    pub fn get_chunk_at(&self, index: usize) -> Option<Chunk> {
        self.session().file.get(index).cloned()
    }

    pub fn get_attributes(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        id: Option<i64>,
    ) -> Option<Header> {
        self.get_chunk(char_type, num_type, id).map(|c| c.header)
    }

    pub fn get_data(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        id: Option<i64>,
    ) -> Option<Vec<u8>> {
        self.get_chunk(char_type, num_type, id).map(|c| c.data)
    }

    /// Smallest id at or above `start` that no chunk matching the type
    /// filters uses, within what the id field can hold.
    pub fn get_next_available_id(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        start: i64,
    ) -> Result<i64> {
        let session = self.session();
        let used: HashSet<i64> = self
            .filtered(&session.file, char_type, num_type)
            .map(|(_, id)| id)
            .collect();

        let (min, max) = match self.spec.chunk_spec().get_field(FieldType::IdNumber) {
            Some(field) => (field.size().min_value(), field.size().max_value()),
            None => (0, i64::MAX),
        };

        let mut candidate = start.max(min);
        while candidate <= max {
            if !used.contains(&candidate) {
                return Ok(candidate);
            }
            candidate = match candidate.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }
        Err(Error::IdOverflow { start })
    }

    pub fn add(&self, chunk: Chunk) -> Result<()> {
        let chunk = self.prepare(chunk)?;
        let mut session = self.session();
        self.check_unique(&session.file, &chunk, None)?;
        session.file.push(chunk);
        Ok(())
    }

    /// Inserts ahead of the chunk currently holding the identity, appends when there is none.
    pub fn insert(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        id: Option<i64>,
        chunk: Chunk,
    ) -> Result<()> {
        let chunk = self.prepare(chunk)?;
        let mut session = self.session();
        self.check_unique(&session.file, &chunk, None)?;
        match self.index_of(&session.file, (char_type, num_type, id)) {
            Some(index) => session.file.insert(index, chunk),
            None => session.file.push(chunk),
        }
        Ok(())
    }

    pub fn set(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        id: Option<i64>,
        chunk: Chunk,
    ) -> Result<bool> {
        let chunk = self.prepare(chunk)?;
        let mut session = self.session();
        match self.index_of(&session.file, (char_type, num_type, id)) {
            Some(index) => self.replace(&mut session, index, chunk),
            None => Ok(false),
        }
    }

    pub fn set_at(&self, index: usize, chunk: Chunk) -> Result<bool> {
        let chunk = self.prepare(chunk)?;
        let mut session = self.session();
        self.replace(&mut session, index, chunk)
    }

    fn replace(&self, session: &mut Session, index: usize, chunk: Chunk) -> Result<bool> {
        if index >= session.file.len() {
            return Ok(false);
        }
        self.check_unique(&session.file, &chunk, Some(index))?;
        session.file.replace(index, chunk);
        Ok(true)
    }

    pub fn set_attributes(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        id: Option<i64>,
        header: Header,
    ) -> Result<bool> {
        let mut session = self.session();
        match self.index_of(&session.file, (char_type, num_type, id)) {
            Some(index) => self.replace_header(&mut session, index, header),
            None => Ok(false),
        }
    }

    pub fn set_attributes_at(&self, index: usize, header: Header) -> Result<bool> {
        let mut session = self.session();
        self.replace_header(&mut session, index, header)
    }

    fn replace_header(&self, session: &mut Session, index: usize, header: Header) -> Result<bool> {
        let data = match session.file.get(index) {
            Some(chunk) => chunk.data.clone(),
            None => return Ok(false),
        };
        let chunk = self.prepare(Chunk::new(header, data))?;
        self.replace(session, index, chunk)
    }

    pub fn set_data(
        &self,
        char_type: Option<i64>,
        num_type: Option<i64>,
        id: Option<i64>,
        data: Vec<u8>,
    ) -> Result<bool> {
        let mut session = self.session();
        match self.index_of(&session.file, (char_type, num_type, id)) {
            Some(index) => self.replace_data(&mut session, index, data),
            None => Ok(false),
        }
    }

    pub fn set_data_at(&self, index: usize, data: Vec<u8>) -> Result<bool> {
        let mut session = self.session();
        self.replace_data(&mut session, index, data)
    }

    fn replace_data(&self, session: &mut Session, index: usize, data: Vec<u8>) -> Result<bool> {
        let chunk = match session.file.chunks.get_mut(index) {
            Some(chunk) => chunk,
            None => return Ok(false),
        };
        let mut updated = Chunk::new(chunk.header.clone(), data);
        self.spec.update_sizes(&mut updated)?;
        *chunk = updated;
        Ok(true)
    }

    pub fn remove(&self, char_type: Option<i64>, num_type: Option<i64>, id: Option<i64>) -> bool {
        let mut session = self.session();
        match self.index_of(&session.file, (char_type, num_type, id)) {
            Some(index) => session.file.remove(index).is_some(),
            None => false,
        }
    }

    pub fn remove_at(&self, index: usize) -> bool {
        self.session().file.remove(index).is_some()
    }

    /// Rewrites the whole store, a no-op without one.
    pub fn flush(&self) -> Result<()> {
        let mut session = self.session();
        let Session { file, store } = &mut *session;
        if let Some(store) = store {
            let data = self.spec.encode(file)?;
            debug!("flushing {} chunks, {} bytes", file.chunks.len(), data.len());
            store.save(&data).map_err(Error::StoreUnavailable)?;
        }
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.flush()
    }
}
