//! Format descriptors and the container read/write engine
//!
//! A [`ChunkFileSpec`] pairs the layout of the file header with the layout of
//! every chunk header. Reading decodes the file header first and then picks
//! how to find the end of the chunk list from whichever control field that
//! header declares, in this order:
//!
//! | Field in file header  | Termination |
//! | --------------------- | ----------- |
//! | chunk count           | read exactly that many chunks |
//! | size excluding header | read until the chunks add up to the size |
//! | size including header | same, the file header counts towards the size |
//! | none of them          | read until the input runs out between chunks |
//!
//! Writing recomputes every control field from the chunks actually present,
//! along with the size fields of each chunk.
//!
//! The textual form of a descriptor is `<file layout>:<chunk layout>`, for
//! example RIFF without a wrapping header is `:t4s4<d+`. The binary form is
//! the binary file layout followed by the binary chunk layout.
use std::fmt;
use std::io::{Cursor, Read, Write};
use std::str::FromStr;

use log::{debug, trace};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::checksum::ChunkChecksum;
use crate::chunk::{Chunk, ChunkFile, Header};
use crate::chunk_spec::ChunkSpec;
use crate::error::{malformed, Error, Result};
use crate::field::FieldType;

mod known;

pub use known::WELL_KNOWN;

const LAYOUT_SEPARATOR: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Count(u64),
    SizeExcludingHeader(u64),
    SizeIncludingHeader(u64),
    Unbounded,
}

/// Header of one chunk found by [`ChunkFileSpec::read_chunk_headers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    pub header: Header,
    /// Offset of the payload from the start of the input
    pub offset: u64,
    pub length: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkIndex {
    pub header: Header,
    pub entries: Vec<ChunkEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChunkFileSpec {
    file_spec: ChunkSpec,
    chunk_spec: ChunkSpec,
}

impl ChunkFileSpec {
    pub fn new(file_spec: ChunkSpec, chunk_spec: ChunkSpec) -> Result<ChunkFileSpec> {
        if file_spec.contains_type(FieldType::Payload) {
            return Err(malformed("a file header cannot carry a payload marker"));
        }
        Ok(ChunkFileSpec {
            file_spec,
            chunk_spec,
        })
    }

    pub fn file_spec(&self) -> &ChunkSpec {
        &self.file_spec
    }

    pub fn chunk_spec(&self) -> &ChunkSpec {
        &self.chunk_spec
    }

    /// One of the formats in [`WELL_KNOWN`], case is ignored.
    pub fn well_known(name: &str) -> Option<ChunkFileSpec> {
        known::by_name(name)
    }

    /// An empty container, the file header carrying the format's signature if it has one.
    pub fn create_chunk_file(&self) -> ChunkFile {
        let mut header = self.file_spec.create_header();
        known::sign(self, &mut header);
        ChunkFile::new(header)
    }

    /// A fresh chunk around `data`. Sizes too wide for their field are only
    /// caught once the chunk goes through [`ChunkFileSpec::update_sizes`].
    pub fn create_chunk(&self, data: Vec<u8>) -> Chunk {
        let mut chunk = Chunk::new(self.chunk_spec.create_header(), data);
        for (typ, value) in self.size_values(chunk.data.len() as u64) {
            chunk.header.set(typ, value as i64);
        }
        chunk
    }

    fn size_values(&self, len: u64) -> Vec<(FieldType, u64)> {
        let mut sizes = Vec::new();
        if self.chunk_spec.contains_type(FieldType::SizeExcludingHeader) {
            sizes.push((FieldType::SizeExcludingHeader, len));
        }
        if self.chunk_spec.contains_type(FieldType::SizeIncludingHeader) {
            sizes.push((
                FieldType::SizeIncludingHeader,
                self.chunk_spec.byte_count() as u64 + len,
            ));
        }
        sizes
    }

    /// Sets the chunk's own size fields from its payload.
    pub fn update_sizes(&self, chunk: &mut Chunk) -> Result<()> {
        for (typ, value) in self.size_values(chunk.data.len() as u64) {
            chunk.header.set(typ, fit(&self.chunk_spec, typ, value)?);
        }
        Ok(())
    }

    fn control(&self, header: &Header, typ: FieldType) -> Option<u64> {
        let field = self.file_spec.get_field(typ)?;
        header.get(typ).map(|v| field.size().unsigned(v))
    }

    pub fn strategy(&self, header: &Header) -> Termination {
        if let Some(count) = self.control(header, FieldType::ChunkCount) {
            Termination::Count(count)
        } else if let Some(size) = self.control(header, FieldType::SizeExcludingHeader) {
            Termination::SizeExcludingHeader(size)
        } else if let Some(size) = self.control(header, FieldType::SizeIncludingHeader) {
            Termination::SizeIncludingHeader(size)
        } else {
            Termination::Unbounded
        }
    }

    // Walks the chunk list after the file header. `body` gets each chunk
    // header with its payload offset, consumes the rest of the chunk and
    // returns what to keep along with the payload length.
    fn walk<R, T, F>(&self, reader: &mut R, strategy: Termination, mut body: F) -> Result<Vec<T>>
    where
        R: Read,
        F: FnMut(&mut R, Header, u64) -> Result<(T, u64)>,
    {
        let header_len = self.chunk_spec.header_byte_count() as u64;
        let mut position = self.file_spec.byte_count() as u64;
        let mut items = Vec::new();

        let mut next = |reader: &mut R, header: Header, position: &mut u64| -> Result<(T, u64)> {
            let (item, len) = body(reader, header, *position + header_len)?;
            let used = self.chunk_spec.chunk_byte_count(len);
            trace!("chunk at {} takes {} bytes", position, used);
            *position += used;
            Ok((item, used))
        };

        match strategy {
            Termination::Count(count) => {
                for _ in 0..count {
                    let header = self.chunk_spec.read_header(reader)?;
                    items.push(next(reader, header, &mut position)?.0);
                }
            }
            Termination::SizeExcludingHeader(total) | Termination::SizeIncludingHeader(total) => {
                let mut used = match strategy {
                    Termination::SizeIncludingHeader(_) => self.file_spec.byte_count() as u64,
                    _ => 0,
                };
                while used < total {
                    let header = self.chunk_spec.read_header(reader)?;
                    let (item, bytes) = next(reader, header, &mut position)?;
                    // Nothing left to read but the declared size isn't reached
                    if bytes == 0 {
                        return Err(Error::TruncatedInput);
                    }
                    items.push(item);
                    used += bytes;
                }
            }
            Termination::Unbounded => loop {
                let header = match self.chunk_spec.read_header(reader) {
                    Ok(header) => header,
                    Err(Error::TruncatedInput) => break,
                    Err(e) => return Err(e),
                };
                let (item, bytes) = next(reader, header, &mut position)?;
                // A layout without any fields reads nothing once the input is gone
                if bytes == 0 {
                    break;
                }
                items.push(item);
            },
        }

        Ok(items)
    }

    pub fn read_chunk_file<R: Read>(&self, reader: &mut R) -> Result<ChunkFile> {
        let header = self.file_spec.read_header(reader)?;
        let strategy = self.strategy(&header);
        debug!("reading chunks: {:?}", strategy);

        let chunks = self.walk(reader, strategy, |reader, mut header, _| {
            let (len, data) = self.chunk_spec.read_body(reader, &mut header, true)?;
            Ok((Chunk::new(header, data), len))
        })?;
        debug!("read {} chunks", chunks.len());

        Ok(ChunkFile { header, chunks })
    }

    /// Reads only the headers, payloads are skipped over and located by offset.
    pub fn read_chunk_headers<R: Read>(&self, reader: &mut R) -> Result<ChunkIndex> {
        let header = self.file_spec.read_header(reader)?;
        let strategy = self.strategy(&header);
        debug!("indexing chunks: {:?}", strategy);

        let entries = self.walk(reader, strategy, |reader, mut header, offset| {
            let (length, _) = self.chunk_spec.read_body(reader, &mut header, false)?;
            Ok((
                ChunkEntry {
                    header,
                    offset,
                    length,
                },
                length,
            ))
        })?;

        Ok(ChunkIndex { header, entries })
    }

    /// Control fields of the file header, as they would be written for these chunks.
    pub fn file_header_for(&self, file: &ChunkFile) -> Result<Header> {
        let mut header = file.header.clone();
        let chunk_bytes: u64 = file
            .chunks
            .iter()
            .map(|c| self.chunk_spec.chunk_byte_count(c.data.len() as u64))
            .sum();

        let controls = [
            (FieldType::ChunkCount, file.chunks.len() as u64),
            (FieldType::SizeExcludingHeader, chunk_bytes),
            (
                FieldType::SizeIncludingHeader,
                self.file_spec.byte_count() as u64 + chunk_bytes,
            ),
        ];
        for (typ, value) in controls {
            if self.file_spec.contains_type(typ) {
                header.set(typ, fit(&self.file_spec, typ, value)?);
            }
        }
        Ok(header)
    }

    pub fn write_chunk_file<W: Write>(&self, writer: &mut W, file: &ChunkFile) -> Result<()> {
        let header = self.file_header_for(file)?;
        debug!("writing {} chunks, file header {:?}", file.chunks.len(), header);
        self.file_spec.write_header(writer, &header)?;

        for chunk in &file.chunks {
            let mut chunk = chunk.clone();
            self.update_sizes(&mut chunk)?;
            self.chunk_spec.write_chunk(writer, &chunk)?;
        }
        Ok(())
    }

    pub fn encode(&self, file: &ChunkFile) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_chunk_file(&mut out, file)?;
        Ok(out)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<ChunkFile> {
        self.read_chunk_file(&mut Cursor::new(bytes))
    }

    /// Stores a freshly computed checksum in every chunk.
    pub fn seal(&self, file: &mut ChunkFile, checksum: &dyn ChunkChecksum) -> Result<()> {
        let field = match self.chunk_spec.get_field(FieldType::Checksum) {
            Some(field) => field,
            None => return Ok(()),
        };
        for chunk in file.chunks.iter_mut() {
            self.update_sizes(chunk)?;
            let value = field.size().normalize(checksum.compute(&self.chunk_spec, chunk));
            chunk.header.set(FieldType::Checksum, value);
        }
        Ok(())
    }

    pub fn verify(&self, file: &ChunkFile, checksum: &dyn ChunkChecksum) -> Result<()> {
        let field = match self.chunk_spec.get_field(FieldType::Checksum) {
            Some(field) => field,
            None => return Ok(()),
        };
        for (index, chunk) in file.chunks.iter().enumerate() {
            let stored = field
                .size()
                .normalize(chunk.header.get(FieldType::Checksum).unwrap_or(0));
            let computed = field.size().normalize(checksum.compute(&self.chunk_spec, chunk));
            if stored != computed {
                return Err(Error::ChecksumMismatch {
                    index,
                    stored,
                    computed,
                });
            }
        }
        Ok(())
    }

    pub fn parse(s: &str) -> Result<ChunkFileSpec> {
        let (file, chunk) = s.split_once(LAYOUT_SEPARATOR).ok_or_else(|| {
            malformed(format!("expected {:?} between the two layouts", LAYOUT_SEPARATOR))
        })?;
        ChunkFileSpec::new(ChunkSpec::parse(file)?, ChunkSpec::parse(chunk)?)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.file_spec.to_bytes();
        out.extend(self.chunk_spec.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<ChunkFileSpec> {
        let (file_spec, used) = ChunkSpec::decode_bytes(bytes)?;
        let chunk_spec = ChunkSpec::from_bytes(&bytes[used..])?;
        ChunkFileSpec::new(file_spec, chunk_spec)
    }
}

// Control and size values are unsigned on the wire
fn fit(spec: &ChunkSpec, typ: FieldType, value: u64) -> Result<i64> {
    match spec.get_field(typ) {
        Some(field) if value > field.size().unsigned_max() => {
            Err(Error::FieldOverflow { field: typ, value })
        }
        _ => Ok(value as i64),
    }
}

impl fmt::Display for ChunkFileSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.file_spec, LAYOUT_SEPARATOR, self.chunk_spec)
    }
}

impl FromStr for ChunkFileSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ChunkFileSpec::parse(s)
    }
}

// Serde impls, descriptors travel as their textual form
impl Serialize for ChunkFileSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct ChunkFileSpecVisitor;

impl<'de> Visitor<'de> for ChunkFileSpecVisitor {
    type Value = ChunkFileSpec;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a format descriptor such as \"t4S4:t4S4d\" or a well known format name")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        if let Some(spec) = ChunkFileSpec::well_known(v) {
            return Ok(spec);
        }
        ChunkFileSpec::parse(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for ChunkFileSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_str(ChunkFileSpecVisitor)
    }
}

#[cfg(test)]
mod test_chunk_file_spec {
    use super::*;
    use crate::checksum::Crc32;

    fn tagged(spec: &ChunkFileSpec, tag: &[u8], data: &[u8]) -> Chunk {
        let mut chunk = spec.create_chunk(data.to_vec());
        let field = spec.chunk_spec().get_field(FieldType::CharType).unwrap();
        chunk.header.set(FieldType::CharType, field.tag_value(tag));
        chunk
    }

    fn declared(spec: &ChunkSpec, header: &Header) -> Vec<(FieldType, i64)> {
        header
            .iter()
            .filter(|(t, _)| spec.contains_type(*t))
            .collect()
    }

    #[test]
    fn descriptors_round_trip() {
        for name in WELL_KNOWN {
            let spec = ChunkFileSpec::well_known(name).unwrap();

            assert_eq!(ChunkFileSpec::parse(&spec.to_string()).unwrap(), spec, "{}", name);
            assert_eq!(ChunkFileSpec::from_bytes(&spec.to_bytes()).unwrap(), spec, "{}", name);
        }
    }

    #[test]
    fn write_read_idempotent() {
        let payloads: [(&[u8], &[u8]); 4] = [
            (b"AAAA", b""),
            (b"BBBB", b"x"),
            (b"CCCC", b"hello world"),
            (b"DDDD", &[0u8; 300]),
        ];

        for name in WELL_KNOWN {
            let spec = ChunkFileSpec::well_known(name).unwrap();
            let mut file = spec.create_chunk_file();
            for (tag, data) in payloads.iter() {
                file.push(tagged(&spec, tag, data));
            }

            let bytes = spec.encode(&file).unwrap();
            let back = spec.decode(&bytes).unwrap();

            assert_eq!(back.chunks.len(), file.chunks.len(), "{}", name);
            for (a, b) in file.chunks.iter().zip(back.chunks.iter()) {
                assert_eq!(a.data, b.data, "{}", name);
                assert_eq!(
                    declared(spec.chunk_spec(), &a.header),
                    declared(spec.chunk_spec(), &b.header),
                    "{}",
                    name
                );
            }

            // And the index agrees with the full read
            let index = spec.read_chunk_headers(&mut Cursor::new(&bytes)).unwrap();
            assert_eq!(index.entries.len(), back.chunks.len(), "{}", name);
            for (entry, chunk) in index.entries.iter().zip(back.chunks.iter()) {
                let start = entry.offset as usize;
                assert_eq!(&bytes[start..start + entry.length as usize], &chunk.data[..]);
                assert_eq!(entry.header, chunk.header);
            }
        }
    }

    #[test]
    fn count_ignores_trailing_garbage() {
        let spec = ChunkFileSpec::parse("c2:t4s4d").unwrap();
        let mut file = spec.create_chunk_file();
        for tag in [b"one ", b"two ", b"thre"] {
            file.push(tagged(&spec, tag, b"abc"));
        }

        let mut bytes = spec.encode(&file).unwrap();
        assert_eq!(&bytes[..2], &[0, 3]);
        bytes.extend_from_slice(b"garbage that is not a chunk");

        let back = spec.decode(&bytes).unwrap();
        assert_eq!(back.chunks.len(), 3);
        assert_eq!(back.header.get(FieldType::ChunkCount), Some(3));
    }

    #[test]
    fn size_excluding_header_with_padding() {
        let spec = ChunkFileSpec::parse("t4s4<:t4s4<d+").unwrap();
        let mut file = spec.create_chunk_file();
        file.push(tagged(&spec, b"fmt ", &[7u8; 16]));
        file.push(tagged(&spec, b"data", &[1, 2, 3, 4, 5]));

        assert_eq!(
            spec.file_header_for(&file).unwrap().get(FieldType::SizeExcludingHeader),
            Some(38)
        );

        let mut bytes = spec.encode(&file).unwrap();
        assert_eq!(bytes.len(), 8 + 38);
        assert_eq!(&bytes[4..8], &[38, 0, 0, 0]);

        // Anything past the declared size is not a chunk
        bytes.extend_from_slice(b"LIST\x00\x00\x00\x00");
        let back = spec.decode(&bytes).unwrap();
        assert_eq!(back.chunks.len(), 2);
        assert_eq!(back.chunks[1].data, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            spec.strategy(&back.header),
            Termination::SizeExcludingHeader(38)
        );
    }

    #[test]
    fn size_including_header() {
        let spec = ChunkFileSpec::icns();
        let mut file = spec.create_chunk_file();
        file.push(tagged(&spec, b"ic07", b"png bytes"));
        file.push(tagged(&spec, b"TOC ", b""));

        let mut bytes = spec.encode(&file).unwrap();
        // 8 byte file header, 8 + 9 and 8 + 0 for the chunks
        assert_eq!(&bytes[4..8], &[0, 0, 0, 33]);
        bytes.extend_from_slice(&[0xFF; 12]);

        let back = spec.decode(&bytes).unwrap();
        assert_eq!(back.chunks.len(), 2);
        assert_eq!(back.chunks[0].data, b"png bytes".to_vec());
    }

    #[test]
    fn unbounded_empty() {
        let spec = ChunkFileSpec::iff();
        let back = spec.decode(&[]).unwrap();

        assert!(back.chunks.is_empty());
        assert!(back.header.is_empty());
        assert_eq!(spec.strategy(&back.header), Termination::Unbounded);
    }

    #[test]
    fn unbounded_stops_on_partial_header() {
        let spec = ChunkFileSpec::midi();
        let bytes = b"MThd\x00\x00\x00\x02\x00\x01MTr".to_vec();

        let back = spec.decode(&bytes).unwrap();
        assert_eq!(back.chunks.len(), 1);
        assert_eq!(back.chunks[0].data, vec![0, 1]);
    }

    #[test]
    fn unbounded_truncated_payload_fails() {
        let spec = ChunkFileSpec::midi();
        let bytes = b"MThd\x00\x00\x00\x06\x00\x01".to_vec();

        assert!(matches!(spec.decode(&bytes), Err(Error::TruncatedInput)));
    }

    #[test]
    fn count_truncated_fails() {
        let spec = ChunkFileSpec::parse("c1:t4s4d").unwrap();
        assert!(matches!(
            spec.decode(b"\x02MThd\x00\x00\x00\x00"),
            Err(Error::TruncatedInput)
        ));
    }

    #[test]
    fn declared_size_beyond_input_fails() {
        let spec = ChunkFileSpec::parse("s4:d").unwrap();
        assert!(matches!(
            spec.decode(b"\x00\x00\x00\x0Aabcde"),
            Err(Error::TruncatedInput)
        ));

        let spec = ChunkFileSpec::parse("S4:d").unwrap();
        assert!(matches!(
            spec.decode(b"\x00\x00\x00\x0Eabcde"),
            Err(Error::TruncatedInput)
        ));

        // Exactly the declared size is fine
        let back = spec.decode(b"\x00\x00\x00\x09abcde").unwrap();
        assert_eq!(back.chunks.len(), 1);
        assert_eq!(back.chunks[0].data, b"abcde".to_vec());
    }

    #[test]
    fn control_field_too_narrow() {
        let spec = ChunkFileSpec::parse("c1:t4s4d").unwrap();
        let mut file = spec.create_chunk_file();
        for _ in 0..255 {
            file.push(tagged(&spec, b"ITEM", b"x"));
        }
        let back = spec.decode(&spec.encode(&file).unwrap()).unwrap();
        assert_eq!(back.chunks.len(), 255);

        file.push(tagged(&spec, b"ITEM", b"x"));
        assert!(matches!(
            spec.encode(&file),
            Err(Error::FieldOverflow {
                field: FieldType::ChunkCount,
                value: 256
            })
        ));
    }

    #[test]
    fn chunk_size_too_narrow() {
        let spec = ChunkFileSpec::parse(":t4s1d").unwrap();
        let mut chunk = tagged(&spec, b"BIG ", &[0; 255]);
        spec.update_sizes(&mut chunk).unwrap();
        assert_eq!(chunk.header.get(FieldType::SizeExcludingHeader), Some(255));

        let mut file = spec.create_chunk_file();
        file.push(tagged(&spec, b"BIG ", &[0; 256]));
        assert!(matches!(
            spec.encode(&file),
            Err(Error::FieldOverflow {
                field: FieldType::SizeExcludingHeader,
                value: 256
            })
        ));
        assert!(spec.update_sizes(&mut file.chunks[0]).is_err());
    }

    #[test]
    fn fieldless_chunks_read_everything_once() {
        let spec = ChunkFileSpec::parse("f2:d").unwrap();
        let back = spec.decode(b"\x00\x00rest").unwrap();

        assert_eq!(back.chunks.len(), 1);
        assert_eq!(back.chunks[0].data, b"rest".to_vec());
    }

    #[test]
    fn stale_control_fields_are_recomputed() {
        let spec = ChunkFileSpec::dff_be();
        let mut file = spec.create_chunk_file();
        file.header.set(FieldType::ChunkCount, 99);
        file.header.set(FieldType::SizeExcludingHeader, 12345);
        file.push(tagged(&spec, b"DFFCHUNK", b"abcd"));

        let header = spec.file_header_for(&file).unwrap();
        assert_eq!(header.get(FieldType::ChunkCount), Some(1));
        assert_eq!(header.get(FieldType::SizeExcludingHeader), Some(16 + 4));

        let back = spec.decode(&spec.encode(&file).unwrap()).unwrap();
        assert_eq!(back.header, header);
    }

    #[test]
    fn png_checksums() {
        let spec = ChunkFileSpec::png();
        let mut file = spec.create_chunk_file();
        file.header.set(
            FieldType::Filler,
            i64::from_be_bytes(*b"\x89PNG\r\n\x1a\n"),
        );
        file.push(tagged(&spec, b"IHDR", &[0; 13]));
        file.push(tagged(&spec, b"IEND", b""));

        spec.seal(&mut file, &Crc32).unwrap();
        let bytes = spec.encode(&file).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(&bytes[bytes.len() - 4..], &[0xAE, 0x42, 0x60, 0x82]);

        let mut back = spec.decode(&bytes).unwrap();
        assert_eq!(back, file);
        spec.verify(&back, &Crc32).unwrap();

        back.chunks[0].data[0] = 1;
        assert!(matches!(
            spec.verify(&back, &Crc32),
            Err(Error::ChecksumMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn parse_errors() {
        assert!(ChunkFileSpec::parse("t4s4d").is_err());
        assert!(ChunkFileSpec::parse("t4d:t4s4d").is_err());
        assert!(ChunkFileSpec::parse(":z4").is_err());
        assert!(ChunkFileSpec::from_bytes(&[0]).is_err());
    }

    #[derive(Deserialize, Serialize)]
    struct Named {
        format: ChunkFileSpec,
    }

    #[test]
    fn serde_text_form() {
        let named: Named = toml::from_str(r#"format = "t4c2:t4i2s4<d+""#).unwrap();
        assert_eq!(named.format.to_string(), "t4c2:t4i2s4<d+");

        let riff: Named = toml::from_str(r#"format = "RIFF""#).unwrap();
        assert_eq!(riff.format, ChunkFileSpec::riff());

        let out = toml::to_string(&Named {
            format: ChunkFileSpec::midi(),
        })
        .unwrap();
        assert_eq!(out.trim(), r#"format = ":t4s4d""#);

        assert!(toml::from_str::<Named>(r#"format = "nope""#).is_err());
    }
}
