use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

use log::trace;

use crate::chunk::{Chunk, Header};
use crate::error::{malformed, Error, Result};
use crate::field::{FieldSpec, FieldType};

const EVEN_PADDED_MARK: char = '+';
const EVEN_PADDED_BIT: u8 = 0x80;
const MAX_FIELDS: usize = 0x7F;

/// One header layout: the ordered fields of a file header or of a chunk
/// header.
///
/// Fields after the payload marker are a trailer, they follow the payload on
/// disk (PNG's CRC for example). Without a payload marker the payload of a
/// chunk follows all of the fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChunkSpec {
    fields: Vec<FieldSpec>,
    even_padded: bool,
}

impl ChunkSpec {
    pub fn new(fields: Vec<FieldSpec>, even_padded: bool) -> Result<ChunkSpec> {
        let payloads = fields
            .iter()
            .filter(|f| f.field_type() == FieldType::Payload)
            .count();
        if payloads > 1 {
            return Err(malformed("more than one payload marker"));
        }
        if fields.len() > MAX_FIELDS {
            return Err(malformed(format!("more than {} fields", MAX_FIELDS)));
        }
        Ok(ChunkSpec {
            fields,
            even_padded,
        })
    }

    pub fn empty() -> ChunkSpec {
        ChunkSpec::default()
    }

    // Built in tables only, skips the payload marker check
    pub(crate) fn from_parts(fields: Vec<FieldSpec>, even_padded: bool) -> ChunkSpec {
        ChunkSpec {
            fields,
            even_padded,
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn even_padded(&self) -> bool {
        self.even_padded
    }

    pub fn contains_type(&self, typ: FieldType) -> bool {
        self.fields.iter().any(|f| f.field_type() == typ)
    }

    /// The last field of the given type, matching what ends up in a decoded [`Header`].
    pub fn get_field(&self, typ: FieldType) -> Option<FieldSpec> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.field_type() == typ)
            .copied()
    }

    fn payload_position(&self) -> usize {
        self.fields
            .iter()
            .position(|f| f.field_type() == FieldType::Payload)
            .unwrap_or(self.fields.len())
    }

    fn leading_fields(&self) -> &[FieldSpec] {
        &self.fields[..self.payload_position()]
    }

    fn trailing_fields(&self) -> &[FieldSpec] {
        let pos = self.payload_position();
        if pos < self.fields.len() {
            &self.fields[pos + 1..]
        } else {
            &[]
        }
    }

    /// Bytes taken by every field, payload excluded.
    pub fn byte_count(&self) -> usize {
        self.fields.iter().map(FieldSpec::byte_count).sum()
    }

    pub fn header_byte_count(&self) -> usize {
        self.leading_fields().iter().map(FieldSpec::byte_count).sum()
    }

    fn trailer_byte_count(&self) -> usize {
        self.trailing_fields().iter().map(FieldSpec::byte_count).sum()
    }

    pub fn padding(&self, payload_len: u64) -> u64 {
        if self.even_padded && payload_len % 2 == 1 {
            1
        } else {
            0
        }
    }

    /// Bytes a chunk with this payload length takes on disk.
    pub fn chunk_byte_count(&self, payload_len: u64) -> u64 {
        self.byte_count() as u64 + payload_len + self.padding(payload_len)
    }

    fn default_value(field: &FieldSpec) -> i64 {
        match field.field_type() {
            FieldType::CharType => field.tag_value(b""),
            _ => 0,
        }
    }

    pub fn create_header(&self) -> Header {
        self.fields
            .iter()
            .filter(|f| f.field_type() != FieldType::Payload)
            .map(|f| (f.field_type(), ChunkSpec::default_value(f)))
            .collect()
    }

    pub fn read_header<R: Read>(&self, reader: &mut R) -> Result<Header> {
        let mut header = Header::new();
        for field in self.leading_fields() {
            header.set(field.field_type(), field.read(reader)?);
        }
        Ok(header)
    }

    fn read_trailer<R: Read>(&self, reader: &mut R, header: &mut Header) -> Result<()> {
        for field in self.trailing_fields() {
            header.set(field.field_type(), field.read(reader)?);
        }
        Ok(())
    }

    /// Payload length declared by the header, `None` when it runs to the end of the input.
    pub fn payload_len(&self, header: &Header) -> Result<Option<u64>> {
        if let (Some(field), Some(value)) = (
            self.get_field(FieldType::SizeIncludingHeader),
            header.get(FieldType::SizeIncludingHeader),
        ) {
            let declared = field.size().unsigned(value);
            let own = self.byte_count();
            return match declared.checked_sub(own as u64) {
                Some(len) => Ok(Some(len)),
                None => Err(Error::BadLength {
                    declared,
                    header: own,
                }),
            };
        }
        if let (Some(field), Some(value)) = (
            self.get_field(FieldType::SizeExcludingHeader),
            header.get(FieldType::SizeExcludingHeader),
        ) {
            return Ok(Some(field.size().unsigned(value)));
        }
        Ok(None)
    }

    fn skip_pad<R: Read>(&self, reader: &mut R) -> Result<()> {
        let mut pad = [0u8; 1];
        match reader.read_exact(&mut pad) {
            Ok(()) => Ok(()),
            // Plenty of writers drop the pad byte of the very last chunk
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                trace!("missing pad byte at end of input");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    // Everything after the leading header fields, returns the payload length
    // and the payload itself when `keep` is set
    pub(crate) fn read_body<R: Read>(
        &self,
        reader: &mut R,
        header: &mut Header,
        keep: bool,
    ) -> Result<(u64, Vec<u8>)> {
        let mut data = Vec::new();

        let len = match self.payload_len(header)? {
            Some(len) => {
                let read = if keep {
                    reader.by_ref().take(len).read_to_end(&mut data)? as u64
                } else {
                    io::copy(&mut reader.by_ref().take(len), &mut io::sink())?
                };
                if read < len {
                    return Err(Error::TruncatedInput);
                }
                len
            }
            None => {
                // Runs to the end, the trailer is whatever is left at the very end
                reader.read_to_end(&mut data)?;
                let trailer_bytes = self.trailer_byte_count();
                if data.len() < trailer_bytes {
                    return Err(Error::TruncatedInput);
                }
                let trailer = data.split_off(data.len() - trailer_bytes);
                self.read_trailer(&mut &trailer[..], header)?;

                let len = data.len() as u64;
                if !keep {
                    data = Vec::new();
                }
                return Ok((len, data));
            }
        };

        if self.padding(len) == 1 {
            self.skip_pad(reader)?;
        }
        self.read_trailer(reader, header)?;

        Ok((len, data))
    }

    pub fn read_chunk<R: Read>(&self, reader: &mut R) -> Result<Chunk> {
        let mut header = self.read_header(reader)?;
        let (_, data) = self.read_body(reader, &mut header, true)?;
        Ok(Chunk::new(header, data))
    }

    /// Like [`ChunkSpec::read_chunk`] but the payload is skipped, returns its length instead.
    pub fn skip_chunk<R: Read>(&self, reader: &mut R) -> Result<(Header, u64)> {
        let mut header = self.read_header(reader)?;
        let (len, _) = self.read_body(reader, &mut header, false)?;
        Ok((header, len))
    }

    fn write_fields<W: Write>(fields: &[FieldSpec], writer: &mut W, header: &Header) -> Result<()> {
        for field in fields {
            let value = header
                .get(field.field_type())
                .unwrap_or_else(|| ChunkSpec::default_value(field));
            field.write(writer, value)?;
        }
        Ok(())
    }

    /// Writes the fields ahead of the payload exactly as given.
    pub fn write_header<W: Write>(&self, writer: &mut W, header: &Header) -> Result<()> {
        ChunkSpec::write_fields(self.leading_fields(), writer, header)
    }

    pub fn write_chunk<W: Write>(&self, writer: &mut W, chunk: &Chunk) -> Result<()> {
        self.write_header(writer, &chunk.header)?;
        writer.write_all(&chunk.data)?;
        if self.padding(chunk.data.len() as u64) == 1 {
            writer.write_all(&[0])?;
        }
        ChunkSpec::write_fields(self.trailing_fields(), writer, &chunk.header)
    }

    pub fn parse(s: &str) -> Result<ChunkSpec> {
        let mut fields = Vec::new();
        let mut even_padded = false;
        let mut chars = s.chars().filter(|c| !c.is_whitespace() && *c != ',').peekable();

        while let Some(&c) = chars.peek() {
            if c == EVEN_PADDED_MARK {
                chars.next();
                if chars.peek().is_some() {
                    return Err(malformed(format!(
                        "{:?} must end the layout {:?}",
                        EVEN_PADDED_MARK, s
                    )));
                }
                even_padded = true;
                break;
            }
            fields.push(FieldSpec::parse_next(&mut chars)?);
        }

        ChunkSpec::new(fields, even_padded)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.fields.len() + 1);
        let mut count = self.fields.len() as u8;
        if self.even_padded {
            count |= EVEN_PADDED_BIT;
        }
        out.push(count);
        out.extend(self.fields.iter().map(FieldSpec::to_byte));
        out
    }

    /// Decodes one layout from the front of `bytes`, returns it with the number of bytes used.
    pub fn decode_bytes(bytes: &[u8]) -> Result<(ChunkSpec, usize)> {
        let (&count, rest) = bytes
            .split_first()
            .ok_or_else(|| malformed("missing field count"))?;
        let len = (count & !EVEN_PADDED_BIT) as usize;
        if rest.len() < len {
            return Err(malformed(format!(
                "expected {} field bytes, found {}",
                len,
                rest.len()
            )));
        }
        let fields = rest[..len]
            .iter()
            .map(|b| FieldSpec::from_byte(*b))
            .collect::<Result<Vec<_>>>()?;

        Ok((ChunkSpec::new(fields, count & EVEN_PADDED_BIT != 0)?, len + 1))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<ChunkSpec> {
        let (spec, used) = ChunkSpec::decode_bytes(bytes)?;
        if used != bytes.len() {
            return Err(malformed(format!(
                "{} trailing bytes after layout",
                bytes.len() - used
            )));
        }
        Ok(spec)
    }
}

impl fmt::Display for ChunkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "{}", field)?;
        }
        if self.even_padded {
            write!(f, "{}", EVEN_PADDED_MARK)?;
        }
        Ok(())
    }
}

impl FromStr for ChunkSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ChunkSpec::parse(s)
    }
}
