use crate::chunk::Header;
use crate::chunk_spec::ChunkSpec;
use crate::field::FieldSize::{Eight, Four, Two};
use crate::field::FieldSpec;
use crate::field::FieldType::{
    CharType, Checksum, ChunkCount, Filler, IdNumber, SizeExcludingHeader, SizeIncludingHeader,
};
use crate::file_spec::ChunkFileSpec;

/// Names accepted by [`ChunkFileSpec::well_known`].
pub const WELL_KNOWN: [&str; 8] = [
    "iff",
    "riff",
    "midi",
    "png",
    "icns",
    "hypercard",
    "dff",
    "dff-le",
];

pub(crate) fn by_name(name: &str) -> Option<ChunkFileSpec> {
    match name.to_ascii_lowercase().as_str() {
        "iff" => Some(ChunkFileSpec::iff()),
        "riff" => Some(ChunkFileSpec::riff()),
        "midi" => Some(ChunkFileSpec::midi()),
        "png" => Some(ChunkFileSpec::png()),
        "icns" => Some(ChunkFileSpec::icns()),
        "hypercard" => Some(ChunkFileSpec::hypercard()),
        "dff" => Some(ChunkFileSpec::dff_be()),
        "dff-le" => Some(ChunkFileSpec::dff_le()),
        _ => None,
    }
}

const PNG_SIGNATURE: [u8; 8] = *b"\x89PNG\r\n\x1a\n";

/// Seeds a fresh file header with the signature of formats that open with one.
pub(crate) fn sign(spec: &ChunkFileSpec, header: &mut Header) {
    if *spec == ChunkFileSpec::png() {
        header.set(Filler, i64::from_be_bytes(PNG_SIGNATURE));
    }
}

fn layout(fields: &[FieldSpec], even_padded: bool) -> ChunkSpec {
    ChunkSpec::from_parts(fields.to_vec(), even_padded)
}

fn pair(file: ChunkSpec, chunk: ChunkSpec) -> ChunkFileSpec {
    ChunkFileSpec {
        file_spec: file,
        chunk_spec: chunk,
    }
}

impl ChunkFileSpec {
    /// `:t4s4d+`
    pub fn iff() -> ChunkFileSpec {
        pair(
            ChunkSpec::empty(),
            layout(
                &[
                    FieldSpec::be(CharType, Four),
                    FieldSpec::be(SizeExcludingHeader, Four),
                    FieldSpec::payload(),
                ],
                true,
            ),
        )
    }

    /// `:t4s4<d+`
    pub fn riff() -> ChunkFileSpec {
        pair(
            ChunkSpec::empty(),
            layout(
                &[
                    FieldSpec::be(CharType, Four),
                    FieldSpec::le(SizeExcludingHeader, Four),
                    FieldSpec::payload(),
                ],
                true,
            ),
        )
    }

    /// `:t4s4d`
    pub fn midi() -> ChunkFileSpec {
        pair(
            ChunkSpec::empty(),
            layout(
                &[
                    FieldSpec::be(CharType, Four),
                    FieldSpec::be(SizeExcludingHeader, Four),
                    FieldSpec::payload(),
                ],
                false,
            ),
        )
    }

    /// `f8:s4t4dh4`, the file header is the signature
    pub fn png() -> ChunkFileSpec {
        pair(
            layout(&[FieldSpec::be(Filler, Eight)], false),
            layout(
                &[
                    FieldSpec::be(SizeExcludingHeader, Four),
                    FieldSpec::be(CharType, Four),
                    FieldSpec::payload(),
                    FieldSpec::be(Checksum, Four),
                ],
                false,
            ),
        )
    }

    /// `t4S4:t4S4d`
    pub fn icns() -> ChunkFileSpec {
        pair(
            layout(
                &[
                    FieldSpec::be(CharType, Four),
                    FieldSpec::be(SizeIncludingHeader, Four),
                ],
                false,
            ),
            layout(
                &[
                    FieldSpec::be(CharType, Four),
                    FieldSpec::be(SizeIncludingHeader, Four),
                    FieldSpec::payload(),
                ],
                false,
            ),
        )
    }

    /// `:S4t4i4f4d`
    pub fn hypercard() -> ChunkFileSpec {
        pair(
            ChunkSpec::empty(),
            layout(
                &[
                    FieldSpec::be(SizeIncludingHeader, Four),
                    FieldSpec::be(CharType, Four),
                    FieldSpec::be(IdNumber, Four),
                    FieldSpec::be(Filler, Four),
                    FieldSpec::payload(),
                ],
                false,
            ),
        )
    }

    fn dff(little_endian: bool) -> ChunkFileSpec {
        let field = if little_endian {
            FieldSpec::le
        } else {
            FieldSpec::be
        };
        pair(
            layout(
                &[
                    field(CharType, Eight),
                    field(Filler, Two),
                    field(ChunkCount, Two),
                    field(SizeExcludingHeader, Four),
                ],
                false,
            ),
            layout(
                &[
                    field(CharType, Eight),
                    field(IdNumber, Two),
                    field(Filler, Two),
                    field(SizeExcludingHeader, Four),
                    FieldSpec::payload(),
                ],
                false,
            ),
        )
    }

    /// `t8f2c2s4:t8i2f2s4d`
    pub fn dff_be() -> ChunkFileSpec {
        ChunkFileSpec::dff(false)
    }

    /// `t8<f2<c2<s4<:t8<i2<f2<s4<d`
    pub fn dff_le() -> ChunkFileSpec {
        ChunkFileSpec::dff(true)
    }
}

#[cfg(test)]
mod test_well_known {
    use super::*;

    #[test]
    fn textual_forms() {
        let expected = [
            ("iff", ":t4s4d+"),
            ("riff", ":t4s4<d+"),
            ("midi", ":t4s4d"),
            ("png", "f8:s4t4dh4"),
            ("icns", "t4S4:t4S4d"),
            ("hypercard", ":S4t4i4f4d"),
            ("dff", "t8f2c2s4:t8i2f2s4d"),
            ("dff-le", "t8<f2<c2<s4<:t8<i2<f2<s4<d"),
        ];
        for (name, text) in expected {
            let spec = by_name(name).unwrap();
            assert_eq!(spec.to_string(), text);
            assert_eq!(ChunkFileSpec::parse(text).unwrap(), spec);
        }
    }

    #[test]
    fn names_ignore_case() {
        assert_eq!(by_name("HyperCard"), Some(ChunkFileSpec::hypercard()));
        assert_eq!(by_name("DFF-LE"), Some(ChunkFileSpec::dff_le()));
        assert_eq!(by_name("wav"), None);
        assert!(WELL_KNOWN.iter().all(|n| by_name(n).is_some()));
    }

    #[test]
    fn fresh_png_carries_signature() {
        let spec = ChunkFileSpec::parse("f8:s4t4dh4").unwrap();
        let bytes = spec.encode(&spec.create_chunk_file()).unwrap();
        assert_eq!(bytes, PNG_SIGNATURE.to_vec());

        // Other formats with a filler header stay zeroed
        let plain = ChunkFileSpec::parse("f8:s4t4d").unwrap();
        assert_eq!(plain.encode(&plain.create_chunk_file()).unwrap(), vec![0; 8]);
    }
}
