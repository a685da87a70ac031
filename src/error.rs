use std::io;

use thiserror::Error;

use crate::field::FieldType;

#[derive(Error, Debug)]
pub enum Error {
    #[error("input ended before a declared field or payload was complete")]
    TruncatedInput,
    #[error(transparent)]
    Io(io::Error),
    #[error("malformed format descriptor: {0}")]
    MalformedDescriptor(String),
    #[error("declared chunk size {declared} is smaller than its {header} byte header")]
    BadLength { declared: u64, header: usize },
    #[error("chunk {char_type:?}/{num_type:?}/{id:?} already exists")]
    AlreadyExists {
        char_type: Option<i64>,
        num_type: Option<i64>,
        id: Option<i64>,
    },
    #[error("backing store unavailable")]
    StoreUnavailable(#[source] io::Error),
    #[error("checksum mismatch on chunk {index}: stored {stored:#x}, computed {computed:#x}")]
    ChecksumMismatch {
        index: usize,
        stored: i64,
        computed: i64,
    },
    #[error("no free id at or above {start} fits the id field")]
    IdOverflow { start: i64 },
    #[error("{value} does not fit the {field} field")]
    FieldOverflow { field: FieldType, value: u64 },
}

// A short read is always a truncated container, everything else is a real io failure
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::TruncatedInput,
            _ => Error::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn malformed<S: Into<String>>(msg: S) -> Error {
    Error::MalformedDescriptor(msg.into())
}

#[cfg(test)]
mod test_error {
    use super::*;

    #[test]
    fn eof_is_truncated() {
        let err: Error = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(err, Error::TruncatedInput));
    }

    #[test]
    fn other_io_is_kept() {
        let err: Error = io::Error::from(io::ErrorKind::PermissionDenied).into();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            x => panic!("unexpected: {:?}", x),
        }
    }
}
