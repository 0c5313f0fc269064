//! Error types for DBPF archive handling

use std::io::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not a DBPF archive: magic was {0:02X?}")]
    NotAnArchive([u8; 4]),

    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Truncated data: {0}")]
    Truncated(String),

    #[error("Binary layout error: {0}")]
    Binary(String),

    #[error("Unknown property type: 0x{0:04X}")]
    UnknownPropertyType(u16),

    #[error("Malformed text property: {0}")]
    MalformedTextProperty(String),

    #[error("Unsupported entry format: {0}")]
    UnsupportedEntryFormat(String),

    #[error("Corrupt QFS stream: {0}")]
    Decompression(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == ErrorKind::UnexpectedEof {
            Error::Truncated(err.to_string())
        } else {
            Error::Io(err)
        }
    }
}

impl From<binrw::Error> for Error {
    fn from(err: binrw::Error) -> Self {
        if err.is_eof() {
            return Error::Truncated(err.to_string());
        }
        match err {
            binrw::Error::Io(e) => e.into(),
            binrw::Error::Backtrace(bt) => (*bt.error).into(),
            other => Error::Binary(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
