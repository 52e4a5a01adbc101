pub mod binary;
pub mod cache;
pub mod compression;
pub mod header;
pub mod primitive;
pub mod template;
pub mod text;
pub mod token;

use crate::diagnostics::Location;
use nom::{
    error::{ErrorKind, ParseError},
    IResult,
};
use std::io;
use thiserror::Error;

type Result<'a, T> = IResult<&'a [u8], T, XParseError>;

/// Size of the floating point values stored in the file, taken from the last 4 bytes of the header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FloatWidth {
    Bits32,
    Bits64,
}

impl FloatWidth {
    /// Returns the float size in bytes.
    pub fn bytes_num(self) -> usize {
        match self {
            FloatWidth::Bits32 => 4,
            FloatWidth::Bits64 => 8,
        }
    }
}

/// Errors that can happen while loading an X file. Errors inside the data itself are `Syntax` errors, everything
/// else happens before the parsing engines get to run.
#[derive(Debug, Error)]
pub enum XParseError {
    #[error("parse error ({kind:?})")]
    NomError {
        kind: ErrorKind,
        other: Option<Box<XParseError>>,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Returned when the file is shorter than its header says it should be.
    #[error("not enough data")]
    NotEnoughData,
    /// Returned when the file doesn't start with `b"xof "`.
    #[error("missing \"xof \" signature")]
    NotAnXFile,
    /// The known formats are `b"txt "`, `b"bin "`, `b"tzip"` and `b"bzip"`.
    #[error("unknown format tag {0:?}")]
    UnknownFormat([u8; 4]),
    /// The known float widths are `b"0032"` and `b"0064"`.
    #[error("unknown float width tag {0:?}")]
    UnknownFloatWidth([u8; 4]),
    #[error("decompression failed: {0}")]
    Decompression(String),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl ParseError<&[u8]> for XParseError {
    fn from_error_kind(_input: &[u8], kind: ErrorKind) -> Self {
        XParseError::NomError { kind, other: None }
    }

    fn append(_input: &[u8], kind: ErrorKind, other: Self) -> Self {
        XParseError::NomError {
            kind,
            other: Some(Box::new(other)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A token (or text) was found that is not valid at this position of the template.
    MalformedToken,
    /// The value cache held values of the wrong kind, or held values where it had to be empty.
    CacheViolation,
    /// An array's size refers to a member that doesn't exist or isn't an integer.
    SizeReference,
    /// The input ended before the template was complete.
    PrematureEnd,
    /// A stray comma, brace or semicolon in a text file.
    UnexpectedDelimiter,
    /// Templates are nested deeper than `ParseOptions::max_depth`.
    RecursionLimit,
}

/// A fatal error found by one of the parsing engines. No partial result is ever returned with it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {location}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub location: Location,
    pub message: String,
}

impl SyntaxError {
    pub fn new<T: Into<String>>(kind: SyntaxErrorKind, location: Location, message: T) -> Self {
        SyntaxError {
            kind,
            location,
            message: message.into(),
        }
    }
}
