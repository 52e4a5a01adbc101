use crate::parsers::{FloatWidth, Result, XParseError};
use nom::{
    branch::alt,
    bytes::complete::{tag, take},
    Err,
};

/// Length of the file header. The data parsed by the engines starts right after it.
pub const HEADER_LEN: usize = 16;

/// The four flavors an X file can be stored in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    Text,
    Binary,
    CompressedText,
    CompressedBinary,
}

impl Format {
    pub fn is_compressed(self) -> bool {
        match self {
            Format::CompressedText | Format::CompressedBinary => true,
            Format::Text | Format::Binary => false,
        }
    }

    pub fn is_binary(self) -> bool {
        match self {
            Format::Binary | Format::CompressedBinary => true,
            Format::Text | Format::CompressedText => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Major and minor version as written in the file, e.g. `b"0303"`.
    pub version: [u8; 4],
    pub format: Format,
    /// The size of every float in binary files. Text files are parsed with the same precision.
    pub float_width: FloatWidth,
}

fn four_bytes(input: &[u8]) -> Result<[u8; 4]> {
    let (input, v) = take(4_usize)(input)?;
    Ok((input, [v[0], v[1], v[2], v[3]]))
}

pub fn format(input: &[u8]) -> Result<Format> {
    let (input, code) = four_bytes(input)?;

    let format = match &code {
        b"txt " => Format::Text,
        b"bin " => Format::Binary,
        b"tzip" => Format::CompressedText,
        b"bzip" => Format::CompressedBinary,
        _ => return Err(Err::Failure(XParseError::UnknownFormat(code))),
    };

    Ok((input, format))
}

fn float_width_bits32(input: &[u8]) -> Result<FloatWidth> {
    let (input, _) = tag("0032")(input)?;
    Ok((input, FloatWidth::Bits32))
}

fn float_width_bits64(input: &[u8]) -> Result<FloatWidth> {
    let (input, _) = tag("0064")(input)?;
    Ok((input, FloatWidth::Bits64))
}

pub fn float_width(input: &[u8]) -> Result<FloatWidth> {
    match alt((float_width_bits32, float_width_bits64))(input) {
        Ok(v) => Ok(v),
        Err(_) => {
            let (_, code) = four_bytes(input)?;
            Err(Err::Failure(XParseError::UnknownFloatWidth(code)))
        }
    }
}

pub fn header(input: &[u8]) -> Result<Header> {
    let (input, _) = match tag::<_, _, XParseError>("xof ")(input) {
        Ok(v) => v,
        Err(_) => return Err(Err::Failure(XParseError::NotAnXFile)),
    };

    if input.len() < HEADER_LEN - 4 {
        return Err(Err::Failure(XParseError::NotEnoughData));
    }

    let (input, version) = four_bytes(input)?;
    let (input, format) = format(input)?;
    let (input, float_width) = float_width(input)?;

    Ok((
        input,
        Header {
            version,
            format,
            float_width,
        },
    ))
}
