use crate::parsers::{
    cache::{CacheMismatch, ValueCache},
    token::Token,
    FloatWidth,
};
use crate::structure::Value;
use nom::{
    bytes::complete::take,
    error::ErrorKind,
    number::complete::{le_f32, le_f64, le_i32, le_u16, le_u32},
    Err, IResult,
};

type Result<'a, T> = IResult<&'a [u8], T>;

/// The scalar types a member can hold. Binary files deliver them from tokens (possibly through the value cache),
/// text files from the text between two delimiters.
pub(crate) trait XPrimitive: Copy + Default {
    fn x_name() -> &'static str;

    /// `Ok(None)` if the cache is empty.
    fn take_cached(cache: &mut ValueCache) -> std::result::Result<Option<Self>, CacheMismatch>;

    /// Extracts the first value of `token`, leaving the rest of a list in `cache`. Returns `Ok(None)` for empty
    /// lists and gives the token back if it can't hold this type.
    fn from_token(token: Token, cache: &mut ValueCache) -> std::result::Result<Option<Self>, Token>;

    fn parse_text(text: &str, float_width: FloatWidth) -> Option<Self>;

    fn into_array(values: Vec<Self>) -> Value;
}

impl XPrimitive for i32 {
    fn x_name() -> &'static str {
        "DWORD"
    }

    fn take_cached(cache: &mut ValueCache) -> std::result::Result<Option<Self>, CacheMismatch> {
        cache.take_int()
    }

    fn from_token(token: Token, cache: &mut ValueCache) -> std::result::Result<Option<Self>, Token> {
        match token {
            Token::Integer(v) => Ok(Some(v)),
            Token::IntegerList(values) => {
                cache.fill_ints(values);
                Ok(cache.take_int().unwrap_or(None))
            }
            other => Err(other),
        }
    }

    fn parse_text(text: &str, _float_width: FloatWidth) -> Option<Self> {
        // DWORDs above i32::MAX keep their bit pattern, like in binary files.
        text.parse::<i32>()
            .ok()
            .or_else(|| text.parse::<u32>().ok().map(|v| v as i32))
    }

    fn into_array(values: Vec<Self>) -> Value {
        Value::IntArray(values)
    }
}

impl XPrimitive for f64 {
    fn x_name() -> &'static str {
        "FLOAT"
    }

    fn take_cached(cache: &mut ValueCache) -> std::result::Result<Option<Self>, CacheMismatch> {
        cache.take_float()
    }

    fn from_token(token: Token, cache: &mut ValueCache) -> std::result::Result<Option<Self>, Token> {
        match token {
            Token::FloatList(values) => {
                cache.fill_floats(values);
                Ok(cache.take_float().unwrap_or(None))
            }
            other => Err(other),
        }
    }

    fn parse_text(text: &str, float_width: FloatWidth) -> Option<Self> {
        match float_width {
            FloatWidth::Bits32 => text.parse::<f32>().ok().map(f64::from),
            FloatWidth::Bits64 => text.parse::<f64>().ok(),
        }
    }

    fn into_array(values: Vec<Self>) -> Value {
        Value::FloatArray(values)
    }
}

pub fn word(input: &[u8]) -> Result<u16> {
    le_u16(input)
}

pub fn dword(input: &[u8]) -> Result<u32> {
    le_u32(input)
}

pub fn int(input: &[u8]) -> Result<i32> {
    le_i32(input)
}

pub fn float(input: &[u8], float_width: FloatWidth) -> Result<f64> {
    match float_width {
        FloatWidth::Bits32 => le_f32(input).map(|(i, v)| (i, f64::from(v))),
        FloatWidth::Bits64 => le_f64(input),
    }
}

/// A u32 length followed by that many bytes.
pub fn sized_bytes(input: &[u8]) -> Result<&[u8]> {
    let (input, len) = dword(input)?;
    take(len as usize)(input)
}

/// Fails before allocating anything if `input` can't hold `count` elements of `element_len` bytes.
fn ensure_room(input: &[u8], count: u32, element_len: usize) -> Result<()> {
    if input.len() / element_len < count as usize {
        return Err(Err::Error((input, ErrorKind::Eof)));
    }
    Ok((input, ()))
}

/// A u32 count followed by that many i32s.
pub fn int_list(input: &[u8]) -> Result<Vec<i32>> {
    let (input, count) = dword(input)?;
    let (mut input, _) = ensure_room(input, count, 4)?;

    let mut values = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (next_input, value) = int(input)?;
        input = next_input;
        values.push(value);
    }

    Ok((input, values))
}

/// A u32 count followed by that many floats of `float_width`.
pub fn float_list(input: &[u8], float_width: FloatWidth) -> Result<Vec<f64>> {
    let (input, count) = dword(input)?;
    let (mut input, _) = ensure_room(input, count, float_width.bytes_num())?;

    let mut values = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (next_input, value) = float(input, float_width)?;
        input = next_input;
        values.push(value);
    }

    Ok((input, values))
}
