use crate::parsers::{
    primitive::{float_list, int, int_list, sized_bytes, word},
    FloatWidth,
};
use nom::bytes::complete::take;
use std::fmt;

/// Every token of the binary format. Tokens are stored as a little-endian u16 followed by their payload, if any.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Name = 1,
    String = 2,
    Integer = 3,
    Guid = 5,
    IntegerList = 6,
    FloatList = 7,
    OBrace = 10,
    CBrace = 11,
    OParen = 12,
    CParen = 13,
    OBracket = 14,
    CBracket = 15,
    OAngle = 16,
    CAngle = 17,
    Dot = 18,
    Comma = 19,
    Semicolon = 20,
    Template = 31,
    Word = 40,
    Dword = 41,
    Float = 42,
    Double = 43,
    Char = 44,
    UChar = 45,
    SWord = 46,
    SDword = 47,
    Void = 48,
    LpStr = 49,
    Unicode = 50,
    CString = 51,
    Array = 52,
}

impl TokenKind {
    pub fn from_code(code: u16) -> Option<Self> {
        use self::TokenKind::*;

        let kind = match code {
            1 => Name,
            2 => String,
            3 => Integer,
            5 => Guid,
            6 => IntegerList,
            7 => FloatList,
            10 => OBrace,
            11 => CBrace,
            12 => OParen,
            13 => CParen,
            14 => OBracket,
            15 => CBracket,
            16 => OAngle,
            17 => CAngle,
            18 => Dot,
            19 => Comma,
            20 => Semicolon,
            31 => Template,
            40 => Word,
            41 => Dword,
            42 => Float,
            43 => Double,
            44 => Char,
            45 => UChar,
            46 => SWord,
            47 => SDword,
            48 => Void,
            49 => LpStr,
            50 => Unicode,
            51 => CString,
            52 => Array,
            _ => return None,
        };

        Some(kind)
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::TokenKind::*;

        let text = match self {
            Name => "NAME",
            String => "STRING",
            Integer => "INTEGER",
            Guid => "GUID",
            IntegerList => "INTEGER_LIST",
            FloatList => "FLOAT_LIST",
            OBrace => "'{'",
            CBrace => "'}'",
            OParen => "'('",
            CParen => "')'",
            OBracket => "'['",
            CBracket => "']'",
            OAngle => "'<'",
            CAngle => "'>'",
            Dot => "'.'",
            Comma => "','",
            Semicolon => "';'",
            Template => "template",
            Word => "WORD",
            Dword => "DWORD",
            Float => "FLOAT",
            Double => "DOUBLE",
            Char => "CHAR",
            UChar => "UCHAR",
            SWord => "SWORD",
            SDword => "SDWORD",
            Void => "void",
            LpStr => "LPSTR",
            Unicode => "UNICODE",
            CString => "CSTRING",
            Array => "array",
        };

        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Name(String),
    /// The string's `,`/`;` terminator is consumed along with it.
    String(String),
    Integer(i32),
    Guid([u8; 16]),
    IntegerList(Vec<i32>),
    FloatList(Vec<f64>),
    /// Any token without a payload.
    Punct(TokenKind),
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Name(_) => TokenKind::Name,
            Token::String(_) => TokenKind::String,
            Token::Integer(_) => TokenKind::Integer,
            Token::Guid(_) => TokenKind::Guid,
            Token::IntegerList(_) => TokenKind::IntegerList,
            Token::FloatList(_) => TokenKind::FloatList,
            Token::Punct(kind) => *kind,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Name(name) => write!(f, "NAME {:?}", name),
            Token::String(text) => write!(f, "STRING {:?}", text),
            Token::Integer(v) => write!(f, "INTEGER {}", v),
            Token::IntegerList(values) => write!(f, "INTEGER_LIST of {}", values.len()),
            Token::FloatList(values) => write!(f, "FLOAT_LIST of {}", values.len()),
            other => write!(f, "{}", other.kind()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LexError {
    /// The input ends inside a token (or there is no token at all).
    Truncated,
    UnknownToken(u16),
    /// A string followed by something other than `,` or `;`.
    BadStringTerminator(u16),
}

fn truncated<E>(_: E) -> LexError {
    LexError::Truncated
}

/// Peeks at the kind of the next token without consuming anything.
pub fn peek_kind(input: &[u8]) -> Option<TokenKind> {
    word(input)
        .ok()
        .and_then(|(_, code)| TokenKind::from_code(code))
}

/// Reads one token. Lists are decoded completely, floats with the width given in the file header.
pub fn next_token(input: &[u8], float_width: FloatWidth) -> Result<(&[u8], Token), LexError> {
    let (input, code) = word(input).map_err(truncated)?;
    let kind = TokenKind::from_code(code).ok_or(LexError::UnknownToken(code))?;

    let (input, token) = match kind {
        TokenKind::Name => {
            let (input, bytes) = sized_bytes(input).map_err(truncated)?;
            (input, Token::Name(String::from_utf8_lossy(bytes).into_owned()))
        }
        TokenKind::String => {
            let (input, bytes) = sized_bytes(input).map_err(truncated)?;
            let (input, terminator) = word(input).map_err(truncated)?;
            if terminator != TokenKind::Comma.code() && terminator != TokenKind::Semicolon.code() {
                return Err(LexError::BadStringTerminator(terminator));
            }
            (input, Token::String(String::from_utf8_lossy(bytes).into_owned()))
        }
        TokenKind::Integer => {
            let (input, v) = int(input).map_err(truncated)?;
            (input, Token::Integer(v))
        }
        TokenKind::Guid => {
            let (input, bytes) = take::<_, _, (&[u8], nom::error::ErrorKind)>(16_usize)(input)
                .map_err(truncated)?;
            let mut guid = [0; 16];
            guid.copy_from_slice(bytes);
            (input, Token::Guid(guid))
        }
        TokenKind::IntegerList => {
            let (input, values) = int_list(input).map_err(truncated)?;
            (input, Token::IntegerList(values))
        }
        TokenKind::FloatList => {
            let (input, values) = float_list(input, float_width).map_err(truncated)?;
            (input, Token::FloatList(values))
        }
        other => (input, Token::Punct(other)),
    };

    Ok((input, token))
}
