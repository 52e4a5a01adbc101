#![allow(dead_code)]

use std::{env, path::PathBuf};
use xfile::{Diagnostic, ParseOptions, TemplateRegistry, XFile, XParseError};

pub const NAME: u16 = 1;
pub const STRING: u16 = 2;
pub const INTEGER: u16 = 3;
pub const INTEGER_LIST: u16 = 6;
pub const FLOAT_LIST: u16 = 7;
pub const OBRACE: u16 = 10;
pub const CBRACE: u16 = 11;
pub const COMMA: u16 = 19;
pub const SEMICOLON: u16 = 20;

/// Writes binary token streams.
#[derive(Default)]
pub struct Tokens {
    bytes: Vec<u8>,
    doubles: bool,
}

impl Tokens {
    pub fn new() -> Self {
        Tokens::default()
    }

    pub fn doubles() -> Self {
        Tokens {
            bytes: Vec::new(),
            doubles: true,
        }
    }

    pub fn code(mut self, code: u16) -> Self {
        self.bytes.extend_from_slice(&code.to_le_bytes());
        self
    }

    fn sized(mut self, code: u16, bytes: &[u8]) -> Self {
        self = self.code(code);
        self.bytes.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn name(self, name: &str) -> Self {
        self.sized(NAME, name.as_bytes())
    }

    pub fn string(self, text: &str) -> Self {
        self.sized(STRING, text.as_bytes()).code(SEMICOLON)
    }

    pub fn int(mut self, v: i32) -> Self {
        self = self.code(INTEGER);
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn ints(mut self, values: &[i32]) -> Self {
        self = self.code(INTEGER_LIST);
        self.bytes.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for v in values {
            self.bytes.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    pub fn floats(mut self, values: &[f64]) -> Self {
        self = self.code(FLOAT_LIST);
        self.bytes.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for v in values {
            if self.doubles {
                self.bytes.extend_from_slice(&v.to_le_bytes());
            } else {
                self.bytes.extend_from_slice(&(*v as f32).to_le_bytes());
            }
        }
        self
    }

    pub fn open(self, name: &str) -> Self {
        self.name(name).code(OBRACE)
    }

    pub fn close(self) -> Self {
        self.code(CBRACE)
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

pub fn text_file(body: &str) -> Vec<u8> {
    let mut file = b"xof 0303txt 0032\n".to_vec();
    file.extend_from_slice(body.as_bytes());
    file
}

pub fn binary_file(tokens: Tokens) -> Vec<u8> {
    let header: &[u8] = if tokens.doubles {
        b"xof 0303bin 0064"
    } else {
        b"xof 0303bin 0032"
    };
    let mut file = header.to_vec();
    file.extend_from_slice(&tokens.finish());
    file
}

/// Wraps `payload` in a compressed file made of a single stored DEFLATE block.
pub fn compressed_file(format: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut file = b"xof 0303".to_vec();
    file.extend_from_slice(format);
    file.extend_from_slice(b"0032");
    file.extend_from_slice(&(payload.len() as u32 + 16).to_le_bytes());
    file.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    file.extend_from_slice(&(payload.len() as u16 + 7).to_le_bytes());
    file.extend_from_slice(b"CK");
    file.push(0x01);
    file.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    file.extend_from_slice(&(!(payload.len() as u16)).to_le_bytes());
    file.extend_from_slice(payload);
    file
}

pub fn load(data: &[u8]) -> (Result<XFile, XParseError>, Vec<Diagnostic>) {
    load_with(data, TemplateRegistry::standard())
}

pub fn load_with(
    data: &[u8],
    registry: &TemplateRegistry,
) -> (Result<XFile, XParseError>, Vec<Diagnostic>) {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let result = XFile::from_data_with(data, &ParseOptions::default(), registry, &mut diagnostics);
    (result, diagnostics)
}

pub fn fixtures_dir() -> PathBuf {
    let base_path = PathBuf::from(
        env::var_os("CARGO_MANIFEST_DIR").expect("could not find cargo manifest dir"),
    );
    base_path.join("tests/fixtures")
}
