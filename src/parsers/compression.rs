use crate::parsers::{header::HEADER_LEN, XParseError};
use libflate::deflate::Decoder;
use log::debug;
use std::io::Read;

/// Offset of the DEFLATE stream inside a compressed file: the regular header, the uncompressed size (u32), the
/// block's uncompressed and compressed sizes (u16 each) and the `CK` signature.
pub const COMPRESSED_DATA_OFFSET: usize = HEADER_LEN + 4 + 2 + 2 + 2;

/// Inflates the data of a `tzip`/`bzip` file. `data` is the whole file, header included. The result is the buffer
/// the text or binary engine parses.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, XParseError> {
    if data.len() < COMPRESSED_DATA_OFFSET {
        return Err(XParseError::NotEnoughData);
    }

    if &data[COMPRESSED_DATA_OFFSET - 2..COMPRESSED_DATA_OFFSET] != b"CK" {
        return Err(XParseError::Decompression(
            "missing CK block signature".to_string(),
        ));
    }

    let mut decoder = Decoder::new(&data[COMPRESSED_DATA_OFFSET..]);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| XParseError::Decompression(e.to_string()))?;

    debug!(
        "inflated {} bytes into {} bytes",
        data.len() - COMPRESSED_DATA_OFFSET,
        inflated.len()
    );

    Ok(inflated)
}
