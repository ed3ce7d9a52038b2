//! PlantUML text encoding.
//!
//! PlantUML servers accept diagram source embedded directly in a URL path.
//! The payload is the raw deflate stream of the UTF-8 source (a zlib stream
//! with its 2-byte header and 4-byte Adler-32 trailer removed), re-encoded
//! with a 64-symbol URL-safe alphabet, 6 bits per symbol.
//!
//! # Example
//!
//! ```
//! # use plantbatch_core::encoding::{ALPHABET, encode};
//! let payload = encode("@startuml\nAlice -> Bob\n@enduml\n");
//! assert!(payload.bytes().all(|b| ALPHABET.contains(&b)));
//! ```

use std::io::Write;

use flate2::{Compression, write::ZlibEncoder};
use log::trace;

/// The 64-symbol alphabet used by PlantUML, indexed by 6-bit value.
pub const ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

const ZLIB_HEADER_LEN: usize = 2;
const ZLIB_TRAILER_LEN: usize = 4;

/// Encode diagram source text into a PlantUML URL payload.
///
/// The result is deterministic for a given input: the compression level is
/// fixed at [`Compression::best`] and the alphabet is fixed. Any input,
/// including the empty string, encodes successfully.
pub fn encode(text: &str) -> String {
    let compressed = deflate(text.as_bytes());
    let end = compressed.len().saturating_sub(ZLIB_TRAILER_LEN);
    let raw = compressed.get(ZLIB_HEADER_LEN..end).unwrap_or_default();

    trace!(
        source_len = text.len(),
        deflate_len = raw.len();
        "Encoded diagram source"
    );

    encode_bytes(raw)
}

/// Pack bytes into the 6-bit alphabet, 3 bytes to 4 symbols.
///
/// A trailing partial group is zero-padded, so the output length is always
/// a multiple of 4.
pub fn encode_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let b1 = chunk[0];
        let b2 = chunk.get(1).copied().unwrap_or(0);
        let b3 = chunk.get(2).copied().unwrap_or(0);

        out.push(symbol(b1 >> 2));
        out.push(symbol(((b1 & 0x3) << 4) | (b2 >> 4)));
        out.push(symbol(((b2 & 0xF) << 2) | (b3 >> 6)));
        out.push(symbol(b3 & 0x3F));
    }

    out
}

fn symbol(value: u8) -> char {
    char::from(ALPHABET[usize::from(value & 0x3F)])
}

fn deflate(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(bytes.len()), Compression::best());
    encoder
        .write_all(bytes)
        .expect("Writing to Vec buffer is infallible");
    encoder
        .finish()
        .expect("Writing to Vec buffer is infallible")
}
