//! Per-file compression engine.
//!
//! Each file gets its own canonical Huffman code. The code travels with the
//! entry as a [`DecodeMap`] of `(symbol, length)` pairs; no tree shape is
//! stored. Files the code cannot represent within the entry format fall back
//! to raw storage (see [`compress`]).

mod bitio;
mod decode_map;
mod decoder;
mod encoder;
mod error;
mod frequency;
mod huffman;

pub use bitio::{BitReader, BitWriter};
pub use decode_map::{DecodeMap, MAX_DECODE_MAP_ENTRIES, STORED_CODE_LENGTH};
pub use decoder::decode;
pub use encoder::{
    check_encodable_len, compress, encode, store, Encoded, EncodingKind, MAX_CONTENT_LEN,
    MAX_ENCODABLE_LEN, MAX_PAYLOAD_LEN,
};
pub use error::CodecError;
pub use frequency::FrequencyTable;
pub use huffman::{Codeword, HuffmanCode, HuffmanModel, MAX_CODE_LENGTH};
