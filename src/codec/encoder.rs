use serde::Serialize;
use tracing::warn;

use super::bitio::BitWriter;
use super::decode_map::{DecodeMap, MAX_DECODE_MAP_ENTRIES};
use super::error::CodecError;
use super::frequency::FrequencyTable;
use super::huffman::HuffmanModel;

/// Largest payload the two-byte length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Largest content the four-byte original length field can describe.
pub const MAX_CONTENT_LEN: usize = u32::MAX as usize;

/// Longest content any entry can hold: every symbol costs at least one bit.
pub const MAX_ENCODABLE_LEN: u64 = MAX_PAYLOAD_LEN as u64 * 8;

/// How an entry's payload represents its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingKind {
    Huffman,
    Stored,
}

impl EncodingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Huffman => "huffman",
            Self::Stored => "stored",
        }
    }
}

/// Everything an archive entry needs besides its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub decode_map: DecodeMap,
    pub payload: Vec<u8>,
    pub original_len: u32,
}

impl Encoded {
    pub fn kind(&self) -> EncodingKind {
        if self.decode_map.is_stored() {
            EncodingKind::Stored
        } else {
            EncodingKind::Huffman
        }
    }
}

/// Reject content of `len` bytes that cannot fit an entry in any form.
///
/// Lets callers refuse a file from its metadata before reading it.
pub fn check_encodable_len(len: u64) -> Result<(), CodecError> {
    if len > MAX_ENCODABLE_LEN {
        return Err(CodecError::CompressedSizeOverflow {
            size: len.div_ceil(8) as usize,
            max: MAX_PAYLOAD_LEN,
        });
    }
    Ok(())
}

fn original_len(content: &[u8]) -> Result<u32, CodecError> {
    u32::try_from(content.len()).map_err(|_| CodecError::ContentTooLarge {
        size: content.len(),
        max: MAX_CONTENT_LEN,
    })
}

/// Huffman-encode `content` with its own canonical code.
///
/// # Errors
///
/// - `AlphabetOverflow` when all 256 byte values occur
/// - `CompressedSizeOverflow` when the packed bits need more than
///   [`MAX_PAYLOAD_LEN`] bytes
/// - `ContentTooLarge` when the content length does not fit in a `u32`
pub fn encode(content: &[u8]) -> Result<Encoded, CodecError> {
    let original_len = original_len(content)?;
    check_encodable_len(content.len() as u64)?;

    let frequencies = FrequencyTable::from_bytes(content);
    let symbols = frequencies.distinct_symbols();
    if symbols > MAX_DECODE_MAP_ENTRIES {
        return Err(CodecError::AlphabetOverflow {
            symbols,
            max: MAX_DECODE_MAP_ENTRIES,
        });
    }

    let code = HuffmanModel::canonicalize(&HuffmanModel::build(&frequencies));
    let decode_map = HuffmanModel::serialize(&code)?;

    // Size check before packing so oversized files fail fast.
    let payload_len = code.encoded_bits(&frequencies).div_ceil(8) as usize;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(CodecError::CompressedSizeOverflow {
            size: payload_len,
            max: MAX_PAYLOAD_LEN,
        });
    }

    let mut table = [(0u64, 0u8); 256];
    for (symbol, codeword) in code.iter() {
        table[symbol as usize] = (codeword.bits(), codeword.length());
    }

    let mut writer = BitWriter::with_capacity(payload_len);
    for &byte in content {
        let (bits, length) = table[byte as usize];
        writer.write_bits(bits, length);
    }
    debug_assert_eq!(writer.bit_len() as u64, code.encoded_bits(&frequencies));
    let payload = writer.finish();

    Ok(Encoded {
        decode_map,
        payload,
        original_len,
    })
}

/// Represent `content` literally behind the stored sentinel map.
pub fn store(content: &[u8]) -> Result<Encoded, CodecError> {
    let original_len = original_len(content)?;
    if content.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::CompressedSizeOverflow {
            size: content.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }

    Ok(Encoded {
        decode_map: DecodeMap::stored(),
        payload: content.to_vec(),
        original_len,
    })
}

/// Huffman-encode `content`, storing it raw when the code cannot be used.
///
/// Errors from the raw fallback are returned as is: if neither form fits the
/// entry format the file cannot be archived.
pub fn compress(content: &[u8]) -> Result<Encoded, CodecError> {
    match encode(content) {
        Err(e) if e.is_fallback_trigger() => {
            warn!(len = content.len(), "Huffman coding unusable ({}), storing raw", e);
            store(content)
        }
        result => result,
    }
}
