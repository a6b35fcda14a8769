use super::bitio::BitReader;
use super::decode_map::DecodeMap;
use super::error::CodecError;
use super::huffman::{HuffmanCode, HuffmanModel, MAX_CODE_LENGTH};

/// Per-length lookup for canonical codes.
///
/// Canonical codes of one length are consecutive integers, so a prefix of
/// length `n` matches iff it falls in `[first[n], first[n] + count[n])`.
struct DecodeTable {
    first_code: [u64; MAX_CODE_LENGTH as usize + 1],
    count: [u64; MAX_CODE_LENGTH as usize + 1],
    /// Offset into `symbols` of the first code of each length
    offset: [usize; MAX_CODE_LENGTH as usize + 1],
    /// Symbols ordered by (length, code)
    symbols: Vec<u8>,
    max_length: u8,
}

impl DecodeTable {
    fn new(code: &HuffmanCode) -> Self {
        let mut ordered: Vec<(u8, u64, u8)> = code
            .iter()
            .map(|(symbol, codeword)| (codeword.length(), codeword.bits(), symbol))
            .collect();
        ordered.sort_unstable();

        let mut table = Self {
            first_code: [0; MAX_CODE_LENGTH as usize + 1],
            count: [0; MAX_CODE_LENGTH as usize + 1],
            offset: [0; MAX_CODE_LENGTH as usize + 1],
            symbols: Vec::with_capacity(ordered.len()),
            max_length: code.max_length(),
        };

        for (index, &(length, bits, symbol)) in ordered.iter().enumerate() {
            let length = length as usize;
            if table.count[length] == 0 {
                table.first_code[length] = bits;
                table.offset[length] = index;
            }
            table.count[length] += 1;
            table.symbols.push(symbol);
        }

        table
    }

    #[inline]
    fn lookup(&self, prefix: u64, length: u8) -> Option<u8> {
        let length = length as usize;
        let index = prefix.checked_sub(self.first_code[length])?;
        if index < self.count[length] {
            Some(self.symbols[self.offset[length] + index as usize])
        } else {
            None
        }
    }
}

/// Reconstruct `original_len` bytes from a decode map and its payload.
///
/// Bits past the last symbol are padding and are ignored.
///
/// # Errors
///
/// `CorruptStream` when the payload runs out early, when an accumulated
/// prefix longer than every code matches nothing, or when the map cannot
/// describe the requested content.
pub fn decode(map: &DecodeMap, payload: &[u8], original_len: u32) -> Result<Vec<u8>, CodecError> {
    if map.is_stored() {
        if payload.len() != original_len as usize {
            return Err(CodecError::corrupt(format!(
                "stored payload is {} bytes, header says {}",
                payload.len(),
                original_len
            )));
        }
        return Ok(payload.to_vec());
    }

    if original_len == 0 {
        return Ok(Vec::new());
    }
    if map.is_empty() {
        return Err(CodecError::corrupt(format!(
            "empty decode map cannot produce {original_len} symbols"
        )));
    }

    let table = DecodeTable::new(&HuffmanModel::deserialize(map)?);
    let mut reader = BitReader::new(payload);
    // Every symbol costs at least one bit.
    let mut output = Vec::with_capacity((original_len as usize).min(reader.bits_remaining()));

    while output.len() < original_len as usize {
        let mut prefix = 0u64;
        let mut length = 0u8;
        let symbol = loop {
            let bit = reader.read_bit().ok_or_else(|| {
                CodecError::corrupt(format!(
                    "bit stream exhausted after {} of {} symbols",
                    output.len(),
                    original_len
                ))
            })?;
            prefix = (prefix << 1) | bit as u64;
            length += 1;

            if let Some(symbol) = table.lookup(prefix, length) {
                break symbol;
            }
            if length >= table.max_length {
                return Err(CodecError::corrupt(format!(
                    "no code matches the bits ending at position {}",
                    reader.position()
                )));
            }
        };
        output.push(symbol);
    }

    Ok(output)
}
