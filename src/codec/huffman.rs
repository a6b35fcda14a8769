//! Canonical Huffman code construction.
//!
//! The merge tree is built greedily from a [`FrequencyTable`]. Ties are broken
//! by `(weight, insertion order)`: leaves enter the queue in ascending symbol
//! order and every internal node takes the next sequence number when it is
//! created, so the tree shape depends on nothing but the counts. The first
//! node taken from the queue becomes the `0` branch.
//!
//! Only code lengths leave this module. Codes are reassigned canonically
//! (ascending length, then ascending symbol), which lets a decoder rebuild
//! the exact code from `(symbol, length)` pairs.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::fmt;

use super::decode_map::DecodeMap;
use super::error::CodecError;
use super::frequency::FrequencyTable;

/// Longest code the bit packer and the decode tables handle.
///
/// A file would need more than `u32::MAX` bytes with Fibonacci-shaped counts
/// to produce a longer code, and entry lengths are capped at `u32::MAX`.
pub const MAX_CODE_LENGTH: u8 = 64;

/// One code: the low `length` bits of `bits`, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Codeword {
    bits: u64,
    length: u8,
}

impl Codeword {
    pub fn new(bits: u64, length: u8) -> Self {
        Self { bits, length }
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn length(&self) -> u8 {
        self.length
    }
}

impl fmt::Display for Codeword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for shift in (0..self.length).rev() {
            let bit = if (self.bits >> shift) & 1 == 1 { '1' } else { '0' };
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

/// Symbol to codeword mapping for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HuffmanCode {
    codes: BTreeMap<u8, Codeword>,
}

impl HuffmanCode {
    pub fn get(&self, symbol: u8) -> Option<Codeword> {
        self.codes.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// `(symbol, codeword)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, Codeword)> + '_ {
        self.codes.iter().map(|(&symbol, &code)| (symbol, code))
    }

    pub fn max_length(&self) -> u8 {
        self.codes.values().map(Codeword::length).max().unwrap_or(0)
    }

    /// Bits needed to pack content with these symbol counts.
    pub fn encoded_bits(&self, frequencies: &FrequencyTable) -> u64 {
        self.iter()
            .map(|(symbol, code)| frequencies.count(symbol) * code.length() as u64)
            .sum()
    }

    fn lengths(&self) -> Vec<(u8, u8)> {
        self.iter()
            .map(|(symbol, code)| (symbol, code.length()))
            .collect()
    }
}

enum Node {
    Leaf(u8),
    Internal { zero: usize, one: usize },
}

/// Builds, canonicalizes and (de)serializes Huffman codes.
pub struct HuffmanModel;

impl HuffmanModel {
    /// Build a Huffman code from symbol counts.
    ///
    /// No symbols yields an empty code. A single symbol gets the one-bit
    /// code `0` so every packed symbol occupies at least one bit.
    pub fn build(frequencies: &FrequencyTable) -> HuffmanCode {
        let leaves: Vec<(u8, u64)> = frequencies.iter().collect();
        match leaves.as_slice() {
            [] => return HuffmanCode::default(),
            [(symbol, _)] => {
                let mut codes = BTreeMap::new();
                codes.insert(*symbol, Codeword::new(0, 1));
                return HuffmanCode { codes };
            }
            _ => {}
        }

        // Node index doubles as insertion order for tie-breaking.
        let mut nodes = Vec::with_capacity(leaves.len() * 2 - 1);
        let mut queue = BinaryHeap::with_capacity(leaves.len());
        for (symbol, count) in leaves {
            queue.push(Reverse((count, nodes.len())));
            nodes.push(Node::Leaf(symbol));
        }

        while queue.len() > 1 {
            let (Some(Reverse((zero_weight, zero))), Some(Reverse((one_weight, one)))) =
                (queue.pop(), queue.pop())
            else {
                break;
            };
            queue.push(Reverse((zero_weight + one_weight, nodes.len())));
            nodes.push(Node::Internal { zero, one });
        }

        let mut codes = BTreeMap::new();
        let mut stack = vec![(nodes.len() - 1, 0u64, 0u8)];
        while let Some((index, bits, depth)) = stack.pop() {
            match nodes[index] {
                Node::Leaf(symbol) => {
                    codes.insert(symbol, Codeword::new(bits, depth));
                }
                Node::Internal { zero, one } => {
                    debug_assert!(depth < MAX_CODE_LENGTH);
                    stack.push((one, (bits << 1) | 1, depth + 1));
                    stack.push((zero, bits << 1, depth + 1));
                }
            }
        }

        HuffmanCode { codes }
    }

    /// Reassign codes canonically, keeping every symbol's code length.
    pub fn canonicalize(code: &HuffmanCode) -> HuffmanCode {
        assign_canonical(code.lengths())
    }

    /// Emit the `(symbol, length)` pairs of a code in ascending symbol order.
    pub fn serialize(code: &HuffmanCode) -> Result<DecodeMap, CodecError> {
        DecodeMap::new(code.lengths())
    }

    /// Rebuild the canonical code described by a decode map.
    pub fn deserialize(map: &DecodeMap) -> Result<HuffmanCode, CodecError> {
        if map.is_stored() {
            return Err(CodecError::corrupt("stored entry carries no Huffman code"));
        }

        let mut kraft_sum: u128 = 0;
        let mut previous_symbol: Option<u8> = None;
        for &(symbol, length) in map.entries() {
            if previous_symbol.is_some_and(|previous| previous >= symbol) {
                return Err(CodecError::corrupt(format!(
                    "decode map symbol {symbol:#04x} is out of order"
                )));
            }
            previous_symbol = Some(symbol);

            if length == 0 || length > MAX_CODE_LENGTH {
                return Err(CodecError::corrupt(format!(
                    "invalid code length {length} for symbol {symbol:#04x}"
                )));
            }
            kraft_sum += 1u128 << (MAX_CODE_LENGTH - length);
        }

        if kraft_sum > 1u128 << MAX_CODE_LENGTH {
            return Err(CodecError::corrupt("decode map code lengths are over-subscribed"));
        }

        Ok(assign_canonical(map.entries().to_vec()))
    }
}

/// Canonical assignment; `lengths` must satisfy the Kraft inequality.
fn assign_canonical(mut lengths: Vec<(u8, u8)>) -> HuffmanCode {
    lengths.sort_unstable_by_key(|&(symbol, length)| (length, symbol));

    let mut codes = BTreeMap::new();
    let mut next: u64 = 0;
    let mut previous_length: Option<u8> = None;
    for (symbol, length) in lengths {
        if let Some(previous) = previous_length {
            next = (next + 1) << (length - previous);
        }
        codes.insert(symbol, Codeword::new(next, length));
        previous_length = Some(length);
    }

    HuffmanCode { codes }
}
