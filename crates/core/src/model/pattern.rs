//! Masked byte patterns.
//!
//! A pattern carries the raw bytes captured from a function together with a
//! per-byte mask. Every set bit of the mask must match exactly; cleared bits
//! are wildcards. In practice masks are nibble-granular (`0xff`, `0xf0`,
//! `0x0f`, `0x00`) because relocations and immediates are masked per nibble.

use serde::{Deserialize, Serialize};

use crate::error::{ZignError, ZignResult};

/// Byte pattern plus mask of identical length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytePattern {
    bytes: Vec<u8>,
    mask: Vec<u8>,
}

impl BytePattern {
    /// Build a pattern, rejecting empty input, length mismatches and all-zero masks.
    ///
    /// An all-zero mask would match every location, so it is never a useful signature.
    pub fn new(bytes: Vec<u8>, mask: Vec<u8>) -> ZignResult<Self> {
        if bytes.is_empty() {
            return Err(ZignError::Validation("byte pattern is empty".into()));
        }
        if bytes.len() != mask.len() {
            return Err(ZignError::Validation(format!(
                "pattern has {} bytes but mask has {}",
                bytes.len(),
                mask.len()
            )));
        }
        if mask.iter().all(|&m| m == 0) {
            return Err(ZignError::Validation("mask is all zero".into()));
        }
        Ok(Self { bytes, mask })
    }

    /// Pattern where every bit must match.
    pub fn exact(bytes: &[u8]) -> ZignResult<Self> {
        Self::new(bytes.to_vec(), vec![0xff; bytes.len()])
    }

    /// Parse the listing form: two characters per byte, each either a hex
    /// digit (nibble must match) or `.` (wildcard nibble).
    ///
    /// `"55..89e5"` becomes bytes `55 00 89 e5` with mask `ff 00 ff ff`.
    pub fn from_masked_hex(text: &str) -> ZignResult<Self> {
        let chars: Vec<char> = text.trim().chars().collect();
        if chars.len() % 2 != 0 {
            return Err(ZignError::Validation(format!(
                "masked hex `{text}` has an odd number of nibbles"
            )));
        }

        let mut bytes = Vec::with_capacity(chars.len() / 2);
        let mut mask = Vec::with_capacity(chars.len() / 2);
        for pair in chars.chunks(2) {
            let (hi, hi_mask) = parse_nibble(pair[0], text)?;
            let (lo, lo_mask) = parse_nibble(pair[1], text)?;
            bytes.push((hi << 4) | lo);
            mask.push((hi_mask << 4) | lo_mask);
        }
        Self::new(bytes, mask)
    }

    /// Render the listing form (inverse of [`BytePattern::from_masked_hex`]).
    pub fn to_masked_hex(&self) -> String {
        let mut out = String::with_capacity(self.bytes.len() * 2);
        for (&b, &m) in self.bytes.iter().zip(&self.mask) {
            out.push(if m & 0xf0 != 0 { nibble_char(b >> 4) } else { '.' });
            out.push(if m & 0x0f != 0 { nibble_char(b & 0x0f) } else { '.' });
        }
        out
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Check the pattern against the start of `data`.
    pub fn matches(&self, data: &[u8]) -> bool {
        if data.len() < self.bytes.len() {
            return false;
        }
        self.bytes
            .iter()
            .zip(&self.mask)
            .zip(data)
            .all(|((&p, &m), &d)| d & m == p & m)
    }

    /// Longest run of fully masked bytes as `(offset, len)`; `len == 0` when
    /// every byte has at least one wildcard bit.
    pub fn longest_exact_run(&self) -> (usize, usize) {
        let mut best = (0, 0);
        let mut start = 0;
        for (i, &m) in self.mask.iter().enumerate() {
            if m != 0xff {
                start = i + 1;
                continue;
            }
            let len = i + 1 - start;
            if len > best.1 {
                best = (start, len);
            }
        }
        best
    }
}

fn parse_nibble(c: char, text: &str) -> ZignResult<(u8, u8)> {
    if c == '.' {
        return Ok((0, 0));
    }
    c.to_digit(16)
        .map(|d| (d as u8, 0xf))
        .ok_or_else(|| ZignError::Validation(format!("invalid character `{c}` in `{text}`")))
}

fn nibble_char(n: u8) -> char {
    char::from_digit(u32::from(n), 16).unwrap_or('?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_mask_and_empty_pattern() {
        assert!(BytePattern::new(vec![0x55], vec![0x00]).is_err());
        assert!(BytePattern::new(vec![], vec![]).is_err());
        assert!(BytePattern::new(vec![0x55, 0x48], vec![0xff]).is_err());
    }

    #[test]
    fn masked_hex_round_trips_listing_form() {
        let pattern = BytePattern::from_masked_hex("55..89e5").unwrap();
        assert_eq!(pattern.bytes(), &[0x55, 0x00, 0x89, 0xe5]);
        assert_eq!(pattern.mask(), &[0xff, 0x00, 0xff, 0xff]);
        assert_eq!(pattern.to_masked_hex(), "55..89e5");

        let half = BytePattern::from_masked_hex("4.").unwrap();
        assert_eq!(half.mask(), &[0xf0]);
        assert_eq!(half.to_masked_hex(), "4.");
    }

    #[test]
    fn masked_hex_rejects_garbage() {
        assert!(BytePattern::from_masked_hex("5").is_err());
        assert!(BytePattern::from_masked_hex("zz").is_err());
        assert!(BytePattern::from_masked_hex("....").is_err());
    }

    #[test]
    fn matches_respects_nibble_mask() {
        let pattern = BytePattern::new(vec![0xde, 0xad, 0xbe, 0xef], vec![0xff, 0x00, 0xff, 0xf0])
            .unwrap();
        assert!(pattern.matches(&[0xde, 0x11, 0xbe, 0xe3]));
        assert!(!pattern.matches(&[0xde, 0x11, 0xbe, 0x2f]));
        assert!(!pattern.matches(&[0xde, 0x11, 0xbe]));
    }

    #[test]
    fn longest_exact_run_picks_widest_window() {
        let pattern = BytePattern::from_masked_hex("55..8948e5..4883ec10").unwrap();
        assert_eq!(pattern.longest_exact_run(), (6, 4));

        let wild = BytePattern::from_masked_hex("5.6.").unwrap();
        assert_eq!(wild.longest_exact_run().1, 0);
    }
}
