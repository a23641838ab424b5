//! Fixed-length sequence normalization.
//!
//! Sequences are always post-padded with zeros. Truncation keeps the first
//! `max_len` tokens by default; `Truncating::Pre` keeps the last ones instead.

use serde::Deserialize;

/// Which end of an over-long sequence is cut
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Truncating {
    /// Drop tokens from the start, keeping the tail
    Pre,
    /// Drop tokens from the end, keeping the head
    #[default]
    Post,
}

/// Value used to fill short sequences
pub const PAD_VALUE: i64 = 0;

/// Pad or truncate `sequence` to exactly `max_len` elements.
pub fn pad_sequence(sequence: &[i64], max_len: usize, truncating: Truncating) -> Vec<i64> {
    let kept = if sequence.len() > max_len {
        match truncating {
            Truncating::Post => &sequence[..max_len],
            Truncating::Pre => &sequence[sequence.len() - max_len..],
        }
    } else {
        sequence
    };

    let mut padded = Vec::with_capacity(max_len);
    padded.extend_from_slice(kept);
    padded.resize(max_len, PAD_VALUE);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sequence_is_right_padded() {
        let padded = pad_sequence(&[4, 8, 15], 20, Truncating::Post);
        assert_eq!(padded.len(), 20);
        assert_eq!(&padded[..3], &[4, 8, 15]);
        assert!(padded[3..].iter().all(|&v| v == PAD_VALUE));
    }

    #[test]
    fn test_long_sequence_keeps_first_tokens() {
        let seq: Vec<i64> = (1..=25).collect();
        let padded = pad_sequence(&seq, 20, Truncating::Post);
        assert_eq!(padded, (1..=20).collect::<Vec<i64>>());
    }

    #[test]
    fn test_pre_truncation_keeps_last_tokens() {
        let seq: Vec<i64> = (1..=25).collect();
        let padded = pad_sequence(&seq, 20, Truncating::Pre);
        assert_eq!(padded, (6..=25).collect::<Vec<i64>>());
    }

    #[test]
    fn test_exact_and_empty() {
        let seq: Vec<i64> = (1..=20).collect();
        assert_eq!(pad_sequence(&seq, 20, Truncating::Post), seq);
        assert_eq!(pad_sequence(&[], 20, Truncating::Post), vec![0; 20]);
    }
}
