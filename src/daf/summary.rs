//! Summary and name record decoding.
//!
//! Summary records form a doubly linked list anchored by the file-record
//! pointers. Each record starts with three 8-byte control words (NEXT,
//! PREV, NSUM) followed by up to NSUM packed summaries: `ND` doubles, then
//! `NI` 32-bit integers two per word (an odd `NI` leaves the final word
//! half empty). The physically following record pairs each summary with a
//! 40-byte name string.
//!
//! # Control-word encodings
//!
//! Real kernels store the control values as IEEE-754 doubles holding whole
//! numbers; simplified fixtures write them as raw 32-bit integers in the
//! low half of the word. [`read_control_word`] accepts both by decoding
//! candidates and keeping whichever yields a sane small integer — an
//! explicit decode-and-validate step, never a silent default.

use crate::daf::word_source::Endianness;
use crate::daf::{SEGMENT_NAME_LENGTH, WORDS_PER_RECORD, WORD_BYTES};
use crate::orrery_errors::OrreryError;

/// One raw DAF array summary: packed numeric components plus the paired
/// name-record entry and the 1-based word address range of the array data.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSummary {
    /// The ND double-precision summary components.
    pub doubles: Vec<f64>,
    /// The NI integer summary components.
    pub integers: Vec<i32>,
    /// Segment name, right-trimmed of NUL/space padding.
    pub name: String,
    /// 1-based word address of the first array element (integer component 5).
    pub initial_address: i32,
    /// 1-based word address of the last array element (integer component 6).
    pub final_address: i32,
}

/// Decode one summary-record control word (NEXT, PREV or NSUM).
///
/// The low integer half is preferred when the high half is clear; otherwise
/// the word is decoded as a double and accepted when it encodes a whole
/// number of sane magnitude. Falls back to the low half.
pub(crate) fn read_control_word(record: &[u8], index: usize, byte_order: Endianness) -> i32 {
    let offset = index * WORD_BYTES;
    let word: [u8; 8] = record[offset..offset + 8]
        .try_into()
        .expect("control word is 8 bytes");

    let (low_half, high_half) = match byte_order {
        Endianness::Little => ([word[0], word[1], word[2], word[3]], [word[4], word[5], word[6], word[7]]),
        Endianness::Big => ([word[4], word[5], word[6], word[7]], [word[0], word[1], word[2], word[3]]),
    };
    let low = byte_order.i32_from_bytes(low_half);
    let high = byte_order.i32_from_bytes(high_half);
    if high == 0 && low != 0 {
        return low;
    }

    let as_double = byte_order.f64_from_bytes(word);
    if as_double.is_finite() && as_double.abs() < i32::MAX as f64 {
        let rounded = as_double.round();
        if (as_double - rounded).abs() < 1e-12 {
            return rounded as i32;
        }
    }
    low
}

/// Decode every summary in a summary/name record pair.
///
/// Arguments
/// -----------------
/// * `summary_record`: The full 1024-byte summary record.
/// * `name_record`: The physically following 1024-byte name record.
/// * `nsum`: Summary count already decoded from control word 2.
/// * `nd`, `ni`: Summary layout from the file record.
///
/// Return
/// ----------
/// * The decoded summaries in record order, or a structural error when the
///   declared layout cannot fit the record
///   ([`OrreryError::SummaryRecordOverflow`]).
pub(crate) fn parse_summaries(
    summary_record: &[u8],
    name_record: &[u8],
    nsum: i32,
    nd: i32,
    ni: i32,
    byte_order: Endianness,
) -> Result<Vec<SegmentSummary>, OrreryError> {
    let summary_word_span = nd as usize + (ni as usize).div_ceil(2);
    let capacity_words = WORDS_PER_RECORD - 3;
    if summary_word_span * nsum as usize > capacity_words {
        return Err(OrreryError::SummaryRecordOverflow { nd, ni, nsum });
    }

    let read_word = |word_index: usize| -> [u8; 8] {
        let offset = word_index * WORD_BYTES;
        summary_record[offset..offset + 8]
            .try_into()
            .expect("summary word is 8 bytes")
    };

    let mut summaries = Vec::with_capacity(nsum as usize);
    let mut word_index = 3;
    for i in 0..nsum as usize {
        let mut doubles = Vec::with_capacity(nd as usize);
        for _ in 0..nd {
            doubles.push(byte_order.f64_from_bytes(read_word(word_index)));
            word_index += 1;
        }

        let mut integers = Vec::with_capacity(ni as usize);
        let mut remaining = ni;
        while remaining > 0 {
            let word = read_word(word_index);
            let first: [u8; 4] = word[0..4].try_into().expect("half word");
            integers.push(byte_order.i32_from_bytes(first));
            remaining -= 1;
            if remaining > 0 {
                let second: [u8; 4] = word[4..8].try_into().expect("half word");
                integers.push(byte_order.i32_from_bytes(second));
                remaining -= 1;
            }
            word_index += 1;
        }

        let name_offset = i * SEGMENT_NAME_LENGTH;
        let name = if name_offset + SEGMENT_NAME_LENGTH <= name_record.len() {
            String::from_utf8_lossy(&name_record[name_offset..name_offset + SEGMENT_NAME_LENGTH])
                .trim_end_matches(['\0', ' '])
                .to_string()
        } else {
            String::new()
        };

        let initial_address = integers.get(4).copied().unwrap_or(0);
        let final_address = integers.get(5).copied().unwrap_or(0);
        summaries.push(SegmentSummary {
            doubles,
            integers,
            name,
            initial_address,
            final_address,
        });
    }
    Ok(summaries)
}
