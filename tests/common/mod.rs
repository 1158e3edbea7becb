//! Synthetic DAF/SPK fixtures with the real 1024-byte record layout.
//!
//! The builder writes a file record with the proper identification word and
//! ND/NI fields, an optional comment record, a summary/name record pair, and
//! the coefficient payloads addressed by 1-based global word addresses —
//! enough for both the eager reader and the memory-mapped lazy path to treat
//! the fixture as a real kernel. Both byte orders and both control-word
//! encodings (raw int32 and whole-number double) can be produced.

#![allow(dead_code)]

use std::io::Write;

use camino::Utf8Path;
use orrery::daf::word_source::Endianness;

pub const RECORD_BYTES: usize = 1024;
pub const WORDS_PER_RECORD: usize = 128;

/// How the summary-record control words (NEXT, PREV, NSUM) are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlWordStyle {
    /// Raw int32 in the low half of the word (simplified fixtures).
    Integer,
    /// IEEE-754 double holding a whole number (real kernels).
    Double,
}

#[derive(Debug, Clone)]
pub struct FixtureSegment {
    pub name: String,
    pub start: f64,
    pub stop: f64,
    pub target: i32,
    pub center: i32,
    pub frame: i32,
    pub data_type: i32,
    pub payload: Vec<f64>,
}

impl FixtureSegment {
    pub fn new(
        target: i32,
        center: i32,
        data_type: i32,
        start: f64,
        stop: f64,
        payload: Vec<f64>,
    ) -> Self {
        FixtureSegment {
            name: format!("SEGMENT {target} WRT {center}"),
            start,
            stop,
            target,
            center,
            frame: 1,
            data_type,
            payload,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

#[derive(Debug)]
pub struct DafFixtureBuilder {
    byte_order: Endianness,
    control_style: ControlWordStyle,
    comments: Vec<String>,
    segments: Vec<FixtureSegment>,
}

impl Default for DafFixtureBuilder {
    fn default() -> Self {
        DafFixtureBuilder {
            byte_order: Endianness::Little,
            control_style: ControlWordStyle::Double,
            comments: Vec::new(),
            segments: Vec::new(),
        }
    }
}

impl DafFixtureBuilder {
    pub fn new() -> Self {
        DafFixtureBuilder::default()
    }

    pub fn byte_order(mut self, byte_order: Endianness) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn control_style(mut self, style: ControlWordStyle) -> Self {
        self.control_style = style;
        self
    }

    pub fn comment(mut self, line: &str) -> Self {
        self.comments.push(line.to_string());
        self
    }

    pub fn segment(mut self, segment: FixtureSegment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        assert!(self.segments.len() <= 24, "one summary record only");

        let comment_records = usize::from(!self.comments.is_empty());
        let fward = 2 + comment_records;
        let name_record = fward + 1;
        let data_record = fward + 2;

        // 1-based global word addresses of each payload, laid out
        // contiguously from the first data record.
        let mut address = ((data_record - 1) * WORDS_PER_RECORD + 1) as u64;
        let mut ranges = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            assert!(!segment.payload.is_empty());
            let len = segment.payload.len() as u64;
            ranges.push((address, address + len - 1));
            address += len;
        }

        let used_bytes = ((address - 1) * 8) as usize;
        let total_bytes = used_bytes
            .max(name_record * RECORD_BYTES)
            .div_ceil(RECORD_BYTES)
            * RECORD_BYTES;
        let mut bytes = vec![0u8; total_bytes];

        // File record.
        bytes[0..8].copy_from_slice(b"DAF/SPK ");
        self.put_i32(&mut bytes, 8, 2);
        self.put_i32(&mut bytes, 12, 6);
        let mut internal_name = [b' '; 60];
        internal_name[..19].copy_from_slice(b"ORRERY TEST FIXTURE");
        bytes[16..76].copy_from_slice(&internal_name);
        self.put_i32(&mut bytes, 76, fward as i32);
        self.put_i32(&mut bytes, 80, fward as i32);

        // Comment record: NUL-terminated lines, EOT after the last.
        if comment_records == 1 {
            let mut offset = RECORD_BYTES;
            for line in &self.comments {
                bytes[offset..offset + line.len()].copy_from_slice(line.as_bytes());
                offset += line.len();
                bytes[offset] = 0;
                offset += 1;
            }
            bytes[offset] = 4;
            assert!(offset < RECORD_BYTES + 1000, "comment area overflow");
        }

        // Summary record.
        let summary_base = (fward - 1) * RECORD_BYTES;
        self.put_control(&mut bytes, summary_base, 0);
        self.put_control(&mut bytes, summary_base + 8, 0);
        self.put_control(&mut bytes, summary_base + 16, self.segments.len() as i32);

        let mut offset = summary_base + 24;
        for (segment, &(initial, final_address)) in self.segments.iter().zip(&ranges) {
            self.put_f64(&mut bytes, offset, segment.start);
            self.put_f64(&mut bytes, offset + 8, segment.stop);
            offset += 16;
            let integers = [
                segment.target,
                segment.center,
                segment.frame,
                segment.data_type,
                initial as i32,
                final_address as i32,
            ];
            for pair in integers.chunks(2) {
                self.put_i32(&mut bytes, offset, pair[0]);
                self.put_i32(&mut bytes, offset + 4, pair[1]);
                offset += 8;
            }
        }

        // Name record.
        let name_base = (name_record - 1) * RECORD_BYTES;
        for (i, segment) in self.segments.iter().enumerate() {
            let mut name = [b' '; 40];
            let len = segment.name.len().min(40);
            name[..len].copy_from_slice(&segment.name.as_bytes()[..len]);
            bytes[name_base + i * 40..name_base + (i + 1) * 40].copy_from_slice(&name);
        }

        // Coefficient payloads.
        for (segment, &(initial, _)) in self.segments.iter().zip(&ranges) {
            for (i, &value) in segment.payload.iter().enumerate() {
                self.put_f64(&mut bytes, ((initial - 1) as usize + i) * 8, value);
            }
        }

        bytes
    }

    fn put_f64(&self, bytes: &mut [u8], offset: usize, value: f64) {
        let encoded = match self.byte_order {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        };
        bytes[offset..offset + 8].copy_from_slice(&encoded);
    }

    fn put_i32(&self, bytes: &mut [u8], offset: usize, value: i32) {
        let encoded = match self.byte_order {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        };
        bytes[offset..offset + 4].copy_from_slice(&encoded);
    }

    /// Write one control word at `offset`, honoring the chosen encoding.
    /// The integer encoding puts the value in the word half the reader
    /// treats as low for the chosen byte order.
    fn put_control(&self, bytes: &mut [u8], offset: usize, value: i32) {
        match self.control_style {
            ControlWordStyle::Double => self.put_f64(bytes, offset, value as f64),
            ControlWordStyle::Integer => match self.byte_order {
                Endianness::Little => self.put_i32(bytes, offset, value),
                Endianness::Big => self.put_i32(bytes, offset + 4, value),
            },
        }
    }
}

/// A [mid, radius, coefficient sets...] record for multi-record payloads.
pub fn chebyshev_record(mid: f64, radius: f64, sets: &[&[f64]]) -> Vec<f64> {
    let mut record = vec![mid, radius];
    for set in sets {
        record.extend_from_slice(set);
    }
    record
}

/// Concatenate uniform records and append the [INIT, INTLEN, RSIZE, N]
/// trailer the real-kernel layout carries.
pub fn trailered_payload(records: &[Vec<f64>], init: f64, intlen: f64) -> Vec<f64> {
    let rsize = records[0].len();
    assert!(records.iter().all(|r| r.len() == rsize));
    let mut payload: Vec<f64> = records.iter().flatten().copied().collect();
    payload.extend([init, intlen, rsize as f64, records.len() as f64]);
    payload
}

/// Persist fixture bytes for the path-based (lazy/mmap) loading APIs.
pub fn write_temp_kernel(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp kernel");
    file.write_all(bytes).expect("write temp kernel");
    file.flush().expect("flush temp kernel");
    file
}

pub fn temp_kernel_path(file: &tempfile::NamedTempFile) -> &Utf8Path {
    Utf8Path::from_path(file.path()).expect("temp path is UTF-8")
}
