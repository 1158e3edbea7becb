//! DAF (Double Precision Array File) container reading.
//!
//! This module family decodes the generic DAF record model independent of
//! SPK semantics: the file record with its heuristic byte-order detection
//! ([`daf_header`]), the doubly linked summary/name record traversal
//! ([`summary`]), the free-text comment area ([`comment`]), and 1-based
//! word-addressed data access ([`word_source`]).
//!
//! A DAF file is a sequence of fixed 1024-byte records, each holding 128
//! eight-byte words. Word addresses are global, 1-based, and map to byte
//! offsets through the record grid.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

use camino::Utf8Path;

use crate::orrery_errors::OrreryError;

pub mod comment;
pub mod daf_header;
pub mod summary;
pub mod word_source;

use daf_header::DafHeader;
use summary::{parse_summaries, read_control_word, SegmentSummary};
use word_source::Endianness;

/// Fixed DAF record size in bytes.
pub const RECORD_BYTES: usize = 1024;
/// Size of one DAF word in bytes.
pub const WORD_BYTES: usize = 8;
/// Words per record (128).
pub const WORDS_PER_RECORD: usize = RECORD_BYTES / WORD_BYTES;
/// Fixed-width segment name length for the SPK summary layout (ND=2, NI=6).
pub const SEGMENT_NAME_LENGTH: usize = 40;
/// Text bytes used per comment record.
const COMMENT_TEXT_BYTES: usize = 1000;
/// EOT byte terminating a comment record's text.
const COMMENT_END_MARKER: u8 = 4;

/// An open DAF container: the parsed file record plus a seekable reader for
/// the remaining records.
///
/// See also
/// ------------
/// * [`DafFile::segment_summaries`] – walk the summary linked list.
/// * [`DafFile::comment_lines`] – extract the comment area.
/// * [`crate::spk::loader::SpkKernel`] – SPK interpretation of the summaries.
#[derive(Debug)]
pub struct DafFile<R> {
    reader: R,
    /// Decoded file record.
    pub header: DafHeader,
}

impl DafFile<BufReader<File>> {
    /// Open a DAF file from disk.
    pub fn open(path: &Utf8Path) -> Result<Self, OrreryError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> DafFile<R> {
    /// Open a DAF container from any seekable reader (files, in-memory
    /// fixtures).
    pub fn from_reader(mut reader: R) -> Result<Self, OrreryError> {
        let mut record = [0u8; RECORD_BYTES];
        reader.seek(SeekFrom::Start(0))?;
        reader
            .read_exact(&mut record)
            .map_err(|e| eof_as(e, OrreryError::RecordOutOfRange(1)))?;
        let header = DafHeader::parse(&record)?;
        Ok(DafFile { reader, header })
    }

    /// Byte order detected when the file record was parsed.
    pub fn byte_order(&self) -> Endianness {
        self.header.byte_order
    }

    fn read_record(
        &mut self,
        record_number: usize,
        buf: &mut [u8; RECORD_BYTES],
    ) -> Result<(), OrreryError> {
        if record_number == 0 {
            return Err(OrreryError::RecordOutOfRange(0));
        }
        let offset = (record_number as u64 - 1) * RECORD_BYTES as u64;
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader
            .read_exact(buf)
            .map_err(|e| eof_as(e, OrreryError::RecordOutOfRange(record_number)))
    }

    /// Read `count` words starting at the 1-based global word `address`,
    /// mapping the address through the 1024-byte/128-word record grid.
    pub fn read_words(&mut self, address: u64, count: usize) -> Result<Vec<f64>, OrreryError> {
        if address == 0 {
            return Err(OrreryError::TruncatedRead(0));
        }
        let record_index = (address - 1) / WORDS_PER_RECORD as u64;
        let word_in_record = (address - 1) % WORDS_PER_RECORD as u64;
        let byte_offset = record_index * RECORD_BYTES as u64 + word_in_record * WORD_BYTES as u64;

        self.reader.seek(SeekFrom::Start(byte_offset))?;
        let mut buf = vec![0u8; count * WORD_BYTES];
        self.reader
            .read_exact(&mut buf)
            .map_err(|e| eof_as(e, OrreryError::TruncatedRead(address)))?;

        let byte_order = self.header.byte_order;
        Ok(buf
            .chunks_exact(WORD_BYTES)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                byte_order.f64_from_bytes(word)
            })
            .collect())
    }

    /// Walk the summary/name record linked list and return every array
    /// summary in file order.
    pub fn segment_summaries(&mut self) -> Result<Vec<SegmentSummary>, OrreryError> {
        if self.header.nd <= 0 || self.header.ni <= 0 {
            return Ok(Vec::new());
        }

        let byte_order = self.header.byte_order;
        let mut summaries = Vec::new();
        let mut visited = Vec::new();
        let mut record_number = self.header.fward;
        while record_number > 0 {
            if visited.contains(&record_number) {
                return Err(OrreryError::MalformedRecord("summary record list cycle"));
            }
            visited.push(record_number);

            let mut summary_record = [0u8; RECORD_BYTES];
            self.read_record(record_number as usize, &mut summary_record)?;

            let next = read_control_word(&summary_record, 0, byte_order);
            let _prev = read_control_word(&summary_record, 1, byte_order);
            let nsum = read_control_word(&summary_record, 2, byte_order);

            if nsum > 10_000 {
                return Err(OrreryError::ImplausibleSummaryCount(nsum as i64));
            }
            if nsum > 0 {
                let mut name_record = [0u8; RECORD_BYTES];
                self.read_record(record_number as usize + 1, &mut name_record)?;
                summaries.extend(parse_summaries(
                    &summary_record,
                    &name_record,
                    nsum,
                    self.header.nd,
                    self.header.ni,
                    byte_order,
                )?);
            }
            record_number = next;
        }
        Ok(summaries)
    }

    /// Extract the comment area: the records between the file record and the
    /// first summary record, decoded as NUL-delimited lines with an EOT byte
    /// ending each record's text.
    pub fn comment_lines(&mut self) -> Result<Vec<String>, OrreryError> {
        if self.header.fward <= 2 {
            return Ok(Vec::new());
        }

        let mut lines = Vec::new();
        let mut current = Vec::new();
        let mut record = [0u8; RECORD_BYTES];
        for record_number in 2..self.header.fward as usize {
            self.read_record(record_number, &mut record)?;
            for &byte in &record[..COMMENT_TEXT_BYTES] {
                match byte {
                    COMMENT_END_MARKER => break,
                    0 => {
                        lines.push(String::from_utf8_lossy(&current).to_string());
                        current.clear();
                    }
                    _ => current.push(byte),
                }
            }
        }
        if !current.is_empty() {
            lines.push(String::from_utf8_lossy(&current).to_string());
        }
        Ok(lines)
    }
}

fn eof_as(error: std::io::Error, replacement: OrreryError) -> OrreryError {
    if error.kind() == std::io::ErrorKind::UnexpectedEof {
        replacement
    } else {
        OrreryError::IoError(error)
    }
}
