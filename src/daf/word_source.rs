//! Random access to a kernel's 8-byte word array.
//!
//! DAF addresses count **double-precision words** (8-byte units) starting at
//! 1, so word `a` lives at byte offset `(a - 1) * 8`. [`WordSource`] wraps a
//! kernel file behind that addressing scheme with the byte order fixed at
//! construction (taken from the DAF header detection, never per call).
//!
//! Two variants exist:
//! * [`WordSource::Stream`] seeks before every read over a buffered file
//!   handle. It carries an internal cursor and is meant for one session.
//! * [`WordSource::Mmap`] memory-maps the file for constant-time random
//!   access and may be shared read-only; preferred for large kernels.
//!
//! Any read past the end of the data signals [`OrreryError::TruncatedRead`];
//! callers treat that as fatal for the affected segment.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::sync::Mutex;

use camino::Utf8Path;
use memmap2::Mmap;

use crate::orrery_errors::OrreryError;

/// Byte order of numeric data inside a DAF file, decided once when the file
/// record is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub(crate) fn f64_from_bytes(&self, bytes: [u8; 8]) -> f64 {
        match self {
            Endianness::Little => f64::from_le_bytes(bytes),
            Endianness::Big => f64::from_be_bytes(bytes),
        }
    }

    pub(crate) fn i32_from_bytes(&self, bytes: [u8; 4]) -> i32 {
        match self {
            Endianness::Little => i32::from_le_bytes(bytes),
            Endianness::Big => i32::from_be_bytes(bytes),
        }
    }
}

impl std::fmt::Display for Endianness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endianness::Little => write!(f, "little-endian"),
            Endianness::Big => write!(f, "big-endian"),
        }
    }
}

/// A kernel's coefficient area, addressed by 1-based 8-byte words.
#[derive(Debug)]
pub enum WordSource {
    /// Seek-per-read over a buffered file handle.
    Stream {
        reader: Mutex<BufReader<File>>,
        byte_order: Endianness,
    },
    /// Memory-mapped file, constant-time random access.
    Mmap { map: Mmap, byte_order: Endianness },
}

impl WordSource {
    /// Open a stream-backed source over `path`.
    pub fn open_stream(path: &Utf8Path, byte_order: Endianness) -> Result<Self, OrreryError> {
        let file = File::open(path)?;
        Ok(WordSource::Stream {
            reader: Mutex::new(BufReader::new(file)),
            byte_order,
        })
    }

    /// Memory-map `path` for random access.
    pub fn open_mmap(path: &Utf8Path, byte_order: Endianness) -> Result<Self, OrreryError> {
        let file = File::open(path)?;
        let map = unsafe { Mmap::map(&file)? };
        Ok(WordSource::Mmap { map, byte_order })
    }

    pub fn byte_order(&self) -> Endianness {
        match self {
            WordSource::Stream { byte_order, .. } | WordSource::Mmap { byte_order, .. } => {
                *byte_order
            }
        }
    }

    /// Read the word at 1-based `address`.
    pub fn read_word(&self, address: u64) -> Result<f64, OrreryError> {
        let mut out = [0.0];
        self.read_into(address, &mut out)?;
        Ok(out[0])
    }

    /// Read `count` consecutive words starting at 1-based `address`.
    pub fn read_words(&self, address: u64, count: usize) -> Result<Vec<f64>, OrreryError> {
        let mut out = vec![0.0; count];
        self.read_into(address, &mut out)?;
        Ok(out)
    }

    fn read_into(&self, address: u64, destination: &mut [f64]) -> Result<(), OrreryError> {
        if address == 0 {
            return Err(OrreryError::TruncatedRead(0));
        }
        let byte_offset = (address - 1) * 8;
        match self {
            WordSource::Stream { reader, byte_order } => {
                let mut guard = reader.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                guard.seek(SeekFrom::Start(byte_offset))?;
                let mut buf = vec![0u8; destination.len() * 8];
                guard.read_exact(&mut buf).map_err(|e| truncated(e, address))?;
                for (slot, chunk) in destination.iter_mut().zip(buf.chunks_exact(8)) {
                    let mut word = [0u8; 8];
                    word.copy_from_slice(chunk);
                    *slot = byte_order.f64_from_bytes(word);
                }
                Ok(())
            }
            WordSource::Mmap { map, byte_order } => {
                let start = byte_offset as usize;
                let end = start + destination.len() * 8;
                let bytes = map
                    .get(start..end)
                    .ok_or(OrreryError::TruncatedRead(address))?;
                for (slot, chunk) in destination.iter_mut().zip(bytes.chunks_exact(8)) {
                    let mut word = [0u8; 8];
                    word.copy_from_slice(chunk);
                    *slot = byte_order.f64_from_bytes(word);
                }
                Ok(())
            }
        }
    }
}

fn truncated(error: std::io::Error, address: u64) -> OrreryError {
    if error.kind() == std::io::ErrorKind::UnexpectedEof {
        OrreryError::TruncatedRead(address)
    } else {
        OrreryError::IoError(error)
    }
}

#[cfg(test)]
mod test_word_source {
    use super::*;
    use std::io::Write;

    fn write_fixture(values: &[f64], byte_order: Endianness) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for v in values {
            let bytes = match byte_order {
                Endianness::Little => v.to_le_bytes(),
                Endianness::Big => v.to_be_bytes(),
            };
            file.write_all(&bytes).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_stream_and_mmap_agree() {
        let values = [1.5, -2.25, 3.75, 1e100];
        let file = write_fixture(&values, Endianness::Little);
        let path = Utf8Path::from_path(file.path()).unwrap();

        let stream = WordSource::open_stream(path, Endianness::Little).unwrap();
        let mmap = WordSource::open_mmap(path, Endianness::Little).unwrap();

        for (i, expected) in values.iter().enumerate() {
            let address = i as u64 + 1;
            assert_eq!(stream.read_word(address).unwrap(), *expected);
            assert_eq!(mmap.read_word(address).unwrap(), *expected);
        }
        assert_eq!(stream.read_words(2, 3).unwrap(), values[1..4].to_vec());
        assert_eq!(mmap.read_words(2, 3).unwrap(), values[1..4].to_vec());
    }

    #[test]
    fn test_big_endian_words() {
        let values = [42.0, -0.5];
        let file = write_fixture(&values, Endianness::Big);
        let path = Utf8Path::from_path(file.path()).unwrap();

        let source = WordSource::open_mmap(path, Endianness::Big).unwrap();
        assert_eq!(source.read_word(1).unwrap(), 42.0);
        assert_eq!(source.read_word(2).unwrap(), -0.5);
    }

    #[test]
    fn test_read_past_end_is_truncation() {
        let file = write_fixture(&[1.0], Endianness::Little);
        let path = Utf8Path::from_path(file.path()).unwrap();

        for source in [
            WordSource::open_stream(path, Endianness::Little).unwrap(),
            WordSource::open_mmap(path, Endianness::Little).unwrap(),
        ] {
            assert!(matches!(
                source.read_word(2),
                Err(OrreryError::TruncatedRead(2))
            ));
            assert!(matches!(
                source.read_words(1, 2),
                Err(OrreryError::TruncatedRead(1))
            ));
        }
    }
}
