//! DAF file-record parsing.
//!
//! This module decodes the first 1024-byte record of a DAF container (the
//! "file record") into a [`DafHeader`]: format identifier, summary layout
//! (`ND`/`NI`), internal file name, and the forward/backward pointers that
//! anchor the doubly linked list of summary records.
//!
//! # Endianness detection
//!
//! DAF files carry no reliable, always-present byte-order tag, so the byte
//! order is detected heuristically from the `ND`/`NI` header fields: both
//! are decoded under the little- and the big-endian interpretation, and an
//! interpretation is *plausible* when both values land in `1..=255`.
//! Exactly one plausible interpretation selects the file byte order. When
//! both or neither are plausible the file is rejected with
//! [`OrreryError::AmbiguousEndianness`] — guessing would corrupt every
//! downstream address and coefficient, so the ambiguity is surfaced
//! instead.

use std::fmt;

use nom::bytes::complete::take;

use crate::daf::word_source::Endianness;
use crate::orrery_errors::OrreryError;

/// In-memory representation of the DAF file record (first 1024-byte record).
///
/// Fields are trimmed of trailing padding where applicable (`idword`,
/// `internal_filename`).
#[derive(Debug, PartialEq, Clone)]
pub struct DafHeader {
    /// 8-byte identifier, typically `"DAF/SPK"`.
    pub idword: String,
    /// 60-byte, padded internal kernel name.
    pub internal_filename: String,
    /// Number of double-precision components in each summary (ND).
    pub nd: i32,
    /// Number of integer components in each summary (NI).
    pub ni: i32,
    /// Record index of the first summary record (forward pointer).
    pub fward: i32,
    /// Record index of the last summary record (backward pointer).
    pub bward: i32,
    /// Byte order detected from the ND/NI heuristic.
    pub byte_order: Endianness,
}

fn plausible(value: i32) -> bool {
    (1..=255).contains(&value)
}

impl DafHeader {
    /// Parse the first 1024-byte DAF record into a [`DafHeader`].
    ///
    /// Arguments
    /// -----------------
    /// * `record`: The file record bytes, at least 84 bytes long (callers
    ///   hand in the full 1024-byte record).
    ///
    /// Return
    /// ----------
    /// * The decoded header, or a structural error: [`OrreryError::NotADafFile`]
    ///   for a foreign identification word, [`OrreryError::AmbiguousEndianness`]
    ///   when the ND/NI heuristic cannot decide a byte order.
    pub fn parse(record: &[u8]) -> Result<Self, OrreryError> {
        let (record, id_word) = take::<_, _, nom::error::Error<&[u8]>>(8usize)(record)
            .map_err(|_| OrreryError::MalformedRecord("file record too short"))?;
        let idword = String::from_utf8_lossy(id_word).trim_end().to_string();
        if !(idword.starts_with("DAF/") || idword.starts_with("NAIF/DAF")) {
            return Err(OrreryError::NotADafFile(idword));
        }

        if record.len() < 76 {
            return Err(OrreryError::MalformedRecord("file record too short"));
        }

        // ND at byte 8, NI at byte 12: decode both candidate byte orders and
        // keep whichever alone is plausible.
        let nd_bytes: [u8; 4] = record[0..4].try_into().expect("slice length checked");
        let ni_bytes: [u8; 4] = record[4..8].try_into().expect("slice length checked");
        let little_ok = plausible(i32::from_le_bytes(nd_bytes)) && plausible(i32::from_le_bytes(ni_bytes));
        let big_ok = plausible(i32::from_be_bytes(nd_bytes)) && plausible(i32::from_be_bytes(ni_bytes));
        if little_ok == big_ok {
            return Err(OrreryError::AmbiguousEndianness);
        }
        let byte_order = if little_ok {
            Endianness::Little
        } else {
            Endianness::Big
        };

        let nd = byte_order.i32_from_bytes(nd_bytes);
        let ni = byte_order.i32_from_bytes(ni_bytes);

        let (record, _) = take::<_, _, nom::error::Error<&[u8]>>(8usize)(record)
            .map_err(|_| OrreryError::MalformedRecord("file record too short"))?;
        let (record, ifname) = take::<_, _, nom::error::Error<&[u8]>>(60usize)(record)
            .map_err(|_| OrreryError::MalformedRecord("file record too short"))?;
        let internal_filename = String::from_utf8_lossy(ifname)
            .trim_end_matches(['\0', ' '])
            .to_string();

        let fward_bytes: [u8; 4] = record[0..4].try_into().expect("slice length checked");
        let bward_bytes: [u8; 4] = record[4..8].try_into().expect("slice length checked");
        let fward = byte_order.i32_from_bytes(fward_bytes);
        let bward = byte_order.i32_from_bytes(bward_bytes);

        Ok(DafHeader {
            idword,
            internal_filename,
            nd,
            ni,
            fward,
            bward,
            byte_order,
        })
    }
}

impl fmt::Display for DafHeader {
    /// Render a fixed-width table summarizing the DAF header fields.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LABEL_WIDTH: usize = 18;
        const VALUE_WIDTH: usize = 50;

        let border = format!(
            "+{:-<label$}+{:-<value$}+",
            "",
            "",
            label = LABEL_WIDTH + 1,
            value = VALUE_WIDTH + 1
        );

        let rows = [
            ("ID Word", format!("{} (Format ID)", self.idword)),
            ("Internal Name", self.internal_filename.clone()),
            (
                "ND (doubles)",
                format!("{} double precision summary components", self.nd),
            ),
            (
                "NI (integers)",
                format!("{} integer summary components", self.ni),
            ),
            (
                "Forward Ptr",
                format!("Record # of first summary: {}", self.fward),
            ),
            (
                "Backward Ptr",
                format!("Record # of last summary: {}", self.bward),
            ),
            ("Byte Order", format!("{}", self.byte_order)),
        ];

        writeln!(f, "{border}")?;
        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "DAF File Header",
            "",
            label = LABEL_WIDTH,
            value = VALUE_WIDTH
        )?;
        writeln!(f, "{border}")?;
        for (label, value) in rows {
            writeln!(
                f,
                "| {:<label$}| {:<value$}|",
                label,
                value,
                label = LABEL_WIDTH,
                value = VALUE_WIDTH
            )?;
        }
        writeln!(f, "{border}")
    }
}
