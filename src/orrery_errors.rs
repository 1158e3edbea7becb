use thiserror::Error;

/// Unified error type for every fallible operation in the crate.
///
/// Structural variants (malformed container, ambiguous byte order,
/// truncated reads) are always fatal for the file being parsed; coverage
/// variants are fatal for the evaluation call that raised them; an
/// unresolvable query is only an error through the throwing API
/// ([`crate::ephemeris::Ephemeris::get_state`]) — the probing API reports
/// it as `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum OrreryError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Not a DAF file (IDWORD={0:?})")]
    NotADafFile(String),

    #[error("Unable to determine DAF endianness (ambiguous ND/NI header)")]
    AmbiguousEndianness,

    #[error("Malformed DAF record: {0}")]
    MalformedRecord(&'static str),

    #[error("DAF record {0} out of range")]
    RecordOutOfRange(usize),

    #[error("Implausible summary count: {0}")]
    ImplausibleSummaryCount(i64),

    #[error("Summary record overflow (ND={nd}, NI={ni}, NSUM={nsum})")]
    SummaryRecordOverflow { nd: i32, ni: i32, nsum: i32 },

    #[error("Truncated read at word address {0}")]
    TruncatedRead(u64),

    #[error("Invalid SPK data type: {0}")]
    InvalidSpkDataType(i32),

    #[error("Invalid coefficient layout: {total} words cannot form {components}-component Chebyshev records")]
    InvalidCoefficientLayout { total: usize, components: usize },

    #[error("Epoch {epoch} outside segment coverage [{start}, {stop}]")]
    EpochOutsideSegment { epoch: f64, start: f64, stop: f64 },

    #[error("Gap in coverage: no record contains epoch {0}")]
    CoverageGap(f64),

    #[error("No SPK segment or barycentric composition path for target {target}, center {center} at epoch {epoch}")]
    UnresolvableState { target: i32, center: i32, epoch: i64 },
}
