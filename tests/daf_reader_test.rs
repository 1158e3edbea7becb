//! DAF container-format integration tests over synthetic kernels.

mod common;

use std::io::Cursor;

use common::{
    temp_kernel_path, write_temp_kernel, ControlWordStyle, DafFixtureBuilder, FixtureSegment,
};
use orrery::daf::comment::{extract_comments, find_symbol, try_get_constant};
use orrery::daf::word_source::Endianness;
use orrery::daf::DafFile;
use orrery::orrery_errors::OrreryError;

fn one_segment_builder() -> DafFixtureBuilder {
    DafFixtureBuilder::new().segment(
        FixtureSegment::new(399, 3, 2, 0.0, 100.0, vec![10.0, 5.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
            .named("EARTH WRT EMB"),
    )
}

#[test]
fn test_open_and_enumerate_little_endian() {
    let bytes = one_segment_builder().build();
    let mut daf = DafFile::from_reader(Cursor::new(bytes)).unwrap();

    assert_eq!(daf.header.idword, "DAF/SPK");
    assert_eq!(daf.header.internal_filename, "ORRERY TEST FIXTURE");
    assert_eq!(daf.header.nd, 2);
    assert_eq!(daf.header.ni, 6);
    assert_eq!(daf.header.fward, 2);
    assert_eq!(daf.byte_order(), Endianness::Little);

    let summaries = daf.segment_summaries().unwrap();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.doubles, vec![0.0, 100.0]);
    assert_eq!(summary.integers[..4], [399, 3, 1, 2]);
    assert_eq!(summary.name, "EARTH WRT EMB");
    // Data starts at the first word of record 4.
    assert_eq!(summary.initial_address, 385);
    assert_eq!(summary.final_address, 393);
}

#[test]
fn test_both_control_word_encodings_agree() {
    let with_doubles = one_segment_builder()
        .control_style(ControlWordStyle::Double)
        .build();
    let with_integers = one_segment_builder()
        .control_style(ControlWordStyle::Integer)
        .build();

    let mut daf_doubles = DafFile::from_reader(Cursor::new(with_doubles)).unwrap();
    let mut daf_integers = DafFile::from_reader(Cursor::new(with_integers)).unwrap();

    assert_eq!(
        daf_doubles.segment_summaries().unwrap(),
        daf_integers.segment_summaries().unwrap()
    );
}

#[test]
fn test_big_endian_detection_and_decoding() {
    for style in [ControlWordStyle::Double, ControlWordStyle::Integer] {
        let bytes = one_segment_builder()
            .byte_order(Endianness::Big)
            .control_style(style)
            .build();
        let mut daf = DafFile::from_reader(Cursor::new(bytes)).unwrap();

        assert_eq!(daf.byte_order(), Endianness::Big);
        let summaries = daf.segment_summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].doubles, vec![0.0, 100.0]);
        assert_eq!(summaries[0].integers[..4], [399, 3, 1, 2]);
    }
}

#[test]
fn test_undecidable_endianness_is_surfaced() {
    // Zero out ND/NI: neither byte order yields plausible values, and the
    // file must be rejected rather than parsed under a guess.
    let mut bytes = one_segment_builder().build();
    bytes[8..16].fill(0);
    assert!(matches!(
        DafFile::from_reader(Cursor::new(bytes)),
        Err(OrreryError::AmbiguousEndianness)
    ));
}

#[test]
fn test_summary_record_overflow_is_structural() {
    // Patch NSUM to 26: ND=2/NI=6 summaries are 5 words each, so 26 of
    // them cannot fit the 125-word summary area.
    let mut bytes = one_segment_builder().build();
    bytes[1024 + 16..1024 + 24].copy_from_slice(&26.0f64.to_le_bytes());
    let mut daf = DafFile::from_reader(Cursor::new(bytes)).unwrap();
    assert!(matches!(
        daf.segment_summaries(),
        Err(OrreryError::SummaryRecordOverflow { nsum: 26, .. })
    ));
}

#[test]
fn test_implausible_summary_count_is_structural() {
    let mut bytes = one_segment_builder().build();
    bytes[1024 + 16..1024 + 24].copy_from_slice(&20_000.0f64.to_le_bytes());
    let mut daf = DafFile::from_reader(Cursor::new(bytes)).unwrap();
    assert!(matches!(
        daf.segment_summaries(),
        Err(OrreryError::ImplausibleSummaryCount(20_000))
    ));
}

#[test]
fn test_comment_area_and_symbol_extraction() {
    let bytes = one_segment_builder()
        .comment("JPL planetary ephemeris DE-style fixture")
        .comment("")
        .comment("AU      = 0.1495978707000000D+09")
        .comment("EMRAT    81.30056789872074")
        .build();
    let file = write_temp_kernel(&bytes);
    let path = temp_kernel_path(&file);

    let (lines, symbols) = extract_comments(path).unwrap();
    assert!(lines
        .iter()
        .any(|l| l.contains("planetary ephemeris")));

    let au = find_symbol(&symbols, "AU").expect("AU symbol present");
    assert_eq!(au.first_numeric(), Some(1.495978707e8));
    assert_eq!(
        try_get_constant(path, "EMRAT").unwrap(),
        Some(81.30056789872074)
    );
    assert_eq!(try_get_constant(path, "MISSING").unwrap(), None);
}

#[test]
fn test_comment_record_shifts_summary_pointer() {
    let bytes = one_segment_builder().comment("shifted").build();
    let mut daf = DafFile::from_reader(Cursor::new(bytes)).unwrap();
    assert_eq!(daf.header.fward, 3);
    assert_eq!(daf.segment_summaries().unwrap().len(), 1);
}
