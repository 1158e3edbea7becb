//! SPK kernel loading: DAF summaries to typed segments.
//!
//! The SPK summary convention (ND=2, NI=6) maps each DAF array summary to
//! `[start, stop]` TDB seconds and `[target, center, frame, data type,
//! initial address, final address]`. Segments of data types other than 2
//! and 3 are skipped without failing the kernel — real kernels legitimately
//! mix array types the reader does not need.
//!
//! ## Layout inference
//! The inclusive word range `[initial, final]` is interpreted in precedence
//! order:
//! 1. the real-kernel convention, a 4-word trailer [INIT, INTLEN, RSIZE, N]
//!    with `RSIZE · N + 4` equal to the total word count;
//! 2. the legacy single-record layout, a bare `k·(degree+1)` coefficient
//!    block with no header words;
//! 3. uniform headered records without a trailer, searched by descending
//!    degree so the most specific record size wins.
//!
//! Eager loading materializes the payload; lazy loading reads only the
//! trailer and each record's mid/radius header, leaving coefficients on the
//! shared [`WordSource`]. Both produce identical per-record metadata, so the
//! evaluator never knows which mode built a segment.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::sync::Arc;

use camino::Utf8Path;

use crate::daf::summary::SegmentSummary;
use crate::daf::word_source::WordSource;
use crate::daf::DafFile;
use crate::orrery_errors::OrreryError;
use crate::spk::naif_ids::{BodyId, FrameId, SpkDataType};
use crate::spk::segment::{
    CoefficientStore, SegmentShape, SegmentTrailer, SpkSegment,
};

/// An ordered, append-only collection of loaded SPK segments.
///
/// See also
/// ------------
/// * [`crate::ephemeris::Ephemeris`] – owns kernels and answers queries.
#[derive(Debug, Default)]
pub struct SpkKernel {
    segments: Vec<SpkSegment>,
}

/// One screened SPK summary with its components already pulled apart.
struct ScreenedSummary {
    name: String,
    start: f64,
    stop: f64,
    target: i32,
    center: i32,
    frame: i32,
    data_type: SpkDataType,
    components: usize,
    initial: u64,
    total: usize,
}

/// Inferred per-record layout of a segment's word range.
#[derive(Debug, PartialEq)]
enum RecordLayout {
    /// Real-kernel convention: trailer-directed uniform records.
    Trailer {
        rsize: usize,
        count: usize,
        init: f64,
        intlen: f64,
        degree: usize,
    },
    /// Legacy fixture convention: one bare coefficient block, no headers.
    RawSingle { degree: usize },
    /// Uniform headered records without a trailer.
    Headered {
        rsize: usize,
        count: usize,
        degree: usize,
    },
}

impl RecordLayout {
    fn degree(&self) -> usize {
        match self {
            RecordLayout::RawSingle { degree }
            | RecordLayout::Trailer { degree, .. }
            | RecordLayout::Headered { degree, .. } => *degree,
        }
    }
}

impl SpkKernel {
    /// Eagerly parse an SPK kernel from any seekable reader.
    pub fn load<R: Read + Seek>(reader: R) -> Result<Self, OrreryError> {
        let mut daf = DafFile::from_reader(reader)?;
        let summaries = daf.segment_summaries()?;

        let mut segments = Vec::new();
        for summary in &summaries {
            if let Some(segment) = load_eager_segment(&mut daf, summary)? {
                segments.push(segment);
            }
        }
        Ok(SpkKernel { segments })
    }

    /// Eagerly load an SPK kernel from disk.
    pub fn load_eager(path: &Utf8Path) -> Result<Self, OrreryError> {
        Self::load(BufReader::new(File::open(path)?))
    }

    /// Lazily load an SPK kernel: summaries, trailers and record headers are
    /// read now, coefficient payloads stay on a shared memory-mapped word
    /// source until a record is evaluated.
    pub fn load_lazy(path: &Utf8Path) -> Result<Self, OrreryError> {
        let mut daf = DafFile::open(path)?;
        let summaries = daf.segment_summaries()?;
        let source = Arc::new(WordSource::open_mmap(path, daf.byte_order())?);

        let mut segments = Vec::new();
        for summary in &summaries {
            if let Some(segment) = load_lazy_segment(&source, summary)? {
                segments.push(segment);
            }
        }
        Ok(SpkKernel { segments })
    }

    pub fn segments(&self) -> &[SpkSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn into_segments(self) -> Vec<SpkSegment> {
        self.segments
    }
}

/// Validate an SPK summary, returning `None` for segments the reader skips:
/// short summaries, unsupported data types, degenerate address ranges.
fn screen_summary(summary: &SegmentSummary) -> Option<ScreenedSummary> {
    if summary.doubles.len() < 2 || summary.integers.len() < 6 {
        return None;
    }
    let data_type = match SpkDataType::from_i32(summary.integers[3]) {
        Ok(data_type) => data_type,
        Err(_) => return None,
    };
    let components = data_type.components_per_set()?;

    let initial = summary.initial_address;
    let final_address = summary.final_address;
    if initial < 1 || final_address < initial {
        return None;
    }

    Some(ScreenedSummary {
        name: summary.name.clone(),
        start: summary.doubles[0],
        stop: summary.doubles[1],
        target: summary.integers[0],
        center: summary.integers[1],
        frame: summary.integers[2],
        data_type,
        components,
        initial: initial as u64,
        total: (final_address - initial + 1) as usize,
    })
}

/// Infer the record layout of a `total`-word coefficient range with `k`
/// components per set. `tail` holds the range's last 4 words when available
/// (the candidate trailer).
fn infer_layout(total: usize, k: usize, tail: Option<&[f64]>) -> Result<RecordLayout, OrreryError> {
    if let Some(tail) = tail {
        let (init, intlen, rsize_word, count_word) = (tail[0], tail[1], tail[2], tail[3]);
        if rsize_word.fract() == 0.0
            && count_word.fract() == 0.0
            && rsize_word >= (2 + k) as f64
            && count_word >= 1.0
        {
            let rsize = rsize_word as usize;
            let count = count_word as usize;
            if rsize * count + 4 == total && (rsize - 2) % k == 0 {
                let degree = (rsize - 2) / k - 1;
                return Ok(RecordLayout::Trailer {
                    rsize,
                    count,
                    init,
                    intlen,
                    degree,
                });
            }
        }
    }

    if total >= k && total % k == 0 {
        return Ok(RecordLayout::RawSingle {
            degree: total / k - 1,
        });
    }

    // Headered records without a trailer: prefer the highest degree whose
    // record size divides the range evenly.
    let max_degree = (total.saturating_sub(2)) / k;
    for degree in (0..max_degree).rev() {
        let rsize = 2 + k * (degree + 1);
        if total % rsize == 0 {
            return Ok(RecordLayout::Headered {
                rsize,
                count: total / rsize,
                degree,
            });
        }
    }

    Err(OrreryError::InvalidCoefficientLayout {
        total,
        components: k,
    })
}

fn load_eager_segment<R: Read + Seek>(
    daf: &mut DafFile<R>,
    summary: &SegmentSummary,
) -> Result<Option<SpkSegment>, OrreryError> {
    let Some(screened) = screen_summary(summary) else {
        return Ok(None);
    };

    let words = daf.read_words(screened.initial, screened.total)?;
    let tail = (screened.total >= 4).then(|| &words[screened.total - 4..]);
    let layout = infer_layout(screened.total, screened.components, tail)?;
    let degree = layout.degree();

    let (shape, trailer, payload) = match layout {
        RecordLayout::RawSingle { .. } => (SegmentShape::SingleRecord, None, words),
        RecordLayout::Trailer {
            rsize,
            count,
            init,
            intlen,
            ..
        } => {
            let payload = words[..screened.total - 4].to_vec();
            let (mids, radii) = record_headers(&payload, rsize, count);
            (
                SegmentShape::MultiRecord {
                    mids,
                    radii,
                    rsize,
                    count,
                },
                Some(SegmentTrailer { init, intlen }),
                payload,
            )
        }
        RecordLayout::Headered { rsize, count, .. } => {
            let (mids, radii) = record_headers(&words, rsize, count);
            (
                SegmentShape::MultiRecord {
                    mids,
                    radii,
                    rsize,
                    count,
                },
                None,
                words,
            )
        }
    };

    Ok(Some(build_segment(
        screened,
        degree,
        shape,
        trailer,
        CoefficientStore::Owned(payload),
    )))
}

fn load_lazy_segment(
    source: &Arc<WordSource>,
    summary: &SegmentSummary,
) -> Result<Option<SpkSegment>, OrreryError> {
    let Some(screened) = screen_summary(summary) else {
        return Ok(None);
    };

    let tail = if screened.total >= 4 {
        Some(source.read_words(screened.initial + screened.total as u64 - 4, 4)?)
    } else {
        None
    };
    let layout = infer_layout(screened.total, screened.components, tail.as_deref())?;
    let degree = layout.degree();

    let (shape, trailer) = match layout {
        RecordLayout::RawSingle { .. } => (SegmentShape::SingleRecord, None),
        RecordLayout::Trailer {
            rsize,
            count,
            init,
            intlen,
            ..
        } => {
            let (mids, radii) = lazy_record_headers(source, screened.initial, rsize, count)?;
            (
                SegmentShape::MultiRecord {
                    mids,
                    radii,
                    rsize,
                    count,
                },
                Some(SegmentTrailer { init, intlen }),
            )
        }
        RecordLayout::Headered { rsize, count, .. } => {
            let (mids, radii) = lazy_record_headers(source, screened.initial, rsize, count)?;
            (
                SegmentShape::MultiRecord {
                    mids,
                    radii,
                    rsize,
                    count,
                },
                None,
            )
        }
    };

    let base_address = screened.initial;
    Ok(Some(build_segment(
        screened,
        degree,
        shape,
        trailer,
        CoefficientStore::External {
            source: Arc::clone(source),
            base_address,
        },
    )))
}

fn build_segment(
    screened: ScreenedSummary,
    degree: usize,
    shape: SegmentShape,
    trailer: Option<SegmentTrailer>,
    store: CoefficientStore,
) -> SpkSegment {
    SpkSegment {
        name: screened.name,
        target: BodyId(screened.target),
        center: BodyId(screened.center),
        frame: FrameId(screened.frame),
        data_type: screened.data_type,
        start: screened.start,
        stop: screened.stop,
        degree,
        components: screened.components,
        shape,
        trailer,
        store,
    }
}

/// Extract the leading [mid, radius] pair of every record in an owned
/// payload.
fn record_headers(payload: &[f64], rsize: usize, count: usize) -> (Vec<f64>, Vec<f64>) {
    let mut mids = Vec::with_capacity(count);
    let mut radii = Vec::with_capacity(count);
    for record in 0..count {
        let offset = record * rsize;
        mids.push(payload[offset]);
        radii.push(payload[offset + 1]);
    }
    (mids, radii)
}

/// As [`record_headers`], reading the two header words of each record from
/// the word source.
fn lazy_record_headers(
    source: &WordSource,
    initial: u64,
    rsize: usize,
    count: usize,
) -> Result<(Vec<f64>, Vec<f64>), OrreryError> {
    let mut mids = Vec::with_capacity(count);
    let mut radii = Vec::with_capacity(count);
    for record in 0..count {
        let header = source.read_words(initial + (record * rsize) as u64, 2)?;
        mids.push(header[0]);
        radii.push(header[1]);
    }
    Ok((mids, radii))
}

#[cfg(test)]
mod test_loader {
    use super::*;

    #[test]
    fn test_infer_trailer_layout() {
        // 2 records of rsize 11 (k=3, degree 2) plus the 4-word trailer.
        let total = 2 * 11 + 4;
        let tail = [0.0, 200.0, 11.0, 2.0];
        let layout = infer_layout(total, 3, Some(&tail)).unwrap();
        assert_eq!(
            layout,
            RecordLayout::Trailer {
                rsize: 11,
                count: 2,
                init: 0.0,
                intlen: 200.0,
                degree: 2,
            }
        );
    }

    #[test]
    fn test_infer_raw_single_record() {
        // 3 coefficients per axis, k=3, no header words anywhere.
        let tail = [10.0, 5.0, 2.0, 0.0];
        let layout = infer_layout(9, 3, Some(&tail)).unwrap();
        assert_eq!(layout, RecordLayout::RawSingle { degree: 2 });

        // Type-3 constant fixture: 6 words, below the trailer threshold.
        let layout = infer_layout(6, 6, None).unwrap();
        assert_eq!(layout, RecordLayout::RawSingle { degree: 0 });
    }

    #[test]
    fn test_infer_headered_prefers_highest_degree() {
        // 22 words, k=3: only rsize 11 (degree 2) divides evenly, and the
        // tail words do not form a consistent trailer.
        let tail = [1.0, 2.0, 3.0, 4.0];
        let layout = infer_layout(22, 3, Some(&tail)).unwrap();
        assert_eq!(
            layout,
            RecordLayout::Headered {
                rsize: 11,
                count: 2,
                degree: 2,
            }
        );
    }

    #[test]
    fn test_unformable_layout_is_structural() {
        let tail = [0.0, 0.0, 0.0, 0.0];
        assert!(matches!(
            infer_layout(4, 3, Some(&tail)),
            Err(OrreryError::InvalidCoefficientLayout {
                total: 4,
                components: 3
            })
        ));
    }

    #[test]
    fn test_screening_skips_unsupported_summaries() {
        let unsupported_type = SegmentSummary {
            doubles: vec![0.0, 100.0],
            integers: vec![1, 0, 1, 13, 641, 650],
            name: "HERMITE".into(),
            initial_address: 641,
            final_address: 650,
        };
        assert!(screen_summary(&unsupported_type).is_none());

        let inverted_range = SegmentSummary {
            doubles: vec![0.0, 100.0],
            integers: vec![1, 0, 1, 2, 650, 641],
            name: String::new(),
            initial_address: 650,
            final_address: 641,
        };
        assert!(screen_summary(&inverted_range).is_none());

        let supported = SegmentSummary {
            doubles: vec![0.0, 100.0],
            integers: vec![1, 0, 1, 2, 641, 649],
            name: "OK".into(),
            initial_address: 641,
            final_address: 649,
        };
        let screened = screen_summary(&supported).expect("type 2 is loadable");
        assert_eq!(screened.components, 3);
        assert_eq!(screened.total, 9);
    }
}

