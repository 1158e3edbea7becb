//! SPK segment model and state evaluation.
//!
//! An [`SpkSegment`] carries one (target, center, frame, data type) array
//! from a kernel: its coverage interval in TDB seconds, the per-record
//! midpoint/radius arrays, and the Chebyshev coefficients themselves. The
//! coefficients live either in an owned buffer (eager loading) or behind a
//! shared [`WordSource`] plus the segment's first word address (lazy
//! loading); evaluation dispatches on that closed set of variants.
//!
//! ## Record location
//! A multi-record segment is located by binary-searching the sorted midpoint
//! array for the latest midpoint at or before the epoch, then checking the
//! neighboring windows. At a boundary epoch shared by two adjacent records
//! the lower-indexed (earlier-starting) record wins. When the midpoints turn
//! out not to be sorted the search falls back to an exhaustive first-match
//! linear scan rather than returning a wrong record.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use hifitime::Epoch;
use nalgebra::Vector3;

use crate::constants::TdbSeconds;
use crate::daf::word_source::WordSource;
use crate::orrery_errors::OrreryError;
use crate::spk::chebyshev;
use crate::spk::naif_ids::{BodyId, FrameId, SpkDataType};
use crate::state::StateVector;

/// Where a segment's Chebyshev coefficients live.
///
/// The variant is fixed at load time; [`SpkSegment::evaluate_state`]
/// dispatches on it. An `External` store holds a non-owning handle to the
/// session's data source — the source outlives every segment borrowed from
/// it and is released when the session drops the last `Arc`.
#[derive(Debug)]
pub enum CoefficientStore {
    /// Fully materialized payload (eager loading). For a multi-record
    /// segment this is the whole record area, headers included, with the
    /// trailer stripped.
    Owned(Vec<f64>),
    /// On-demand retrieval from the kernel's word source (lazy loading).
    External {
        source: Arc<WordSource>,
        /// 1-based word address of the segment's first payload word.
        base_address: u64,
    },
}

/// Coefficient layout of a segment's coverage interval.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentShape {
    /// One Chebyshev set spans the whole coverage; midpoint and radius are
    /// derived from (start+stop)/2 and (stop-start)/2.
    SingleRecord,
    /// `count` uniform records of `rsize` words each:
    /// [mid, radius, k·(degree+1) coefficients].
    MultiRecord {
        mids: Vec<f64>,
        radii: Vec<f64>,
        rsize: usize,
        count: usize,
    },
}

/// The 4-word directory trailer of a real multi-record segment:
/// initial epoch and uniform interval length (RSIZE and N are folded into
/// [`SegmentShape::MultiRecord`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTrailer {
    /// Initial epoch of the first record (TDB seconds).
    pub init: f64,
    /// Length of the interval covered by each record (seconds).
    pub intlen: f64,
}

/// One SPK segment: identity, coverage, record layout and coefficients.
///
/// See also
/// ------------
/// * [`crate::spk::loader::SpkKernel`] – produces segments from DAF summaries.
/// * [`crate::spk::index::SegmentIndex`] – epoch lookup across segments.
/// * [`SpkSegment::evaluate_state`] – state evaluation at an epoch.
#[derive(Debug)]
pub struct SpkSegment {
    /// Segment name from the DAF name record, right-trimmed.
    pub name: String,
    pub target: BodyId,
    pub center: BodyId,
    pub frame: FrameId,
    /// Data type 2 (position only) or 3 (position and velocity).
    pub data_type: SpkDataType,
    /// Coverage start (TDB seconds past J2000).
    pub start: TdbSeconds,
    /// Coverage stop (TDB seconds past J2000), inclusive.
    pub stop: TdbSeconds,
    /// Shared polynomial degree of every coefficient set.
    pub degree: usize,
    /// Coefficient sets per record: 3 for type 2, 6 for type 3.
    pub components: usize,
    pub shape: SegmentShape,
    pub trailer: Option<SegmentTrailer>,
    pub store: CoefficientStore,
}

impl SpkSegment {
    /// Number of Chebyshev records in this segment.
    pub fn record_count(&self) -> usize {
        match &self.shape {
            SegmentShape::SingleRecord => 1,
            SegmentShape::MultiRecord { count, .. } => *count,
        }
    }

    /// Whether `et` lies inside the declared coverage interval (inclusive).
    pub fn covers(&self, et: TdbSeconds) -> bool {
        et >= self.start && et <= self.stop
    }

    /// Evaluate position and velocity at `et` (TDB seconds past J2000).
    ///
    /// Arguments
    /// -----------------
    /// * `et`: Epoch in TDB seconds; must lie in `[start, stop]`.
    ///
    /// Return
    /// ----------
    /// * The state in km and km/s, or [`OrreryError::EpochOutsideSegment`]
    ///   for an epoch outside the coverage,
    ///   [`OrreryError::CoverageGap`] when no record window contains an
    ///   in-coverage epoch, [`OrreryError::TruncatedRead`] when a lazy
    ///   coefficient fetch runs past the data source.
    pub fn evaluate_state(&self, et: TdbSeconds) -> Result<StateVector, OrreryError> {
        if !self.covers(et) {
            return Err(OrreryError::EpochOutsideSegment {
                epoch: et,
                start: self.start,
                stop: self.stop,
            });
        }

        let (mid, radius, coefficients) = match &self.shape {
            SegmentShape::SingleRecord => {
                let mid = 0.5 * (self.start + self.stop);
                let radius = 0.5 * (self.stop - self.start);
                (mid, radius, self.record_coefficients(0)?)
            }
            SegmentShape::MultiRecord { mids, radii, .. } => {
                let record = locate_record(mids, radii, et)?;
                (mids[record], radii[record], self.record_coefficients(record)?)
            }
        };

        let tau = if radius == 0.0 { 0.0 } else { (et - mid) / radius };
        let n1 = self.degree + 1;
        let c = coefficients.as_ref();

        if self.data_type == SpkDataType::ChebyshevPositionVelocity {
            // Type 3: six sets; the stored velocity series is a polynomial
            // in tau in km/s and is evaluated directly, not differentiated.
            let position =
                chebyshev::evaluate_vector(&c[..n1], &c[n1..2 * n1], &c[2 * n1..3 * n1], tau);
            let velocity = chebyshev::evaluate_vector(
                &c[3 * n1..4 * n1],
                &c[4 * n1..5 * n1],
                &c[5 * n1..6 * n1],
                tau,
            );
            return Ok(StateVector::new(position, velocity));
        }

        // Type 2 (the only other loadable type): three position sets,
        // velocity from the analytic derivative with dtau/dt = 1/radius.
        let (x, y, z) = (&c[..n1], &c[n1..2 * n1], &c[2 * n1..3 * n1]);
        let position = chebyshev::evaluate_vector(x, y, z, tau);
        let scale = if radius == 0.0 { 0.0 } else { 1.0 / radius };
        let velocity = Vector3::new(
            chebyshev::derivative(x, tau),
            chebyshev::derivative(y, tau),
            chebyshev::derivative(z, tau),
        ) * scale;
        Ok(StateVector::new(position, velocity))
    }

    /// Fetch the coefficient block of `record`, skipping the two-word
    /// mid/radius header of multi-record layouts.
    fn record_coefficients(&self, record: usize) -> Result<Cow<'_, [f64]>, OrreryError> {
        let n_coefficients = self.components * (self.degree + 1);
        match (&self.store, &self.shape) {
            (CoefficientStore::Owned(buffer), SegmentShape::SingleRecord) => {
                Ok(Cow::Borrowed(&buffer[..n_coefficients]))
            }
            (CoefficientStore::Owned(buffer), SegmentShape::MultiRecord { rsize, .. }) => {
                let offset = record * rsize + 2;
                Ok(Cow::Borrowed(&buffer[offset..offset + n_coefficients]))
            }
            (
                CoefficientStore::External {
                    source,
                    base_address,
                },
                SegmentShape::SingleRecord,
            ) => Ok(Cow::Owned(source.read_words(*base_address, n_coefficients)?)),
            (
                CoefficientStore::External {
                    source,
                    base_address,
                },
                SegmentShape::MultiRecord { rsize, .. },
            ) => {
                let address = base_address + (record * rsize) as u64 + 2;
                Ok(Cow::Owned(source.read_words(address, n_coefficients)?))
            }
        }
    }
}

/// Find the record whose [mid - radius, mid + radius] window contains `et`.
///
/// Binary search assumes `mids` sorted ascending; the neighbor checks defend
/// against near-boundary epochs, and the linear fallback against unsorted
/// midpoints. The lower-indexed record wins a shared boundary.
fn locate_record(mids: &[f64], radii: &[f64], et: f64) -> Result<usize, OrreryError> {
    let window_contains =
        |i: usize| -> bool { (et - mids[i]).abs() <= radii[i] };

    // Latest midpoint <= et; the record just before the partition point is
    // the primary candidate.
    let partition = mids.partition_point(|&m| m <= et);
    let anchor = partition.saturating_sub(1);

    if !mids.is_empty() && window_contains(anchor) {
        let mut chosen = anchor;
        while chosen > 0 && window_contains(chosen - 1) {
            chosen -= 1;
        }
        return Ok(chosen);
    }
    if anchor + 1 < mids.len() && window_contains(anchor + 1) {
        return Ok(anchor + 1);
    }

    // Sorted-midpoint assumption violated or genuine gap: exhaustive scan,
    // first match wins.
    (0..mids.len())
        .find(|&i| window_contains(i))
        .ok_or(OrreryError::CoverageGap(et))
}

impl fmt::Display for SpkSegment {
    /// Render a fixed-width table describing the segment.
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

        let records = match &self.shape {
            SegmentShape::SingleRecord => "1 (single record)".to_string(),
            SegmentShape::MultiRecord { count, rsize, .. } => {
                format!("{count} x {rsize} words")
            }
        };

        let rows = [
            ("Name", self.name.clone()),
            ("Target", format!("{}", self.target)),
            ("Center", format!("{}", self.center)),
            ("Frame", format!("{}", self.frame)),
            ("Data Type", format!("{} ({})", self.data_type.to_i32(), self.data_type)),
            ("Start", format!("{}", Epoch::from_et_seconds(self.start))),
            ("Stop", format!("{}", Epoch::from_et_seconds(self.stop))),
            ("Records", records),
            ("Degree", format!("{}", self.degree)),
        ];

        writeln!(f, "{border}")?;
        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "SPK Segment",
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
