//! Per-(target, center) segment lookup.
//!
//! The index maps each (target, center) pair to the indices of its segments,
//! sorted ascending by coverage start. Lookup binary-searches for the
//! greatest start at or before the epoch and scans backward for the first
//! covering segment, so among overlapping coverage the latest-starting
//! segment wins, and among equal starts the latest-loaded one does.
//!
//! The index is rebuilt from scratch after every kernel append — there is no
//! incremental update, so a partially built index is never observable.

use std::collections::HashMap;

use ahash::RandomState;

use crate::constants::TdbSeconds;
use crate::spk::naif_ids::BodyId;
use crate::spk::segment::SpkSegment;

/// Start-time-sorted segment lists keyed by (target, center), plus a
/// per-target list for barycentric candidate enumeration.
#[derive(Debug, Default)]
pub struct SegmentIndex {
    by_pair: HashMap<(BodyId, BodyId), Vec<usize>, RandomState>,
    by_target: HashMap<BodyId, Vec<usize>, RandomState>,
}

impl SegmentIndex {
    /// Build the index over `segments` in one pass.
    pub fn build(segments: &[SpkSegment]) -> Self {
        let mut by_pair: HashMap<(BodyId, BodyId), Vec<usize>, RandomState> = HashMap::default();
        let mut by_target: HashMap<BodyId, Vec<usize>, RandomState> = HashMap::default();

        for (i, segment) in segments.iter().enumerate() {
            by_pair
                .entry((segment.target, segment.center))
                .or_default()
                .push(i);
            by_target.entry(segment.target).or_default().push(i);
        }

        // Stable sort keeps insertion order among equal starts, which the
        // lookup turns into latest-loaded-wins.
        for list in by_pair.values_mut() {
            list.sort_by(|&a, &b| segments[a].start.total_cmp(&segments[b].start));
        }

        SegmentIndex { by_pair, by_target }
    }

    /// Find the segment serving (target, center) at `et`, or `None` — the
    /// resolver treats absence as a composition opportunity, not an error.
    pub fn lookup(
        &self,
        segments: &[SpkSegment],
        target: BodyId,
        center: BodyId,
        et: TdbSeconds,
    ) -> Option<usize> {
        let list = self.by_pair.get(&(target, center))?;
        let partition = list.partition_point(|&i| segments[i].start <= et);

        for &i in list[..partition].iter().rev() {
            if segments[i].covers(et) {
                return Some(i);
            }
        }
        // One forward, against boundary rounding in the partition.
        if let Some(&i) = list.get(partition) {
            if segments[i].covers(et) {
                return Some(i);
            }
        }
        None
    }

    /// Every segment with the given target covering `et`, ordered by
    /// ascending center id (then load order) — the resolver's deterministic
    /// candidate order for barycentric chain walking.
    pub fn candidates_for_target(
        &self,
        segments: &[SpkSegment],
        target: BodyId,
        et: TdbSeconds,
    ) -> Vec<usize> {
        let mut candidates: Vec<usize> = match self.by_target.get(&target) {
            Some(list) => list
                .iter()
                .copied()
                .filter(|&i| segments[i].covers(et))
                .collect(),
            None => return Vec::new(),
        };
        candidates.sort_by(|&a, &b| segments[a].center.cmp(&segments[b].center));
        candidates
    }
}
