//! Ephemeris session: kernel loading, state queries, barycentric
//! resolution.
//!
//! [`Ephemeris`] owns every loaded segment, the lazily rebuilt
//! [`SegmentIndex`] and the per-session resolution cache. Queries come in
//! two tiers: [`Ephemeris::try_get_state`] reports an unresolvable
//! (target, center, epoch) triple as `Ok(None)`, while
//! [`Ephemeris::get_state`] promotes it to
//! [`OrreryError::UnresolvableState`]. Structural kernel errors propagate
//! as `Err` through both.
//!
//! ## Barycentric composition
//! When no direct (target, center) segment covers the epoch, both bodies are
//! resolved against body 0 (the solar system barycenter) by recursively
//! walking body→center chains: a body resolves through its direct
//! (body, 0) segment when one exists, otherwise through the first covering
//! segment (candidates ordered by ascending center id) whose center itself
//! resolves. An explicit visited set fails cyclic branches without aborting
//! the query, and successful per-body resolutions are memoized by
//! (body, epoch) for the session lifetime — the cache is unbounded by
//! design, its growth limited to the distinct pairs actually queried.
//!
//! A session is single-threaded: queries take `&mut self` (index and cache
//! mutation), so one `Ephemeris` per concurrent workflow.

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek};

use ahash::RandomState;
use camino::Utf8Path;
use hifitime::Epoch;

use crate::orrery_errors::OrreryError;
use crate::spk::index::SegmentIndex;
use crate::spk::loader::SpkKernel;
use crate::spk::naif_ids::BodyId;
use crate::spk::segment::SpkSegment;
use crate::state::StateVector;
use crate::time::Instant;

/// A loading and query session over one or more SPK kernels.
///
/// See also
/// ------------
/// * [`crate::spk::loader::SpkKernel`] – per-file loading.
/// * [`crate::daf::comment`] – provenance extraction from kernel comments.
#[derive(Debug, Default)]
pub struct Ephemeris {
    segments: Vec<SpkSegment>,
    index: Option<SegmentIndex>,
    cache: HashMap<(BodyId, i64), StateVector, RandomState>,
}

impl Ephemeris {
    pub fn new() -> Self {
        Ephemeris::default()
    }

    /// Load an SPK kernel from disk and append its segments.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Kernel file path (the caller's meta-kernel layer decides
    ///   which paths are SPK).
    /// * `lazy`: Keep coefficients on a shared memory-mapped source instead
    ///   of materializing them now.
    pub fn load_kernel(&mut self, path: &Utf8Path, lazy: bool) -> Result<(), OrreryError> {
        let kernel = if lazy {
            SpkKernel::load_lazy(path)?
        } else {
            SpkKernel::load_eager(path)?
        };
        self.append(kernel);
        Ok(())
    }

    /// Eagerly load an SPK kernel from any seekable reader (in-memory
    /// fixtures, sockets spooled to disk, ...).
    pub fn load_spk<R: Read + Seek>(&mut self, reader: R) -> Result<(), OrreryError> {
        let kernel = SpkKernel::load(reader)?;
        self.append(kernel);
        Ok(())
    }

    fn append(&mut self, kernel: SpkKernel) {
        self.segments.extend(kernel.into_segments());
        // Drop the index and cache wholesale; the next query rebuilds the
        // index in full, so a partial view is never published.
        self.index = None;
        self.cache.clear();
    }

    /// Every loaded segment, in load order.
    pub fn segments(&self) -> &[SpkSegment] {
        &self.segments
    }

    /// Print the session summary table and each segment's details.
    pub fn info(&self) {
        println!("{self}");
        for segment in &self.segments {
            println!("{segment}");
        }
    }

    /// State of `target` relative to `center` at `t`, or `Ok(None)` when no
    /// direct segment and no composable chain exists.
    pub fn try_get_state(
        &mut self,
        target: BodyId,
        center: BodyId,
        t: Instant,
    ) -> Result<Option<StateVector>, OrreryError> {
        if target == center {
            return Ok(Some(StateVector::zero()));
        }

        self.ensure_index();
        let et = t.as_et_seconds();
        if let Some(i) = self.direct_lookup(target, center, et) {
            return self.segments[i].evaluate_state(et).map(Some);
        }

        let mut visited = Vec::new();
        let Some(target_state) = self.resolve_to_reference(target, t, &mut visited)? else {
            return Ok(None);
        };
        visited.clear();
        let Some(center_state) = self.resolve_to_reference(center, t, &mut visited)? else {
            return Ok(None);
        };
        Ok(Some(target_state - center_state))
    }

    /// As [`Ephemeris::try_get_state`], promoting absence to
    /// [`OrreryError::UnresolvableState`].
    pub fn get_state(
        &mut self,
        target: BodyId,
        center: BodyId,
        t: Instant,
    ) -> Result<StateVector, OrreryError> {
        self.try_get_state(target, center, t)?
            .ok_or(OrreryError::UnresolvableState {
                target: target.0,
                center: center.0,
                epoch: t.tdb_seconds(),
            })
    }

    /// Resolve `body` relative to the solar system barycenter.
    ///
    /// `visited` is the set of bodies already on the current resolution
    /// chain; revisiting one fails that branch (`Ok(None)`) so sibling
    /// candidate centers can still be tried.
    fn resolve_to_reference(
        &mut self,
        body: BodyId,
        t: Instant,
        visited: &mut Vec<BodyId>,
    ) -> Result<Option<StateVector>, OrreryError> {
        if body == BodyId::SOLAR_SYSTEM_BARYCENTER {
            return Ok(Some(StateVector::zero()));
        }

        let key = (body, t.tdb_seconds());
        if let Some(state) = self.cache.get(&key) {
            return Ok(Some(*state));
        }
        if visited.contains(&body) {
            return Ok(None);
        }

        visited.push(body);
        let resolved = self.resolve_uncached(body, t, visited)?;
        visited.pop();

        if let Some(state) = resolved {
            self.cache.insert(key, state);
        }
        Ok(resolved)
    }

    fn resolve_uncached(
        &mut self,
        body: BodyId,
        t: Instant,
        visited: &mut Vec<BodyId>,
    ) -> Result<Option<StateVector>, OrreryError> {
        let et = t.as_et_seconds();

        if let Some(i) = self.direct_lookup(body, BodyId::SOLAR_SYSTEM_BARYCENTER, et) {
            return self.segments[i].evaluate_state(et).map(Some);
        }

        let candidates = match self.index.as_ref() {
            Some(index) => index.candidates_for_target(&self.segments, body, et),
            None => Vec::new(),
        };
        for i in candidates {
            let center = self.segments[i].center;
            if center == body {
                continue;
            }
            let Some(center_state) = self.resolve_to_reference(center, t, visited)? else {
                continue;
            };
            let relative = self.segments[i].evaluate_state(et)?;
            return Ok(Some(relative + center_state));
        }
        Ok(None)
    }

    fn direct_lookup(&self, target: BodyId, center: BodyId, et: f64) -> Option<usize> {
        self.index
            .as_ref()
            .and_then(|index| index.lookup(&self.segments, target, center, et))
    }

    fn ensure_index(&mut self) {
        if self.index.is_none() {
            self.index = Some(SegmentIndex::build(&self.segments));
        }
    }
}

impl fmt::Display for Ephemeris {
    /// Render a one-line-per-segment session summary.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ephemeris session: {} segment(s)", self.segments.len())?;
        for (i, segment) in self.segments.iter().enumerate() {
            writeln!(
                f,
                "  [{i}] target {} center {} type {} [{} .. {}]",
                segment.target,
                segment.center,
                segment.data_type.to_i32(),
                Epoch::from_et_seconds(segment.start),
                Epoch::from_et_seconds(segment.stop),
            )?;
        }
        Ok(())
    }
}
