//! SPK (Spacecraft and Planet Kernel) semantics on top of the DAF container.
//!
//! The [`crate::daf`] family hands over raw array summaries and word-addressed
//! data; this family gives them ephemeris meaning: typed segment models and
//! their Chebyshev evaluation ([`segment`]), the numeric core ([`chebyshev`]),
//! summary-to-segment loading with eager or lazy coefficient storage
//! ([`loader`]), the per-(target, center) lookup structure ([`index`]), and
//! the NAIF identifier types ([`naif_ids`]).

pub mod chebyshev;
pub mod index;
pub mod loader;
pub mod naif_ids;
pub mod segment;
