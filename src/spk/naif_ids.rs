//! NAIF integer identifiers.
//!
//! Bodies and reference frames are identified by opaque NAIF integer codes
//! (0 = solar system barycenter, 3 = Earth-Moon barycenter, 399 = Earth,
//! 301 = Moon, 1 = J2000 frame, ...). The wrappers here exist for type
//! safety only; equality is value equality and no name table is consulted.

use std::convert::TryFrom;
use std::fmt;

use crate::orrery_errors::OrreryError;

/// NAIF body identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub i32);

impl BodyId {
    /// Body 0, the universal reference for barycentric composition.
    pub const SOLAR_SYSTEM_BARYCENTER: BodyId = BodyId(0);
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NAIF reference frame identifier (1 = J2000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub i32);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SPK segment data types, per the SPK Required Reading type registry.
///
/// Only [`SpkDataType::ChebyshevPositionOnly`] and
/// [`SpkDataType::ChebyshevPositionVelocity`] are evaluatable here; the
/// loader skips segments of every other type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SpkDataType {
    ModifiedDifferenceArray = 1,
    ChebyshevPositionOnly = 2,
    ChebyshevPositionVelocity = 3,
    Reserved4 = 4,
    TwoBodyDiscreteStates = 5,
    Reserved6 = 6,
    Reserved7 = 7,
    EquallySpacedLagrange = 8,
    UnequallySpacedLagrange = 9,
    TwoLineElements = 10,
    Reserved11 = 11,
    HermiteUniform = 12,
    HermiteNonUniform = 13,
    ChebyshevNonUniform = 14,
    PrecessingConic = 15,
    Reserved16 = 16,
    EquinoctialElements = 17,
    ESAHermiteLagrange = 18,
    ESAPiecewiseInterpolation = 19,
    ChebyshevVelocityOnly = 20,
    ExtendedModifiedDifferenceArray = 21,
}

impl SpkDataType {
    pub fn from_i32(value: i32) -> Result<Self, OrreryError> {
        SpkDataType::try_from(value)
    }

    pub fn to_i32(self) -> i32 {
        self as i32
    }

    /// Coefficient sets per record: 3 (position) for type 2, 6 (position +
    /// velocity) for type 3, `None` for every unsupported type.
    pub fn components_per_set(&self) -> Option<usize> {
        match self {
            SpkDataType::ChebyshevPositionOnly => Some(3),
            SpkDataType::ChebyshevPositionVelocity => Some(6),
            _ => None,
        }
    }
}

impl From<SpkDataType> for i32 {
    fn from(data_type: SpkDataType) -> Self {
        data_type as i32
    }
}

impl TryFrom<i32> for SpkDataType {
    type Error = OrreryError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        use SpkDataType::*;
        match value {
            1 => Ok(ModifiedDifferenceArray),
            2 => Ok(ChebyshevPositionOnly),
            3 => Ok(ChebyshevPositionVelocity),
            4 => Ok(Reserved4),
            5 => Ok(TwoBodyDiscreteStates),
            6 => Ok(Reserved6),
            7 => Ok(Reserved7),
            8 => Ok(EquallySpacedLagrange),
            9 => Ok(UnequallySpacedLagrange),
            10 => Ok(TwoLineElements),
            11 => Ok(Reserved11),
            12 => Ok(HermiteUniform),
            13 => Ok(HermiteNonUniform),
            14 => Ok(ChebyshevNonUniform),
            15 => Ok(PrecessingConic),
            16 => Ok(Reserved16),
            17 => Ok(EquinoctialElements),
            18 => Ok(ESAHermiteLagrange),
            19 => Ok(ESAPiecewiseInterpolation),
            20 => Ok(ChebyshevVelocityOnly),
            21 => Ok(ExtendedModifiedDifferenceArray),
            _ => Err(OrreryError::InvalidSpkDataType(value)),
        }
    }
}

impl fmt::Display for SpkDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SpkDataType::ModifiedDifferenceArray => "Modified Difference Array",
            SpkDataType::ChebyshevPositionOnly => "Chebyshev Position Only",
            SpkDataType::ChebyshevPositionVelocity => "Chebyshev Position and Velocity",
            SpkDataType::TwoBodyDiscreteStates => "Two-Body Discrete States",
            SpkDataType::EquallySpacedLagrange => "Equally Spaced Lagrange",
            SpkDataType::UnequallySpacedLagrange => "Unequally Spaced Lagrange",
            SpkDataType::TwoLineElements => "Two-Line Elements",
            SpkDataType::HermiteUniform => "Hermite (Uniform)",
            SpkDataType::HermiteNonUniform => "Hermite (Non-Uniform)",
            SpkDataType::ChebyshevNonUniform => "Chebyshev (Non-Uniform)",
            SpkDataType::PrecessingConic => "Precessing Conic",
            SpkDataType::EquinoctialElements => "Equinoctial Elements",
            SpkDataType::ESAHermiteLagrange => "ESA Hermite/Lagrange",
            SpkDataType::ESAPiecewiseInterpolation => "ESA Piecewise Interpolation",
            SpkDataType::ChebyshevVelocityOnly => "Chebyshev Velocity Only",
            SpkDataType::ExtendedModifiedDifferenceArray => "Extended Modified Difference Array",
            SpkDataType::Reserved4
            | SpkDataType::Reserved6
            | SpkDataType::Reserved7
            | SpkDataType::Reserved11
            | SpkDataType::Reserved16 => "Reserved",
        };
        write!(f, "{label}")
    }
}
