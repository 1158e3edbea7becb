//! Cartesian state vectors.
//!
//! Overview
//! -----------------
//! [`StateVector`] is the unified result type of every ephemeris query:
//! a position in **kilometers** and a velocity in **kilometers per second**,
//! both expressed in the segment's inertial frame (J2000 for every kernel
//! this crate targets).
//!
//! Arithmetic semantics
//! -----------------
//! Addition, subtraction and scalar scaling are component-wise on both
//! vectors. They exist for barycentric composition (chaining a body's state
//! relative to its center with the center's state relative to the reference
//! body) and for nothing else — no frame rotation is implied.

use std::ops::{Add, Mul, Sub};

use nalgebra::Vector3;

use crate::constants::{AU, SECONDS_PER_DAY};

/// Position (km) and velocity (km/s) of one body relative to another at an
/// instant.
///
/// See also
/// ------------
/// * [`crate::ephemeris::Ephemeris::get_state`] – high-level producer.
/// * [`crate::spk::segment::SpkSegment::evaluate_state`] – low-level producer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    /// Cartesian position in kilometers.
    pub position: Vector3<f64>,
    /// Cartesian velocity in kilometers per second.
    pub velocity: Vector3<f64>,
}

impl StateVector {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        StateVector { position, velocity }
    }

    /// The zero state (coincident bodies).
    pub fn zero() -> Self {
        StateVector {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
        }
    }

    /// Convert to AU-based units: position in **AU**, velocity in **AU/day**.
    #[must_use = "`.to_au()` returns a new StateVector; assign or use it"]
    pub fn to_au(&self) -> Self {
        StateVector {
            position: self.position / AU,
            velocity: self.velocity * (SECONDS_PER_DAY / AU),
        }
    }
}

impl Add for StateVector {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        StateVector {
            position: self.position + other.position,
            velocity: self.velocity + other.velocity,
        }
    }
}

impl Sub for StateVector {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        StateVector {
            position: self.position - other.position,
            velocity: self.velocity - other.velocity,
        }
    }
}

impl Mul<f64> for StateVector {
    type Output = Self;

    fn mul(self, scale: f64) -> Self {
        StateVector {
            position: self.position * scale,
            velocity: self.velocity * scale,
        }
    }
}

impl std::fmt::Display for StateVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pos(km)=[{:.6}, {:.6}, {:.6}] Vel(km/s)=[{:.9}, {:.9}, {:.9}]",
            self.position[0],
            self.position[1],
            self.position[2],
            self.velocity[0],
            self.velocity[1],
            self.velocity[2],
        )
    }
}
