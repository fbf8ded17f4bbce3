//! Orientation frames and sphere-constrained motion
//!
//! Heads move in straight Euclidean steps that are projected back onto the sphere
//! shell. At the step sizes the game runs (at most 0.05 s) this first-order scheme
//! tracks a great circle closely enough, and the frame is re-orthonormalized every
//! step so long matches do not drift.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::tuning::Motion;

/// Squared length below which a projected forward vector counts as degenerate
const DEGENERATE_LENGTH_SQ: f64 = 1e-10;

/// Position and basis of a head on the sphere shell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationFrame {
    /// Point on the shell (radius = world radius + head radius)
    pub position: DVec3,
    /// Outward surface normal
    pub up: DVec3,
    /// Heading, tangent to the sphere
    pub forward: DVec3,
    /// `forward × up`
    pub right: DVec3,
}

impl OrientationFrame {
    /// Build a frame at `up * shell_radius` heading roughly along `heading`.
    ///
    /// `heading` need not be tangent; its normal component is removed. If it is
    /// parallel to `up`, an arbitrary tangent is chosen.
    pub fn from_up_heading(up: DVec3, heading: DVec3, shell_radius: f64) -> Self {
        let up = up.normalize();
        let mut forward = heading.reject_from_normalized(up);
        if forward.length_squared() < DEGENERATE_LENGTH_SQ {
            forward = up.any_orthonormal_vector();
        }
        let forward = forward.normalize();
        let right = forward.cross(up).normalize();
        Self {
            position: up * shell_radius,
            up,
            forward: up.cross(right).normalize(),
            right,
        }
    }

    /// Advance one timestep under a turn input in [-1, 1].
    ///
    /// Positive input yaws toward `-right` (a left turn seen from above).
    pub fn advance(&mut self, turn_input: f64, dt: f64, motion: &Motion) {
        let yaw = DQuat::from_axis_angle(self.up, turn_input * motion.turn_rate * dt);
        let heading = (yaw * self.forward).normalize();

        let moved = self.position + heading * (motion.speed * dt);
        let up = moved.normalize();
        self.position = up * motion.shell_radius();

        let mut forward = heading.reject_from_normalized(up);
        if forward.length_squared() < DEGENERATE_LENGTH_SQ {
            // Pole or exact reversal: rebuild the heading from the old right axis
            forward = self.right.reject_from_normalized(up);
        }
        let forward = forward.normalize();

        let right = forward.cross(up).normalize();
        self.up = up;
        self.right = right;
        self.forward = up.cross(right).normalize();
    }

    /// Copy advanced one timestep
    #[inline]
    pub fn advanced(mut self, turn_input: f64, dt: f64, motion: &Motion) -> Self {
        self.advance(turn_input, dt, motion);
        self
    }

    /// Largest deviation from an orthonormal basis
    pub fn orthonormal_error(&self) -> f64 {
        [
            (self.up.length() - 1.0).abs(),
            (self.forward.length() - 1.0).abs(),
            (self.right.length() - 1.0).abs(),
            self.forward.dot(self.up).abs(),
            self.right.dot(self.up).abs(),
            self.right.dot(self.forward).abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}
