//! Collision detection against trails
//!
//! The hot path of every tick: called for each head against every trail, for every
//! spawn candidate, and at each step of every bot's look-ahead. It is a flat scan
//! with no allocation.

use glam::DVec3;

use super::state::{Player, PlayerId};
use crate::tuning::SimConfig;

/// Only every second stored point is tested.
///
/// Sampling approximation, not a correctness requirement: with a spacing of
/// 0.9 body radius, a stride of 2 leaves at most ~0.65 units between tested
/// points, roughly one collision radius. A fast head crossing a trail exactly
/// between two tested samples can slip through.
pub const COLLISION_SAMPLE_STRIDE: usize = 2;

/// Does `point` lie within collision radius of any collidable trail?
///
/// With `include_others` false only the trail of `self_id` is checked. The newest
/// `safe_tail_ignore_count` points of the caller's own trail are exempt, so a
/// turning head does not hit the segment it just drew.
pub fn hits_any_trail(
    point: DVec3,
    players: &[Player],
    self_id: PlayerId,
    include_others: bool,
    config: &SimConfig,
) -> bool {
    let r2 = config.collision_radius * config.collision_radius;

    for player in players {
        if !player.trail_collidable {
            continue;
        }
        let is_self = player.id == self_id;
        if !include_others && !is_self {
            continue;
        }

        let pts = player.trail.solid_points();
        let ignore = if is_self { config.safe_tail_ignore_count } else { 0 };
        let end = pts.len().saturating_sub(ignore);

        if pts[..end]
            .iter()
            .step_by(COLLISION_SAMPLE_STRIDE)
            .any(|p| point.distance_squared(*p) <= r2)
        {
            return true;
        }
    }

    false
}
