//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads lives in [`SimConfig`]. A match works
//! on a copy scaled to the chosen sphere size.

use serde::{Deserialize, Serialize};

/// Base world radius the default speeds were tuned for
pub const BASE_WORLD_RADIUS: f64 = 24.0;

/// World radius for size classes 1..=9
pub const SPHERE_SIZE_PRESETS: [f64; 9] = [12.0, 15.0, 18.0, 21.0, 24.0, 27.0, 30.0, 34.0, 38.0];

/// World radius for size class 0, indexed by total player count (1..=4)
pub const SPHERE_AUTO_SCALE_RADII: [f64; 4] = [18.0, 21.0, 24.0, 27.0];

/// Trail samples are spaced at this fraction of the body radius
pub const SAMPLE_SPACING_FACTOR: f64 = 0.9;

/// Gameplay constants for one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world_radius: f64,
    /// Head speed (world units per second)
    pub speed: f64,
    /// Yaw rate at full turn input (radians per second)
    pub turn_rate: f64,
    pub body_radius: f64,
    pub head_radius: f64,
    pub collision_radius: f64,
    /// Newest own trail points exempt from the own-trail collision check
    pub safe_tail_ignore_count: usize,

    // === Trail gaps ===
    pub gap_interval_min: f64,
    pub gap_interval_max: f64,
    pub gap_duration_min: f64,
    pub gap_duration_max: f64,

    // === Bots ===
    pub bot_sim_steps: usize,
    pub bot_sim_dt: f64,

    // === Match flow ===
    /// Continuous mode: trail fade before respawn (seconds)
    pub fade_duration: f64,
    pub spawn_grace_duration: f64,
    pub score_per_hit: u32,

    // === Dash ===
    pub dash_cooldown: f64,
    pub dash_distance: f64,
    pub dash_gap_duration: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_radius: BASE_WORLD_RADIUS,
            speed: 9.0,
            turn_rate: 2.05,
            body_radius: 0.36,
            head_radius: 0.62,
            collision_radius: 0.62,
            safe_tail_ignore_count: 18,

            gap_interval_min: 1.3,
            gap_interval_max: 2.9,
            gap_duration_min: 0.16,
            gap_duration_max: 0.31,

            bot_sim_steps: 22,
            bot_sim_dt: 0.12,

            fade_duration: 2.0,
            spawn_grace_duration: 2.0,
            score_per_hit: 1,

            dash_cooldown: 5.0,
            dash_distance: 5.4,
            dash_gap_duration: 0.34,
        }
    }
}

/// Radius for a menu size class. Class 0 picks by player count.
pub fn world_radius_for_size(size_class: u8, player_count: usize) -> f64 {
    if size_class == 0 {
        let idx = player_count.clamp(1, SPHERE_AUTO_SCALE_RADII.len()) - 1;
        return SPHERE_AUTO_SCALE_RADII[idx];
    }
    let idx = (size_class as usize).clamp(1, SPHERE_SIZE_PRESETS.len()) - 1;
    SPHERE_SIZE_PRESETS[idx]
}

impl SimConfig {
    /// Default tuning scaled for a size class and player count
    pub fn for_sphere_size(size_class: u8, player_count: usize) -> Self {
        Self::default().scaled_to_radius(world_radius_for_size(size_class, player_count))
    }

    /// Rescale distances that should track the world size.
    ///
    /// Speed scales with radius so a lap takes the same time on every sphere.
    pub fn scaled_to_radius(mut self, radius: f64) -> Self {
        let scale = radius / self.world_radius;
        self.world_radius = radius;
        self.speed *= scale;
        self.dash_distance *= scale;
        self
    }

    /// Radius heads and trail points live on
    #[inline]
    pub fn shell_radius(&self) -> f64 {
        self.world_radius + self.head_radius
    }

    /// Integration time equivalent to one dash
    #[inline]
    pub fn dash_duration(&self) -> f64 {
        self.dash_distance / self.speed
    }

    pub fn motion(&self) -> Motion {
        Motion {
            turn_rate: self.turn_rate,
            speed: self.speed,
            world_radius: self.world_radius,
            head_radius: self.head_radius,
        }
    }

    pub fn trail_params(&self) -> TrailParams {
        TrailParams {
            sample_spacing: self.body_radius * SAMPLE_SPACING_FACTOR,
            shell_radius: self.shell_radius(),
            gap_interval: (self.gap_interval_min, self.gap_interval_max),
            gap_duration: (self.gap_duration_min, self.gap_duration_max),
        }
    }

    /// Long-run fraction of trail time spent in gaps
    pub fn expected_gap_fraction(&self) -> f64 {
        let gap = (self.gap_duration_min + self.gap_duration_max) / 2.0;
        let interval = (self.gap_interval_min + self.gap_interval_max) / 2.0;
        gap / (gap + interval)
    }
}

/// Parameters of the sphere motion integrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub turn_rate: f64,
    pub speed: f64,
    pub world_radius: f64,
    pub head_radius: f64,
}

impl Motion {
    #[inline]
    pub fn shell_radius(&self) -> f64 {
        self.world_radius + self.head_radius
    }
}

/// Parameters of one trail's sampling and gap cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailParams {
    pub sample_spacing: f64,
    pub shell_radius: f64,
    /// Solid run length range (seconds)
    pub gap_interval: (f64, f64),
    /// Gap length range (seconds)
    pub gap_duration: (f64, f64),
}
