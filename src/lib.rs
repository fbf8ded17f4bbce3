//! Achtung Kugel - a trail duel on the surface of a sphere
//!
//! Core modules:
//! - `sim`: Simulation core (sphere motion, trails, collisions, bots, match flow)
//! - `tuning`: Data-driven game balance
//! - `settings`: Persisted menu settings with validation

pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{MenuSettings, SettingsError, SettingsStore};
pub use tuning::SimConfig;

use glam::DVec3;

/// Game configuration constants
pub mod consts {
    /// Largest timestep a single tick integrates (seconds)
    pub const MAX_DT: f64 = 0.05;

    /// Player slots (humans + bots)
    pub const MAX_PLAYERS: usize = 4;
    pub const MIN_HUMANS: u8 = 1;

    /// Randomized placement attempts before accepting an unsafe spawn
    pub const SPAWN_ATTEMPTS: usize = 18;

    /// Head/trail colors by player slot (0xRRGGBB)
    pub const PLAYER_COLORS: [u32; 4] = [0xff3b30, 0x34c759, 0x0a84ff, 0xffd60a];

    /// Default keyboard layout by human slot
    pub const CONTROL_SCHEMES: [ControlScheme; 4] = [
        ControlScheme { label: "P1", left: "ArrowLeft", right: "ArrowRight", dash: "ArrowUp" },
        ControlScheme { label: "P2", left: "KeyA", right: "KeyD", dash: "KeyW" },
        ControlScheme { label: "P3", left: "KeyJ", right: "KeyL", dash: "KeyI" },
        ControlScheme { label: "P4", left: "KeyF", right: "KeyH", dash: "KeyT" },
    ];

    /// Key codes a front end binds for one human player
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlScheme {
        pub label: &'static str,
        pub left: &'static str,
        pub right: &'static str,
        pub dash: &'static str,
    }
}

/// Scale a point back onto the sphere shell of the given radius
#[inline]
pub fn project_to_shell(point: DVec3, shell_radius: f64) -> DVec3 {
    point.normalize_or_zero() * shell_radius
}

/// Outward direction for a spawn angle around the vertical axis.
///
/// `lift` raises the point off the equator before normalizing.
#[inline]
pub fn spawn_direction(angle: f64, lift: f64) -> DVec3 {
    DVec3::new(angle.cos(), lift, angle.sin()).normalize()
}
