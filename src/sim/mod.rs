//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, passed in explicitly
//! - Stable iteration order (by player slot)
//! - No rendering, input device or platform dependencies

pub mod bot;
pub mod collision;
pub mod frame;
pub mod rng;
pub mod state;
pub mod tick;
pub mod trail;

pub use bot::{HeadPredictions, decide, predict_heads, should_dash};
pub use collision::{COLLISION_SAMPLE_STRIDE, hits_any_trail};
pub use frame::OrientationFrame;
pub use rng::{RandomSource, SimRng};
pub use state::{GameEvent, GameMode, GameSession, MatchPhase, Player, PlayerId, PlayerStatus};
pub use tick::{PlayerInput, SpawnPlacement, TickInput, place_spawn, tick};
pub use trail::Trail;
