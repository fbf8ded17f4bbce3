//! Game state and core simulation types
//!
//! A [`GameSession`] owns everything one match needs: tuning, players, RNG and the
//! event queue. Nothing lives in globals.

use serde::{Deserialize, Serialize};

use super::frame::OrientationFrame;
use super::rng::SimRng;
use super::trail::Trail;
use crate::consts::{CONTROL_SCHEMES, ControlScheme, PLAYER_COLORS};
use crate::settings::MenuSettings;
use crate::tuning::SimConfig;

/// Player slot index (0..4), stable for the whole match
pub type PlayerId = usize;

/// Lifecycle of a player within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// Moving, drawing a trail, checked for collisions
    Active,
    /// Elimination mode: crashed, frozen in place until the next round
    Out,
    /// Continuous mode: trail fading out before a respawn
    Respawning,
}

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    Running,
    /// Elimination round finished, waiting for `start_next_round`
    RoundOver,
    MatchOver { winner: PlayerId },
}

/// Discrete outputs for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Crash { player: PlayerId },
    Dash { player: PlayerId },
    Respawned { player: PlayerId },
    RoundOver,
    MatchOver { winner: PlayerId },
}

/// Elimination rounds or continuous play with respawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Elimination,
    Continuous,
}

/// A human or bot player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_bot: bool,
    /// 0xRRGGBB
    pub color: u32,
    /// Index into `CONTROL_SCHEMES` (humans only)
    pub control: Option<usize>,
    pub frame: OrientationFrame,
    pub status: PlayerStatus,
    pub score: u32,
    /// Turn intent in [-1, 1]; positive turns left
    pub turn_input: f64,
    /// Seconds until the next dash is allowed
    pub dash_cooldown: f64,
    pub dash_requested: bool,
    /// While > 0 the player cannot crash and draws no trail
    pub spawn_grace: f64,
    /// Continuous mode fade timer
    pub respawn_timer: f64,
    pub trail_collidable: bool,
    pub trail: Trail,
}

impl Player {
    pub fn new(id: PlayerId, is_bot: bool, config: &SimConfig, rng: &mut SimRng) -> Self {
        let shell = config.shell_radius();
        Self {
            id,
            name: format!("P{}", id + 1),
            is_bot,
            color: PLAYER_COLORS[id % PLAYER_COLORS.len()],
            control: (!is_bot).then_some(id % CONTROL_SCHEMES.len()),
            frame: OrientationFrame::from_up_heading(glam::DVec3::Y, glam::DVec3::Z, shell),
            status: PlayerStatus::Active,
            score: 0,
            turn_input: 0.0,
            dash_cooldown: config.dash_cooldown,
            dash_requested: false,
            spawn_grace: config.spawn_grace_duration,
            respawn_timer: 0.0,
            trail_collidable: true,
            trail: Trail::new(config.trail_params(), rng),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == PlayerStatus::Active
    }

    pub fn control_scheme(&self) -> Option<&'static ControlScheme> {
        self.control.map(|idx| &CONTROL_SCHEMES[idx])
    }

    /// Grace progress for cooldown indicators (1 = just spawned)
    pub fn spawn_grace_fraction(&self, config: &SimConfig) -> f64 {
        if config.spawn_grace_duration <= 0.0 {
            return 0.0;
        }
        (self.spawn_grace / config.spawn_grace_duration).clamp(0.0, 1.0)
    }

    /// Dash cooldown progress for cooldown indicators (1 = just dashed)
    pub fn dash_cooldown_fraction(&self, config: &SimConfig) -> f64 {
        if config.dash_cooldown <= 0.0 {
            return 0.0;
        }
        (self.dash_cooldown / config.dash_cooldown).clamp(0.0, 1.0)
    }
}

/// One match: tuning, players, RNG and pending events
#[derive(Debug, Clone)]
pub struct GameSession {
    pub settings: MenuSettings,
    pub config: SimConfig,
    pub players: Vec<Player>,
    pub phase: MatchPhase,
    pub rng: SimRng,
    /// Events raised by the most recent tick
    pub events: Vec<GameEvent>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Rounds started this match
    pub round: u32,
}

impl GameSession {
    /// Start a match from menu settings.
    ///
    /// Humans take the first slots, bots fill the rest.
    /// Out-of-range settings fall back to the defaults.
    pub fn new(settings: MenuSettings, seed: u64) -> Self {
        let settings = checked_settings(settings);
        let count = settings.player_count();
        let config = SimConfig::for_sphere_size(settings.sphere_size, count);
        Self::with_config(settings, config, seed)
    }

    /// Start a match with explicit tuning (sphere size already applied)
    pub fn with_config(settings: MenuSettings, config: SimConfig, seed: u64) -> Self {
        let settings = checked_settings(settings);
        let mut rng = SimRng::new(seed);
        let humans = settings.humans as usize;
        let players = (0..settings.player_count())
            .map(|id| Player::new(id, id >= humans, &config, &mut rng))
            .collect();

        let mut session = Self {
            settings,
            config,
            players,
            phase: MatchPhase::Running,
            rng,
            events: Vec::new(),
            time_ticks: 0,
            round: 0,
        };
        log::info!(
            "Match start: {} humans, {} bots, radius {:.1}, {:?} mode, target {}",
            session.settings.humans,
            session.settings.bots,
            session.config.world_radius,
            session.mode(),
            session.target_score()
        );
        super::tick::reset_round(&mut session);
        session
    }

    pub fn mode(&self) -> GameMode {
        self.settings.mode()
    }

    /// Score that ends the match
    pub fn target_score(&self) -> u32 {
        (self.players.len().saturating_sub(1) as u32 * 10).max(1)
    }

    /// First player, in slot order, who reached the target
    pub fn winner(&self) -> Option<PlayerId> {
        let target = self.target_score();
        self.players.iter().find(|p| p.score >= target).map(|p| p.id)
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Leave `RoundOver` and respawn everyone
    pub fn start_next_round(&mut self) {
        if self.phase != MatchPhase::RoundOver {
            return;
        }
        super::tick::reset_round(self);
        self.phase = MatchPhase::Running;
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Settings a match can be built from; invalid ones degrade to the defaults
fn checked_settings(settings: MenuSettings) -> MenuSettings {
    match settings.validate() {
        Ok(()) => settings,
        Err(e) => {
            log::warn!("Invalid match settings, using defaults: {e}");
            MenuSettings::default()
        }
    }
}
