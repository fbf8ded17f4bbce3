//! Bot decision engine
//!
//! Each tick a bot forward-simulates the three discrete turns and keeps the one
//! that survives longest and stays farthest from where opponents are heading.
//! Opponent trajectories are predicted once per tick and shared by all bots.

use std::collections::BTreeMap;

use glam::DVec3;

use super::collision::hits_any_trail;
use super::frame::OrientationFrame;
use super::state::{Player, PlayerId};
use crate::tuning::SimConfig;

/// Turn candidates, in evaluation order
pub const TURN_CANDIDATES: [f64; 3] = [-1.0, 0.0, 1.0];

/// Base score of a candidate that crashes in the look-ahead
const CRASH_PENALTY: f64 = -10_000.0;
/// Added per step survived before an imagined crash
const CRASH_STEP_BONUS: f64 = 25.0;

/// Weight of the minimum separation from predicted opponent heads
const SEPARATION_WEIGHT: f64 = 6.0;
/// Weight of the short-horizon safety margin
const LOCAL_SAFETY_WEIGHT: f64 = 4.0;

const LOCAL_SAFETY_STEPS: usize = 10;
const LOCAL_SAFETY_DT: f64 = 0.08;

/// Look-ahead used to detect "danger soon" before dashing
const DASH_DANGER_STEPS: usize = 8;
const DASH_DANGER_DT: f64 = 0.08;

/// Separation reported when no opponent trajectory is available
const NO_OPPONENT_DISTANCE: f64 = 99_999.0;

/// Predicted head positions per player, indexed by look-ahead step
#[derive(Debug, Clone, Default)]
pub struct HeadPredictions {
    paths: BTreeMap<PlayerId, Vec<DVec3>>,
}

impl HeadPredictions {
    pub fn get(&self, id: PlayerId) -> Option<&[DVec3]> {
        self.paths.get(&id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Simulate every Active player under its current turn input.
///
/// Computed once per tick before any bot decides; bots therefore see opponents'
/// previous-tick intents.
pub fn predict_heads(players: &[Player], config: &SimConfig) -> HeadPredictions {
    let motion = config.motion();
    let paths = players
        .iter()
        .filter(|p| p.is_active())
        .map(|player| {
            let mut sim = player.frame;
            let path = (0..config.bot_sim_steps)
                .map(|_| {
                    sim.advance(player.turn_input, config.bot_sim_dt, &motion);
                    sim.position
                })
                .collect();
            (player.id, path)
        })
        .collect();
    HeadPredictions { paths }
}

/// Pick a turn in {-1, 0, 1} for `bot`.
///
/// Ties keep the earlier candidate.
pub fn decide(bot: &Player, players: &[Player], heads: &HeadPredictions, config: &SimConfig) -> f64 {
    let mut best_turn = 0.0;
    let mut best_score = f64::NEG_INFINITY;

    for turn in TURN_CANDIDATES {
        let score = score_candidate(bot, turn, players, heads, config);
        if score > best_score {
            best_score = score;
            best_turn = turn;
        }
    }

    best_turn
}

/// Score one turn candidate over the full bot horizon
pub fn score_candidate(
    bot: &Player,
    turn: f64,
    players: &[Player],
    heads: &HeadPredictions,
    config: &SimConfig,
) -> f64 {
    let motion = config.motion();
    let mut sim = bot.frame;
    let mut min_dist = NO_OPPONENT_DISTANCE;

    for step in 0..config.bot_sim_steps {
        sim.advance(turn, config.bot_sim_dt, &motion);

        if hits_any_trail(sim.position, players, bot.id, true, config) {
            return CRASH_PENALTY + step as f64 * CRASH_STEP_BONUS;
        }

        for other in players {
            if other.id == bot.id || !other.is_active() {
                continue;
            }
            if let Some(predicted) = heads.get(other.id).and_then(|path| path.get(step)) {
                min_dist = min_dist.min(sim.position.distance(*predicted));
            }
        }
    }

    min_dist * SEPARATION_WEIGHT + local_safety(bot, turn, players, config) * LOCAL_SAFETY_WEIGHT
}

/// Short look-ahead margin: `10` if clear, `step - 10` on the first hit
fn local_safety(bot: &Player, turn: f64, players: &[Player], config: &SimConfig) -> f64 {
    match first_hit(&bot.frame, turn, LOCAL_SAFETY_STEPS, LOCAL_SAFETY_DT, bot.id, players, config) {
        Some(step) => step as f64 - LOCAL_SAFETY_STEPS as f64,
        None => LOCAL_SAFETY_STEPS as f64,
    }
}

/// Dash only to escape an imminent crash, and only if the landing spot is clear
pub fn should_dash(bot: &Player, players: &[Player], config: &SimConfig) -> bool {
    let danger_soon = first_hit(
        &bot.frame,
        bot.turn_input,
        DASH_DANGER_STEPS,
        DASH_DANGER_DT,
        bot.id,
        players,
        config,
    )
    .is_some();
    if !danger_soon {
        return false;
    }

    let landing = bot
        .frame
        .advanced(bot.turn_input, config.dash_duration(), &config.motion());
    !hits_any_trail(landing.position, players, bot.id, true, config)
}

/// Step of the first trail hit within `steps` steps, if any
fn first_hit(
    start: &OrientationFrame,
    turn: f64,
    steps: usize,
    dt: f64,
    self_id: PlayerId,
    players: &[Player],
    config: &SimConfig,
) -> Option<usize> {
    let motion = config.motion();
    let mut sim = *start;
    (0..steps).find(|_| {
        sim.advance(turn, dt, &motion);
        hits_any_trail(sim.position, players, self_id, true, config)
    })
}
