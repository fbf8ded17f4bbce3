//! Per-tick simulation pipeline
//!
//! Advances a [`GameSession`] by one variable timestep (clamped to `MAX_DT`).
//! The stages run in a fixed order so that the same seed and inputs always give
//! the same match: respawns, timers, inputs, bot decisions, integration, then a
//! single collision pass over everyone who moved.

use std::f64::consts::TAU;

use glam::DVec3;

use super::bot;
use super::collision::hits_any_trail;
use super::frame::OrientationFrame;
use super::rng::RandomSource;
use super::state::{GameEvent, GameMode, GameSession, MatchPhase, Player, PlayerId, PlayerStatus};
use crate::consts::{MAX_DT, SPAWN_ATTEMPTS};
use crate::spawn_direction;
use crate::tuning::SimConfig;

/// Spawn latitude lift and its jitter span
const SPAWN_LIFT: f64 = 0.26;
const SPAWN_LIFT_JITTER: f64 = 0.15;

/// One human's controls for a tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Turn intent; clamped to [-1, 1], positive turns left
    pub turn: f64,
    /// Dash pressed this tick (edge, not level)
    pub dash: bool,
}

/// Input commands for a single tick, indexed by human slot
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub players: Vec<PlayerInput>,
}

impl TickInput {
    pub fn for_player(&self, id: PlayerId) -> PlayerInput {
        self.players.get(id).copied().unwrap_or_default()
    }
}

/// Result of a spawn search
#[derive(Debug, Clone, Copy)]
pub struct SpawnPlacement {
    pub frame: OrientationFrame,
    /// Candidates tried, 1..=SPAWN_ATTEMPTS
    pub attempts: usize,
    /// False when every candidate touched a trail and the last one was kept
    pub clear: bool,
}

/// Advance the session by one timestep
pub fn tick(session: &mut GameSession, input: &TickInput, dt: f64) {
    session.events.clear();

    if session.phase != MatchPhase::Running {
        return;
    }

    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_DT) } else { 0.0 };
    session.time_ticks += 1;

    // 1. Fading trails and respawns
    update_respawning(session, dt);

    // 2. Spawn grace
    for player in session.players.iter_mut().filter(|p| p.is_active()) {
        player.spawn_grace = (player.spawn_grace - dt).max(0.0);
    }

    let jump_mode = session.settings.jump_mode;
    let active: Vec<PlayerId> = session
        .players
        .iter()
        .filter(|p| p.is_active())
        .map(|p| p.id)
        .collect();

    // 3. Cooldowns and human input
    for &id in &active {
        let player = &mut session.players[id];
        player.dash_cooldown = (player.dash_cooldown - dt).max(0.0);
        player.dash_requested = false;

        if !player.is_bot {
            let controls = input.for_player(id);
            player.turn_input = controls.turn.clamp(-1.0, 1.0);
            if jump_mode && player.spawn_grace <= 0.0 && controls.dash {
                player.dash_requested = true;
            }
        }
    }

    // 4-5. Bots see every head's prediction from the same snapshot
    let heads = bot::predict_heads(&session.players, &session.config);
    for &id in &active {
        if !session.players[id].is_bot {
            continue;
        }
        let turn = bot::decide(&session.players[id], &session.players, &heads, &session.config);
        session.players[id].turn_input = turn;

        // Dash look-ahead runs under the turn just chosen
        let player = &session.players[id];
        let dash = jump_mode
            && player.spawn_grace <= 0.0
            && player.dash_cooldown <= 0.0
            && bot::should_dash(player, &session.players, &session.config);
        if dash {
            session.players[id].dash_requested = true;
        }
    }

    // 6. Integrate, record trails, dash
    let motion = session.config.motion();
    for &id in &active {
        let player = &mut session.players[id];
        player.frame.advance(player.turn_input, dt, &motion);

        if player.spawn_grace <= 0.0 {
            player.trail.add_point(player.frame.position, dt, &mut session.rng);
        }

        if jump_mode
            && player.spawn_grace <= 0.0
            && player.dash_requested
            && player.dash_cooldown <= 0.0
        {
            perform_dash(session, id);
        }
    }

    // 7. Death check, after everyone has moved and drawn
    let crashed: Vec<PlayerId> = active
        .iter()
        .copied()
        .filter(|&id| {
            let player = &session.players[id];
            player.spawn_grace <= 0.0
                && hits_any_trail(player.frame.position, &session.players, id, true, &session.config)
        })
        .collect();

    // 8. React
    for id in crashed {
        if session.players[id].is_active() {
            handle_crash(session, id);
        }
    }
}

/// Clear every trail and respawn all players at evenly spread angles
pub(crate) fn reset_round(session: &mut GameSession) {
    session.round += 1;

    for player in &mut session.players {
        player.trail.reset(&mut session.rng);
    }

    let count = session.players.len().max(1);
    for id in 0..session.players.len() {
        let hint = id as f64 / count as f64 * TAU;
        spawn_player(session, id, Some(hint));
    }

    log::info!("Round {} start", session.round);
}

/// Search for a spawn frame that is clear of every collidable trail.
///
/// The first candidate uses `angle_hint` when given; the rest pick random angles.
/// Gives up after `SPAWN_ATTEMPTS` and returns the last candidate, leaving a bad
/// spawn to the regular death check.
pub fn place_spawn(
    players: &[Player],
    player_id: PlayerId,
    angle_hint: Option<f64>,
    config: &SimConfig,
    rng: &mut dyn RandomSource,
) -> SpawnPlacement {
    let shell = config.shell_radius();
    let mut frame = spawn_frame(0.0, SPAWN_LIFT, shell);

    for attempt in 0..SPAWN_ATTEMPTS {
        let angle = match angle_hint {
            Some(hint) if attempt == 0 => hint,
            _ => rng.range(0.0, TAU),
        };
        let lift = SPAWN_LIFT + (rng.next_f64() - 0.5) * SPAWN_LIFT_JITTER;
        frame = spawn_frame(angle, lift, shell);

        if !hits_any_trail(frame.position, players, player_id, true, config) {
            return SpawnPlacement {
                frame,
                attempts: attempt + 1,
                clear: true,
            };
        }
    }

    SpawnPlacement {
        frame,
        attempts: SPAWN_ATTEMPTS,
        clear: false,
    }
}

fn spawn_frame(angle: f64, lift: f64, shell_radius: f64) -> OrientationFrame {
    let up = spawn_direction(angle, lift);
    let heading = DVec3::new(-angle.sin(), 0.0, angle.cos());
    OrientationFrame::from_up_heading(up, heading, shell_radius)
}

/// Place a player and reset its per-life state
fn spawn_player(session: &mut GameSession, id: PlayerId, angle_hint: Option<f64>) {
    let placement = place_spawn(&session.players, id, angle_hint, &session.config, &mut session.rng);
    if !placement.clear {
        log::debug!("P{} spawn not clear after {} attempts", id + 1, placement.attempts);
    }

    let grace = session.config.spawn_grace_duration;
    let player = &mut session.players[id];
    player.frame = placement.frame;
    player.status = PlayerStatus::Active;
    player.trail_collidable = true;
    player.respawn_timer = 0.0;
    player.spawn_grace = grace;
    player.turn_input = 0.0;
    player.dash_cooldown = 0.0;
    player.dash_requested = false;
}

/// Award survivors and move the crashed player out of play
pub(crate) fn handle_crash(session: &mut GameSession, id: PlayerId) {
    let score_per_hit = session.config.score_per_hit;
    for other in session.players.iter_mut() {
        if other.id != id && other.is_active() {
            other.score += score_per_hit;
        }
    }
    log::debug!("P{} crashed", id + 1);
    session.events.push(GameEvent::Crash { player: id });

    match session.mode() {
        GameMode::Continuous => {
            let fade = session.config.fade_duration;
            let player = &mut session.players[id];
            player.status = PlayerStatus::Respawning;
            player.respawn_timer = fade;
            player.trail_collidable = false;
            player.turn_input = 0.0;

            if let Some(winner) = session.winner() {
                end_match(session, winner);
            }
        }
        GameMode::Elimination => {
            let player = &mut session.players[id];
            player.status = PlayerStatus::Out;
            player.turn_input = 0.0;

            if session.active_count() <= 1 {
                match session.winner() {
                    Some(winner) => end_match(session, winner),
                    None => end_round(session),
                }
            }
        }
    }
}

fn end_round(session: &mut GameSession) {
    if session.phase != MatchPhase::Running {
        return;
    }
    session.phase = MatchPhase::RoundOver;
    session.events.push(GameEvent::RoundOver);
    let scores: Vec<u32> = session.players.iter().map(|p| p.score).collect();
    log::info!("Round {} over, scores {:?}", session.round, scores);
}

fn end_match(session: &mut GameSession, winner: PlayerId) {
    if matches!(session.phase, MatchPhase::MatchOver { .. }) {
        return;
    }
    session.phase = MatchPhase::MatchOver { winner };
    session.events.push(GameEvent::MatchOver { winner });
    log::info!(
        "Match over: P{} wins with {} points",
        winner + 1,
        session.players[winner].score
    );
}

/// Fade Respawning trails and bring players back once the fade completes
pub(crate) fn update_respawning(session: &mut GameSession, dt: f64) {
    let fade_duration = session.config.fade_duration;

    for id in 0..session.players.len() {
        let player = &mut session.players[id];
        if player.status != PlayerStatus::Respawning {
            continue;
        }

        player.respawn_timer -= dt;
        let progress = if fade_duration > 0.0 {
            1.0 - player.respawn_timer.max(0.0) / fade_duration
        } else {
            1.0
        };
        player.trail.set_fade(progress);

        if player.respawn_timer <= 0.0 {
            player.trail.reset(&mut session.rng);
            spawn_player(session, id, None);
            log::debug!("P{} respawned", id + 1);
            session.events.push(GameEvent::Respawned { player: id });
        }
    }
}

/// Jump ahead one dash length, leaving a forced gap behind
fn perform_dash(session: &mut GameSession, id: PlayerId) {
    let config = &session.config;
    let player = &mut session.players[id];
    player
        .frame
        .advance(player.turn_input, config.dash_duration(), &config.motion());
    player
        .trail
        .force_gap(config.dash_gap_duration, player.frame.position);
    player.dash_cooldown = config.dash_cooldown;
    player.dash_requested = false;

    log::debug!("P{} dashed", id + 1);
    session.events.push(GameEvent::Dash { player: id });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MenuSettings;
    use crate::sim::rng::SimRng;
    use crate::sim::trail::Trail;

    const DT: f64 = 0.016;

    fn settings(humans: u8, bots: u8) -> MenuSettings {
        MenuSettings {
            humans,
            bots,
            ..Default::default()
        }
    }

    fn turns(turns: &[f64]) -> TickInput {
        TickInput {
            players: turns
                .iter()
                .map(|&turn| PlayerInput { turn, dash: false })
                .collect(),
        }
    }

    #[test]
    fn test_two_humans_no_contact() {
        let mut session = GameSession::new(settings(2, 0), 42);
        let input = turns(&[0.0, 1.0]);
        let ticks = (3.5 / DT) as usize;

        let mut crashes = 0;
        for _ in 0..ticks {
            tick(&mut session, &input, DT);
            crashes += session
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::Crash { .. }))
                .count();
        }

        assert_eq!(crashes, 0);
        assert_eq!(session.phase, MatchPhase::Running);
        assert!(session.players.iter().all(|p| p.is_active()));
        assert!(session.players.iter().all(|p| !p.trail.is_empty()));
        assert_eq!(session.time_ticks, ticks as u64);
    }

    #[test]
    fn test_continuous_match_ends_on_target() {
        let mut session = GameSession::new(
            MenuSettings {
                continuous: true,
                ..settings(2, 0)
            },
            7,
        );
        assert_eq!(session.target_score(), 10);
        let fade = session.config.fade_duration;

        for crash in 1..=10 {
            handle_crash(&mut session, 0);
            assert_eq!(session.players[0].status, PlayerStatus::Respawning);
            assert!(!session.players[0].trail_collidable);
            assert_eq!(session.players[1].score, crash);
            if crash < 10 {
                assert_eq!(session.phase, MatchPhase::Running);
                update_respawning(&mut session, fade);
                assert!(session.players[0].is_active());
                assert!(session.players[0].trail_collidable);
            }
        }

        assert_eq!(session.phase, MatchPhase::MatchOver { winner: 1 });
        let events = session.drain_events();
        let count = |f: fn(&GameEvent) -> bool| events.iter().filter(|e| f(e)).count();
        assert_eq!(count(|e| matches!(e, GameEvent::Crash { player: 0 })), 10);
        assert_eq!(count(|e| matches!(e, GameEvent::Respawned { player: 0 })), 9);
        assert_eq!(count(|e| matches!(e, GameEvent::MatchOver { winner: 1 })), 1);
    }

    /// Obstacle points covering every longitude of the spawn latitude band
    fn saturate_spawn_band(shell: f64) -> Vec<DVec3> {
        let step = 0.3;
        let lat_min = 0.1f64.asin();
        let lat_max = 0.45f64.asin();
        let mut points = Vec::new();
        let mut lat = lat_min;
        while lat <= lat_max {
            let ring = shell * lat.cos();
            let columns = (TAU * ring / step).ceil() as usize;
            for c in 0..columns {
                let lon = c as f64 / columns as f64 * TAU;
                let p = DVec3::new(lat.cos() * lon.cos(), lat.sin(), lat.cos() * lon.sin()) * shell;
                // Twice, so the stride-2 scan sees every point
                points.push(p);
                points.push(p);
            }
            lat += step / shell;
        }
        points
    }

    #[test]
    fn test_spawn_gives_up_on_saturated_sphere() {
        let mut session = GameSession::new(settings(2, 0), 99);
        let shell = session.config.shell_radius();
        session.players[1].status = PlayerStatus::Out;
        session.players[1].trail =
            Trail::with_points(session.config.trail_params(), &saturate_spawn_band(shell));

        let placement = place_spawn(
            &session.players,
            0,
            Some(0.0),
            &session.config,
            &mut session.rng,
        );
        assert_eq!(placement.attempts, SPAWN_ATTEMPTS);
        assert!(!placement.clear);
        assert!((placement.frame.position.length() - shell).abs() < 1e-9);
        assert!(placement.frame.orthonormal_error() < 1e-9);
    }

    #[test]
    fn test_spawn_uses_hint_when_clear() {
        let config = SimConfig::default();
        let mut rng = SimRng::new(5);
        let players = vec![Player::new(0, false, &config, &mut rng)];
        let placement = place_spawn(&players, 0, Some(0.0), &config, &mut rng);
        assert!(placement.clear);
        assert_eq!(placement.attempts, 1);
        // Angle 0 sits over +X, heading toward +Z
        assert!(placement.frame.position.x > 0.0);
        assert!(placement.frame.position.z.abs() < 1e-9);
        assert!(placement.frame.forward.z > 0.9);
    }

    #[test]
    fn test_determinism() {
        let mut a = GameSession::new(settings(1, 3), 2024);
        let mut b = GameSession::new(settings(1, 3), 2024);
        let input = turns(&[0.4]);

        for _ in 0..600 {
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }

        assert_eq!(a.phase, b.phase);
        for (pa, pb) in a.players.iter().zip(&b.players) {
            assert_eq!(pa.frame.position, pb.frame.position);
            assert_eq!(pa.score, pb.score);
            assert_eq!(pa.status, pb.status);
            assert_eq!(pa.trail.solid_points(), pb.trail.solid_points());
        }
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut session = GameSession::new(settings(1, 0), 1);
        let start = session.players[0].frame.position;
        let grace = session.players[0].spawn_grace;

        tick(&mut session, &TickInput::default(), 1.0);

        let moved = session.players[0].frame.position.distance(start);
        assert!(moved <= session.config.speed * MAX_DT + 1e-9);
        assert!((grace - session.players[0].spawn_grace - MAX_DT).abs() < 1e-12);
    }

    #[test]
    fn test_grace_blocks_trail_and_death() {
        let mut session = GameSession::new(settings(2, 0), 8);
        // Drop player 0's head right onto player 1's spawn
        session.players[1].trail = Trail::with_points(
            session.config.trail_params(),
            &[session.players[0].frame.position; 4],
        );
        tick(&mut session, &TickInput::default(), DT);
        assert!(session.players[0].is_active());
        assert!(session.players[0].trail.is_empty());
    }

    #[test]
    fn test_elimination_round_flow() {
        let mut session = GameSession::new(settings(2, 0), 3);
        assert_eq!(session.round, 1);

        handle_crash(&mut session, 0);
        assert_eq!(session.players[0].status, PlayerStatus::Out);
        assert!(session.players[0].trail_collidable);
        assert_eq!(session.players[1].score, 1);
        assert_eq!(session.phase, MatchPhase::RoundOver);
        assert!(session.events.contains(&GameEvent::RoundOver));

        // Nothing moves between rounds
        let frozen = session.players[1].frame.position;
        tick(&mut session, &turns(&[0.0, 1.0]), DT);
        assert_eq!(session.players[1].frame.position, frozen);
        assert!(session.events.is_empty());

        session.start_next_round();
        assert_eq!(session.round, 2);
        assert_eq!(session.phase, MatchPhase::Running);
        assert!(session.players.iter().all(|p| p.is_active() && p.trail.is_empty()));
        assert_eq!(session.players[1].score, 1);
    }

    #[test]
    fn test_elimination_match_over() {
        let mut session = GameSession::new(settings(2, 0), 3);
        session.players[1].score = 9;
        handle_crash(&mut session, 0);
        assert_eq!(session.phase, MatchPhase::MatchOver { winner: 1 });

        // Later crash in the same tick does not end the match twice
        handle_crash(&mut session, 1);
        let overs = session
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::MatchOver { .. }))
            .count();
        assert_eq!(overs, 1);
        assert_eq!(session.phase, MatchPhase::MatchOver { winner: 1 });
    }

    #[test]
    fn test_three_players_round_waits_for_last_survivor() {
        let mut session = GameSession::new(settings(3, 0), 3);
        handle_crash(&mut session, 2);
        assert_eq!(session.phase, MatchPhase::Running);
        assert_eq!(session.players[0].score, 1);
        assert_eq!(session.players[1].score, 1);

        handle_crash(&mut session, 0);
        assert_eq!(session.phase, MatchPhase::RoundOver);
        assert_eq!(session.players[1].score, 2);
        assert_eq!(session.players[0].score, 1);
    }

    #[test]
    fn test_dash_in_jump_mode() {
        let mut session = GameSession::new(
            MenuSettings {
                jump_mode: true,
                ..settings(1, 0)
            },
            12,
        );
        let dash = TickInput {
            players: vec![PlayerInput {
                turn: 0.0,
                dash: true,
            }],
        };

        // Still in grace: ignored
        tick(&mut session, &dash, DT);
        assert!(!session.events.contains(&GameEvent::Dash { player: 0 }));

        session.players[0].spawn_grace = 0.0;
        let before = session.players[0].frame.position;
        tick(&mut session, &dash, DT);
        assert!(session.events.contains(&GameEvent::Dash { player: 0 }));
        let player = &session.players[0];
        assert_eq!(player.dash_cooldown, session.config.dash_cooldown);
        assert!(player.trail.in_gap());
        let jumped = player.frame.position.distance(before);
        assert!(jumped > session.config.dash_distance * 0.95);

        // Cooldown running: second press ignored
        tick(&mut session, &dash, DT);
        assert!(session.events.is_empty());
    }

    #[test]
    fn test_bot_dash_checks_the_turn_it_chose() {
        let mut session = GameSession::new(
            MenuSettings {
                jump_mode: true,
                ..settings(1, 1)
            },
            31,
        );
        let shell = session.config.shell_radius();
        session.players[0].status = PlayerStatus::Out;

        // Narrow wall straight ahead of the bot: turning clears it, going straight does not
        let f = session.players[1].frame;
        let wall: Vec<DVec3> = (-1..=1)
            .flat_map(|k| {
                let offset = f.forward * 3.0 + f.right * (k as f64 * 0.3);
                let p = crate::project_to_shell(f.position + offset, shell);
                [p, p]
            })
            .collect();
        session.players[0].trail = Trail::with_points(session.config.trail_params(), &wall);

        let player = &mut session.players[1];
        player.spawn_grace = 0.0;
        player.dash_cooldown = 0.0;
        player.turn_input = 0.0;
        // Last tick's heading would want to dash
        assert!(bot::should_dash(&session.players[1], &session.players, &session.config));

        tick(&mut session, &TickInput::default(), DT);

        assert_ne!(session.players[1].turn_input, 0.0);
        assert!(!session.events.contains(&GameEvent::Dash { player: 1 }));
        assert!(session.players[1].is_active());
    }

    #[test]
    fn test_non_finite_dt_is_ignored() {
        let mut session = GameSession::new(settings(1, 0), 4);
        let start = session.players[0].frame;
        tick(&mut session, &TickInput::default(), f64::NAN);
        tick(&mut session, &TickInput::default(), f64::INFINITY);
        let frame = session.players[0].frame;
        assert!(frame.position.distance(start.position) < 1e-9);
        assert!(frame.orthonormal_error() < 1e-9);
        assert!(session.players[0].spawn_grace.is_finite());
    }

    #[test]
    fn test_no_dash_without_jump_mode() {
        let mut session = GameSession::new(settings(1, 0), 12);
        session.players[0].spawn_grace = 0.0;
        let dash = TickInput {
            players: vec![PlayerInput {
                turn: 0.0,
                dash: true,
            }],
        };
        tick(&mut session, &dash, DT);
        assert!(session.events.is_empty());
    }

    #[test]
    fn test_continuous_respawn_through_ticks() {
        let mut session = GameSession::new(
            MenuSettings {
                continuous: true,
                ..settings(2, 0)
            },
            21,
        );
        handle_crash(&mut session, 0);
        let fade = session.config.fade_duration;

        let mut respawned = false;
        let ticks = (fade / DT) as usize + 2;
        for _ in 0..ticks {
            tick(&mut session, &TickInput::default(), DT);
            if session.events.contains(&GameEvent::Respawned { player: 0 }) {
                respawned = true;
                break;
            }
            assert!(session.players[0].trail.fade() > 0.0);
        }
        assert!(respawned);
        let player = &session.players[0];
        assert!(player.is_active());
        assert!(player.trail.is_empty());
        assert_eq!(player.trail.fade(), 0.0);
        assert_eq!(player.dash_cooldown, 0.0);
    }
}
