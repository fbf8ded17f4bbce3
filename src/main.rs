//! Achtung Kugel entry point
//!
//! Native builds run a headless match: humans follow a scripted wobble, bots play
//! for real, and events go to the log. The browser front end drives the library
//! directly and does not use this binary.

#[cfg(not(target_arch = "wasm32"))]
use achtung_kugel::MenuSettings;
#[cfg(not(target_arch = "wasm32"))]
use achtung_kugel::settings::FileStore;
#[cfg(not(target_arch = "wasm32"))]
use achtung_kugel::sim::{GameEvent, GameSession, MatchPhase, PlayerInput, TickInput, tick};

/// Headless tick rate
#[cfg(not(target_arch = "wasm32"))]
const DEMO_DT: f64 = 1.0 / 60.0;

/// Stop a demo that never reaches a winner (simulated seconds)
#[cfg(not(target_arch = "wasm32"))]
const DEMO_TIME_LIMIT: f64 = 20.0 * 60.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or(0x5eed);
    let dir = std::env::var("ACHTUNG_KUGEL_DATA").unwrap_or_else(|_| ".achtung-kugel".to_string());
    let store = FileStore::new(dir);

    // Settings are only read here
    let settings = MenuSettings::load(&store).unwrap_or_default();
    log::info!("Achtung Kugel (native) starting, seed {seed}");

    let mut session = GameSession::new(settings, seed);
    let mut elapsed = 0.0;

    while elapsed < DEMO_TIME_LIMIT {
        let input = scripted_input(&session, elapsed);
        tick(&mut session, &input, DEMO_DT);
        elapsed += DEMO_DT;

        for event in session.drain_events() {
            match event {
                GameEvent::Crash { player } => log::info!("{:>7.2}s  P{} crashed", elapsed, player + 1),
                GameEvent::Dash { player } => log::info!("{:>7.2}s  P{} dashed", elapsed, player + 1),
                GameEvent::Respawned { player } => {
                    log::info!("{:>7.2}s  P{} respawned", elapsed, player + 1)
                }
                GameEvent::RoundOver | GameEvent::MatchOver { .. } => {}
            }
        }

        match session.phase {
            MatchPhase::Running => {}
            MatchPhase::RoundOver => session.start_next_round(),
            MatchPhase::MatchOver { .. } => break,
        }
    }

    println!("\nFinal scores after {} rounds ({elapsed:.1}s):", session.round);
    for player in &session.players {
        let kind = if player.is_bot { "bot" } else { "human" };
        println!("  {} ({kind}): {}", player.name, player.score);
    }
    if let MatchPhase::MatchOver { winner } = session.phase {
        println!("Winner: P{}", winner + 1);
    }
}

/// Humans weave slowly, each with its own phase
#[cfg(not(target_arch = "wasm32"))]
fn scripted_input(session: &GameSession, elapsed: f64) -> TickInput {
    let players = session
        .players
        .iter()
        .filter(|p| !p.is_bot)
        .map(|p| PlayerInput {
            turn: (elapsed * 0.7 + p.id as f64 * 1.3).sin(),
            dash: false,
        })
        .collect();
    TickInput { players }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web front end links the library directly
}
