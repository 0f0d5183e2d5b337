//! Headless demo runner
//!
//! Drives the simulation with scripted input at the fixed tick rate and
//! logs what happens. Useful for profiling the core and for eyeballing
//! determinism: the same seed always prints the same run.

use std::process::ExitCode;

use frameshift::consts::*;
use frameshift::metronome::Metronome;
use frameshift::sim::{TickInput, WorldState, tick};
use frameshift::sink::RecordingAudio;
use glam::IVec2;

const MAX_TICKS: u64 = 60 * 60;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let mut world = match WorldState::new(seed) {
        Ok(world) => world,
        Err(err) => {
            log::error!("level data rejected: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut metronome = Metronome::new(TICK_RATE, MAX_TICKS_PER_FRAME);
    let mut audio = RecordingAudio::default();

    // Simulated wall clock: feed the metronome one frame at a time.
    while !world.finished && metronome.ticks < MAX_TICKS {
        for _ in 0..metronome.advance(1.0 / TICK_RATE) {
            let input = scripted_input(metronome.ticks);
            tick(&mut world, &input, &mut audio);
        }
    }

    for (sound, pos) in &audio.played {
        log::debug!("sound {sound:?} at {pos}");
    }
    log::info!(
        "ran {} ticks, reached level {}, {} sounds, finished: {}",
        metronome.ticks,
        world.current_level,
        audio.played.len(),
        world.finished
    );
    ExitCode::SUCCESS
}

/// Walk right and hop periodically. Not a solver; it exercises input
/// edges, physics, death and respawn.
fn scripted_input(ticks: u64) -> TickInput {
    TickInput {
        mouse_pos: IVec2::ZERO,
        mouse_down: false,
        left: false,
        right: ticks > 30,
        jump: ticks > 30 && ticks % 90 < 12,
        reset: false,
    }
}
