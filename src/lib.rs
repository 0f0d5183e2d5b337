//! Frameshift - a drag-the-world puzzle platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (frame stack, collision, player physics)
//! - `render`: Back-to-front draw call emission against an abstract sink
//! - `sink`: Boundary traits implemented by the rendering/audio backends
//! - `metronome`: Fixed timestep accumulator decoupling sim rate from render rate

pub mod metronome;
pub mod render;
pub mod sim;
pub mod sink;

pub use metronome::Metronome;
pub use sink::{AudioSink, Fill, RenderSink, Sound};

use glam::IVec2;

/// Game configuration constants
pub mod consts {
    use glam::IVec2;

    /// Fixed simulation rate in ticks per second
    pub const TICK_RATE: f64 = 60.0;
    /// Maximum ticks consumed per rendered frame to prevent spiral of death
    pub const MAX_TICKS_PER_FRAME: u32 = 8;

    /// Side length of one tile in world pixels
    pub const TILE_SIZE: i32 = 16;
    /// Logical screen size in world pixels; world coordinates are centered on 0
    pub const SCREEN_SIZE: IVec2 = IVec2::new(480, 270);

    /// A dragged frame keeps at least this margin inside the screen
    pub const DRAG_MARGIN: i32 = 8;

    /// Player walk/physics tuning, in pixels per tick
    pub const WALK_SPEED: f32 = 1.5;
    pub const WALK_ACC: f32 = 0.4;
    pub const WALK_DEC: f32 = 0.4;
    pub const GRAVITY: f32 = 0.14;
    /// Stronger gravity selected once the jump key is released mid-rise
    pub const GRAVITY_LOW_JUMP: f32 = 0.24;
    pub const MAX_FALL_SPEED: f32 = 4.0;
    pub const JUMP_SPEED: f32 = -3.0;
    /// Sub-pixel remainder decay per tick, bounds drift accumulation
    pub const VEL_COMP_DECAY: f32 = 0.98;

    /// Ticks from death/win until respawn/level advance
    pub const DEATH_TIMER_TICKS: i32 = 45;
    /// Full-screen fade speed per tick
    pub const FADE_STEP: f32 = 0.03;
    /// Frame hover shadow animation speed and caps
    pub const HOVER_STEP: f32 = 0.15;
    pub const HOVER_CAP: f32 = 1.0;
    pub const HOVER_CAP_DRAGGED: f32 = 1.7;
    /// Tutorial hint fade speed per tick
    pub const TUTORIAL_STEP: f32 = 0.005;
    /// Reset button visibility fade speed per tick
    pub const RESET_VIS_STEP: f32 = 0.05;

    /// Half-extent of the exit and key pickup regions
    pub const PICKUP_HALF_EXTENT: i32 = 5;
}

/// Half-open AABB test: `a` inclusive top-left, `b` exclusive bottom-right
#[inline]
pub fn pixel_in_rect(p: IVec2, a: IVec2, b: IVec2) -> bool {
    p.x >= a.x && p.y >= a.y && p.x < b.x && p.y < b.y
}
