//! World state and level lifecycle
//!
//! Everything the simulation mutates lives here, owned by one
//! `WorldState` with a single mutation path (`tick`). Level loading
//! validates static content up front; the entity spawner resolves marker
//! tiles into world positions and re-runs while a spawn-carrying frame is
//! dragged before gameplay starts.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::frame::{EntityRole, Frame};
use super::level::{LEVELS, LevelError, validate_levels};
use super::particle::Particle;
use super::player::Player;
use crate::consts::*;

/// One key or mouse button, with the previous tick's state so the sim
/// can derive press/release edges without an event queue
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Button {
    pub is_down: bool,
    pub is_down_prev: bool,
}

impl Button {
    pub fn update(&mut self, down: bool) {
        self.is_down_prev = self.is_down;
        self.is_down = down;
    }

    pub fn pressed(&self) -> bool {
        self.is_down && !self.is_down_prev
    }

    pub fn released(&self) -> bool {
        !self.is_down && self.is_down_prev
    }
}

/// Input snapshot with derived edges, refreshed once at tick start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputState {
    /// Mouse position in world pixels (screen centered on 0)
    pub mouse_pos: IVec2,
    pub mouse: Button,
    pub left: Button,
    pub right: Button,
    pub jump: Button,
    pub reset: Button,
}

/// Tutorial hint latches and visibility timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tutorial {
    pub explaining_drag: bool,
    pub explaining_move: bool,
    pub explaining_reset: bool,

    /// Visibility timers in 0..1, eased in the render pass
    pub drag_timer: f32,
    pub move_timer: f32,
    pub reset_timer: f32,

    /// Latch gating the move hint: only shown after a first drag
    pub dragged_at_least_once: bool,
}

impl Default for Tutorial {
    fn default() -> Self {
        Self {
            explaining_drag: true,
            explaining_move: true,
            explaining_reset: true,
            drag_timer: 0.0,
            move_timer: 0.0,
            reset_timer: 0.0,
            dragged_at_least_once: false,
        }
    }
}

/// Seeded RNG with the distribution helpers the particle recipes use
#[derive(Debug, Clone)]
pub struct WorldRng(Pcg32);

impl WorldRng {
    pub fn new(seed: u64) -> Self {
        Self(Pcg32::seed_from_u64(seed))
    }

    /// -1.0 or 1.0
    pub fn sign(&mut self) -> f32 {
        if self.0.random::<bool>() { 1.0 } else { -1.0 }
    }

    /// Uniform in [0, 1)
    pub fn unit(&mut self) -> f32 {
        self.0.random_range(0.0..1.0)
    }

    /// Uniform in [-1, 1)
    pub fn symmetric(&mut self) -> f32 {
        self.0.random_range(-1.0..1.0)
    }

    /// Uniform angle in [-pi, pi)
    pub fn angle(&mut self) -> f32 {
        self.0
            .random_range(-std::f32::consts::PI..std::f32::consts::PI)
    }
}

impl Default for WorldRng {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Complete simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    /// Run seed for reproducibility
    pub seed: u64,
    #[serde(skip)]
    pub rng: WorldRng,

    pub input: InputState,

    /// Ordered frame stack; later = higher render/collision priority
    pub frames: Vec<Frame>,
    pub current_level: usize,

    pub player: Player,

    /// Highest stack index whose AABB overlaps the player's hitbox this
    /// tick; `None` when the player touches nothing
    pub topmost_touched: Option<usize>,

    /// Latched on the first horizontal input or jump of a level
    pub movement_started: bool,
    /// Ticks spent in movement since construction; drives background scroll
    pub background_timer: i32,
    /// Tick counter that runs only during movement; sprite animation only
    pub movement_ticks: i32,

    /// Full-screen overlay alpha, ramped toward 1 while winning
    pub fade: f32,
    pub winning_fade_out: bool,

    /// Set after the final level is completed; the embedder stops ticking
    pub finished: bool,

    #[serde(skip)]
    pub particles: Vec<Particle>,

    pub reset_button_pos: IVec2,
    pub reset_button_size: IVec2,
    pub reset_button_hovered: bool,
    pub reset_button_vis: f32,

    pub tutorial: Tutorial,
}

impl WorldState {
    /// Build the world and load the first level. All authored levels are
    /// validated here so content bugs surface before the first tick.
    pub fn new(seed: u64) -> Result<Self, LevelError> {
        validate_levels()?;

        let reset_button_size = IVec2::splat(32);
        let mut world = Self {
            seed,
            rng: WorldRng::new(seed),
            input: InputState::default(),
            frames: Vec::new(),
            current_level: 0,
            player: Player::default(),
            topmost_touched: None,
            movement_started: false,
            background_timer: 0,
            movement_ticks: 0,
            fade: 1.0,
            winning_fade_out: false,
            finished: false,
            particles: Vec::new(),
            reset_button_pos: SCREEN_SIZE / 2 - reset_button_size,
            reset_button_size,
            reset_button_hovered: false,
            reset_button_vis: 0.0,
            tutorial: Tutorial::default(),
        };
        world.load_level(0)?;
        Ok(world)
    }

    /// Replace the frame stack with a level's initial placements and
    /// spawn its entities
    pub fn load_level(&mut self, index: usize) -> Result<(), LevelError> {
        let def = &LEVELS[index];
        self.current_level = index;
        self.frames = def
            .frames
            .iter()
            .map(|p| Frame::new(p.type_id, p.pos, p.roles))
            .collect();

        self.movement_started = false;
        self.player = Player::default();
        self.particles.clear();

        for i in 0..self.frames.len() {
            self.resolve_frame_markers(i)?;
            self.apply_frame_entities(i);
        }

        self.fade = 1.0;
        self.winning_fade_out = false;

        log::info!("loaded level {index}");
        Ok(())
    }

    /// Respawn in place: reset the player and frame-carried entities
    /// without touching frame positions or stack order
    pub fn restart_level(&mut self) {
        self.movement_started = false;
        self.player = Player::default();
        for i in 0..self.frames.len() {
            self.apply_frame_entities(i);
        }
    }

    /// Scan a frame's template for its role markers and record their
    /// offsets. No-op once resolved; offsets are relative to the frame
    /// position so they survive drags.
    pub(crate) fn resolve_frame_markers(&mut self, index: usize) -> Result<(), LevelError> {
        let frame = &mut self.frames[index];
        if frame.spawned || frame.roles.is_empty() {
            return Ok(());
        }

        let ty = frame.ty();
        for (k, role) in frame.roles.iter().enumerate() {
            let marker = b'1' + k as u8;
            let Some(coord) = ty.find_marker(marker) else {
                return Err(LevelError::MissingMarker {
                    level: self.current_level,
                    frame: index,
                    role: *role,
                    marker: marker as char,
                });
            };
            let offset = ty.top_left(frame.pos) + coord * TILE_SIZE + TILE_SIZE / 2 - frame.pos;
            frame.spawn_offsets.push(offset);
        }
        frame.spawned = true;
        Ok(())
    }

    /// Apply a frame's resolved roles: position the player, restore the
    /// exit, refill keys. Re-invoked while the frame is dragged before
    /// gameplay starts so spawn points track the drag live.
    pub fn apply_frame_entities(&mut self, index: usize) {
        let frame = &self.frames[index];
        if !frame.spawned {
            return;
        }

        let mut player_pos = None;
        let mut exit = None;
        let mut keys = Vec::new();
        for (role, offset) in frame.roles.iter().zip(&frame.spawn_offsets) {
            match role {
                EntityRole::Player => player_pos = Some(frame.pos + *offset),
                EntityRole::Exit => exit = Some(*offset),
                EntityRole::Key => keys.push(*offset),
            }
        }

        let frame = &mut self.frames[index];
        frame.exit_offset = exit;
        frame.key_offsets = keys;
        if let Some(pos) = player_pos {
            self.player.exists = true;
            self.player.pos = pos;
        }
    }

    /// Uncollected keys across the whole frame stack; the exit opens
    /// only at zero
    pub fn keys_remaining(&self) -> usize {
        self.frames.iter().map(|f| f.key_offsets.len()).sum()
    }

    /// World position of the first open exit, if any
    pub fn exit_world_pos(&self) -> Option<IVec2> {
        self.frames
            .iter()
            .find_map(|f| f.exit_offset.map(|off| f.pos + off))
    }
}
