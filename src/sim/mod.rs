//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable frame stack order (later = higher priority)
//! - No rendering or platform dependencies beyond the sink traits

pub mod frame;
pub mod level;
pub mod particle;
pub mod player;
pub mod state;
pub mod tick;

pub use frame::{EntityRole, Frame, FrameType, PixelQuery};
pub use level::{FrameTypeId, LevelDef, LevelError, frame_type, validate_levels, FRAME_TYPES, LEVELS};
pub use particle::Particle;
pub use player::{Player, PLAYER_HITBOX};
pub use state::{Button, InputState, Tutorial, WorldRng, WorldState};
pub use tick::{TickInput, tick};
