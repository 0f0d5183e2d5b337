//! Boundary traits between the simulation core and its backends
//!
//! The core issues abstract draw calls in back-to-front order and
//! fire-and-forget sounds; the embedder supplies the actual GPU and audio
//! implementations. Nothing here blocks or returns data into the sim.

use glam::{IVec2, Vec2, Vec4};

/// Named sound effects dispatched by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    /// First horizontal input of a level
    StartMoving,
    Jump,
    Landing,
    KeyPickup,
    Win,
    Death,
    Respawn,
}

/// Fill source for a rectangle draw call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    /// Source rect top-left in the texture atlas, with an alpha multiplier
    /// and optional horizontal mirroring
    Atlas {
        tex_pos: IVec2,
        alpha: f32,
        flip_x: bool,
    },
    Color(Vec4),
}

impl Fill {
    pub fn atlas(tex_pos: IVec2) -> Self {
        Self::Atlas {
            tex_pos,
            alpha: 1.0,
            flip_x: false,
        }
    }

    pub fn atlas_alpha(tex_pos: IVec2, alpha: f32) -> Self {
        Self::Atlas {
            tex_pos,
            alpha,
            flip_x: false,
        }
    }
}

/// Draw call consumer. Calls are issued back to front within one frame.
pub trait RenderSink {
    /// Filled rectangle with top-left `pos`
    fn draw_rect(&mut self, pos: IVec2, size: IVec2, fill: Fill);
    /// Rectangle outline of the given border width, drawn inward
    fn draw_rect_hollow(&mut self, pos: IVec2, size: IVec2, border: i32, color: Vec4);
    /// Filled rectangle given two absolute corners
    fn draw_rect_abs(&mut self, a: IVec2, b: IVec2, color: Vec4);
}

/// Sound consumer. Fire and forget; the backend attenuates volume by
/// distance from its listener.
pub trait AudioSink {
    fn play(&mut self, sound: Sound, pos: Vec2, volume: f32, pitch_offset: f32);
}

/// Audio sink that discards everything
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _sound: Sound, _pos: Vec2, _volume: f32, _pitch_offset: f32) {}
}

/// Records dispatched sounds; used by tests and the headless demo
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub played: Vec<(Sound, Vec2)>,
}

impl RecordingAudio {
    pub fn count(&self, sound: Sound) -> usize {
        self.played.iter().filter(|(s, _)| *s == sound).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, sound: Sound, pos: Vec2, _volume: f32, _pitch_offset: f32) {
        self.played.push((sound, pos));
    }
}

/// Records draw calls; used by render tests
#[derive(Debug, Default)]
pub struct RecordingRender {
    pub rects: Vec<(IVec2, IVec2)>,
    pub hollow_rects: Vec<(IVec2, IVec2)>,
    pub abs_rects: Vec<(IVec2, IVec2)>,
}

impl RenderSink for RecordingRender {
    fn draw_rect(&mut self, pos: IVec2, size: IVec2, _fill: Fill) {
        self.rects.push((pos, size));
    }

    fn draw_rect_hollow(&mut self, pos: IVec2, size: IVec2, _border: i32, _color: Vec4) {
        self.hollow_rects.push((pos, size));
    }

    fn draw_rect_abs(&mut self, a: IVec2, b: IVec2, _color: Vec4) {
        self.abs_rects.push((a, b));
    }
}
