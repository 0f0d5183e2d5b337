//! Frames: draggable tile-grid puzzle pieces
//!
//! A `FrameType` is an immutable tile-bitmap template; a `Frame` is one
//! placed, draggable instance of it. Collision against a frame is pixel
//! precise: a world pixel maps to a tile by integer division, and `#`
//! tiles are solid.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::level::{FrameTypeId, frame_type};
use crate::consts::TILE_SIZE;
use crate::pixel_in_rect;

pub const TILE_SOLID: u8 = b'#';
pub const TILE_EMPTY: u8 = b'-';

/// Immutable tile-bitmap template, defined once as static level data
#[derive(Debug)]
pub struct FrameType {
    /// Source tile offset in the texture atlas, measured in tiles
    pub tex_pos: IVec2,
    /// Row-major tile rows; every row has the same length.
    /// `#` solid, `-` empty, `1`..`9` entity markers.
    pub tiles: &'static [&'static str],
}

impl FrameType {
    /// Grid dimensions in tiles
    pub fn tile_size(&self) -> IVec2 {
        if self.tiles.is_empty() {
            return IVec2::ZERO;
        }
        IVec2::new(self.tiles[0].len() as i32, self.tiles.len() as i32)
    }

    /// Grid dimensions in pixels
    pub fn pixel_size(&self) -> IVec2 {
        self.tile_size() * TILE_SIZE
    }

    /// Top-left corner of a placement centered at `pos`
    pub fn top_left(&self, pos: IVec2) -> IVec2 {
        pos - self.pixel_size() / 2
    }

    /// Raw tile character at an in-bounds tile coordinate
    pub fn tile_at(&self, coord: IVec2) -> u8 {
        self.tiles[coord.y as usize].as_bytes()[coord.x as usize]
    }

    /// Tile coordinate of the first occurrence of `marker`, scanning in
    /// row-major order
    pub fn find_marker(&self, marker: u8) -> Option<IVec2> {
        for (y, row) in self.tiles.iter().enumerate() {
            if let Some(x) = row.bytes().position(|b| b == marker) {
                return Some(IVec2::new(x as i32, y as i32));
            }
        }
        None
    }
}

/// Entity roles a frame assigns to its numbered marker tiles, in order:
/// the first role binds to marker `1`, the second to `2`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRole {
    Player,
    Exit,
    Key,
}

/// Tri-state result of a pixel solidity query against one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelQuery {
    OutsideAabb,
    Empty,
    Solid,
}

/// One placed, draggable instance of a `FrameType`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub type_id: FrameTypeId,

    /// Center position in world pixels
    pub pos: IVec2,

    /// Entity roles assigned to markers `1`, `2`, ... in order
    pub roles: Vec<EntityRole>,

    pub hovered: bool,
    /// Damped hover animation scalar; drives the shadow offset only
    pub hover_time: f32,

    pub dragged: bool,
    /// Frame position relative to the mouse at drag start, so the frame
    /// tracks the cursor without snapping
    pub drag_offset: IVec2,

    /// True once marker tiles were resolved into `spawn_offsets`
    pub spawned: bool,
    /// Resolved marker positions relative to `pos`, one per role
    pub spawn_offsets: Vec<IVec2>,

    pub aabb_overlaps_player: bool,
    /// Collisions and interactions are ignored while the player is
    /// tucked under this frame
    pub player_is_under: bool,

    /// Exit position relative to `pos`, while the exit is still open
    pub exit_offset: Option<IVec2>,
    /// Uncollected key positions relative to `pos`
    pub key_offsets: Vec<IVec2>,
}

impl Frame {
    pub fn new(type_id: FrameTypeId, pos: IVec2, roles: &[EntityRole]) -> Self {
        Self {
            type_id,
            pos,
            roles: roles.to_vec(),
            hovered: false,
            hover_time: 0.0,
            dragged: false,
            drag_offset: IVec2::ZERO,
            spawned: false,
            spawn_offsets: Vec::new(),
            aabb_overlaps_player: false,
            player_is_under: false,
            exit_offset: None,
            key_offsets: Vec::new(),
        }
    }

    pub fn ty(&self) -> &'static FrameType {
        frame_type(self.type_id)
    }

    pub fn top_left(&self) -> IVec2 {
        self.ty().top_left(self.pos)
    }

    pub fn pixel_size(&self) -> IVec2 {
        self.ty().pixel_size()
    }

    /// AABB containment for a world pixel, half-open on the far edges
    pub fn world_pixel_in_rect(&self, pixel: IVec2) -> bool {
        let a = self.top_left();
        pixel_in_rect(pixel, a, a + self.pixel_size())
    }

    /// Tile-precise solidity at a world pixel.
    ///
    /// The AABB check and the tile index math must agree; an index that
    /// escapes the grid after a positive bounds check is a logic defect,
    /// never clamped.
    pub fn query_world_pixel(&self, pixel: IVec2) -> PixelQuery {
        if !self.world_pixel_in_rect(pixel) {
            return PixelQuery::OutsideAabb;
        }

        let ty = self.ty();
        let coord = (pixel - self.top_left()) / TILE_SIZE;
        let n = ty.tile_size();
        assert!(
            coord.x >= 0 && coord.y >= 0 && coord.x < n.x && coord.y < n.y,
            "tile coord {coord} escaped {n} grid after a positive bounds check"
        );

        if ty.tile_at(coord) == TILE_SOLID {
            PixelQuery::Solid
        } else {
            PixelQuery::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level;

    fn island_at(pos: IVec2) -> Frame {
        Frame::new(level::FLOWER_ISLAND, pos, &[])
    }

    #[test]
    fn aabb_is_half_open() {
        // 5x6 tile template = 80x96 px; centered at origin the AABB is
        // [-40, 40) x [-48, 48).
        let frame = island_at(IVec2::ZERO);
        assert!(frame.world_pixel_in_rect(IVec2::new(-40, -48)));
        assert!(frame.world_pixel_in_rect(IVec2::new(39, 47)));
        assert!(!frame.world_pixel_in_rect(IVec2::new(40, 0)));
        assert!(!frame.world_pixel_in_rect(IVec2::new(0, 48)));
    }

    #[test]
    fn query_is_tri_state() {
        let frame = island_at(IVec2::ZERO);
        // Far outside the AABB.
        assert_eq!(
            frame.query_world_pixel(IVec2::new(200, 0)),
            PixelQuery::OutsideAabb
        );
        // Row 4 (`-###-`) is solid in columns 1..4: world y in [16, 32).
        assert_eq!(
            frame.query_world_pixel(IVec2::new(0, 20)),
            PixelQuery::Solid
        );
        // Column 0 of the same row is empty.
        assert_eq!(
            frame.query_world_pixel(IVec2::new(-35, 20)),
            PixelQuery::Empty
        );
        // The marker tile is not solid.
        assert_eq!(
            frame.query_world_pixel(IVec2::new(0, 10)),
            PixelQuery::Empty
        );
    }

    #[test]
    fn query_tracks_frame_position() {
        let at_origin = island_at(IVec2::ZERO);
        let moved = island_at(IVec2::new(100, -50));
        assert_eq!(
            at_origin.query_world_pixel(IVec2::new(0, 20)),
            moved.query_world_pixel(IVec2::new(100, -30)),
        );
    }

    #[test]
    fn marker_scan_is_row_major_first_hit() {
        let ty = frame_type(level::FLOWER_ISLAND);
        assert_eq!(ty.find_marker(b'1'), Some(IVec2::new(2, 3)));
        assert_eq!(ty.find_marker(b'9'), None);
    }
}
