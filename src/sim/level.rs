//! Static level-authoring data and load-time validation
//!
//! Frame templates live in a program-lifetime registry referenced by a
//! stable index, so mutable `Frame` instances never hold references into
//! the templates. Authoring mistakes (a role with no marker tile) are
//! content bugs and surface once, at load, as `LevelError`.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::frame::{EntityRole, FrameType};

/// Stable handle into [`FRAME_TYPES`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameTypeId(pub usize);

pub const FLOWER_ISLAND: FrameTypeId = FrameTypeId(0);
pub const VORTEX: FrameTypeId = FrameTypeId(1);
pub const KEY_LOFT: FrameTypeId = FrameTypeId(2);
pub const PILLAR: FrameTypeId = FrameTypeId(3);
pub const VAULT: FrameTypeId = FrameTypeId(4);
pub const LONG_LEDGE: FrameTypeId = FrameTypeId(5);

/// Program-lifetime frame template registry
pub const FRAME_TYPES: &[FrameType] = &[
    // FLOWER_ISLAND
    FrameType {
        tex_pos: IVec2::new(0, 0),
        tiles: &[
            "-----", //
            "-----", //
            "-----", //
            "--1--", //
            "-###-", //
            "-----", //
        ],
    },
    // VORTEX
    FrameType {
        tex_pos: IVec2::new(5, 0),
        tiles: &[
            "-----", //
            "-----", //
            "--1--", //
            "-###-", //
        ],
    },
    // KEY_LOFT
    FrameType {
        tex_pos: IVec2::new(10, 0),
        tiles: &[
            "------", //
            "--1---", //
            "-###--", //
            "------", //
        ],
    },
    // PILLAR
    FrameType {
        tex_pos: IVec2::new(16, 0),
        tiles: &[
            "---", //
            "-#-", //
            "-#-", //
            "-#-", //
            "---", //
        ],
    },
    // VAULT
    FrameType {
        tex_pos: IVec2::new(19, 0),
        tiles: &[
            "------", //
            "---2--", //
            "--##--", //
            "-1----", //
            "###---", //
        ],
    },
    // LONG_LEDGE
    FrameType {
        tex_pos: IVec2::new(25, 0),
        tiles: &[
            "-------", //
            "-------", //
            "-#####-", //
        ],
    },
];

pub fn frame_type(id: FrameTypeId) -> &'static FrameType {
    &FRAME_TYPES[id.0]
}

/// Initial placement of one frame within a level
#[derive(Debug)]
pub struct FramePlacement {
    pub type_id: FrameTypeId,
    pub pos: IVec2,
    pub roles: &'static [EntityRole],
}

/// One authored level: a background, its scroll direction, and the
/// initial frame stack from bottom to top
#[derive(Debug)]
pub struct LevelDef {
    pub background: i32,
    /// Horizontal background scroll direction, -1 or 1
    pub scroll_dir: i32,
    pub frames: &'static [FramePlacement],
}

pub const LEVELS: &[LevelDef] = &[
    LevelDef {
        background: 0,
        scroll_dir: 1,
        frames: &[
            FramePlacement {
                type_id: FLOWER_ISLAND,
                pos: IVec2::new(-50, 20),
                roles: &[EntityRole::Player],
            },
            FramePlacement {
                type_id: VORTEX,
                pos: IVec2::new(70, -20),
                roles: &[EntityRole::Exit],
            },
        ],
    },
    LevelDef {
        background: 1,
        scroll_dir: -1,
        frames: &[
            FramePlacement {
                type_id: FLOWER_ISLAND,
                pos: IVec2::new(-70, 40),
                roles: &[EntityRole::Player],
            },
            FramePlacement {
                type_id: KEY_LOFT,
                pos: IVec2::new(0, -40),
                roles: &[EntityRole::Key],
            },
            FramePlacement {
                type_id: VORTEX,
                pos: IVec2::new(90, 10),
                roles: &[EntityRole::Exit],
            },
        ],
    },
    LevelDef {
        background: 0,
        scroll_dir: 1,
        frames: &[
            FramePlacement {
                type_id: FLOWER_ISLAND,
                pos: IVec2::new(-80, 50),
                roles: &[EntityRole::Player],
            },
            FramePlacement {
                type_id: LONG_LEDGE,
                pos: IVec2::new(0, 70),
                roles: &[],
            },
            FramePlacement {
                type_id: PILLAR,
                pos: IVec2::new(30, 0),
                roles: &[],
            },
            FramePlacement {
                type_id: VAULT,
                pos: IVec2::new(80, -30),
                roles: &[EntityRole::Exit, EntityRole::Key],
            },
        ],
    },
    LevelDef {
        background: 1,
        scroll_dir: -1,
        frames: &[
            FramePlacement {
                type_id: FLOWER_ISLAND,
                pos: IVec2::new(-60, 60),
                roles: &[EntityRole::Player],
            },
            FramePlacement {
                type_id: KEY_LOFT,
                pos: IVec2::new(-20, -50),
                roles: &[EntityRole::Key],
            },
            FramePlacement {
                type_id: KEY_LOFT,
                pos: IVec2::new(60, -60),
                roles: &[EntityRole::Key],
            },
            FramePlacement {
                type_id: LONG_LEDGE,
                pos: IVec2::new(20, 40),
                roles: &[],
            },
            FramePlacement {
                type_id: VORTEX,
                pos: IVec2::new(100, 30),
                roles: &[EntityRole::Exit],
            },
        ],
    },
];

/// Malformed static level data. Fatal at load time, never mid-tick.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    /// A frame declares an entity role with no matching numbered marker
    /// tile in its template
    #[error("level {level}, frame {frame}: role {role:?} has no '{marker}' marker tile")]
    MissingMarker {
        level: usize,
        frame: usize,
        role: EntityRole,
        marker: char,
    },
}

/// Check one placement's roles against its template's marker tiles
pub fn validate_placement(
    level: usize,
    frame: usize,
    placement: &FramePlacement,
) -> Result<(), LevelError> {
    let ty = frame_type(placement.type_id);
    for (k, role) in placement.roles.iter().enumerate() {
        let marker = b'1' + k as u8;
        if ty.find_marker(marker).is_none() {
            return Err(LevelError::MissingMarker {
                level,
                frame,
                role: *role,
                marker: marker as char,
            });
        }
    }
    Ok(())
}

/// Validate every authored level up front, so a marker cannot go missing
/// when a later level is loaded mid-run
pub fn validate_levels() -> Result<(), LevelError> {
    for (li, level) in LEVELS.iter().enumerate() {
        for (fi, placement) in level.frames.iter().enumerate() {
            validate_placement(li, fi, placement)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authored_levels_are_valid() {
        validate_levels().unwrap();
    }

    #[test]
    fn missing_marker_is_reported() {
        // LONG_LEDGE has no markers at all, so any role must fail.
        let placement = FramePlacement {
            type_id: LONG_LEDGE,
            pos: IVec2::ZERO,
            roles: &[EntityRole::Player],
        };
        assert_eq!(
            validate_placement(0, 0, &placement),
            Err(LevelError::MissingMarker {
                level: 0,
                frame: 0,
                role: EntityRole::Player,
                marker: '1',
            })
        );
    }

    #[test]
    fn second_role_needs_second_marker() {
        // VORTEX only carries marker '1'.
        let placement = FramePlacement {
            type_id: VORTEX,
            pos: IVec2::ZERO,
            roles: &[EntityRole::Exit, EntityRole::Key],
        };
        let err = validate_placement(2, 1, &placement).unwrap_err();
        assert_eq!(
            err,
            LevelError::MissingMarker {
                level: 2,
                frame: 1,
                role: EntityRole::Key,
                marker: '2',
            }
        );
    }

    #[test]
    fn every_template_has_rectangular_rows() {
        for ty in FRAME_TYPES {
            let width = ty.tiles[0].len();
            assert!(ty.tiles.iter().all(|row| row.len() == width));
        }
    }
}
