//! Player state and hitbox

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Boundary sample points of the player's 8x11 px body, relative to its
/// position. Corner points suffice: the body is smaller than one tile on
/// both axes, so any solid tile reaching the body reaches a corner.
pub const PLAYER_HITBOX: [IVec2; 4] = [
    IVec2::new(-4, -3),
    IVec2::new(3, -3),
    IVec2::new(-4, 7),
    IVec2::new(3, 7),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Player {
    pub exists: bool,
    pub exists_prev: bool,

    /// World position in whole pixels
    pub pos: IVec2,
    /// Velocity in pixels per tick
    pub vel: Vec2,
    /// Sub-pixel remainder carried between ticks
    pub vel_comp: Vec2,

    pub on_ground: bool,
    pub on_ground_prev: bool,
    pub facing_left: bool,
    /// Consecutive ticks with horizontal displacement; walk animation only
    pub movement_timer: i32,
    pub holding_jump: bool,

    /// Ticks since existence was cleared; gates respawn/level advance
    pub death_timer: i32,
}

/// Round a float velocity plus carried remainder into a whole-pixel step
/// and the next remainder. The remainder is decayed slightly so repeated
/// rounding cannot accumulate drift.
pub fn split_velocity(vel: Vec2, comp: Vec2, decay: f32) -> (IVec2, Vec2) {
    let with_comp = vel + comp;
    let int_step = with_comp.round().as_ivec2();
    let remainder = (with_comp - int_step.as_vec2()) * decay;
    (int_step, remainder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::VEL_COMP_DECAY;
    use proptest::prelude::*;

    #[test]
    fn split_rounds_to_nearest() {
        let (step, rem) = split_velocity(Vec2::new(1.6, -0.4), Vec2::ZERO, 1.0);
        assert_eq!(step, IVec2::new(2, 0));
        assert!((rem.x - (-0.4)).abs() < 1e-6);
        assert!((rem.y - (-0.4)).abs() < 1e-6);
    }

    proptest! {
        /// Integrating a constant velocity for N ticks lands within one
        /// pixel of the ideal rounded displacement on each axis.
        #[test]
        fn constant_velocity_drift_is_bounded(
            vx in -4.0f32..4.0,
            vy in -4.0f32..4.0,
            ticks in 1usize..400,
        ) {
            let vel = Vec2::new(vx, vy);
            let mut comp = Vec2::ZERO;
            let mut total = IVec2::ZERO;
            for _ in 0..ticks {
                let (step, rem) = split_velocity(vel, comp, VEL_COMP_DECAY);
                total += step;
                comp = rem;
            }
            let ideal = (vel * ticks as f32).round().as_ivec2();
            prop_assert!((total.x - ideal.x).abs() <= 1);
            prop_assert!((total.y - ideal.y).abs() <= 1);
        }

        /// The carried remainder never grows past half a pixel (plus decay).
        #[test]
        fn remainder_stays_sub_pixel(
            vx in -4.0f32..4.0,
            ticks in 1usize..100,
        ) {
            let vel = Vec2::new(vx, 0.0);
            let mut comp = Vec2::ZERO;
            for _ in 0..ticks {
                let (_, rem) = split_velocity(vel, comp, VEL_COMP_DECAY);
                comp = rem;
                prop_assert!(comp.x.abs() <= 0.5);
            }
        }
    }
}
