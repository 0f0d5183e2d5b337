//! Cosmetic particles
//!
//! Short-lived kinematic decorations spawned by gameplay events. They
//! never feed back into the simulation.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Constant acceleration per tick
    pub acc: Vec2,
    /// Exponential velocity damping per tick
    pub damp: f32,
    pub color: Vec4,
    pub max_size: f32,
    pub total_life: i32,
    pub remaining_life: i32,
}

impl Particle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: Vec2,
        vel: Vec2,
        acc: Vec2,
        damp: f32,
        color: Vec4,
        max_size: f32,
        life: i32,
    ) -> Self {
        Self {
            pos,
            vel,
            acc,
            damp,
            color,
            max_size,
            total_life: life,
            remaining_life: life,
        }
    }

    /// Rendered size shrinks linearly with remaining life
    pub fn size(&self) -> i32 {
        (self.max_size * self.remaining_life as f32 / self.total_life as f32).round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_shrinks_with_life() {
        let mut p = Particle::new(
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ZERO,
            0.01,
            Vec4::ONE,
            4.0,
            10,
        );
        assert_eq!(p.size(), 4);
        p.remaining_life = 5;
        assert_eq!(p.size(), 2);
        p.remaining_life = 0;
        assert_eq!(p.size(), 0);
    }
}
