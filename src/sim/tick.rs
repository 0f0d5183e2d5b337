//! Fixed timestep simulation tick
//!
//! Core game loop that advances the world deterministically. Input is
//! sampled once at tick start; press/release edges come from the
//! previous tick's snapshot. Pipeline order matters and is fixed:
//! particles, reset button, hover, drag, overlap flags, entity
//! interactions, player physics, death/respawn bookkeeping, cosmetics.

use glam::{IVec2, Vec2, Vec4};

use super::frame::{EntityRole, PixelQuery};
use super::level::LEVELS;
use super::particle::Particle;
use super::player::{PLAYER_HITBOX, split_velocity};
use super::state::WorldState;
use crate::consts::*;
use crate::pixel_in_rect;
use crate::sink::{AudioSink, Sound};

/// Raw input snapshot for a single tick. The source does not need to
/// debounce; edges are derived inside the tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Mouse position in world pixels (screen centered on 0)
    pub mouse_pos: IVec2,
    pub mouse_down: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub reset: bool,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut WorldState, input: &TickInput, audio: &mut dyn AudioSink) {
    world.input.mouse_pos = input.mouse_pos;
    world.input.mouse.update(input.mouse_down);
    world.input.left.update(input.left);
    world.input.right.update(input.right);
    world.input.jump.update(input.jump);
    world.input.reset.update(input.reset);

    update_particles(world);
    update_reset_button(world);

    let hovered = resolve_hover(world);
    update_hover_timers(world);
    update_drag(world, hovered);

    refresh_overlap_flags(world);
    entity_interactions(world, audio);
    update_player(world, audio);
    death_and_respawn(world, audio);

    update_fade(world);
    update_tutorial(world);
    update_counters(world);
}

fn update_particles(world: &mut WorldState) {
    world.particles.retain(|p| p.remaining_life > 0);
    for p in &mut world.particles {
        p.vel += p.acc;
        p.pos += p.vel;
        p.vel *= 1.0 - p.damp;
        p.remaining_life -= 1;
    }
}

fn update_reset_button(world: &mut WorldState) {
    if world.movement_started {
        world.reset_button_vis = (world.reset_button_vis + RESET_VIS_STEP).min(1.0);

        let a = world.reset_button_pos;
        world.reset_button_hovered =
            pixel_in_rect(world.input.mouse_pos, a, a + world.reset_button_size);

        if (world.reset_button_hovered && world.input.mouse.pressed())
            || world.input.reset.pressed()
        {
            // Killing the player triggers the restart path.
            world.player.exists = false;
        }
    } else {
        world.reset_button_vis = (world.reset_button_vis - RESET_VIS_STEP).max(0.0);
        world.reset_button_hovered = false;
    }
}

/// Scan the stack top to bottom; the first frame under the mouse (or the
/// frame already being dragged) is hovered, everything else is not. No
/// hover once movement started, and none while the reset button has the
/// cursor.
fn resolve_hover(world: &mut WorldState) -> Option<usize> {
    let mut hovered = None;
    for i in (0..world.frames.len()).rev() {
        let frame = &mut world.frames[i];
        let eligible = hovered.is_none()
            && !world.movement_started
            && (frame.dragged
                || (!world.reset_button_hovered
                    && frame.world_pixel_in_rect(world.input.mouse_pos)));
        frame.hovered = eligible;
        if eligible {
            hovered = Some(i);
        }
    }
    hovered
}

/// Hover time ramps toward a per-state cap; purely cosmetic (shadow offset)
fn update_hover_timers(world: &mut WorldState) {
    for frame in &mut world.frames {
        if frame.hovered {
            let cap = if frame.dragged {
                HOVER_CAP_DRAGGED
            } else {
                HOVER_CAP
            };
            if frame.hover_time < cap {
                frame.hover_time = (frame.hover_time + HOVER_STEP).min(cap);
            } else if frame.hover_time > cap {
                frame.hover_time = (frame.hover_time - HOVER_STEP).max(cap);
            }
        } else {
            frame.hover_time = (frame.hover_time - HOVER_STEP).max(0.0);
        }
    }
}

fn update_drag(world: &mut WorldState, hovered: Option<usize>) {
    let mut any_dragged = world.frames.iter().any(|f| f.dragged);

    // Start: promote the hovered frame to the top of the stack.
    if world.input.mouse.pressed() && !world.winning_fade_out {
        if let Some(i) = hovered {
            if !world.frames[i].dragged {
                let frame = world.frames.remove(i);
                world.frames.push(frame);

                let mouse_pos = world.input.mouse_pos;
                let top = world.frames.len() - 1;
                let frame = &mut world.frames[top];
                frame.dragged = true;
                frame.drag_offset = frame.pos - mouse_pos;

                world.tutorial.dragged_at_least_once = true;
                any_dragged = true;
            }
        }
    }

    // Finish: mouse release, the win fade, or gameplay underway all end
    // the drag. Only the topmost frame can be dragged.
    if any_dragged
        && (!world.input.mouse.is_down
            || world.winning_fade_out
            || (world.movement_started && world.player.exists))
    {
        if let Some(top) = world.frames.last_mut() {
            top.dragged = false;
        }
    }

    // Continue: follow the mouse, clamped fully on screen.
    let Some(top) = world.frames.last() else {
        return;
    };
    if top.dragged {
        let top_index = world.frames.len() - 1;
        let frame = &mut world.frames[top_index];
        frame.pos = world.input.mouse_pos + frame.drag_offset;

        let bound = SCREEN_SIZE / 2 - frame.pixel_size() / 2 - DRAG_MARGIN;
        frame.pos = frame.pos.clamp(-bound, bound);

        // Spawn points track the drag live until gameplay starts.
        if !world.movement_started {
            world.apply_frame_entities(top_index);
        }
    }
}

/// Refresh per-frame AABB overlap and occlusion flags, and capture the
/// topmost frame the player's hitbox touches this tick.
///
/// Before movement starts the flags are recomputed from scratch: frames
/// stacked above the player's spawn frame that cover the player become
/// occluded, so a frame dragged over the spawn never crushes it. After a
/// frame no longer overlaps the player, its occlusion flag always clears.
fn refresh_overlap_flags(world: &mut WorldState) {
    let player_pos = world.player.pos;
    let mut passed_player_frame = false;
    let mut topmost_touched = None;

    for (i, frame) in world.frames.iter_mut().enumerate() {
        frame.aabb_overlaps_player = false;
        if !world.movement_started {
            frame.player_is_under = false;
        }

        for point in PLAYER_HITBOX {
            if frame.world_pixel_in_rect(player_pos + point) {
                frame.aabb_overlaps_player = true;
                topmost_touched = Some(i);
                if passed_player_frame {
                    frame.player_is_under = true;
                }
                break;
            }
        }

        if !world.movement_started
            && frame.spawned
            && frame.roles.contains(&EntityRole::Player)
        {
            passed_player_frame = true;
        }

        if !frame.aabb_overlaps_player {
            frame.player_is_under = false;
        }
    }

    world.topmost_touched = topmost_touched;
}

/// Key pickup and exit interactions, skipped on occluded frames. Runs
/// before player movement; keys are resolved first so collecting the
/// last key and touching the exit on the same tick wins.
fn entity_interactions(world: &mut WorldState, audio: &mut dyn AudioSink) {
    if !world.movement_started || !world.player.exists {
        return;
    }

    let player_pos = world.player.pos;

    for i in 0..world.frames.len() {
        if world.frames[i].player_is_under {
            continue;
        }
        let frame_pos = world.frames[i].pos;

        let mut j = 0;
        while j < world.frames[i].key_offsets.len() {
            let key_world = frame_pos + world.frames[i].key_offsets[j];
            let dist = (key_world - player_pos).abs();
            if dist.x < PICKUP_HALF_EXTENT && dist.y < PICKUP_HALF_EXTENT {
                world.frames[i].key_offsets.remove(j);
                let pitch = world.rng.symmetric() * 0.2;
                audio.play(Sound::KeyPickup, key_world.as_vec2(), 1.0, pitch);
                spawn_key_burst(world, key_world);

                if world.keys_remaining() == 0 {
                    if let Some(exit_world) = world.exit_world_pos() {
                        spawn_exit_open_burst(world, exit_world);
                    }
                }
            } else {
                j += 1;
            }
        }
    }

    if world.keys_remaining() == 0 {
        for i in 0..world.frames.len() {
            if world.frames[i].player_is_under {
                continue;
            }
            let Some(offset) = world.frames[i].exit_offset else {
                continue;
            };
            let exit_world = world.frames[i].pos + offset;
            let dist = (exit_world - player_pos).abs();
            if dist.x < PICKUP_HALF_EXTENT && dist.y < PICKUP_HALF_EXTENT {
                world.frames[i].exit_offset = None;
                let pitch = world.rng.symmetric() * 0.2;
                audio.play(Sound::Win, exit_world.as_vec2(), 1.0, pitch);
                world.player.exists = false;
                world.winning_fade_out = true;
                spawn_win_burst(world, exit_world);
            }
        }
    }
}

/// Stack-wide solidity for the player's hitbox shifted by `offset`.
///
/// Frames are scanned topmost first; for each hitbox point the first
/// non-occluded frame whose AABB contains it answers. In update mode a
/// solid hit on a frame that is clear of the player's hitbox and stacked
/// above every frame the player touches marks that frame occluded (the
/// player tucks under it) instead of blocking.
fn solid_at_offset(world: &mut WorldState, offset: IVec2, update_frames: bool) -> bool {
    let mut solid = false;

    for point in PLAYER_HITBOX {
        let pixel = world.player.pos + point + offset;
        let mut found_aabb = false;

        for i in (0..world.frames.len()).rev() {
            if found_aabb {
                break;
            }
            let above_player = world.topmost_touched.map_or(true, |top| i > top);
            let frame = &mut world.frames[i];
            if frame.player_is_under {
                continue;
            }

            match frame.query_world_pixel(pixel) {
                PixelQuery::OutsideAabb => {}
                PixelQuery::Empty => found_aabb = true,
                PixelQuery::Solid => {
                    found_aabb = true;
                    if update_frames && !frame.aabb_overlaps_player && above_player {
                        frame.player_is_under = true;
                    } else {
                        solid = true;
                    }
                }
            }
        }
    }

    solid
}

fn update_player(world: &mut WorldState, audio: &mut dyn AudioSink) {
    if !world.player.exists {
        return;
    }

    // Horizontal control.
    let hc = world.input.right.is_down as i32 - world.input.left.is_down as i32;
    if hc != 0 {
        if !world.movement_started {
            let pitch = world.rng.symmetric() * 0.2;
            audio.play(Sound::StartMoving, world.player.pos.as_vec2(), 1.0, pitch);
        }
        world.movement_started = true;
        world.player.facing_left = hc < 0;
        world.player.vel.x =
            (world.player.vel.x + hc as f32 * WALK_ACC).clamp(-WALK_SPEED, WALK_SPEED);
    } else {
        let v = world.player.vel.x;
        world.player.vel.x = if v.abs() > WALK_DEC {
            v - WALK_DEC * v.signum()
        } else {
            0.0
        };
    }

    // Ground check, non-mutating so probing never flips occlusion flags.
    world.player.on_ground_prev = world.player.on_ground;
    world.player.on_ground = solid_at_offset(world, IVec2::new(0, 1), false);

    if world.player.on_ground && !world.player.on_ground_prev && world.movement_started {
        let pitch = world.rng.symmetric() * 0.3;
        audio.play(Sound::Landing, world.player.pos.as_vec2(), 1.0, pitch);
        spawn_landing_dust(world);
    }

    // Jumping and gravity. Releasing jump mid-rise selects the stronger
    // gravity constant for a low-jump cutoff.
    if world.player.on_ground {
        if world.input.jump.pressed() {
            world.movement_started = true;
            world.player.holding_jump = true;
            world.player.vel.y = JUMP_SPEED;
            world.player.vel_comp.y = 0.0;

            let pitch = world.rng.symmetric() * 0.3;
            audio.play(Sound::Jump, world.player.pos.as_vec2(), 1.0, pitch);
            spawn_jump_dust(world);
        } else {
            world.player.holding_jump = false;
            if world.player.vel.y > 0.0 {
                world.player.vel.y = 0.0;
                if world.player.vel_comp.y > 0.0 {
                    world.player.vel_comp.y = 0.0;
                }
            }
        }
    } else {
        if !world.input.jump.is_down || world.player.vel.y > 0.0 {
            world.player.holding_jump = false;
        }
        if world.movement_started {
            let g = if world.player.holding_jump {
                GRAVITY
            } else {
                GRAVITY_LOW_JUMP
            };
            world.player.vel.y = (world.player.vel.y + g).min(MAX_FALL_SPEED);
        }
    }

    // Sub-pixel integration: the float velocity plus carried remainder
    // rounds to a whole-pixel step, applied one pixel at a time with the
    // axes interleaved. Each single-pixel step is accepted or rejected
    // atomically, so thin solids cannot be tunneled.
    let (mut int_vel, remainder) =
        split_velocity(world.player.vel, world.player.vel_comp, VEL_COMP_DECAY);
    world.player.vel_comp = remainder;

    let mut moved_x = false;
    while int_vel != IVec2::ZERO {
        for axis in 0..2 {
            let amount = int_vel[axis];
            if amount == 0 {
                continue;
            }

            let mut offset = IVec2::ZERO;
            offset[axis] = amount.signum();

            if solid_at_offset(world, offset, true) {
                // Blocked: kill the velocity component, but only when it
                // still points into the wall.
                if amount as f32 * world.player.vel[axis] > 0.0 {
                    world.player.vel[axis] = 0.0;
                    if amount as f32 * world.player.vel_comp[axis] > 0.0 {
                        world.player.vel_comp[axis] = 0.0;
                    }
                }
                int_vel[axis] = 0;
            } else {
                int_vel -= offset;
                world.player.pos += offset;
                if axis == 0 {
                    moved_x = true;
                }
            }
        }
    }

    if moved_x {
        world.player.movement_timer += 1;
    } else {
        world.player.movement_timer = 0;
    }

    // Moving retires the first two tutorial hints.
    if world.movement_started {
        world.tutorial.explaining_move = false;
        world.tutorial.explaining_drag = false;
    }
}

fn death_and_respawn(world: &mut WorldState, audio: &mut dyn AudioSink) {
    // Leaving the screen kills, except upward: jumping above the bounds
    // is allowed.
    if world.player.exists {
        let p = world.player.pos;
        let half = SCREEN_SIZE / 2;
        if p.x <= -half.x || p.x > half.x || p.y > half.y {
            world.player.exists = false;
        }
    }

    // Death edge. Winning also clears existence but is not a death.
    if !world.player.exists && world.player.exists_prev && !world.winning_fade_out {
        let pitch = world.rng.symmetric() * 0.1;
        audio.play(Sound::Death, world.player.pos.as_vec2(), 1.0, pitch);
        // Any death teaches the reset, not just the button.
        world.tutorial.explaining_reset = false;
        spawn_death_burst(world);
    }
    world.player.exists_prev = world.player.exists;

    // Respawn in place, or advance to the next level on a win.
    if !world.player.exists {
        world.player.death_timer += 1;
        if world.player.death_timer > DEATH_TIMER_TICKS {
            if world.winning_fade_out {
                let next = world.current_level + 1;
                if next >= LEVELS.len() {
                    world.finished = true;
                    log::info!("final level complete");
                    return;
                }
                if let Err(err) = world.load_level(next) {
                    // Every level was validated at construction; a marker
                    // cannot go missing mid-run.
                    panic!("level data invalidated mid-run: {err}");
                }
            } else {
                let pitch = world.rng.symmetric() * 0.2;
                audio.play(Sound::Respawn, world.player.pos.as_vec2(), 1.0, pitch);
                world.restart_level();
                spawn_respawn_burst(world);
            }
        }
    }
}

fn update_fade(world: &mut WorldState) {
    if world.winning_fade_out {
        world.fade = (world.fade + FADE_STEP).min(1.0);
    } else {
        world.fade = (world.fade - FADE_STEP).max(0.0);
    }
}

fn update_tutorial(world: &mut WorldState) {
    let tut = &mut world.tutorial;

    ramp(&mut tut.drag_timer, tut.explaining_drag);
    ramp(
        &mut tut.move_timer,
        tut.explaining_move && tut.dragged_at_least_once,
    );
    ramp(
        &mut tut.reset_timer,
        tut.explaining_reset && world.movement_started,
    );

    // Clicking around after movement started re-shows the reset hint.
    if world.movement_started && !world.reset_button_hovered && world.input.mouse.pressed() {
        world.tutorial.explaining_reset = true;
    }
}

fn ramp(timer: &mut f32, up: bool) {
    if up {
        *timer = (*timer + TUTORIAL_STEP).min(1.0);
    } else {
        *timer = (*timer - TUTORIAL_STEP).max(0.0);
    }
}

fn update_counters(world: &mut WorldState) {
    if world.movement_started {
        world.background_timer += 1;
        world.movement_ticks += 1;
    } else {
        world.movement_ticks = 0;
    }
}

fn dust_color(world: &mut WorldState) -> Vec4 {
    let gray = 0.7 + world.rng.unit() * 0.2;
    Vec4::new(gray, gray, gray, 0.7)
}

fn spawn_landing_dust(world: &mut WorldState) {
    let base = world.player.pos.as_vec2();
    for _ in 0..8 {
        let pos = base
            + Vec2::new(0.0, 8.0)
            + Vec2::new(
                world.rng.sign() * (2.0 + 1.2 * world.rng.unit()),
                world.rng.symmetric(),
            );
        let vel = Vec2::new(world.rng.symmetric() * 0.7, world.rng.unit() * -0.14);
        let color = dust_color(world);
        world
            .particles
            .push(Particle::new(pos, vel, Vec2::new(0.0, -0.01), 0.01, color, 3.0, 30));
    }
}

fn spawn_jump_dust(world: &mut WorldState) {
    let base = world.player.pos.as_vec2();
    for _ in 0..4 {
        let pos = base
            + Vec2::new(0.0, 7.0)
            + Vec2::new(world.rng.symmetric() * 4.0, world.rng.unit());
        let vel = Vec2::new(world.rng.symmetric() * 0.2, world.rng.unit() * -0.48);
        let color = dust_color(world);
        world
            .particles
            .push(Particle::new(pos, vel, Vec2::new(0.0, -0.01), 0.01, color, 3.0, 30));
    }
}

fn spawn_death_burst(world: &mut WorldState) {
    let base = world.player.pos.as_vec2();
    for _ in 0..64 {
        let a1 = world.rng.angle();
        let a2 = world.rng.angle();
        let pos = base + Vec2::from_angle(a1) * (world.rng.unit() * 6.0);
        let vel = Vec2::from_angle(a2) * (world.rng.unit() * 2.0);
        let gray = 0.6 + world.rng.unit() * 0.4;
        let color = Vec4::new(gray, gray, gray, 0.5 + world.rng.unit() * 0.5);
        world
            .particles
            .push(Particle::new(pos, vel, Vec2::ZERO, 0.01, color, 4.0, 90));
    }
}

fn spawn_respawn_burst(world: &mut WorldState) {
    let base = world.player.pos.as_vec2();
    for _ in 0..16 {
        let dir = Vec2::from_angle(world.rng.angle());
        let pos = base + dir * (3.0 + world.rng.unit());
        let gray = 0.7 + world.rng.unit() * 0.2;
        let color = Vec4::new(gray, gray, gray, 1.0);
        world
            .particles
            .push(Particle::new(pos, dir, Vec2::ZERO, 0.05, color, 3.0, 20));
    }
}

fn spawn_win_burst(world: &mut WorldState, exit_world: IVec2) {
    let base = exit_world.as_vec2();
    for _ in 0..32 {
        let dir = Vec2::from_angle(world.rng.angle());
        let pos = base + dir * (world.rng.unit() * 4.0);
        let vel = dir * (0.5 + world.rng.unit() * 1.5);
        let color = Vec4::new(1.0, 0.85 + world.rng.unit() * 0.15, 0.4, 0.8);
        world
            .particles
            .push(Particle::new(pos, vel, Vec2::ZERO, 0.02, color, 4.0, 60));
    }
}

fn spawn_key_burst(world: &mut WorldState, key_world: IVec2) {
    let base = key_world.as_vec2();
    for _ in 0..12 {
        let dir = Vec2::from_angle(world.rng.angle());
        let vel = dir * (0.4 + world.rng.unit() * 0.8);
        let color = Vec4::new(1.0, 0.9, 0.3 + world.rng.unit() * 0.2, 0.9);
        world
            .particles
            .push(Particle::new(base, vel, Vec2::ZERO, 0.03, color, 3.0, 40));
    }
}

/// Bonus burst at the exit when the last key is collected
fn spawn_exit_open_burst(world: &mut WorldState, exit_world: IVec2) {
    let base = exit_world.as_vec2();
    for _ in 0..24 {
        let dir = Vec2::from_angle(world.rng.angle());
        let pos = base + dir * (world.rng.unit() * 8.0);
        let vel = dir * (0.3 + world.rng.unit());
        let color = Vec4::new(0.6, 0.9 + world.rng.unit() * 0.1, 1.0, 0.8);
        world
            .particles
            .push(Particle::new(pos, vel, Vec2::ZERO, 0.02, color, 3.0, 50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::frame::Frame;
    use crate::sim::level::{FLOWER_ISLAND, KEY_LOFT, VORTEX};
    use crate::sink::{NullAudio, RecordingAudio};
    use proptest::prelude::*;

    /// World with a custom frame layout; markers resolved, entities applied.
    fn world_with(frames: Vec<Frame>) -> WorldState {
        let mut world = WorldState::new(7).unwrap();
        world.frames = frames;
        for i in 0..world.frames.len() {
            world.resolve_frame_markers(i).unwrap();
            world.apply_frame_entities(i);
        }
        world
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn hold_right() -> TickInput {
        TickInput {
            right: true,
            ..TickInput::default()
        }
    }

    /// Walkable bridge: player island at the origin, exit frame placed so
    /// its floor continues the walk to the right.
    fn bridge_to_exit() -> WorldState {
        world_with(vec![
            Frame::new(FLOWER_ISLAND, IVec2::new(0, 0), &[EntityRole::Player]),
            Frame::new(VORTEX, IVec2::new(48, 4), &[EntityRole::Exit]),
        ])
    }

    fn assert_not_embedded(world: &WorldState) {
        for point in PLAYER_HITBOX {
            let pixel = world.player.pos + point;
            for frame in &world.frames {
                if frame.player_is_under {
                    continue;
                }
                assert_ne!(
                    frame.query_world_pixel(pixel),
                    PixelQuery::Solid,
                    "hitbox point {pixel} embedded in solid at frame pos {}",
                    frame.pos
                );
            }
        }
    }

    #[test]
    fn player_settles_on_floor() {
        let mut world = world_with(vec![Frame::new(
            FLOWER_ISLAND,
            IVec2::ZERO,
            &[EntityRole::Player],
        )]);
        let mut audio = NullAudio;

        // One tick of input to start movement, then let gravity settle.
        tick(&mut world, &hold_right(), &mut audio);
        for _ in 0..120 {
            tick(&mut world, &idle(), &mut audio);
        }

        // Solid row 4 of the 5x6 grid has its top edge at world y = 16;
        // the feet offset is +7, so resting pos.y = 16 - 8.
        assert!(world.player.on_ground);
        assert_eq!(world.player.vel.y, 0.0);
        assert_eq!(world.player.pos.y, 8);
        assert_not_embedded(&world);
    }

    #[test]
    fn never_ends_tick_embedded() {
        let mut world = bridge_to_exit();
        let mut audio = NullAudio;

        for n in 0..240 {
            let input = TickInput {
                right: true,
                jump: (n / 30) % 2 == 0,
                ..TickInput::default()
            };
            tick(&mut world, &input, &mut audio);
            if world.player.exists {
                assert_not_embedded(&world);
            }
        }
    }

    #[test]
    fn walking_into_exit_wins_once() {
        let mut world = bridge_to_exit();
        let mut audio = RecordingAudio::default();

        let mut won = false;
        for _ in 0..300 {
            tick(&mut world, &hold_right(), &mut audio);
            if world.winning_fade_out {
                won = true;
                break;
            }
        }
        assert!(won, "player never reached the exit");
        assert!(!world.player.exists);

        // Staying near the consumed exit must not re-trigger it.
        for _ in 0..10 {
            tick(&mut world, &idle(), &mut audio);
        }
        assert_eq!(audio.count(Sound::Win), 1);
    }

    #[test]
    fn exit_is_gated_on_keys() {
        let mut world = world_with(vec![
            Frame::new(FLOWER_ISLAND, IVec2::new(0, 0), &[EntityRole::Player]),
            Frame::new(VORTEX, IVec2::new(48, 4), &[EntityRole::Exit]),
            // A key far out of reach keeps the exit shut.
            Frame::new(KEY_LOFT, IVec2::new(-150, -100), &[EntityRole::Key]),
        ]);
        let mut audio = RecordingAudio::default();

        // Walk until the player overlaps the exit region.
        let mut overlapped = false;
        for _ in 0..200 {
            tick(&mut world, &hold_right(), &mut audio);
            let d = (world.exit_world_pos().unwrap() - world.player.pos).abs();
            if d.x < PICKUP_HALF_EXTENT && d.y < PICKUP_HALF_EXTENT {
                overlapped = true;
                break;
            }
        }
        assert!(overlapped, "player never reached the exit region");
        assert!(!world.winning_fade_out);
        assert_eq!(audio.count(Sound::Win), 0);

        // With the last key gone, the very next overlapping tick wins.
        let key_frame = world
            .frames
            .iter_mut()
            .find(|f| !f.key_offsets.is_empty())
            .unwrap();
        key_frame.key_offsets.clear();
        tick(&mut world, &hold_right(), &mut audio);
        assert!(world.winning_fade_out);
        assert_eq!(audio.count(Sound::Win), 1);
    }

    #[test]
    fn falling_out_of_bounds_kills_on_threshold_tick() {
        // Island near the right edge; walking off drops into the void.
        let mut world = world_with(vec![Frame::new(
            FLOWER_ISLAND,
            IVec2::new(0, 0),
            &[EntityRole::Player],
        )]);
        let mut audio = RecordingAudio::default();

        let mut prev_y = world.player.pos.y;
        let mut died = false;
        for _ in 0..600 {
            let alive_before = world.player.exists;
            tick(&mut world, &hold_right(), &mut audio);
            if alive_before && !world.player.exists {
                // Existence cleared exactly when the threshold is crossed.
                assert!(world.player.pos.y > SCREEN_SIZE.y / 2);
                assert!(prev_y <= SCREEN_SIZE.y / 2);
                died = true;
                break;
            }
            prev_y = world.player.pos.y;
        }
        assert!(died, "player never fell out of bounds");
        assert_eq!(audio.count(Sound::Death), 1);
    }

    #[test]
    fn death_respawns_after_timer() {
        let mut world = world_with(vec![Frame::new(
            FLOWER_ISLAND,
            IVec2::new(0, 0),
            &[EntityRole::Player],
        )]);
        let mut audio = RecordingAudio::default();

        // Walk off and die.
        while world.player.exists {
            tick(&mut world, &hold_right(), &mut audio);
        }
        let spawn = IVec2::new(0, 8);

        // Respawn fires one tick after the timer threshold.
        for _ in 0..=DEATH_TIMER_TICKS {
            tick(&mut world, &idle(), &mut audio);
        }
        assert!(world.player.exists);
        assert_eq!(world.player.pos, spawn);
        assert_eq!(audio.count(Sound::Respawn), 1);
        assert!(!world.movement_started);
    }

    #[test]
    fn occlusion_clears_when_overlap_ends() {
        let mut world = world_with(vec![
            Frame::new(FLOWER_ISLAND, IVec2::new(0, 0), &[EntityRole::Player]),
            Frame::new(VORTEX, IVec2::new(0, 0), &[]),
        ]);
        world.frames[1].player_is_under = true;
        world.frames[1].aabb_overlaps_player = true;

        // Move the occluding frame away; the first refresh clears the flag.
        world.frames[1].pos = IVec2::new(200, 100);
        let mut audio = NullAudio;
        tick(&mut world, &idle(), &mut audio);
        assert!(!world.frames[1].player_is_under);
        assert!(!world.frames[1].aabb_overlaps_player);
    }

    #[test]
    fn frame_dragged_over_spawn_occludes_player() {
        let mut world = world_with(vec![
            Frame::new(FLOWER_ISLAND, IVec2::new(0, 0), &[EntityRole::Player]),
            // Solid floor row covers the spawn point.
            Frame::new(VORTEX, IVec2::new(0, -4), &[]),
        ]);
        let mut audio = NullAudio;
        tick(&mut world, &idle(), &mut audio);

        // The higher-stacked frame covering the spawn is flagged, so the
        // spawn is never crushed and the player falls through it later.
        assert!(world.frames[1].player_is_under);
        assert_not_embedded(&world);
    }

    #[test]
    fn press_promotes_frame_to_top_and_drags() {
        let mut world = world_with(vec![
            Frame::new(FLOWER_ISLAND, IVec2::new(0, 0), &[EntityRole::Player]),
            Frame::new(VORTEX, IVec2::new(120, -60), &[]),
        ]);
        let mut audio = NullAudio;

        // Press on the bottom frame.
        let input = TickInput {
            mouse_pos: IVec2::new(0, 20),
            mouse_down: true,
            ..TickInput::default()
        };
        tick(&mut world, &input, &mut audio);

        let top = world.frames.last().unwrap();
        assert!(top.dragged);
        assert_eq!(top.type_id, FLOWER_ISLAND);
        assert!(world.tutorial.dragged_at_least_once);
    }

    #[test]
    fn topmost_frame_wins_hover() {
        let mut world = world_with(vec![
            Frame::new(FLOWER_ISLAND, IVec2::new(0, 0), &[EntityRole::Player]),
            Frame::new(VORTEX, IVec2::new(0, 0), &[]),
        ]);
        let mut audio = NullAudio;

        let input = TickInput {
            mouse_pos: IVec2::ZERO,
            ..TickInput::default()
        };
        tick(&mut world, &input, &mut audio);

        assert!(!world.frames[0].hovered);
        assert!(world.frames[1].hovered);
    }

    #[test]
    fn winning_advances_level_after_timer() {
        let mut world = bridge_to_exit();
        let mut audio = NullAudio;

        for _ in 0..300 {
            tick(&mut world, &hold_right(), &mut audio);
            if world.winning_fade_out {
                break;
            }
        }
        assert!(world.winning_fade_out);

        for _ in 0..=DEATH_TIMER_TICKS {
            tick(&mut world, &idle(), &mut audio);
        }
        assert_eq!(world.current_level, 1);
        assert!(world.player.exists);
        assert!(!world.winning_fade_out);
    }

    #[test]
    fn reset_key_kills_player_mid_run() {
        let mut world = world_with(vec![Frame::new(
            FLOWER_ISLAND,
            IVec2::new(0, 0),
            &[EntityRole::Player],
        )]);
        let mut audio = NullAudio;

        tick(&mut world, &hold_right(), &mut audio);
        assert!(world.movement_started);

        let input = TickInput {
            reset: true,
            ..TickInput::default()
        };
        tick(&mut world, &input, &mut audio);
        assert!(!world.player.exists);
    }

    #[test]
    fn tutorial_hints_retire() {
        let mut world = world_with(vec![Frame::new(
            FLOWER_ISLAND,
            IVec2::new(0, 0),
            &[EntityRole::Player],
        )]);
        let mut audio = NullAudio;

        assert!(world.tutorial.explaining_drag);
        tick(&mut world, &hold_right(), &mut audio);
        assert!(!world.tutorial.explaining_drag);
        assert!(!world.tutorial.explaining_move);
        // Reset hint retires on first death, not on movement.
        assert!(world.tutorial.explaining_reset);
    }

    proptest! {
        /// Dragging never leaves a frame's AABB outside the screen
        /// margin, no matter where the mouse goes.
        #[test]
        fn drag_clamp_is_total(mx in -2000i32..2000, my in -2000i32..2000) {
            let mut world = world_with(vec![Frame::new(
                FLOWER_ISLAND,
                IVec2::new(0, 0),
                &[EntityRole::Player],
            )]);
            let mut audio = NullAudio;

            // Grab the frame at its center, then drag to an arbitrary point.
            let grab = TickInput {
                mouse_pos: IVec2::ZERO,
                mouse_down: true,
                ..TickInput::default()
            };
            tick(&mut world, &grab, &mut audio);
            let drag = TickInput {
                mouse_pos: IVec2::new(mx, my),
                mouse_down: true,
                ..TickInput::default()
            };
            tick(&mut world, &drag, &mut audio);

            let frame = world.frames.last().unwrap();
            let a = frame.top_left();
            let b = a + frame.pixel_size();
            let half = SCREEN_SIZE / 2;
            prop_assert!(a.x >= -half.x + DRAG_MARGIN && a.y >= -half.y + DRAG_MARGIN);
            prop_assert!(b.x <= half.x - DRAG_MARGIN && b.y <= half.y - DRAG_MARGIN);
        }
    }
}
