//! Draw-call emission
//!
//! Walks the world state and issues draw calls to a [`RenderSink`] in
//! back-to-front order. The frame stack is split at the first occluding
//! frame so the player and particles render between the frames below
//! them and the frames they are tucked under.

use glam::{IVec2, Vec2, Vec4};

use crate::consts::*;
use crate::sim::frame::Frame;
use crate::sim::level::LEVELS;
use crate::sim::state::WorldState;
use crate::sink::{Fill, RenderSink};

const BG_TILE: i32 = 128;
const PLAYER_SPRITE: i32 = 16;
const EXIT_SPRITE: i32 = 32;
const KEY_SPRITE: i32 = 16;

/// Atlas rows for the non-frame art
const ATLAS_FRAMES: IVec2 = IVec2::new(0, 128);
const ATLAS_KEY_ROW: i32 = 224;
const ATLAS_PLAYER: IVec2 = IVec2::new(0, 240);
const ATLAS_EXIT_ROW: i32 = 288;
const ATLAS_RESET_ROW: i32 = 320;
const ATLAS_TEXT: IVec2 = IVec2::new(0, 352);
const ATLAS_VIGNETTE: IVec2 = IVec2::new(544, 754);

pub fn draw_world(world: &WorldState, sink: &mut dyn RenderSink) {
    draw_background(world, sink);

    // Vignette over the background, under everything else.
    sink.draw_rect(
        -SCREEN_SIZE / 2,
        SCREEN_SIZE,
        Fill::atlas_alpha(ATLAS_VIGNETTE, 0.1),
    );

    // Frames below the player, up to the first one it is tucked under.
    let split = world
        .frames
        .iter()
        .position(|f| f.player_is_under)
        .unwrap_or(world.frames.len());
    for frame in &world.frames[..split] {
        draw_frame(frame, world.movement_ticks, sink);
    }

    // Borders of the lower frames stay faintly visible through the rest.
    for frame in &world.frames[..split] {
        sink.draw_rect_hollow(
            frame.top_left(),
            frame.pixel_size(),
            1,
            Vec4::new(0.0, 0.0, 0.0, 0.06),
        );
    }

    draw_player(world, sink);

    for p in &world.particles {
        let size = p.size();
        let corner = (p.pos - Vec2::splat(size as f32 / 2.0)).round().as_ivec2();
        sink.draw_rect(corner, IVec2::splat(size), Fill::Color(p.color));
    }

    // Frames the player is under.
    for frame in &world.frames[split..] {
        draw_frame(frame, world.movement_ticks, sink);
    }

    draw_tutorial(world, sink);

    if world.movement_started {
        let hovered_offset = i32::from(world.reset_button_hovered) * world.reset_button_size.x;
        sink.draw_rect(
            world.reset_button_pos,
            world.reset_button_size,
            Fill::atlas_alpha(
                IVec2::new(hovered_offset, ATLAS_RESET_ROW),
                world.reset_button_vis,
            ),
        );
    }

    if world.fade > 0.001 {
        sink.draw_rect_abs(
            -SCREEN_SIZE / 2,
            SCREEN_SIZE / 2,
            Vec4::new(0.0, 0.0, 0.0, world.fade),
        );
    }
}

fn draw_background(world: &WorldState, sink: &mut dyn RenderSink) {
    let def = &LEVELS[world.current_level];
    let scroll = (world.background_timer / 2 * def.scroll_dir).rem_euclid(BG_TILE);
    let count = (SCREEN_SIZE + BG_TILE - 1) / BG_TILE;

    for y in 0..count.y {
        for x in -1..count.x {
            sink.draw_rect(
                IVec2::new(x, y) * BG_TILE - SCREEN_SIZE / 2 + IVec2::new(scroll, 0),
                IVec2::splat(BG_TILE),
                Fill::atlas(IVec2::new(BG_TILE * def.background, 0)),
            );
        }
    }
}

fn draw_frame(frame: &Frame, movement_ticks: i32, sink: &mut dyn RenderSink) {
    let corner = frame.top_left();
    let size = frame.pixel_size();

    // Occluded frames go translucent so the player reads through them.
    let under_alpha = if frame.player_is_under { 0.5 } else { 1.0 };

    // Shadow grows with the hover animation.
    let lift = frame.hover_time.round() as i32;
    sink.draw_rect_abs(
        corner + IVec2::ONE + IVec2::splat(lift),
        corner + size + IVec2::new(2, 2) + IVec2::new(lift, (frame.hover_time * 3.0).round() as i32),
        Vec4::new(0.0, 0.0, 0.0, 0.5 * under_alpha),
    );

    // The image and its border.
    sink.draw_rect(
        corner,
        size,
        Fill::atlas_alpha(ATLAS_FRAMES + TILE_SIZE * frame.ty().tex_pos, under_alpha),
    );
    sink.draw_rect_hollow(corner, size, 1, Vec4::new(0.0, 0.0, 0.0, under_alpha));

    // Entities riding on this frame.
    if let Some(offset) = frame.exit_offset {
        let anim = movement_ticks / 6 % 4;
        sink.draw_rect(
            frame.pos + offset - EXIT_SPRITE / 2,
            IVec2::splat(EXIT_SPRITE),
            Fill::atlas_alpha(IVec2::new(anim * EXIT_SPRITE, ATLAS_EXIT_ROW), under_alpha),
        );
    }
    for offset in &frame.key_offsets {
        let anim = movement_ticks / 8 % 2;
        sink.draw_rect(
            frame.pos + *offset - KEY_SPRITE / 2,
            IVec2::splat(KEY_SPRITE),
            Fill::atlas_alpha(IVec2::new(anim * KEY_SPRITE, ATLAS_KEY_ROW), under_alpha),
        );
    }

    if frame.hovered {
        sink.draw_rect_hollow(corner + 1, size - 2, 1, Vec4::ONE);
    }
}

fn draw_player(world: &WorldState, sink: &mut dyn RenderSink) {
    if !world.player.exists {
        return;
    }
    let player = &world.player;

    // Sprite sheet row is the pose, column the animation frame.
    let (state, frame) = if player.on_ground {
        if player.movement_timer > 0 {
            (1, player.movement_timer / 3 % 4)
        } else {
            (0, 0)
        }
    } else {
        let frame = if player.vel.y < -1.0 {
            0
        } else if player.vel.y < -0.5 {
            1
        } else if player.vel.y < 0.0 {
            2
        } else if player.vel.y < 0.5 {
            3
        } else {
            4
        };
        (2, frame)
    };

    sink.draw_rect(
        player.pos - PLAYER_SPRITE / 2 + IVec2::new(0, 2),
        IVec2::splat(PLAYER_SPRITE),
        Fill::Atlas {
            tex_pos: ATLAS_PLAYER + IVec2::new(frame, state) * PLAYER_SPRITE,
            alpha: 1.0,
            flip_x: player.facing_left,
        },
    );
}

fn draw_tutorial(world: &WorldState, sink: &mut dyn RenderSink) {
    const TEXT_SIZE: IVec2 = IVec2::new(192, 16);

    // Hints hold invisible through the first third of their timer.
    let map_timer = |t: f32| (t * 3.0 - 1.0).clamp(0.0, 1.0);

    let timers = [
        world.tutorial.drag_timer,
        world.tutorial.move_timer,
        world.tutorial.reset_timer,
    ];
    for (i, timer) in timers.into_iter().enumerate() {
        let t = map_timer(timer);
        if t > 0.001 {
            let slot = 2 - i as i32;
            sink.draw_rect(
                IVec2::new(-TEXT_SIZE.x / 2, SCREEN_SIZE.y / 2 - TEXT_SIZE.y)
                    - IVec2::new(0, TEXT_SIZE.y * slot),
                TEXT_SIZE,
                Fill::atlas_alpha(ATLAS_TEXT + IVec2::new(0, TEXT_SIZE.y * i as i32), t),
            );
        }
    }
}
