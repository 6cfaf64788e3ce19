//! Scene snapshot to triangle list
//!
//! Everything is an axis-aligned quad. World rectangles are shifted by the
//! scene camera; HUD quads are placed in screen space.

use glam::Vec2;

use super::sprite;
use super::vertex::{Vertex, colors, paint_color};
use crate::fraction;
use crate::settings::Settings;
use crate::sim::aabb::Aabb;
use crate::sim::outcome::Outcome;
use crate::sim::state::{Avatar, Facing, Paint, Scene};

/// Maps pixel coordinates (origin top-left, y down) to clip space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    viewport: Vec2,
    camera: Vec2,
}

impl Projection {
    pub fn new(viewport: Vec2, camera: Vec2) -> Self {
        Self {
            viewport: viewport.max(Vec2::ONE),
            camera,
        }
    }

    pub fn to_ndc(&self, world: Vec2) -> [f32; 2] {
        let p = world - self.camera;
        [
            p.x / self.viewport.x * 2.0 - 1.0,
            1.0 - p.y / self.viewport.y * 2.0,
        ]
    }
}

/// Two triangles covering `rect`
pub fn quad(proj: &Projection, rect: &Aabb, color: [f32; 4]) -> [Vertex; 6] {
    let [l, t] = proj.to_ndc(Vec2::new(rect.left(), rect.top()));
    let [r, b] = proj.to_ndc(Vec2::new(rect.right(), rect.bottom()));
    [
        Vertex::new(l, t, color),
        Vertex::new(l, b, color),
        Vertex::new(r, b, color),
        Vertex::new(l, t, color),
        Vertex::new(r, b, color),
        Vertex::new(r, t, color),
    ]
}

fn push_quad(out: &mut Vec<Vertex>, proj: &Projection, rect: Aabb, color: [f32; 4]) {
    out.extend_from_slice(&quad(proj, &rect, color));
}

fn with_alpha(mut color: [f32; 4], alpha: f32) -> [f32; 4] {
    color[3] *= alpha.clamp(0.0, 1.0);
    color
}

/// Build the full vertex list for one frame
pub fn scene_vertices(scene: &Scene, settings: &Settings) -> Vec<Vertex> {
    let world = Projection::new(scene.viewport, scene.camera);
    let screen = Projection::new(scene.viewport, Vec2::ZERO);
    let particles = settings.effective_particles();

    let mut out = Vec::with_capacity((scene.shapes.len() + 16) * 6);
    for shape in &scene.shapes {
        if shape.paint == Paint::Particle && !particles {
            continue;
        }
        push_quad(
            &mut out,
            &world,
            shape.rect,
            with_alpha(paint_color(shape.paint), shape.alpha),
        );
    }
    if let Some(avatar) = &scene.avatar {
        avatar_vertices(&mut out, &world, avatar);
    }
    hud_vertices(&mut out, &screen, scene);

    let overlay = match scene.outcome {
        Outcome::InProgress => None,
        Outcome::Completed => Some(colors::WIN_OVERLAY),
        Outcome::GameOver => Some(colors::LOSE_OVERLAY),
    };
    if let Some(color) = overlay {
        let full = Aabb::from_pos_size(Vec2::ZERO, scene.viewport);
        push_quad(&mut out, &screen, full, color);
    }
    out
}

/// Body, an eye on the facing side and two legs posed by the sprite frame
fn avatar_vertices(out: &mut Vec<Vertex>, proj: &Projection, avatar: &Avatar) {
    if !avatar.visible {
        return;
    }
    let r = avatar.rect;
    push_quad(out, proj, r, colors::PLAYER);

    let eye = r.size.x * 0.18;
    let eye_x = match avatar.facing {
        Facing::Idle => r.center().x - eye * 0.5,
        Facing::Left => r.left() + r.size.x * 0.15,
        Facing::Right => r.right() - r.size.x * 0.15 - eye,
    };
    push_quad(
        out,
        proj,
        Aabb::new(eye_x, r.top() + r.size.y * 0.2, eye, eye),
        colors::PLAYER_DETAIL,
    );

    let stride = r.size.x * 0.12;
    let (front, back) = match sprite::frame(avatar.facing, avatar.moving_for) {
        0 => (0.0, 0.0),
        1 => (stride, -stride),
        _ => (-stride, stride),
    };
    let leg = Vec2::new(r.size.x * 0.25, r.size.y * 0.2);
    let leg_y = r.bottom() - leg.y;
    let legs = [
        (r.left() + r.size.x * 0.15, back),
        (r.right() - r.size.x * 0.15 - leg.x, front),
    ];
    for (base, offset) in legs {
        push_quad(
            out,
            proj,
            Aabb::from_pos_size(Vec2::new(base + offset, leg_y), leg),
            colors::PLAYER_DETAIL,
        );
    }
}

/// Lives as pips and progress toward the target as a bar. Text stays in the DOM.
fn hud_vertices(out: &mut Vec<Vertex>, proj: &Projection, scene: &Scene) {
    let pip = 18.0;
    for i in 0..scene.hud.lives {
        let x = 20.0 + i as f32 * (pip + 8.0);
        push_quad(out, proj, Aabb::new(x, 20.0, pip, pip), colors::HEART);
    }

    if scene.hud.target > 0.0 {
        let width = scene.viewport.x * 0.3;
        let x = scene.viewport.x - width - 20.0;
        push_quad(out, proj, Aabb::new(x, 20.0, width, 12.0), colors::HUD_TRACK);
        let filled = width * fraction(scene.hud.score, scene.hud.target);
        if filled > 0.0 {
            push_quad(out, proj, Aabb::new(x, 20.0, filled, 12.0), colors::HUD_FILL);
        }
    }
}
