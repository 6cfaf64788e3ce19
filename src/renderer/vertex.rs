//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

use crate::sim::state::Paint;

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const BACKGROUND: [f32; 4] = [0.06, 0.04, 0.12, 1.0];
    pub const SKY: [f32; 4] = [0.53, 0.75, 0.95, 1.0];
    pub const PLAYER: [f32; 4] = [0.95, 0.45, 0.6, 1.0];
    pub const PLAYER_DETAIL: [f32; 4] = [0.25, 0.1, 0.2, 1.0];
    pub const PLATFORM: [f32; 4] = [0.45, 0.3, 0.2, 1.0];
    pub const SPIKE: [f32; 4] = [0.75, 0.1, 0.15, 1.0];
    pub const PATROL: [f32; 4] = [0.55, 0.2, 0.7, 1.0];
    pub const HEART: [f32; 4] = [1.0, 0.25, 0.4, 1.0];
    pub const CHECKPOINT: [f32; 4] = [0.6, 0.6, 0.6, 1.0];
    pub const CHECKPOINT_ACTIVE: [f32; 4] = [0.3, 0.9, 0.4, 1.0];
    pub const LANE: [f32; 4] = [0.15, 0.1, 0.22, 1.0];
    pub const HIT_ZONE: [f32; 4] = [1.0, 1.0, 1.0, 0.35];
    pub const BEAT: [f32; 4] = [0.95, 0.2, 0.35, 1.0];
    pub const BOARD_SLOT: [f32; 4] = [0.2, 0.18, 0.28, 1.0];
    pub const STAR: [f32; 4] = [1.0, 0.85, 0.2, 1.0];
    pub const OBSTACLE: [f32; 4] = [0.35, 0.35, 0.4, 1.0];
    pub const BOSS: [f32; 4] = [0.4, 0.7, 0.3, 1.0];
    pub const BOSS_ENRAGED: [f32; 4] = [0.9, 0.3, 0.2, 1.0];
    pub const PROJECTILE: [f32; 4] = [1.0, 0.95, 0.6, 1.0];
    pub const TAXI: [f32; 4] = [1.0, 0.8, 0.0, 1.0];
    pub const PIGEON: [f32; 4] = [0.55, 0.55, 0.6, 1.0];
    pub const WARNING: [f32; 4] = [1.0, 0.2, 0.1, 0.4];
    pub const SHOCKWAVE: [f32; 4] = [0.3, 0.8, 1.0, 0.9];
    pub const PARTICLE: [f32; 4] = [1.0, 0.9, 0.5, 1.0];
    pub const FLASH: [f32; 4] = [1.0, 1.0, 1.0, 0.6];
    pub const HUD_TRACK: [f32; 4] = [0.0, 0.0, 0.0, 0.4];
    pub const HUD_FILL: [f32; 4] = [0.4, 0.9, 0.6, 1.0];
    pub const HUD_TIME: [f32; 4] = [0.95, 0.75, 0.3, 1.0];
    pub const WIN_OVERLAY: [f32; 4] = [1.0, 0.85, 0.3, 0.2];
    pub const LOSE_OVERLAY: [f32; 4] = [0.1, 0.0, 0.0, 0.5];
}

/// Palette entry for a paint role
pub fn paint_color(paint: Paint) -> [f32; 4] {
    match paint {
        Paint::Sky => colors::SKY,
        Paint::Player => colors::PLAYER,
        Paint::Platform => colors::PLATFORM,
        Paint::Spike => colors::SPIKE,
        Paint::PatrolBlock => colors::PATROL,
        Paint::Heart => colors::HEART,
        Paint::Checkpoint => colors::CHECKPOINT,
        Paint::CheckpointActive => colors::CHECKPOINT_ACTIVE,
        Paint::Lane => colors::LANE,
        Paint::HitZone => colors::HIT_ZONE,
        Paint::Beat => colors::BEAT,
        Paint::Tile { index } => tile_shade(index, false),
        Paint::TileLocked { index } => tile_shade(index, true),
        Paint::BoardSlot => colors::BOARD_SLOT,
        Paint::Star => colors::STAR,
        Paint::Obstacle => colors::OBSTACLE,
        Paint::Boss => colors::BOSS,
        Paint::BossEnraged => colors::BOSS_ENRAGED,
        Paint::Projectile => colors::PROJECTILE,
        Paint::Taxi => colors::TAXI,
        Paint::Pigeon => colors::PIGEON,
        Paint::Warning => colors::WARNING,
        Paint::Shockwave => colors::SHOCKWAVE,
        Paint::Particle => colors::PARTICLE,
        Paint::Flash => colors::FLASH,
    }
}

/// Puzzle tiles have no image, so each index gets its own gradient step.
/// Locked tiles are drawn brighter.
fn tile_shade(index: u16, locked: bool) -> [f32; 4] {
    let row = (index / 5) as f32 / 4.0;
    let col = (index % 5) as f32 / 4.0;
    let boost = if locked { 0.15 } else { 0.0 };
    [
        (0.35 + 0.5 * col + boost).min(1.0),
        (0.25 + 0.3 * row + boost).min(1.0),
        (0.6 - 0.3 * col + boost).min(1.0),
        1.0,
    ]
}
