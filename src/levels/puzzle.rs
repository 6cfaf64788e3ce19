//! Level 3: drag-and-drop tile puzzle
//!
//! The picture is cut into a square grid and scattered around the board.
//! Dropping a tile close enough to its home cell snaps and locks it.

use glam::Vec2;

use crate::sim::aabb::Aabb;
use crate::sim::engine::{Level, TickContext};
use crate::sim::outcome::{Reward, RewardKind, Verdict};
use crate::sim::random::RandomSource;
use crate::sim::state::{EntityId, IdAllocator, Paint, ParticleField, Scene, SoundCue};
use crate::sim::vitals::Vitals;
use crate::tuning::PuzzleTuning;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub id: EntityId,
    /// Row-major cell index of the piece
    pub index: u16,
    pub home: Vec2,
    pub pos: Vec2,
    pub locked: bool,
}

impl Tile {
    pub fn rect(&self, size: f32) -> Aabb {
        Aabb::from_pos_size(self.pos, Vec2::splat(size))
    }
}

pub struct Puzzle {
    tuning: PuzzleTuning,
    viewport: Vec2,
    board_size: f32,
    tile_size: f32,
    origin: Vec2,
    /// Draw order; the last tile is on top
    tiles: Vec<Tile>,
    /// Pointer offset into the tile being dragged (always the last one)
    grab: Option<Vec2>,
    particles: ParticleField,
}

impl Puzzle {
    pub fn new(tuning: PuzzleTuning, viewport: Vec2) -> Self {
        let board_size = (viewport.y * tuning.board_height_fraction)
            .min(viewport.x * tuning.board_width_fraction);
        let tile_size = board_size / f32::from(tuning.grid.max(1));
        let origin = (viewport - Vec2::splat(board_size)) / 2.0;
        Self {
            tuning,
            viewport,
            board_size,
            tile_size,
            origin,
            tiles: Vec::new(),
            grab: None,
            particles: ParticleField::new(),
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn board_size(&self) -> f32 {
        self.board_size
    }

    pub fn locked(&self) -> usize {
        self.tiles.iter().filter(|t| t.locked).count()
    }

    pub fn total(&self) -> usize {
        usize::from(self.tuning.grid) * usize::from(self.tuning.grid)
    }

    /// The tile under the pointer while a drag is in progress
    pub fn held(&self) -> Option<&Tile> {
        self.grab.and(self.tiles.last())
    }

    fn scatter(&self, rng: &mut dyn RandomSource) -> Vec2 {
        let tile = self.tile_size;
        let span_y = (self.viewport.y - tile).max(0.0);
        if rng.chance(self.tuning.left_workspace_chance) {
            let span_x = (self.origin.x - tile).max(0.0);
            Vec2::new(rng.uniform() * span_x, rng.uniform() * span_y)
        } else if rng.chance(self.tuning.right_workspace_chance) {
            let left = self.origin.x + self.board_size;
            let span_x = (self.viewport.x - left - tile).max(0.0);
            Vec2::new(left + rng.uniform() * span_x, rng.uniform() * span_y)
        } else {
            let span = self.board_size - tile;
            self.origin + Vec2::new(rng.uniform() * span, rng.uniform() * span)
        }
    }

    fn pick(&mut self, pointer: Vec2) {
        let size = self.tile_size;
        let Some(index) = self
            .tiles
            .iter()
            .rposition(|t| !t.locked && t.rect(size).contains_point(pointer))
        else {
            return;
        };
        let tile = self.tiles.remove(index);
        self.grab = Some(pointer - tile.pos);
        self.tiles.push(tile);
    }

    fn drop_held(&mut self, ctx: &mut TickContext) {
        if self.grab.take().is_none() {
            return;
        }
        let snap = self.tuning.snap_fraction * self.tile_size;
        let Some(tile) = self.tiles.last_mut() else {
            return;
        };
        if tile.pos.distance(tile.home) >= snap {
            return;
        }
        tile.pos = tile.home;
        tile.locked = true;
        let centre = tile.home + Vec2::splat(self.tile_size / 2.0);
        let id = tile.id;
        if ctx.ledger.claim(id) {
            log::debug!("tile {:?} locked ({}/{})", id, self.locked(), self.total());
        }
        ctx.sound(SoundCue::TileLock);
        self.particles.burst(centre, self.tuning.lock_particles);
    }
}

impl Level for Puzzle {
    fn name(&self) -> &'static str {
        "puzzle"
    }

    fn reward(&self) -> Reward {
        Reward::new(
            "Puzzle of Us",
            RewardKind::Text,
            "A little piece of my heart for every piece of this puzzle.",
        )
    }

    fn reward_delay(&self) -> f32 {
        self.tuning.reward_delay
    }

    fn reset(&mut self, rng: &mut dyn RandomSource) {
        let grid = self.tuning.grid;
        let mut ids = IdAllocator::new();
        self.tiles.clear();
        self.grab = None;
        self.particles.clear();
        for row in 0..grid {
            for col in 0..grid {
                let home = self.origin
                    + Vec2::new(f32::from(col), f32::from(row)) * self.tile_size;
                let pos = self.scatter(rng);
                self.tiles.push(Tile {
                    id: ids.next_id(),
                    index: row * grid + col,
                    home,
                    pos,
                    locked: false,
                });
            }
        }
    }

    fn integrate(&mut self, ctx: &mut TickContext) {
        let input = ctx.input;
        if input.pointer_pressed {
            if let Some(pointer) = input.pointer {
                self.pick(pointer);
            }
        }
        if let (Some(offset), Some(pointer)) = (self.grab, input.pointer) {
            if let Some(tile) = self.tiles.last_mut() {
                tile.pos = pointer - offset;
            }
        }
    }

    fn resolve(&mut self, ctx: &mut TickContext) {
        if ctx.input.pointer_released {
            self.drop_held(ctx);
        }
    }

    fn evaluate(&self, _vitals: &Vitals) -> Verdict {
        if !self.tiles.is_empty() && self.locked() == self.total() {
            Verdict::Win
        } else {
            Verdict::Continue
        }
    }

    fn update_cosmetics(&mut self, dt: f32) {
        self.particles.update(dt);
    }

    fn scene(&self, _vitals: &Vitals) -> Scene {
        let mut scene = Scene::new(self.viewport);
        scene.push(Aabb::new(0.0, 0.0, self.viewport.x, self.viewport.y), Paint::Sky);
        for tile in &self.tiles {
            scene.push(
                Aabb::from_pos_size(tile.home, Vec2::splat(self.tile_size)),
                Paint::BoardSlot,
            );
        }
        for tile in &self.tiles {
            let paint = if tile.locked {
                Paint::TileLocked { index: tile.index }
            } else {
                Paint::Tile { index: tile.index }
            };
            scene.push(tile.rect(self.tile_size), paint);
        }
        self.particles.draw(&mut scene);
        scene.hud.score = self.locked() as f32;
        scene.hud.target = self.total() as f32;
        scene.hud.caption = "Drag the pieces into place".to_string();
        scene
    }
}
