//! Level 4: catch falling stars, dodge falling chores
//!
//! A fixed number of stars drop at random intervals while obstacles fall ever
//! faster in between. The round ends once every star has been spawned and the
//! sky is clear.

use glam::Vec2;

use crate::sim::aabb::Aabb;
use crate::sim::engine::{Level, TickContext};
use crate::sim::outcome::{Reward, RewardKind, Verdict};
use crate::sim::random::RandomSource;
use crate::sim::spawner::{Countdown, SpawnTimer, place_with_retry};
use crate::sim::state::{EntityId, IdAllocator, Paint, ParticleField, Scene, Shape, SoundCue};
use crate::sim::vitals::Vitals;
use crate::tuning::CollectorTuning;

const PICKUP_PARTICLES: usize = 10;
const PENALTY_PARTICLES: usize = 8;
/// How long the red "-1" flash stays up after an obstacle hit
const PENALTY_FLASH_SECS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Rent,
    Homework,
    Taxes,
}

impl ObstacleKind {
    const ALL: [ObstacleKind; 3] = [ObstacleKind::Rent, ObstacleKind::Homework, ObstacleKind::Taxes];

    pub fn label(self) -> &'static str {
        match self {
            ObstacleKind::Rent => "RENT",
            ObstacleKind::Homework => "HOMEWORK",
            ObstacleKind::Taxes => "TAXES",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemKind {
    Star,
    Obstacle(ObstacleKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingItem {
    pub id: EntityId,
    pub kind: ItemKind,
    pub pos: Vec2,
    pub speed: f32,
}

impl FallingItem {
    pub fn is_star(&self) -> bool {
        self.kind == ItemKind::Star
    }
}

pub struct Collector {
    tuning: CollectorTuning,
    viewport: Vec2,
    player_x: f32,
    items: Vec<FallingItem>,
    ids: IdAllocator,
    spawned: u32,
    score: i32,
    star_timer: SpawnTimer,
    /// Redrawn after every star
    star_interval: f32,
    obstacle_timer: SpawnTimer,
    particles: ParticleField,
    /// Red "-1" flash after an obstacle hit
    flash: Countdown,
}

impl Collector {
    pub fn new(tuning: CollectorTuning, viewport: Vec2) -> Self {
        Self {
            tuning,
            viewport,
            player_x: (viewport.x - tuning.player_size) / 2.0,
            items: Vec::new(),
            ids: IdAllocator::new(),
            spawned: 0,
            score: 0,
            star_timer: SpawnTimer::new(),
            star_interval: tuning.star_interval_max,
            obstacle_timer: SpawnTimer::new(),
            particles: ParticleField::new(),
            flash: Countdown::default(),
        }
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_running()
    }

    pub fn player_rect(&self) -> Aabb {
        let size = self.tuning.player_size;
        Aabb::new(
            self.player_x,
            self.viewport.y - self.tuning.player_offset,
            size,
            size,
        )
    }

    fn item_rect(&self, item: &FallingItem) -> Aabb {
        Aabb::from_pos_size(item.pos, Vec2::splat(self.tuning.item_size))
    }

    fn all_spawned(&self) -> bool {
        self.spawned >= self.tuning.total_stars
    }

    fn fall_speed(&self) -> f32 {
        self.tuning
            .fall_speed
            .at_ratio(self.spawned as f32, self.tuning.total_stars as f32)
    }

    fn drop_item(&mut self, kind: ItemKind, x: f32) {
        let id = self.ids.next_id();
        let speed = self.fall_speed();
        self.items.push(FallingItem {
            id,
            kind,
            pos: Vec2::new(x, -self.tuning.item_size),
            speed,
        });
    }

    /// An obstacle column is fair when no star near the top shares it
    pub fn is_fair(&self, x: f32) -> bool {
        !self.items.iter().any(|item| {
            item.is_star()
                && (item.pos.x - x).abs() < self.tuning.safe_zone_x
                && item.pos.y < self.tuning.safe_zone_y
        })
    }

    /// Draw up to `placement_attempts` columns and drop an obstacle in the
    /// first fair one
    pub fn try_place_obstacle(&mut self, rng: &mut dyn RandomSource) -> Option<f32> {
        let span = self.viewport.x - self.tuning.item_size;
        let x = place_with_retry(
            &mut *rng,
            self.tuning.placement_attempts,
            |r| r.uniform() * span,
            |&x| self.is_fair(x),
        );
        match x {
            Some(x) => {
                let kind = ObstacleKind::ALL[rng.index(ObstacleKind::ALL.len())];
                log::debug!("{} falls at x={:.0}", kind.label(), x);
                self.drop_item(ItemKind::Obstacle(kind), x);
            }
            None => log::debug!("no fair obstacle column, skipping"),
        }
        x
    }

    fn collect(&mut self, item: FallingItem, ctx: &mut TickContext) {
        if !ctx.ledger.claim(item.id) {
            return;
        }
        let centre = item.pos + Vec2::splat(self.tuning.item_size / 2.0);
        match item.kind {
            ItemKind::Star => {
                self.score += 1;
                ctx.sound(SoundCue::Pickup);
                self.particles.burst(centre, PICKUP_PARTICLES);
            }
            ItemKind::Obstacle(kind) => {
                self.score -= 1;
                ctx.sound(SoundCue::Warning);
                self.particles.burst(centre, PENALTY_PARTICLES);
                self.flash = Countdown::new(PENALTY_FLASH_SECS);
                log::debug!("{} caught, score {}", kind.label(), self.score);
            }
        }
    }
}

impl Level for Collector {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn reward(&self) -> Reward {
        Reward::new(
            "Look How Far You've Come!",
            RewardKind::Photo,
            "/photos/level_4_win.jpeg",
        )
    }

    fn reward_delay(&self) -> f32 {
        self.tuning.reward_delay
    }

    fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.player_x = (self.viewport.x - self.tuning.player_size) / 2.0;
        self.items.clear();
        self.ids = IdAllocator::new();
        self.spawned = 0;
        self.score = 0;
        self.star_timer.reset();
        self.star_interval = rng.range(self.tuning.star_interval_min, self.tuning.star_interval_max);
        self.obstacle_timer.reset();
        self.particles.clear();
        self.flash = Countdown::default();
    }

    fn spawn(&mut self, ctx: &mut TickContext) {
        if !self.all_spawned() && self.star_timer.tick(ctx.dt, self.star_interval) {
            let x = ctx.rng.uniform() * (self.viewport.x - self.tuning.item_size);
            self.drop_item(ItemKind::Star, x);
            self.spawned += 1;
            self.star_interval = ctx
                .rng
                .range(self.tuning.star_interval_min, self.tuning.star_interval_max);
        }

        let stars_pending = !self.all_spawned() || self.items.iter().any(FallingItem::is_star);
        let interval = self
            .tuning
            .obstacle_interval
            .at_ratio(self.spawned as f32, self.tuning.total_stars as f32);
        if self.obstacle_timer.tick(ctx.dt, interval) && stars_pending {
            self.try_place_obstacle(&mut *ctx.rng);
        }
    }

    fn integrate(&mut self, ctx: &mut TickContext) {
        let axis = ctx.input.horizontal();
        let max_x = (self.viewport.x - self.tuning.player_size).max(0.0);
        self.player_x = (self.player_x + axis * self.tuning.player_speed * ctx.dt).clamp(0.0, max_x);

        for item in self.items.iter_mut() {
            item.pos.y += item.speed * ctx.dt;
        }
    }

    fn resolve(&mut self, ctx: &mut TickContext) {
        let player = self.player_rect();
        let (caught, falling): (Vec<FallingItem>, Vec<FallingItem>) =
            std::mem::take(&mut self.items)
                .into_iter()
                .partition(|item| self.item_rect(item).intersects(&player));
        self.items = falling;
        for item in caught {
            self.collect(item, ctx);
        }

        let floor = self.viewport.y + self.tuning.cull_margin;
        self.items.retain(|item| item.pos.y < floor);
    }

    fn evaluate(&self, _vitals: &Vitals) -> Verdict {
        if !self.all_spawned() || !self.items.is_empty() {
            Verdict::Continue
        } else if self.score >= self.tuning.stars_needed {
            Verdict::Win
        } else {
            Verdict::Lose
        }
    }

    fn update_cosmetics(&mut self, dt: f32) {
        self.particles.update(dt);
        self.flash.tick(dt);
    }

    fn scene(&self, _vitals: &Vitals) -> Scene {
        let mut scene = Scene::new(self.viewport);
        scene.push(Aabb::new(0.0, 0.0, self.viewport.x, self.viewport.y), Paint::Sky);
        for item in &self.items {
            let paint = match item.kind {
                ItemKind::Star => Paint::Star,
                ItemKind::Obstacle(_) => Paint::Obstacle,
            };
            scene.push(self.item_rect(item), paint);
        }
        scene.push(self.player_rect(), Paint::Player);
        self.particles.draw(&mut scene);
        if self.is_flashing() {
            let full = Aabb::from_pos_size(Vec2::ZERO, self.viewport);
            let alpha = self.flash.remaining() / PENALTY_FLASH_SECS;
            scene.shapes.push(Shape::new(full, Paint::Warning).with_alpha(alpha));
        }
        scene.hud.score = self.score as f32;
        scene.hud.target = self.tuning.stars_needed as f32;
        scene.hud.caption = if self.is_flashing() {
            "-1 Point!".to_string()
        } else {
            format!("Stars {}/{}", self.spawned, self.tuning.total_stars)
        };
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::engine::SimulationEngine;
    use crate::sim::input::{InputState, Key};
    use crate::sim::outcome::Outcome;
    use crate::sim::random::{ScriptedRandom, SeededRandom};
    use crate::sim::spawner::Ramp;
    use crate::sim::state::GameEvent;
    use crate::tuning::EngineTuning;
    use proptest::prelude::*;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    fn engine_with(tuning: CollectorTuning, rng: ScriptedRandom) -> SimulationEngine<Collector, ScriptedRandom> {
        SimulationEngine::new(Collector::new(tuning, VIEWPORT), rng, EngineTuning::default())
    }

    fn engine(rng: ScriptedRandom) -> SimulationEngine<Collector, ScriptedRandom> {
        engine_with(CollectorTuning::default(), rng)
    }

    fn no_obstacles() -> CollectorTuning {
        CollectorTuning {
            obstacle_interval: Ramp::new(1000.0, 1000.0),
            ..CollectorTuning::default()
        }
    }

    fn holding(keys: &[Key]) -> InputState {
        let mut input = InputState::new();
        for &key in keys {
            input.key_down(key);
        }
        input
    }

    #[test]
    fn test_player_clamped_to_screen() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        let input = holding(&[Key::KeyD]);
        for _ in 0..30 {
            e.step(0.1, &input);
        }
        assert_eq!(e.level().player_rect().left(), 1280.0 - 80.0);
        let input = holding(&[Key::ArrowLeft]);
        for _ in 0..30 {
            e.step(0.1, &input);
        }
        assert_eq!(e.level().player_rect().left(), 0.0);
    }

    #[test]
    fn test_star_scores_and_obstacle_costs() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        let player = e.level().player_rect();
        e.level_mut().drop_item(ItemKind::Star, player.left());
        e.level_mut().items[0].pos.y = player.top();
        let events = e.step(0.0, &InputState::new());
        assert_eq!(e.level().score(), 1);
        assert!(events.contains(&GameEvent::Sound(SoundCue::Pickup)));

        for _ in 0..2 {
            e.level_mut()
                .drop_item(ItemKind::Obstacle(ObstacleKind::Taxes), player.left());
            let last = e.level().items().len() - 1;
            e.level_mut().items[last].pos.y = player.top();
            e.step(0.0, &InputState::new());
        }
        assert_eq!(e.level().score(), -1);
        assert!(e.level().items().is_empty());
    }

    #[test]
    fn test_items_culled_below_screen() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        e.level_mut().drop_item(ItemKind::Star, 10.0);
        e.level_mut().items[0].pos.y = 720.0 + 99.0;
        e.step(0.01, &InputState::new());
        assert!(e.level().items().is_empty());
        assert_eq!(e.level().score(), 0);
    }

    #[test]
    fn test_obstacle_skipped_near_fresh_star() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        e.level_mut().drop_item(ItemKind::Star, 600.0);
        // Three candidates inside the star's column
        let mut rng = ScriptedRandom::new([600.0 / 1230.0, 620.0 / 1230.0, 580.0 / 1230.0]);
        assert_eq!(e.level_mut().try_place_obstacle(&mut rng), None);
        assert_eq!(e.level().items().len(), 1);

        // Second candidate is clear of the zone
        let mut rng = ScriptedRandom::new([600.0 / 1230.0, 0.9, 0.0]);
        let x = e.level_mut().try_place_obstacle(&mut rng).expect("placed");
        assert!((x - 0.9 * 1230.0).abs() < 1e-3);
        assert_eq!(e.level().items().len(), 2);
    }

    #[test]
    fn test_all_stars_caught_wins() {
        // 0.5 drops every star right above the centred player
        let mut e = engine_with(no_obstacles(), ScriptedRandom::constant(0.5));
        let input = InputState::new();
        let mut completions = 0;
        // Keep ticking well past the latch
        for _ in 0..900 {
            let events = e.step(0.1, &input);
            completions += events
                .iter()
                .filter(|ev| matches!(ev, GameEvent::LevelComplete(_)))
                .count();
        }
        assert_eq!(e.level().spawned(), 25);
        assert_eq!(e.level().score(), 25);
        assert_eq!(e.outcome(), Outcome::Completed);
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_obstacle_hit_bursts_and_flashes() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        let player = e.level().player_rect();
        e.level_mut()
            .drop_item(ItemKind::Obstacle(ObstacleKind::Rent), player.left());
        e.level_mut().items[0].pos.y = player.top();
        e.step(0.0, &InputState::new());
        assert_eq!(e.level().score(), -1);
        assert!(e.level().is_flashing());
        assert!(e.level().particle_count() > 0);
        assert_eq!(e.scene().hud.caption, "-1 Point!");

        e.step(0.3, &InputState::new());
        e.step(0.3, &InputState::new());
        assert!(!e.level().is_flashing());
        assert!(e.scene().hud.caption.starts_with("Stars"));
    }

    #[test]
    fn test_bursts_do_not_change_spawns() {
        let quiet = || {
            SimulationEngine::new(
                Collector::new(CollectorTuning::default(), VIEWPORT),
                SeededRandom::new(9),
                EngineTuning::default(),
            )
        };
        let mut plain = quiet();
        let mut busy = quiet();
        let input = InputState::new();
        for _ in 0..120 {
            busy.level_mut().particles.burst(Vec2::new(640.0, 360.0), 15);
            plain.step(0.1, &input);
            busy.step(0.1, &input);
        }
        assert!(!plain.level().items().is_empty());
        assert_eq!(plain.level().items(), busy.level().items());
        assert_eq!(plain.level().score(), busy.level().score());
    }

    #[test]
    fn test_missed_stars_lose() {
        let mut e = engine_with(no_obstacles(), ScriptedRandom::constant(0.5));
        let input = holding(&[Key::KeyA]);
        for _ in 0..700 {
            e.step(0.1, &input);
        }
        assert_eq!(e.level().score(), 0);
        assert_eq!(e.outcome(), Outcome::GameOver);
    }

    #[test]
    fn test_obstacles_stop_after_last_star() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        e.level_mut().spawned = 25;
        e.level_mut().score = 20;
        let events = e.step(0.1, &InputState::new());
        assert!(e.level().items().is_empty());
        assert_eq!(e.outcome(), Outcome::Completed);
        assert!(!events.contains(&GameEvent::GameOver));
    }

    proptest! {
        #[test]
        fn prop_obstacles_respect_safe_zone(
            stars in proptest::collection::vec((0.0f32..1230.0, -50.0f32..400.0), 0..8),
            seed in any::<u64>(),
        ) {
            let mut level = Collector::new(CollectorTuning::default(), VIEWPORT);
            for &(x, y) in &stars {
                level.drop_item(ItemKind::Star, x);
                let last = level.items.len() - 1;
                level.items[last].pos.y = y;
            }
            let mut rng = SeededRandom::new(seed);
            if let Some(x) = level.try_place_obstacle(&mut rng) {
                for &(sx, sy) in &stars {
                    prop_assert!(sy >= 150.0 || (sx - x).abs() >= 50.0);
                }
            }
        }
    }
}
