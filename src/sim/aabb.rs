//! Axis-aligned bounding boxes
//!
//! Every minigame resolves player-vs-platform, player-vs-pickup, player-vs-hazard
//! and projectile-vs-boss with the same strict overlap test, so tie-breaks at
//! touching edges behave identically everywhere.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A rectangle with sides parallel to the axes (top-left origin, y grows down)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test. Rectangles that only share an edge do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        intersects(self, other)
    }

    /// Point-in-rectangle test with inclusive edges (pointer picking)
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }
}

/// `a.x < b.x+b.w && a.x+a.w > b.x && a.y < b.y+b.h && a.y+a.h > b.y`
#[inline]
pub fn intersects(a: &Aabb, b: &Aabb) -> bool {
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_overlap_detected() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let right = Aabb::new(10.0, 0.0, 10.0, 10.0);
        let below = Aabb::new(0.0, 10.0, 10.0, 10.0);
        let corner = Aabb::new(10.0, 10.0, 5.0, 5.0);
        assert!(!a.intersects(&right));
        assert!(!a.intersects(&below));
        assert!(!a.intersects(&corner));
    }

    #[test]
    fn test_contained_box_collides() {
        let outer = Aabb::new(0.0, 0.0, 100.0, 100.0);
        let inner = Aabb::new(40.0, 40.0, 5.0, 5.0);
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }

    #[test]
    fn test_contains_point_inclusive() {
        let tile = Aabb::new(10.0, 10.0, 20.0, 20.0);
        assert!(tile.contains_point(Vec2::new(10.0, 10.0)));
        assert!(tile.contains_point(Vec2::new(30.0, 30.0)));
        assert!(!tile.contains_point(Vec2::new(30.1, 20.0)));
    }

    fn rect() -> impl Strategy<Value = Aabb> {
        (-500.0f32..500.0, -500.0f32..500.0, 0.0f32..200.0, 0.0f32..200.0)
            .prop_map(|(x, y, w, h)| Aabb::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_intersects_is_symmetric(a in rect(), b in rect()) {
            prop_assert_eq!(intersects(&a, &b), intersects(&b, &a));
        }

        #[test]
        fn prop_shared_vertical_edge_never_collides(a in rect(), dy in -100.0f32..100.0, w in 0.0f32..200.0, h in 0.0f32..200.0) {
            let b = Aabb::new(a.right(), a.top() + dy, w, h);
            prop_assert!(!intersects(&a, &b));
        }

        #[test]
        fn prop_shared_horizontal_edge_never_collides(a in rect(), dx in -100.0f32..100.0, w in 0.0f32..200.0, h in 0.0f32..200.0) {
            let b = Aabb::new(a.left() + dx, a.bottom(), w, h);
            prop_assert!(!intersects(&a, &b));
        }
    }
}
