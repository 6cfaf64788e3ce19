//! Movement integration
//!
//! All rates are per second and scaled by the tick delta. Platform physics
//! resolves vertical penetration before horizontal and snaps to the surface.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use crate::consts::LEGACY_FPS;

/// A moving rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            vel: Vec2::ZERO,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }

    /// `pos += vel * dt`
    #[inline]
    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    /// Clamp horizontally to `[0, width - size.x]`
    pub fn clamp_x(&mut self, width: f32) {
        self.pos.x = self.pos.x.clamp(0.0, (width - self.size.x).max(0.0));
    }

    /// Move to `pos` and stop
    pub fn teleport(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
    }
}

/// Gravity platformer constants (per second)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformPhysics {
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Vertical velocity set by a jump (px/s, negative is up)
    pub jump_velocity: f32,
    /// Horizontal speed while a direction is held (px/s)
    pub walk_speed: f32,
    /// Fraction of horizontal velocity kept per legacy frame once released
    pub friction_per_frame: f32,
}

impl Default for PlatformPhysics {
    fn default() -> Self {
        Self {
            gravity: 0.5 * LEGACY_FPS * LEGACY_FPS,
            jump_velocity: -12.0 * LEGACY_FPS,
            walk_speed: 5.0 * LEGACY_FPS,
            friction_per_frame: 0.8,
        }
    }
}

/// Platformer player body plus grounded flag
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Walker {
    pub body: Body,
    pub grounded: bool,
}

impl PlatformPhysics {
    /// Friction factor for a tick of `dt` seconds (`0.8^(60·dt)`)
    pub fn friction(&self, dt: f32) -> f32 {
        self.friction_per_frame.powf(dt * LEGACY_FPS)
    }

    /// Apply held input: direction sets velocity, release decays it.
    /// Returns true when a jump started this tick.
    pub fn steer(&self, walker: &mut Walker, axis: f32, jump: bool, dt: f32) -> bool {
        if axis != 0.0 {
            walker.body.vel.x = axis.signum() * self.walk_speed;
        } else {
            walker.body.vel.x *= self.friction(dt);
        }
        if jump && walker.grounded {
            walker.body.vel.y = self.jump_velocity;
            walker.grounded = false;
            return true;
        }
        false
    }

    /// Gravity then position
    pub fn integrate(&self, walker: &mut Walker, dt: f32) {
        walker.body.vel.y += self.gravity * dt;
        walker.body.integrate(dt);
    }

    /// Push the walker out of every overlapping platform, then clamp to
    /// `[0, level_width - w]`. Grounded is recomputed from scratch.
    pub fn resolve(&self, walker: &mut Walker, platforms: &[Aabb], level_width: f32) {
        walker.grounded = false;
        for platform in platforms {
            if resolve_one(&mut walker.body, platform) {
                walker.grounded = true;
            }
        }
        walker.body.clamp_x(level_width);
    }
}

/// Returns true when the body landed on top of `platform`
fn resolve_one(body: &mut Body, platform: &Aabb) -> bool {
    if !body.bounds().intersects(platform) {
        return false;
    }
    let vel = body.vel;
    if vel.y > 0.0 && body.pos.y < platform.top() {
        body.pos.y = platform.top() - body.size.y;
        body.vel.y = 0.0;
        return true;
    }
    if vel.y < 0.0 && body.pos.y > platform.top() {
        body.pos.y = platform.bottom();
        body.vel.y = 0.0;
    } else if vel.x > 0.0 {
        body.pos.x = platform.left() - body.size.x;
    } else if vel.x < 0.0 {
        body.pos.x = platform.right();
    }
    false
}

/// Time-based motion patterns for pickups and patrol hazards.
///
/// Every pattern is a pure function of elapsed time, so evaluating it twice in
/// one tick cannot double-apply movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    Static,
    /// Vertical bob `base.y + sin(phase + rate·t)·amplitude`
    Float { amplitude: f32, rate: f32, phase: f32 },
    /// Horizontal sway `base.x + sin(phase + rate·t)·amplitude`
    Horizontal { amplitude: f32, rate: f32, phase: f32 },
    /// Ellipse around `base`
    Orbit { radius: Vec2, rate: f32, phase: f32 },
}

impl Motion {
    /// Position at `t` seconds for an entity anchored at `base`
    pub fn position(&self, base: Vec2, t: f32) -> Vec2 {
        match *self {
            Motion::Static => base,
            Motion::Float { amplitude, rate, phase } => {
                Vec2::new(base.x, base.y + (phase + rate * t).sin() * amplitude)
            }
            Motion::Horizontal { amplitude, rate, phase } => {
                Vec2::new(base.x + (phase + rate * t).sin() * amplitude, base.y)
            }
            Motion::Orbit { radius, rate, phase } => {
                let a = phase + rate * t;
                base + Vec2::new(a.cos() * radius.x, a.sin() * radius.y)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walker_at(x: f32, y: f32) -> Walker {
        Walker {
            body: Body::new(Vec2::new(x, y), Vec2::new(50.0, 80.0)),
            grounded: false,
        }
    }

    #[test]
    fn test_landing_snaps_to_surface() {
        let physics = PlatformPhysics::default();
        let floor = Aabb::new(0.0, 500.0, 400.0, 100.0);
        let mut w = walker_at(100.0, 425.0);
        w.body.vel.y = 300.0;
        physics.resolve(&mut w, &[floor], 1000.0);
        assert!(w.grounded);
        assert_eq!(w.body.pos.y, 420.0);
        assert_eq!(w.body.vel.y, 0.0);
    }

    #[test]
    fn test_ceiling_bump() {
        let physics = PlatformPhysics::default();
        let ledge = Aabb::new(0.0, 300.0, 400.0, 30.0);
        let mut w = walker_at(100.0, 320.0);
        w.body.vel.y = -400.0;
        physics.resolve(&mut w, &[ledge], 1000.0);
        assert_eq!(w.body.pos.y, 330.0);
        assert_eq!(w.body.vel.y, 0.0);
        assert!(!w.grounded);
    }

    #[test]
    fn test_wall_blocks_horizontal() {
        let physics = PlatformPhysics::default();
        let wall = Aabb::new(200.0, 0.0, 40.0, 1000.0);
        let mut w = walker_at(160.0, 400.0);
        w.body.vel.x = 300.0;
        physics.resolve(&mut w, &[wall], 1000.0);
        assert_eq!(w.body.pos.x, 150.0);
    }

    #[test]
    fn test_jump_requires_ground() {
        let physics = PlatformPhysics::default();
        let mut w = walker_at(0.0, 0.0);
        assert!(!physics.steer(&mut w, 0.0, true, 0.016));
        assert_eq!(w.body.vel.y, 0.0);
        w.grounded = true;
        assert!(physics.steer(&mut w, 0.0, true, 0.016));
        assert_eq!(w.body.vel.y, -720.0);
        assert!(!w.grounded);
    }

    #[test]
    fn test_friction_matches_legacy_frame() {
        let physics = PlatformPhysics::default();
        let mut w = walker_at(0.0, 0.0);
        w.body.vel.x = 300.0;
        physics.steer(&mut w, 0.0, false, 1.0 / 60.0);
        assert!((w.body.vel.x - 240.0).abs() < 1e-2);
    }

    #[test]
    fn test_clamp_after_resolution() {
        let physics = PlatformPhysics::default();
        let mut w = walker_at(-30.0, 0.0);
        physics.resolve(&mut w, &[], 1000.0);
        assert_eq!(w.body.pos.x, 0.0);
        w.body.pos.x = 990.0;
        physics.resolve(&mut w, &[], 1000.0);
        assert_eq!(w.body.pos.x, 950.0);
    }

    #[test]
    fn test_gravity_scales_with_dt() {
        let physics = PlatformPhysics::default();
        let mut w = walker_at(0.0, 0.0);
        physics.integrate(&mut w, 0.1);
        assert!((w.body.vel.y - 180.0).abs() < 1e-3);
        assert!((w.body.pos.y - 18.0).abs() < 1e-3);
    }

    #[test]
    fn test_motion_patterns() {
        let base = Vec2::new(100.0, 50.0);
        assert_eq!(Motion::Static.position(base, 3.0), base);
        let float = Motion::Float { amplitude: 30.0, rate: 3.0, phase: 0.0 };
        let p = float.position(base, std::f32::consts::FRAC_PI_2 / 3.0);
        assert!((p.y - 80.0).abs() < 1e-3);
        let orbit = Motion::Orbit { radius: Vec2::new(40.0, 25.0), rate: 1.2, phase: 0.0 };
        assert!((orbit.position(base, 0.0) - Vec2::new(140.0, 50.0)).length() < 1e-3);
    }
}
