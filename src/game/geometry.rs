//! Geometry helpers shared by movement, combat and pickup placement

use serde::Serialize;

/// 2D vector in world units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or zero for near-zero input
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len < 0.0001 {
            return Vec2::ZERO;
        }
        Vec2::new(self.x / len, self.y / len)
    }

    pub fn distance_squared(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn within(self, other: Vec2, radius: f32) -> bool {
        self.distance_squared(other) <= radius * radius
    }
}

/// Axis-aligned rectangle anchored at its top-left corner (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Strict overlap test against a box centred at `center`; touching edges do not count.
    pub fn intersects_box(&self, center: Vec2, half_w: f32, half_h: f32) -> bool {
        let left = center.x - half_w;
        let right = center.x + half_w;
        let top = center.y - half_h;
        let bottom = center.y + half_h;
        !(right <= self.x || left >= self.right() || bottom <= self.y || top >= self.bottom())
    }

    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = Vec2::new(
            clamp(center.x, self.x, self.right()),
            clamp(center.y, self.y, self.bottom()),
        );
        center.within(closest, radius)
    }
}

/// `f32::clamp` without the `min <= max` panic
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Sign as ±1 with zero mapped to `fallback`
pub fn sign_or(value: f32, fallback: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizing_tiny_vectors_yields_zero() {
        assert_eq!(Vec2::new(0.00001, 0.0).normalized(), Vec2::ZERO);
        let n = Vec2::new(3.0, 4.0).normalized();
        assert!((n.x - 0.6).abs() < 1e-6);
        assert!((n.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn box_touching_edge_does_not_intersect() {
        let rect = Rect::new(100.0, 100.0, 50.0, 20.0);
        // Bottom edge of box sits exactly on top of rect
        assert!(!rect.intersects_box(Vec2::new(120.0, 76.0), 14.0, 24.0));
        assert!(rect.intersects_box(Vec2::new(120.0, 77.0), 14.0, 24.0));
        assert!(!rect.intersects_box(Vec2::new(164.0, 110.0), 14.0, 24.0));
    }

    #[test]
    fn circle_against_rect_uses_closest_point() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.intersects_circle(Vec2::new(13.0, 5.0), 3.0));
        assert!(!rect.intersects_circle(Vec2::new(13.1, 5.0), 3.0));
        // Corner distance is sqrt(2) * 3 > 3
        assert!(!rect.intersects_circle(Vec2::new(13.0, 13.0), 3.0));
        assert!(rect.intersects_circle(Vec2::new(5.0, 5.0), 0.5));
    }

    #[test]
    fn clamp_and_sign() {
        assert_eq!(clamp(5.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, -1.0, 1.0), -1.0);
        assert_eq!(sign_or(0.0, -1.0), -1.0);
        assert_eq!(sign_or(-0.2, 1.0), -1.0);
    }
}
