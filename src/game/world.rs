//! Static arena geometry shared read-only by every room

use super::geometry::{Rect, Vec2};

/// Immutable map description
#[derive(Debug)]
pub struct World {
    pub width: f32,
    pub height: f32,
    pub obstacles: &'static [Rect],
    pub spawn_points: &'static [Vec2],
}

impl World {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Spawn point for the `index`-th assignment, wrapping around the list
    pub fn spawn_point(&self, index: usize) -> Vec2 {
        if self.spawn_points.is_empty() {
            return self.center();
        }
        self.spawn_points[index % self.spawn_points.len()]
    }
}

const ARENA_OBSTACLES: [Rect; 15] = [
    Rect::new(0.0, 240.0, 430.0, 34.0),
    Rect::new(1170.0, 240.0, 430.0, 34.0),
    Rect::new(0.0, 470.0, 410.0, 34.0),
    Rect::new(1170.0, 470.0, 430.0, 34.0),
    Rect::new(0.0, 705.0, 420.0, 36.0),
    Rect::new(1170.0, 705.0, 430.0, 36.0),
    Rect::new(525.0, 150.0, 150.0, 40.0),
    Rect::new(925.0, 150.0, 150.0, 40.0),
    Rect::new(525.0, 410.0, 140.0, 40.0),
    Rect::new(920.0, 410.0, 150.0, 40.0),
    Rect::new(515.0, 670.0, 140.0, 40.0),
    Rect::new(920.0, 670.0, 150.0, 40.0),
    Rect::new(748.0, 220.0, 70.0, 90.0),
    Rect::new(748.0, 470.0, 70.0, 95.0),
    Rect::new(740.0, 740.0, 85.0, 94.0),
];

const ARENA_SPAWNS: [Vec2; 6] = [
    Vec2::new(230.0, 175.0),
    Vec2::new(1370.0, 175.0),
    Vec2::new(1340.0, 395.0),
    Vec2::new(260.0, 395.0),
    Vec2::new(1335.0, 665.0),
    Vec2::new(235.0, 665.0),
];

/// The one arena every room plays on
pub static ARENA: World = World {
    width: 1600.0,
    height: 900.0,
    obstacles: &ARENA_OBSTACLES,
    spawn_points: &ARENA_SPAWNS,
};
