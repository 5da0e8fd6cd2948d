//! Platformer movement: jumps, wall jumps, slides and obstacle resolution

use super::constants::{
    AIM_FACING_THRESHOLD, AIRBORNE_SPEED_FACTOR, BASE_SPEED, GRAVITY, JUMP_COOLDOWN_SECONDS,
    JUMP_SECONDS, JUMP_VELOCITY, MAX_FALL_SPEED, MOVE_DEADZONE, PLAYER_HALF_HEIGHT,
    PLAYER_HALF_WIDTH, PLAYER_SLIDE_HALF_HEIGHT, SLIDE_SPEED, SPEED_BUFF_MULTIPLIER,
    WALL_CONTACT_TOLERANCE, WALL_JUMP_COOLDOWN_SECONDS, WALL_JUMP_HORIZONTAL_SPEED,
    WALL_JUMP_LOCK_SECONDS, WALL_JUMP_VELOCITY, WORLD_EDGE_TOLERANCE,
};
use super::geometry::{clamp, sign_or, Vec2};
use super::player::Player;
use super::world::World;

/// Which sides of the player are touching a wall
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContacts {
    pub left: bool,
    pub right: bool,
}

impl WallContacts {
    pub fn any(self) -> bool {
        self.left || self.right
    }

    /// Launch direction away from the touched wall; away from `facing` when both are touched
    pub fn jump_direction(self, facing: f32) -> f32 {
        match (self.left, self.right) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => sign_or(-facing, 1.0),
        }
    }
}

/// Physics system for integrating living players
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance one living player by `dt` seconds. Dead players are left untouched.
    pub fn step_player(player: &mut Player, world: &World, dt: f32) {
        if !player.alive {
            return;
        }

        player.timers.advance(dt);
        Self::try_stand(player, world);

        let move_x = clamp(player.input.move_x, -1.0, 1.0);
        Self::update_facing(player, move_x);

        if player.input.jump {
            Self::try_jump(player, world);
        }

        if player.input.slide && player.grounded && player.timers.slide_cooldown <= 0.0 {
            let dir = if move_x.abs() > MOVE_DEADZONE {
                sign_or(move_x, 1.0)
            } else {
                sign_or(player.facing, 1.0)
            };
            player.start_slide(dir);
        }

        let mut speed = BASE_SPEED;
        if player.timers.speed_buffed() {
            speed *= SPEED_BUFF_MULTIPLIER;
        }
        if !player.grounded {
            speed *= AIRBORNE_SPEED_FACTOR;
        }

        player.velocity.x = if player.timers.sliding() {
            player.slide_dir * SLIDE_SPEED
        } else if player.timers.wall_jump_locked() {
            player.wall_jump_dir * WALL_JUMP_HORIZONTAL_SPEED
        } else {
            move_x * speed
        };
        player.velocity.y = (player.velocity.y + GRAVITY * dt).min(MAX_FALL_SPEED);

        Self::integrate(player, world, dt);
    }

    /// Leave the slide hitbox once the slide is over and nothing blocks the
    /// standing box. Grounded players keep their feet in place.
    fn try_stand(player: &mut Player, world: &World) {
        if !player.crouched || player.timers.sliding() {
            return;
        }
        let lift = if player.grounded {
            PLAYER_HALF_HEIGHT - PLAYER_SLIDE_HALF_HEIGHT
        } else {
            0.0
        };
        let standing = Vec2::new(player.position.x, player.position.y - lift);
        let blocked = world
            .obstacles
            .iter()
            .any(|rect| rect.intersects_box(standing, PLAYER_HALF_WIDTH, PLAYER_HALF_HEIGHT));
        if !blocked {
            player.crouched = false;
            player.position = standing;
        }
    }

    fn update_facing(player: &mut Player, move_x: f32) {
        let aim_dx = player.input.target.x - player.position.x;
        if move_x.abs() > MOVE_DEADZONE {
            player.facing = sign_or(move_x, player.facing);
        } else if aim_dx.abs() > AIM_FACING_THRESHOLD {
            player.facing = sign_or(aim_dx, player.facing);
        }
    }

    /// Ground jump when possible, otherwise a wall jump if touching a wall
    fn try_jump(player: &mut Player, world: &World) {
        if player.grounded {
            if player.timers.jump_cooldown <= 0.0 {
                player.velocity.y = JUMP_VELOCITY;
                player.grounded = false;
                player.timers.jump = JUMP_SECONDS;
                player.timers.jump_cooldown = JUMP_COOLDOWN_SECONDS;
            }
            return;
        }

        if player.timers.wall_jump_cooldown > 0.0 {
            return;
        }

        let contacts = Self::wall_contacts(player, world);
        if !contacts.any() {
            return;
        }

        let dir = contacts.jump_direction(player.facing);
        player.velocity.x = dir * WALL_JUMP_HORIZONTAL_SPEED;
        player.velocity.y = WALL_JUMP_VELOCITY;
        player.facing = dir;
        player.wall_jump_dir = dir;
        player.timers.wall_jump_lock = WALL_JUMP_LOCK_SECONDS;
        player.timers.wall_jump_cooldown = WALL_JUMP_COOLDOWN_SECONDS;
        player.timers.jump = JUMP_SECONDS;
    }

    /// Detect walls beside the player within a small tolerance band
    pub fn wall_contacts(player: &Player, world: &World) -> WallContacts {
        let half_h = player.half_height();
        let left = player.position.x - PLAYER_HALF_WIDTH;
        let right = player.position.x + PLAYER_HALF_WIDTH;
        let top = player.position.y - half_h + 2.0;
        let bottom = player.position.y + half_h - 2.0;

        let mut contacts = WallContacts {
            left: left <= WORLD_EDGE_TOLERANCE,
            right: right >= world.width - WORLD_EDGE_TOLERANCE,
        };

        for rect in world.obstacles {
            if bottom <= rect.y + 1.0 || top >= rect.bottom() - 1.0 {
                continue;
            }
            if (left - rect.right()).abs() <= WALL_CONTACT_TOLERANCE {
                contacts.left = true;
            }
            if (right - rect.x).abs() <= WALL_CONTACT_TOLERANCE {
                contacts.right = true;
            }
        }

        contacts
    }

    /// Move along X then Y, resolving each axis against bounds and obstacles
    fn integrate(player: &mut Player, world: &World, dt: f32) {
        let half_w = PLAYER_HALF_WIDTH;
        let half_h = player.half_height();

        let mut next = player.position;
        next.x = clamp(
            player.position.x + player.velocity.x * dt,
            half_w,
            world.width - half_w,
        );
        for rect in world.obstacles {
            if !rect.intersects_box(next, half_w, half_h) {
                continue;
            }
            if player.velocity.x > 0.0 {
                next.x = rect.x - half_w;
            } else if player.velocity.x < 0.0 {
                next.x = rect.right() + half_w;
            }
        }
        player.position.x = next.x;

        next.y = player.position.y + player.velocity.y * dt;
        player.grounded = false;

        if next.y >= world.height - half_h {
            next.y = world.height - half_h;
            player.velocity.y = 0.0;
            player.grounded = true;
        } else if next.y <= half_h {
            next.y = half_h;
            player.velocity.y = 0.0;
        }

        for rect in world.obstacles {
            if !rect.intersects_box(next, half_w, half_h) {
                continue;
            }
            if player.velocity.y > 0.0 {
                next.y = rect.y - half_h;
                player.velocity.y = 0.0;
                player.grounded = true;
            } else if player.velocity.y < 0.0 {
                next.y = rect.bottom() + half_h;
                player.velocity.y = 0.0;
            }
        }
        player.position.y = next.y;
    }
}
