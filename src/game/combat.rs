//! Combat system - projectiles, lobbed charges, damage

use std::collections::BTreeMap;

use tracing::debug;
use uuid::Uuid;

use super::constants::{
    BOMB_ARC_HEIGHT, BOMB_BLAST_RADIUS, BOMB_DAMAGE, BOMB_FLIGHT_SECONDS, BOMB_SPAWN_OFFSET,
    BOMB_SPEED, BULLET_BOUNDS_MARGIN, BULLET_DAMAGE, BULLET_LIFE_SECONDS, BULLET_RADIUS,
    BULLET_SPAWN_OFFSET, BULLET_SPEED, PLAYER_RADIUS,
};
use super::geometry::{clamp, Vec2};
use super::player::{Player, PlayerId};
use super::world::World;

/// Straight-flying single-target projectile
#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: Uuid,
    pub owner_id: PlayerId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub life: f32,
    pub damage: f32,
}

impl Bullet {
    /// Spawn a bullet in front of `origin` along the unit vector `dir`
    pub fn fire(owner_id: PlayerId, origin: Vec2, dir: Vec2) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            position: Vec2::new(
                origin.x + dir.x * BULLET_SPAWN_OFFSET,
                origin.y + dir.y * BULLET_SPAWN_OFFSET,
            ),
            velocity: Vec2::new(dir.x * BULLET_SPEED, dir.y * BULLET_SPEED),
            life: BULLET_LIFE_SECONDS,
            damage: BULLET_DAMAGE,
        }
    }

    fn out_of_bounds(&self, world: &World) -> bool {
        self.position.x < -BULLET_BOUNDS_MARGIN
            || self.position.y < -BULLET_BOUNDS_MARGIN
            || self.position.x > world.width + BULLET_BOUNDS_MARGIN
            || self.position.y > world.height + BULLET_BOUNDS_MARGIN
    }
}

/// Lobbed area charge; ignores terrain and detonates when its flight ends
#[derive(Debug, Clone)]
pub struct Bomb {
    pub id: Uuid,
    pub owner_id: PlayerId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub elapsed: f32,
    pub flight: f32,
    pub damage: f32,
    pub radius: f32,
}

impl Bomb {
    pub fn lob(owner_id: PlayerId, origin: Vec2, dir: Vec2) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            position: Vec2::new(
                origin.x + dir.x * BOMB_SPAWN_OFFSET,
                origin.y + dir.y * BOMB_SPAWN_OFFSET,
            ),
            velocity: Vec2::new(dir.x * BOMB_SPEED, dir.y * BOMB_SPEED),
            elapsed: 0.0,
            flight: BOMB_FLIGHT_SECONDS,
            damage: BOMB_DAMAGE,
            radius: BOMB_BLAST_RADIUS,
        }
    }

    /// Display-only height of the parabolic arc
    pub fn arc_height(&self) -> f32 {
        let t = clamp(self.elapsed / self.flight, 0.0, 1.0);
        BOMB_ARC_HEIGHT * (4.0 * t * (1.0 - t))
    }
}

/// Live projectiles owned by a room
#[derive(Debug, Default)]
pub struct Projectiles {
    pub bullets: Vec<Bullet>,
    pub bombs: Vec<Bomb>,
}

impl Projectiles {
    pub fn clear(&mut self) {
        self.bullets.clear();
        self.bombs.clear();
    }
}

/// What a single damage application did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target missing or already dead
    Ignored,
    Wounded,
    Killed,
}

/// Combat system for advancing projectiles and resolving damage
pub struct CombatSystem;

impl CombatSystem {
    /// Apply `damage` to `target_id`, crediting a kill to `attacker_id` when it
    /// is a different, living player.
    pub fn apply_damage(
        players: &mut BTreeMap<PlayerId, Player>,
        target_id: PlayerId,
        damage: f32,
        attacker_id: Option<PlayerId>,
    ) -> DamageOutcome {
        let Some(target) = players.get_mut(&target_id) else {
            return DamageOutcome::Ignored;
        };
        if !target.alive {
            return DamageOutcome::Ignored;
        }

        target.health = (target.health - damage).max(0.0);
        target.last_damaged_by = attacker_id;
        if target.health > 0.0 {
            return DamageOutcome::Wounded;
        }

        target.die();

        if let Some(attacker_id) = attacker_id.filter(|id| *id != target_id) {
            if let Some(attacker) = players.get_mut(&attacker_id).filter(|a| a.alive) {
                attacker.kills += 1;
            }
        }
        debug!(victim_id = %target_id, killer_id = ?attacker_id, "Player killed");
        DamageOutcome::Killed
    }

    /// Advance bullets one tick. Each bullet is checked in order: lifetime,
    /// world bounds, obstacles, then players (first overlap wins).
    pub fn update_bullets(
        bullets: &mut Vec<Bullet>,
        players: &mut BTreeMap<PlayerId, Player>,
        world: &World,
        dt: f32,
    ) {
        let mut survivors = Vec::with_capacity(bullets.len());

        for mut bullet in bullets.drain(..) {
            bullet.life -= dt;
            if bullet.life <= 0.0 {
                continue;
            }

            bullet.position.x += bullet.velocity.x * dt;
            bullet.position.y += bullet.velocity.y * dt;

            if bullet.out_of_bounds(world) {
                continue;
            }

            if world
                .obstacles
                .iter()
                .any(|rect| rect.intersects_circle(bullet.position, BULLET_RADIUS))
            {
                continue;
            }

            let target = players
                .values()
                .find(|p| {
                    p.alive
                        && p.id != bullet.owner_id
                        && p.position.within(bullet.position, PLAYER_RADIUS + BULLET_RADIUS)
                })
                .map(|p| p.id);

            match target {
                Some(target_id) => {
                    Self::apply_damage(players, target_id, bullet.damage, Some(bullet.owner_id));
                }
                None => survivors.push(bullet),
            }
        }

        *bullets = survivors;
    }

    /// Advance bombs one tick, detonating those whose flight has ended
    pub fn update_bombs(
        bombs: &mut Vec<Bomb>,
        players: &mut BTreeMap<PlayerId, Player>,
        dt: f32,
    ) {
        let mut survivors = Vec::with_capacity(bombs.len());

        for mut bomb in bombs.drain(..) {
            bomb.elapsed += dt;
            bomb.position.x += bomb.velocity.x * dt;
            bomb.position.y += bomb.velocity.y * dt;

            if bomb.elapsed >= bomb.flight {
                Self::detonate(&bomb, players);
            } else {
                survivors.push(bomb);
            }
        }

        *bombs = survivors;
    }

    fn detonate(bomb: &Bomb, players: &mut BTreeMap<PlayerId, Player>) {
        let victims: Vec<PlayerId> = players
            .values()
            .filter(|p| {
                p.alive && p.id != bomb.owner_id && p.position.within(bomb.position, bomb.radius)
            })
            .map(|p| p.id)
            .collect();

        for victim in victims {
            Self::apply_damage(players, victim, bomb.damage, Some(bomb.owner_id));
        }
    }
}
