//! Pickup economy - timed spawning and proximity collection

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use super::cards::CardType;
use super::constants::{
    PICKUP_CLEARANCE_RADIUS, PICKUP_COLLECT_RADIUS, PICKUP_MARGIN_X, PICKUP_MARGIN_Y,
    PICKUP_PLACEMENT_ATTEMPTS, PICKUP_SPAWN_INTERVAL,
};
use super::geometry::Vec2;
use super::player::{Player, PlayerId};
use super::settings::RoomSettings;
use super::world::World;

#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: Uuid,
    pub card: CardType,
    pub position: Vec2,
}

/// Accumulates round time and signals when a spawn batch is due
#[derive(Debug, Default)]
pub struct SpawnClock {
    elapsed: f32,
}

impl SpawnClock {
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Returns true once per elapsed interval, carrying the remainder over
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= PICKUP_SPAWN_INTERVAL {
            self.elapsed -= PICKUP_SPAWN_INTERVAL;
            return true;
        }
        false
    }
}

pub struct PickupSystem;

impl PickupSystem {
    /// Add up to `amount` pickups without exceeding the configured cap
    pub fn spawn_batch<R: Rng>(
        pickups: &mut Vec<Pickup>,
        amount: usize,
        settings: &RoomSettings,
        world: &World,
        rng: &mut R,
    ) -> usize {
        let room_left = settings.max_pickups.saturating_sub(pickups.len());
        let count = amount.min(room_left);

        for _ in 0..count {
            let card = settings
                .allowed_cards
                .choose(rng)
                .copied()
                .unwrap_or(CardType::Shoot);
            pickups.push(Pickup {
                id: Uuid::new_v4(),
                card,
                position: Self::free_position(world, rng),
            });
        }

        Self::enforce_cap(pickups, settings.max_pickups);
        count
    }

    /// Drop the oldest pickups beyond `max`
    pub fn enforce_cap(pickups: &mut Vec<Pickup>, max: usize) {
        if pickups.len() > max {
            let excess = pickups.len() - max;
            pickups.drain(..excess);
        }
    }

    /// Rejection-sample a point clear of obstacles, falling back to the world center
    pub fn free_position<R: Rng>(world: &World, rng: &mut R) -> Vec2 {
        for _ in 0..PICKUP_PLACEMENT_ATTEMPTS {
            let candidate = Vec2::new(
                rng.gen_range(PICKUP_MARGIN_X..world.width - PICKUP_MARGIN_X),
                rng.gen_range(PICKUP_MARGIN_Y..world.height - PICKUP_MARGIN_Y),
            );
            let blocked = world
                .obstacles
                .iter()
                .any(|rect| rect.intersects_circle(candidate, PICKUP_CLEARANCE_RADIUS));
            if !blocked {
                return candidate;
            }
        }
        world.center()
    }

    /// Hand each pickup to the first living player in range with a free slot
    pub fn collect(pickups: &mut Vec<Pickup>, players: &mut BTreeMap<PlayerId, Player>) {
        if pickups.is_empty() {
            return;
        }

        pickups.retain(|pickup| {
            let collector = players.values_mut().find(|p| {
                p.alive
                    && p.free_slot().is_some()
                    && p.position.within(pickup.position, PICKUP_COLLECT_RADIUS)
            });
            match collector {
                Some(player) => {
                    if let Some(slot) = player.free_slot() {
                        player.inventory[slot] = Some(pickup.card);
                    }
                    false
                }
                None => true,
            }
        });
    }
}
