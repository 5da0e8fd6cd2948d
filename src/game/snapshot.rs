//! Snapshot building - projects room state onto the wire schema

use crate::ws::protocol::{
    BombSnapshot, BulletSnapshot, PickupSnapshot, PlayerSnapshot, RankingEntry, RoomSnapshot,
    ServerMsg, SettingsView, WorldView,
};

use super::constants::PLAYER_MAX_HEALTH;
use super::player::Player;
use super::room::Room;

/// Builds snapshots for network transmission
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Full state of `room`. Pure; never mutates the room.
    pub fn build(room: &Room) -> RoomSnapshot {
        RoomSnapshot {
            room_code: room.code.clone(),
            host_id: room.host_id,
            state: room.state,
            settings: SettingsView {
                max_pickups: room.settings.max_pickups,
                round_duration_seconds: room.settings.round_duration_seconds,
                allowed_cards: room.settings.allowed_cards.clone(),
            },
            countdown_remaining: room.countdown_remaining,
            round_remaining: room.round_remaining,
            world: WorldView {
                width: room.world.width,
                height: room.world.height,
            },
            obstacles: room.world.obstacles,
            players: room.players.values().map(player_snapshot).collect(),
            pickups: room
                .pickups
                .iter()
                .map(|p| PickupSnapshot {
                    id: p.id,
                    card: p.card,
                    x: p.position.x,
                    y: p.position.y,
                })
                .collect(),
            bullets: room
                .projectiles
                .bullets
                .iter()
                .map(|b| BulletSnapshot {
                    id: b.id,
                    x: b.position.x,
                    y: b.position.y,
                })
                .collect(),
            bombs: room
                .projectiles
                .bombs
                .iter()
                .map(|b| BombSnapshot {
                    id: b.id,
                    x: b.position.x,
                    y: b.position.y,
                    z: b.arc_height(),
                })
                .collect(),
            ranking: room
                .ranking()
                .into_iter()
                .map(|p| RankingEntry {
                    id: p.id,
                    name: p.name.clone(),
                    kills: p.kills,
                    deaths: p.deaths,
                })
                .collect(),
        }
    }

    /// Build a snapshot message
    pub fn message(room: &Room) -> ServerMsg {
        ServerMsg::RoomSnapshot(Box::new(Self::build(room)))
    }
}

fn player_snapshot(p: &Player) -> PlayerSnapshot {
    PlayerSnapshot {
        id: p.id,
        name: p.name.clone(),
        x: p.position.x,
        y: p.position.y,
        health: p.health,
        max_health: PLAYER_MAX_HEALTH,
        kills: p.kills,
        deaths: p.deaths,
        alive: p.alive,
        inventory: p.inventory.to_vec(),
        facing_x: p.facing,
        vx: p.velocity.x,
        vy: p.velocity.y,
        on_ground: p.grounded,
        speed_buff: p.timers.speed_buffed(),
        sliding: p.timers.sliding(),
        jumping: !p.grounded,
    }
}
