//! Room state and the authoritative per-room tick

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::util::time::clamped_delta;

use super::cards::CardType;
use super::combat::{CombatSystem, Projectiles};
use super::constants::{COUNTDOWN_SECONDS, MAX_PLAYERS, PICKUP_SPAWN_COUNT};
use super::geometry::Vec2;
use super::physics::PhysicsSystem;
use super::pickups::{Pickup, PickupSystem, SpawnClock};
use super::player::{Player, PlayerId};
use super::settings::{RoomSettings, SettingsUpdate};
use super::world::World;

/// Room lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    /// Lobby; accepting joins and settings changes
    Waiting,
    /// Short pause before the round
    Countdown,
    /// Round in progress
    Running,
    /// Round over; frozen until restart or close
    Ended,
}

/// One isolated match. Owns every entity inside it.
pub struct Room {
    pub code: String,
    pub host_id: PlayerId,
    pub state: RoomState,
    pub settings: RoomSettings,
    pub countdown_remaining: f32,
    pub round_remaining: f32,
    pub players: BTreeMap<PlayerId, Player>,
    pub pickups: Vec<Pickup>,
    pub projectiles: Projectiles,
    pub world: &'static World,
    spawn_clock: SpawnClock,
    spawn_cursor: usize,
    last_tick_at: Instant,
    rng: ChaCha8Rng,
}

impl Room {
    pub fn new(code: String, host_id: PlayerId, world: &'static World, seed: u64) -> Self {
        let settings = RoomSettings::default();
        Self {
            code,
            host_id,
            state: RoomState::Waiting,
            countdown_remaining: COUNTDOWN_SECONDS,
            round_remaining: settings.round_duration_seconds as f32,
            settings,
            players: BTreeMap::new(),
            pickups: Vec::new(),
            projectiles: Projectiles::default(),
            world,
            spawn_clock: SpawnClock::default(),
            spawn_cursor: 0,
            last_tick_at: Instant::now(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn is_host(&self, player_id: PlayerId) -> bool {
        self.host_id == player_id
    }

    pub fn member_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    /// Index of the next round-robin spawn assignment
    #[cfg(test)]
    pub fn spawn_cursor(&self) -> usize {
        self.spawn_cursor
    }

    /// Add a player at the next round-robin spawn point
    pub fn add_player(&mut self, id: PlayerId, name: &str) {
        let spawn = self.world.spawn_point(self.spawn_cursor);
        self.spawn_cursor += 1;
        self.players.insert(id, Player::new(id, name, spawn));
        if !self.players.contains_key(&self.host_id) {
            self.host_id = id;
        }
    }

    /// Remove a player, handing the host role to a remaining member.
    /// A room left empty mid-round is marked ended.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let removed = self.players.remove(&id)?;

        if self.players.is_empty() {
            if self.state != RoomState::Waiting {
                self.state = RoomState::Ended;
            }
            return Some(removed);
        }

        if self.host_id == id {
            if let Some(next) = self.players.keys().next() {
                self.host_id = *next;
                info!(room_code = %self.code, host_id = %self.host_id, "Host reassigned");
            }
        }

        Some(removed)
    }

    /// Host-only: begin a round from the lobby or after a finished round
    pub fn start(&mut self, by: PlayerId) -> bool {
        if !self.is_host(by) || !matches!(self.state, RoomState::Waiting | RoomState::Ended) {
            return false;
        }
        self.reset_round();
        true
    }

    /// Host-only: begin another round after one has ended
    pub fn restart(&mut self, by: PlayerId) -> bool {
        if !self.is_host(by) || self.state != RoomState::Ended {
            return false;
        }
        self.reset_round();
        true
    }

    /// Host-only, lobby-only settings change. Returns false when the request was not allowed.
    pub fn update_settings(&mut self, by: PlayerId, update: &SettingsUpdate) -> bool {
        if !self.is_host(by) || self.state != RoomState::Waiting {
            return false;
        }
        self.settings.apply(update);
        PickupSystem::enforce_cap(&mut self.pickups, self.settings.max_pickups);
        self.round_remaining = self.settings.round_duration_seconds as f32;
        true
    }

    /// Overwrite a player's pending input
    pub fn set_input(
        &mut self,
        id: PlayerId,
        move_x: Option<f64>,
        jump: bool,
        slide: bool,
        target_x: Option<f64>,
        target_y: Option<f64>,
    ) {
        if let Some(player) = self.players.get_mut(&id) {
            player.apply_input(move_x, jump, slide, target_x, target_y);
        }
    }

    /// Consume the card in `slot` and apply its effect. Only while running and alive.
    pub fn use_card(
        &mut self,
        id: PlayerId,
        slot: usize,
        target_x: Option<f64>,
        target_y: Option<f64>,
    ) -> Option<CardType> {
        if self.state != RoomState::Running {
            return None;
        }
        let player = self.players.get_mut(&id).filter(|p| p.alive)?;
        let target = player.resolve_target(target_x, target_y);
        let card = player.take_card(slot)?;

        let aim = Vec2::new(target.x - player.position.x, target.y - player.position.y).normalized();
        card.apply(player, aim, &mut self.projectiles);

        debug!(room_code = %self.code, player_id = %id, card = card.as_str(), "Card used");
        Some(card)
    }

    /// Reset everything for a fresh round and enter the countdown
    fn reset_round(&mut self) {
        self.state = RoomState::Countdown;
        self.countdown_remaining = COUNTDOWN_SECONDS;
        self.round_remaining = self.settings.round_duration_seconds as f32;
        self.spawn_clock.reset();
        self.pickups.clear();
        self.projectiles.clear();
        self.last_tick_at = Instant::now();

        let mut index = 0;
        for player in self.players.values_mut() {
            player.reset_for_round(self.world.spawn_point(index));
            index += 1;
        }
        self.spawn_cursor = index;

        info!(room_code = %self.code, players = self.players.len(), "Round countdown started");
    }

    /// Advance using wall-clock time since the previous tick
    pub fn tick(&mut self, now: Instant) {
        let dt = clamped_delta(self.last_tick_at, now);
        self.last_tick_at = now;
        self.advance(dt);
    }

    /// Advance the room by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        match self.state {
            RoomState::Waiting | RoomState::Ended => {}
            RoomState::Countdown => {
                self.countdown_remaining = (self.countdown_remaining - dt).max(0.0);
                if self.countdown_remaining <= 0.0 {
                    self.begin_round();
                }
            }
            RoomState::Running => self.run_simulation(dt),
        }
    }

    fn begin_round(&mut self) {
        self.state = RoomState::Running;
        self.round_remaining = self.settings.round_duration_seconds as f32;
        self.spawn_clock.reset();
        PickupSystem::spawn_batch(
            &mut self.pickups,
            PICKUP_SPAWN_COUNT,
            &self.settings,
            self.world,
            &mut self.rng,
        );
        info!(room_code = %self.code, "Round started");
    }

    fn run_simulation(&mut self, dt: f32) {
        self.round_remaining = (self.round_remaining - dt).max(0.0);

        if self.spawn_clock.advance(dt) {
            PickupSystem::spawn_batch(
                &mut self.pickups,
                PICKUP_SPAWN_COUNT,
                &self.settings,
                self.world,
                &mut self.rng,
            );
        }

        for player in self.players.values_mut() {
            if player.alive {
                PhysicsSystem::step_player(player, self.world, dt);
            } else if player.tick_respawn(dt) {
                player.respawn(self.world.spawn_point(self.spawn_cursor));
                self.spawn_cursor += 1;
            }
        }

        CombatSystem::update_bullets(
            &mut self.projectiles.bullets,
            &mut self.players,
            self.world,
            dt,
        );
        CombatSystem::update_bombs(&mut self.projectiles.bombs, &mut self.players, dt);
        PickupSystem::collect(&mut self.pickups, &mut self.players);

        if self.round_remaining <= 0.0 {
            self.state = RoomState::Ended;
            info!(room_code = %self.code, "Round ended");
        }
    }

    /// Players ordered by kills (desc), deaths (asc), then name ignoring case
    pub fn ranking(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players.values().collect();
        ranked.sort_by(|a, b| {
            b.kills
                .cmp(&a.kills)
                .then(a.deaths.cmp(&b.deaths))
                .then_with(|| compare_names(&a.name, &b.name))
        });
        ranked
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{PLAYER_MAX_HEALTH, RESPAWN_SECONDS};
    use crate::game::snapshot::SnapshotBuilder;
    use crate::game::world::ARENA;
    use uuid::Uuid;

    const DT: f32 = 0.05;

    fn room_with(n: usize) -> (Room, Vec<PlayerId>) {
        let ids: Vec<PlayerId> = (0..n).map(|_| Uuid::new_v4()).collect();
        let mut room = Room::new("ABCD".to_string(), ids[0], &ARENA, 42);
        for (i, id) in ids.iter().enumerate() {
            room.add_player(*id, &format!("player{}", i));
        }
        (room, ids)
    }

    fn run_for(room: &mut Room, seconds: f32) {
        let ticks = (seconds / DT).ceil() as usize + 1;
        for _ in 0..ticks {
            room.advance(DT);
        }
    }

    fn running_room(n: usize) -> (Room, Vec<PlayerId>) {
        let (mut room, ids) = room_with(n);
        assert!(room.start(ids[0]));
        run_for(&mut room, COUNTDOWN_SECONDS);
        assert_eq!(room.state, RoomState::Running);
        (room, ids)
    }

    #[test]
    fn joins_take_spawn_points_round_robin() {
        let (room, ids) = room_with(6);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(room.players[id].position, ARENA.spawn_point(i));
        }
        assert!(room.is_full());
        assert_eq!(room.spawn_cursor(), 6);
    }

    #[test]
    fn start_runs_countdown_then_round() {
        let (mut room, ids) = room_with(2);
        assert!(!room.start(ids[1]), "only the host may start");
        assert!(room.start(ids[0]));
        assert_eq!(room.state, RoomState::Countdown);
        assert_eq!(room.countdown_remaining, 3.0);

        room.advance(1.0);
        assert_eq!(room.state, RoomState::Countdown);

        run_for(&mut room, 2.0);
        assert_eq!(room.state, RoomState::Running);
        assert!(room.round_remaining > 119.0 && room.round_remaining <= 120.0);
        assert!(!room.pickups.is_empty());
    }

    #[test]
    fn round_ends_when_timer_runs_out() {
        let (mut room, ids) = running_room(2);
        run_for(&mut room, 121.0);
        assert_eq!(room.state, RoomState::Ended);
        assert_eq!(room.round_remaining, 0.0);
        assert!(room.pickups.len() <= room.settings.max_pickups);

        // Frozen while ended
        let before = room.players[&ids[0]].position;
        room.advance(DT);
        assert_eq!(room.players[&ids[0]].position, before);

        assert!(!room.restart(ids[1]));
        assert!(room.restart(ids[0]));
        assert_eq!(room.state, RoomState::Countdown);
        assert!(room.pickups.is_empty());
    }

    #[test]
    fn settings_only_change_in_lobby_by_host() {
        let (mut room, ids) = room_with(2);
        let update = SettingsUpdate {
            round_duration_seconds: Some(180.0),
            ..SettingsUpdate::default()
        };
        assert!(!room.update_settings(ids[1], &update));
        assert!(room.update_settings(ids[0], &update));
        assert_eq!(room.settings.round_duration_seconds, 180);
        assert_eq!(room.round_remaining, 180.0);

        room.start(ids[0]);
        let update = SettingsUpdate {
            round_duration_seconds: Some(300.0),
            ..SettingsUpdate::default()
        };
        assert!(!room.update_settings(ids[0], &update));
        assert_eq!(room.settings.round_duration_seconds, 180);
    }

    #[test]
    fn shrinking_cap_evicts_oldest_pickups() {
        let (mut room, ids) = room_with(1);
        room.settings.max_pickups = 9;
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        PickupSystem::spawn_batch(&mut room.pickups, 9, &room.settings, &ARENA, &mut rng);
        let newest = room.pickups.last().map(|p| p.id);

        room.update_settings(
            ids[0],
            &SettingsUpdate {
                max_pickups: Some(6.0),
                ..SettingsUpdate::default()
            },
        );
        assert_eq!(room.pickups.len(), 6);
        assert_eq!(room.pickups.last().map(|p| p.id), newest);
    }

    #[test]
    fn use_card_consumes_exactly_once() {
        let (mut room, ids) = running_room(2);
        let shooter = ids[0];
        room.players.get_mut(&shooter).unwrap().inventory[1] = Some(CardType::Shoot);

        assert_eq!(room.use_card(shooter, 1, Some(0.0), Some(0.0)), Some(CardType::Shoot));
        assert_eq!(room.use_card(shooter, 1, Some(0.0), Some(0.0)), None);
        assert_eq!(room.use_card(shooter, 0, None, None), None);
        assert_eq!(room.use_card(shooter, 9, None, None), None);
        assert_eq!(room.projectiles.bullets.len(), 1);
        assert_eq!(room.players[&shooter].inventory[1], None);
    }

    #[test]
    fn overflowing_aim_yields_finite_projectiles() {
        let (mut room, ids) = running_room(2);
        let thrower = ids[0];
        let player = room.players.get_mut(&thrower).unwrap();
        player.inventory[0] = Some(CardType::Shoot);
        player.inventory[1] = Some(CardType::Bomb);

        assert_eq!(room.use_card(thrower, 0, Some(1e300), Some(400.0)), Some(CardType::Shoot));
        assert_eq!(room.use_card(thrower, 1, Some(1e30), Some(-1e300)), Some(CardType::Bomb));

        let bullet = &room.projectiles.bullets[0];
        assert!(bullet.position.x.is_finite() && bullet.position.y.is_finite());
        assert!(bullet.velocity.x.is_finite() && bullet.velocity.y.is_finite());
        assert!(bullet.velocity.length() > 0.0);
        let bomb = &room.projectiles.bombs[0];
        assert!(bomb.position.x.is_finite() && bomb.position.y.is_finite());

        let json = serde_json::to_value(SnapshotBuilder::build(&room)).unwrap();
        assert!(json["bullets"][0]["x"].is_number());
        assert!(json["bombs"][0]["x"].is_number());
    }

    #[test]
    fn use_card_requires_running_and_alive() {
        let (mut room, ids) = room_with(2);
        room.players.get_mut(&ids[0]).unwrap().inventory[0] = Some(CardType::Heal);
        assert_eq!(room.use_card(ids[0], 0, None, None), None);
        assert_eq!(room.players[&ids[0]].inventory[0], Some(CardType::Heal));

        let (mut room, ids) = running_room(2);
        let player = room.players.get_mut(&ids[0]).unwrap();
        player.inventory[0] = Some(CardType::Heal);
        player.die();
        assert_eq!(room.use_card(ids[0], 0, None, None), None);
    }

    #[test]
    fn dead_player_respawns_round_robin_after_delay() {
        let (mut room, ids) = running_room(2);
        let victim = ids[1];
        CombatSystem::apply_damage(&mut room.players, victim, PLAYER_MAX_HEALTH, Some(ids[0]));
        let died_at = room.players[&victim].position;
        let cursor = room.spawn_cursor();

        run_for(&mut room, RESPAWN_SECONDS / 2.0);
        assert!(!room.players[&victim].alive);
        assert_eq!(room.players[&victim].position, died_at);

        run_for(&mut room, RESPAWN_SECONDS / 2.0);
        let p = &room.players[&victim];
        assert!(p.alive);
        assert_eq!(p.health, PLAYER_MAX_HEALTH);
        assert_eq!(room.spawn_cursor(), cursor + 1);
        assert_eq!(room.players[&ids[0]].kills, 1);
    }

    #[test]
    fn health_stays_in_range_under_fire() {
        let (mut room, ids) = running_room(2);
        let (a, b) = (ids[0], ids[1]);
        // Park both players on the same floor, facing each other
        room.players.get_mut(&a).unwrap().position = Vec2::new(200.0, 876.0);
        room.players.get_mut(&b).unwrap().position = Vec2::new(260.0, 876.0);
        for _ in 0..200 {
            if let Some(p) = room.players.get_mut(&a) {
                p.inventory[0] = Some(CardType::Shoot);
            }
            room.use_card(a, 0, Some(260.0), Some(876.0));
            room.advance(DT);
            for p in room.players.values() {
                assert!(p.health >= 0.0 && p.health <= PLAYER_MAX_HEALTH);
            }
        }
        assert!(room.players[&b].deaths >= 1);
    }

    #[test]
    fn host_leaving_hands_over_and_empty_room_ends() {
        let (mut room, ids) = running_room(2);
        assert!(room.remove_player(ids[0]).is_some());
        assert_eq!(room.host_id, ids[1]);
        assert!(room.remove_player(ids[0]).is_none());

        room.remove_player(ids[1]);
        assert!(room.is_empty());
        assert_eq!(room.state, RoomState::Ended);
    }

    #[test]
    fn ranking_orders_by_kills_then_deaths_then_name() {
        let (mut room, ids) = room_with(3);
        for (id, name, kills, deaths) in [
            (ids[0], "carol", 2, 1),
            (ids[1], "alice", 2, 1),
            (ids[2], "bob", 2, 0),
        ] {
            let p = room.players.get_mut(&id).unwrap();
            p.name = name.to_string();
            p.kills = kills;
            p.deaths = deaths;
        }
        let names: Vec<&str> = room.ranking().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "alice", "carol"]);
    }

    #[test]
    fn ranking_names_ignore_case() {
        let (mut room, ids) = room_with(3);
        for (id, name) in [(ids[0], "bob"), (ids[1], "Alice"), (ids[2], "alice")] {
            room.players.get_mut(&id).unwrap().name = name.to_string();
        }
        let names: Vec<&str> = room.ranking().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "alice", "bob"]);
    }
}
