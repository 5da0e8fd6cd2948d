//! Room registry and the lobby-level operations on it
//!
//! Every operation runs to completion under the caller's lock and returns an
//! [`Outbox`] of messages to deliver afterwards.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::game::constants::{MAX_PLAYERS, ROOM_CODE_ALPHABET, ROOM_CODE_LEN};
use crate::game::settings::SettingsUpdate;
use crate::game::world::{World, ARENA};
use crate::game::{PlayerId, Room, RoomState, SnapshotBuilder};
use crate::ws::protocol::{ClientMsg, LobbyRoom, ServerMsg};

use super::outbox::Outbox;

/// Why a join request was refused. The message is shown to the player as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("Room not found.")]
    NotFound,

    #[error("Room has already started.")]
    AlreadyStarted,

    #[error("Room is full.")]
    Full,
}

pub const ROOM_CLOSED_TEXT: &str = "The host closed the room.";

/// Owns every room plus the player -> room index
pub struct RoomManager {
    rooms: BTreeMap<String, Room>,
    player_rooms: HashMap<PlayerId, String>,
    rng: ChaCha8Rng,
    world: &'static World,
}

impl RoomManager {
    pub fn new(seed: u64) -> Self {
        Self {
            rooms: BTreeMap::new(),
            player_rooms: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            world: &ARENA,
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    #[cfg(test)]
    pub fn room(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    #[cfg(test)]
    pub fn room_of(&self, player_id: PlayerId) -> Option<&Room> {
        let code = self.player_rooms.get(&player_id)?;
        self.rooms.get(code)
    }

    fn room_of_mut(&mut self, player_id: PlayerId) -> Option<&mut Room> {
        let code = self.player_rooms.get(&player_id)?;
        self.rooms.get_mut(code)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Players currently seated in some room
    pub fn player_count(&self) -> usize {
        self.player_rooms.len()
    }

    /// Rooms still accepting players
    pub fn lobby_listing(&self) -> Vec<LobbyRoom> {
        self.rooms
            .values()
            .filter(|room| room.state == RoomState::Waiting)
            .map(|room| LobbyRoom {
                room_code: room.code.clone(),
                players: room.player_count(),
                max_players: MAX_PLAYERS,
            })
            .collect()
    }

    fn lobby_message(&self) -> ServerMsg {
        ServerMsg::LobbyRooms {
            rooms: self.lobby_listing(),
        }
    }

    fn push_snapshot(&self, code: &str, out: &mut Outbox) {
        if let Some(room) = self.rooms.get(code) {
            out.to_players(room.member_ids(), SnapshotBuilder::message(room));
        }
    }

    /// Greeting for a freshly connected session
    pub fn connect(&self, player_id: PlayerId) -> Outbox {
        let mut out = Outbox::new();
        out.to_player(player_id, self.lobby_message());
        out
    }

    /// Disconnects take the same path as an explicit leave
    pub fn disconnect(&mut self, player_id: PlayerId) -> Outbox {
        self.leave(player_id)
    }

    /// Apply one client message from `player_id`
    pub fn dispatch(&mut self, player_id: PlayerId, msg: ClientMsg) -> Outbox {
        match msg {
            ClientMsg::CreateRoom { name } => {
                self.create_room(player_id, name.as_deref().unwrap_or_default())
            }
            ClientMsg::JoinRoom { room_code, name } => {
                let code = room_code.unwrap_or_default();
                match self.join_room(player_id, &code, name.as_deref().unwrap_or_default()) {
                    Ok(out) => out,
                    Err(err) => {
                        debug!(player_id = %player_id, room_code = %code, error = %err, "Join refused");
                        let mut out = Outbox::new();
                        out.to_player(
                            player_id,
                            ServerMsg::ErrorMessage {
                                text: err.to_string(),
                            },
                        );
                        out
                    }
                }
            }
            ClientMsg::LeaveRoom {} => self.leave(player_id),
            ClientMsg::StartGame {} => self.start_game(player_id),
            ClientMsg::RestartGame {} => self.restart_game(player_id),
            ClientMsg::CloseRoom {} => self.close_room(player_id),
            ClientMsg::UpdateRoomSettings {
                max_pickups,
                round_duration_seconds,
                allowed_cards,
            } => self.update_settings(
                player_id,
                &SettingsUpdate {
                    max_pickups,
                    round_duration_seconds,
                    allowed_cards,
                },
            ),
            ClientMsg::InputState {
                move_x,
                jump,
                slide,
                target_x,
                target_y,
            } => {
                self.input_state(player_id, move_x, jump, slide, target_x, target_y);
                Outbox::new()
            }
            ClientMsg::UseCard {
                slot,
                target_x,
                target_y,
            } => {
                self.use_card(player_id, slot, target_x, target_y);
                Outbox::new()
            }
        }
    }

    /// Open a new waiting room with the caller as host, leaving any previous room
    pub fn create_room(&mut self, player_id: PlayerId, name: &str) -> Outbox {
        let mut out = Outbox::new();
        self.detach(player_id, &mut out);

        let code = self.generate_code();
        let seed = self.rng.gen();
        let mut room = Room::new(code.clone(), player_id, self.world, seed);
        room.add_player(player_id, name);
        self.rooms.insert(code.clone(), room);
        self.player_rooms.insert(player_id, code.clone());

        info!(room_code = %code, host_id = %player_id, "Room created");

        out.to_player(
            player_id,
            ServerMsg::JoinedRoom {
                room_code: code.clone(),
                player_id,
            },
        );
        self.push_snapshot(&code, &mut out);
        out.to_everyone(self.lobby_message());
        out
    }

    /// Join a waiting room by code. Codes are matched case-insensitively.
    pub fn join_room(
        &mut self,
        player_id: PlayerId,
        raw_code: &str,
        name: &str,
    ) -> Result<Outbox, JoinError> {
        let code = raw_code.trim().to_uppercase();
        let room = self.rooms.get(&code).ok_or(JoinError::NotFound)?;
        let mut out = Outbox::new();

        if room.players.contains_key(&player_id) {
            out.to_player(
                player_id,
                ServerMsg::JoinedRoom {
                    room_code: code.clone(),
                    player_id,
                },
            );
            out.to_player(player_id, SnapshotBuilder::message(room));
            return Ok(out);
        }
        if room.state != RoomState::Waiting {
            return Err(JoinError::AlreadyStarted);
        }
        if room.is_full() {
            return Err(JoinError::Full);
        }

        self.detach(player_id, &mut out);

        let room = self.rooms.get_mut(&code).ok_or(JoinError::NotFound)?;
        room.add_player(player_id, name);
        self.player_rooms.insert(player_id, code.clone());

        info!(room_code = %code, player_id = %player_id, players = room.player_count(), "Player joined room");

        out.to_player(
            player_id,
            ServerMsg::JoinedRoom {
                room_code: code.clone(),
                player_id,
            },
        );
        self.push_snapshot(&code, &mut out);
        out.to_everyone(self.lobby_message());
        Ok(out)
    }

    /// Remove the caller from their room. Safe to call repeatedly.
    pub fn leave(&mut self, player_id: PlayerId) -> Outbox {
        let mut out = Outbox::new();
        if self.detach(player_id, &mut out) {
            out.to_everyone(self.lobby_message());
        }
        out
    }

    /// Drop `player_id` from its room, tearing the room down once empty.
    /// Returns false if the player was not in a room.
    fn detach(&mut self, player_id: PlayerId, out: &mut Outbox) -> bool {
        let Some(code) = self.player_rooms.remove(&player_id) else {
            return false;
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return true;
        };

        room.remove_player(player_id);
        info!(room_code = %code, player_id = %player_id, "Player left room");

        if room.is_empty() {
            let state = room.state;
            self.rooms.remove(&code);
            info!(room_code = %code, state = ?state, "Room closed");
        } else {
            self.push_snapshot(&code, out);
        }
        true
    }

    /// Host-only. Starts from the lobby or after a finished round.
    pub fn start_game(&mut self, player_id: PlayerId) -> Outbox {
        let mut out = Outbox::new();
        let Some(room) = self.room_of_mut(player_id) else {
            return out;
        };
        if !room.start(player_id) {
            debug!(room_code = %room.code, player_id = %player_id, state = ?room.state, "Start ignored");
            return out;
        }
        out.to_everyone(self.lobby_message());
        out
    }

    /// Host-only, ended rooms only
    pub fn restart_game(&mut self, player_id: PlayerId) -> Outbox {
        if let Some(room) = self.room_of_mut(player_id) {
            if !room.restart(player_id) {
                debug!(room_code = %room.code, player_id = %player_id, state = ?room.state, "Restart ignored");
            }
        }
        Outbox::new()
    }

    /// Host-only. Evicts every member and forgets the room.
    pub fn close_room(&mut self, player_id: PlayerId) -> Outbox {
        let mut out = Outbox::new();
        let Some(code) = self.player_rooms.get(&player_id).cloned() else {
            return out;
        };
        if !self.rooms.get(&code).is_some_and(|room| room.is_host(player_id)) {
            debug!(room_code = %code, player_id = %player_id, "Close ignored for non-host");
            return out;
        }

        if let Some(room) = self.rooms.remove(&code) {
            let members = room.member_ids();
            for id in &members {
                self.player_rooms.remove(id);
            }
            info!(room_code = %code, players = members.len(), "Room closed by host");
            out.to_players(
                members,
                ServerMsg::RoomClosed {
                    text: ROOM_CLOSED_TEXT.to_string(),
                },
            );
        }
        out.to_everyone(self.lobby_message());
        out
    }

    /// Host-only, waiting rooms only. Pushes a fresh snapshot when applied.
    pub fn update_settings(&mut self, player_id: PlayerId, update: &SettingsUpdate) -> Outbox {
        let mut out = Outbox::new();
        let Some(room) = self.room_of_mut(player_id) else {
            return out;
        };
        if !room.update_settings(player_id, update) {
            debug!(room_code = %room.code, player_id = %player_id, "Settings update ignored");
            return out;
        }
        info!(
            room_code = %room.code,
            max_pickups = room.settings.max_pickups,
            round_duration_seconds = room.settings.round_duration_seconds,
            allowed_cards = room.settings.allowed_cards.len(),
            "Room settings updated"
        );
        out.to_players(room.member_ids(), SnapshotBuilder::message(room));
        out
    }

    pub fn input_state(
        &mut self,
        player_id: PlayerId,
        move_x: Option<f64>,
        jump: bool,
        slide: bool,
        target_x: Option<f64>,
        target_y: Option<f64>,
    ) {
        if let Some(room) = self.room_of_mut(player_id) {
            room.set_input(player_id, move_x, jump, slide, target_x, target_y);
        }
    }

    /// `slot` must be a whole, non-negative number
    pub fn use_card(
        &mut self,
        player_id: PlayerId,
        slot: Option<f64>,
        target_x: Option<f64>,
        target_y: Option<f64>,
    ) {
        let Some(slot) = slot
            .filter(|s| s.is_finite() && *s >= 0.0 && s.fract() == 0.0)
            .map(|s| s as usize)
        else {
            return;
        };
        if let Some(room) = self.room_of_mut(player_id) {
            room.use_card(player_id, slot, target_x, target_y);
        }
    }

    /// Advance every room and queue its snapshot
    pub fn tick_all(&mut self, now: Instant) -> Outbox {
        let mut out = Outbox::new();
        for room in self.rooms.values_mut() {
            room.tick(now);
            out.to_players(room.member_ids(), SnapshotBuilder::message(room));
        }
        out
    }

    fn generate_code(&mut self) -> String {
        loop {
            let code: String = (0..ROOM_CODE_LEN)
                .map(|_| ROOM_CODE_ALPHABET[self.rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn room_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::CardType;
    use crate::lobby::outbox::Recipient;
    use uuid::Uuid;

    fn kinds(out: &Outbox) -> Vec<String> {
        out.iter()
            .map(|e| {
                serde_json::to_value(&e.msg).unwrap()["type"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect()
    }

    fn created(manager: &mut RoomManager, host: PlayerId) -> String {
        manager.create_room(host, "host");
        manager.room_of(host).unwrap().code.clone()
    }

    #[test]
    fn create_room_seats_host_and_announces() {
        let mut manager = RoomManager::new(1);
        let host = Uuid::new_v4();
        let out = manager.create_room(host, "  Hosty ");

        assert_eq!(kinds(&out), vec!["joined_room", "room_snapshot", "lobby_rooms"]);
        let room = manager.room_of(host).unwrap();
        assert_eq!(room.host_id, host);
        assert_eq!(room.state, RoomState::Waiting);
        assert_eq!(room.players[&host].name, "Hosty");
        assert_eq!(room.code.len(), ROOM_CODE_LEN);
        assert!(room.code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));
        assert_eq!(manager.lobby_listing().len(), 1);
    }

    #[test]
    fn room_codes_are_unique() {
        let mut manager = RoomManager::new(2);
        let mut codes = std::collections::HashSet::new();
        for _ in 0..200 {
            let code = created(&mut manager, Uuid::new_v4());
            assert!(codes.insert(code));
        }
        assert_eq!(manager.room_count(), 200);
    }

    #[test]
    fn join_normalizes_code_and_notifies_members() {
        let mut manager = RoomManager::new(3);
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let code = created(&mut manager, host);

        let out = manager
            .join_room(guest, &format!("  {} ", code.to_lowercase()), "guest")
            .unwrap();
        assert_eq!(kinds(&out), vec!["joined_room", "room_snapshot", "lobby_rooms"]);
        let snapshot = out.iter().nth(1).unwrap();
        match &snapshot.to {
            Recipient::Players(ids) => {
                assert!(ids.contains(&host) && ids.contains(&guest));
            }
            other => panic!("unexpected recipient {:?}", other),
        }
        assert_eq!(manager.room(&code).unwrap().player_count(), 2);
        assert_eq!(manager.player_count(), 2);
    }

    #[test]
    fn join_failures_are_reported() {
        let mut manager = RoomManager::new(4);
        let host = Uuid::new_v4();
        let code = created(&mut manager, host);

        assert_eq!(
            manager.join_room(Uuid::new_v4(), "NOPE", "x").unwrap_err(),
            JoinError::NotFound
        );

        for _ in 1..MAX_PLAYERS {
            manager.join_room(Uuid::new_v4(), &code, "filler").unwrap();
        }
        assert_eq!(
            manager.join_room(Uuid::new_v4(), &code, "late").unwrap_err(),
            JoinError::Full
        );

        let other_host = Uuid::new_v4();
        let started = created(&mut manager, other_host);
        manager.start_game(other_host);
        assert_eq!(
            manager.join_room(Uuid::new_v4(), &started, "late").unwrap_err(),
            JoinError::AlreadyStarted
        );

        let out = manager.dispatch(
            Uuid::new_v4(),
            ClientMsg::JoinRoom {
                room_code: Some("ZZZZ".to_string()),
                name: None,
            },
        );
        assert_eq!(kinds(&out), vec!["error_message"]);
        let envelope = out.iter().next().unwrap();
        match &envelope.msg {
            ServerMsg::ErrorMessage { text } => assert_eq!(text, "Room not found."),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn leave_is_idempotent_and_tears_down_empty_rooms() {
        let mut manager = RoomManager::new(5);
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let code = created(&mut manager, host);
        manager.join_room(guest, &code, "guest").unwrap();

        let out = manager.leave(host);
        assert_eq!(kinds(&out), vec!["room_snapshot", "lobby_rooms"]);
        assert_eq!(manager.room(&code).unwrap().host_id, guest);

        assert!(manager.leave(host).is_empty());
        assert!(manager.disconnect(host).is_empty());

        let out = manager.disconnect(guest);
        assert_eq!(kinds(&out), vec!["lobby_rooms"]);
        assert!(manager.room(&code).is_none());
        assert_eq!(manager.player_count(), 0);
        assert!(manager.leave(guest).is_empty());
    }

    #[test]
    fn creating_again_leaves_previous_room() {
        let mut manager = RoomManager::new(6);
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let first = created(&mut manager, host);
        manager.join_room(guest, &first, "guest").unwrap();

        let second = created(&mut manager, guest);
        assert_ne!(first, second);
        assert_eq!(manager.room(&first).unwrap().player_count(), 1);
        assert_eq!(manager.room_of(guest).unwrap().code, second);
    }

    #[test]
    fn only_host_controls_the_room() {
        let mut manager = RoomManager::new(7);
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let code = created(&mut manager, host);
        manager.join_room(guest, &code, "guest").unwrap();

        assert!(manager.start_game(guest).is_empty());
        assert!(manager.close_room(guest).is_empty());
        let update = SettingsUpdate {
            max_pickups: Some(9.0),
            ..SettingsUpdate::default()
        };
        assert!(manager.update_settings(guest, &update).is_empty());
        assert_eq!(manager.room(&code).unwrap().state, RoomState::Waiting);

        let out = manager.update_settings(host, &update);
        assert_eq!(kinds(&out), vec!["room_snapshot"]);
        assert_eq!(manager.room(&code).unwrap().settings.max_pickups, 9);

        let out = manager.start_game(host);
        assert_eq!(kinds(&out), vec!["lobby_rooms"]);
        assert_eq!(manager.room(&code).unwrap().state, RoomState::Countdown);
        assert!(manager.lobby_listing().is_empty());
    }

    #[test]
    fn close_room_evicts_everyone() {
        let mut manager = RoomManager::new(8);
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let code = created(&mut manager, host);
        manager.join_room(guest, &code, "guest").unwrap();

        let out = manager.dispatch(host, ClientMsg::CloseRoom {});
        assert_eq!(kinds(&out), vec!["room_closed", "lobby_rooms"]);
        assert!(manager.room(&code).is_none());
        assert!(manager.room_of(guest).is_none());
        assert!(manager.leave(guest).is_empty());
    }

    #[test]
    fn restart_only_after_round_ends() {
        let mut manager = RoomManager::new(9);
        let host = Uuid::new_v4();
        let code = created(&mut manager, host);
        manager.start_game(host);

        manager.restart_game(host);
        assert_eq!(manager.room(&code).unwrap().state, RoomState::Countdown);

        manager.room_mut(&code).unwrap().state = RoomState::Ended;
        manager.restart_game(host);
        assert_eq!(manager.room(&code).unwrap().state, RoomState::Countdown);
    }

    #[test]
    fn card_use_goes_through_dispatch_once() {
        let mut manager = RoomManager::new(10);
        let host = Uuid::new_v4();
        let code = created(&mut manager, host);
        {
            let room = manager.room_mut(&code).unwrap();
            room.start(host);
            room.advance(3.1);
            assert_eq!(room.state, RoomState::Running);
            room.players.get_mut(&host).unwrap().inventory[0] = Some(CardType::Bomb);
        }

        let use_card = || ClientMsg::UseCard {
            slot: Some(0.0),
            target_x: Some(900.0),
            target_y: None,
        };
        manager.dispatch(host, use_card());
        manager.dispatch(host, use_card());
        manager.dispatch(
            host,
            ClientMsg::UseCard {
                slot: Some(0.5),
                target_x: None,
                target_y: None,
            },
        );

        let room = manager.room(&code).unwrap();
        assert_eq!(room.projectiles.bombs.len(), 1);
        assert_eq!(room.players[&host].inventory[0], None);
    }

    #[test]
    fn input_state_updates_pending_input() {
        let mut manager = RoomManager::new(11);
        let host = Uuid::new_v4();
        let code = created(&mut manager, host);
        manager.dispatch(
            host,
            ClientMsg::InputState {
                move_x: Some(4.0),
                jump: true,
                slide: false,
                target_x: Some(f64::NAN),
                target_y: Some(12.0),
            },
        );
        let player = &manager.room(&code).unwrap().players[&host];
        assert_eq!(player.input.move_x, 1.0);
        assert!(player.input.jump);
        assert_eq!(player.input.target.y, 12.0);
        assert_eq!(player.input.target.x, player.position.x + player.facing * 100.0);
    }

    #[test]
    fn tick_all_snapshots_every_room() {
        let mut manager = RoomManager::new(12);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        created(&mut manager, a);
        created(&mut manager, b);

        let out = manager.tick_all(Instant::now());
        assert_eq!(out.len(), 2);
        assert!(out
            .iter()
            .all(|e| matches!(e.msg, ServerMsg::RoomSnapshot(_))));
    }

    #[test]
    fn connect_sends_lobby_listing() {
        let mut manager = RoomManager::new(13);
        created(&mut manager, Uuid::new_v4());
        let newcomer = Uuid::new_v4();
        let out = manager.connect(newcomer);
        let envelope = out.iter().next().unwrap();
        assert_eq!(envelope.to, Recipient::Player(newcomer));
        match &envelope.msg {
            ServerMsg::LobbyRooms { rooms } => assert_eq!(rooms.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }
}
