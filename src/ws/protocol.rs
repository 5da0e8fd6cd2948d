//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::game::cards::CardType;
use crate::game::geometry::Rect;
use crate::game::room::RoomState;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Open a new room with the caller as host
    CreateRoom {
        #[serde(default, deserialize_with = "loose_string")]
        name: Option<String>,
    },

    /// Join an existing room by code
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        #[serde(default, deserialize_with = "loose_string")]
        room_code: Option<String>,
        #[serde(default, deserialize_with = "loose_string")]
        name: Option<String>,
    },

    LeaveRoom {},

    /// Host only
    StartGame {},

    /// Host only, after a round has ended
    RestartGame {},

    /// Host only
    CloseRoom {},

    /// Host only, while waiting. Each field is validated on its own.
    #[serde(rename_all = "camelCase")]
    UpdateRoomSettings {
        #[serde(default, deserialize_with = "loose_number")]
        max_pickups: Option<f64>,
        #[serde(default, deserialize_with = "loose_number")]
        round_duration_seconds: Option<f64>,
        #[serde(default, deserialize_with = "loose_string_list")]
        allowed_cards: Option<Vec<String>>,
    },

    /// Latest held input; sent continuously by the client
    #[serde(rename_all = "camelCase")]
    InputState {
        #[serde(default, deserialize_with = "loose_number")]
        move_x: Option<f64>,
        #[serde(default, deserialize_with = "loose_bool")]
        jump: bool,
        #[serde(default, deserialize_with = "loose_bool")]
        slide: bool,
        #[serde(default, deserialize_with = "loose_number")]
        target_x: Option<f64>,
        #[serde(default, deserialize_with = "loose_number")]
        target_y: Option<f64>,
    },

    /// Spend the card in an inventory slot
    #[serde(rename_all = "camelCase")]
    UseCard {
        #[serde(default, deserialize_with = "loose_number")]
        slot: Option<f64>,
        #[serde(default, deserialize_with = "loose_number")]
        target_x: Option<f64>,
        #[serde(default, deserialize_with = "loose_number")]
        target_y: Option<f64>,
    },
}

impl ClientMsg {
    /// Event name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMsg::CreateRoom { .. } => "create_room",
            ClientMsg::JoinRoom { .. } => "join_room",
            ClientMsg::LeaveRoom {} => "leave_room",
            ClientMsg::StartGame {} => "start_game",
            ClientMsg::RestartGame {} => "restart_game",
            ClientMsg::CloseRoom {} => "close_room",
            ClientMsg::UpdateRoomSettings { .. } => "update_room_settings",
            ClientMsg::InputState { .. } => "input_state",
            ClientMsg::UseCard { .. } => "use_card",
        }
    }
}

// Client payloads are loosely typed. A field of the wrong JSON type is treated
// as missing rather than failing the whole message.

fn loose_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn loose_bool<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => false,
    })
}

fn loose_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn loose_string_list<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Vec<String>>, D::Error> {
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Rooms currently accepting players
    LobbyRooms { rooms: Vec<LobbyRoom> },

    /// Confirmation of create/join
    #[serde(rename_all = "camelCase")]
    JoinedRoom { room_code: String, player_id: Uuid },

    /// Full room state, pushed every tick
    RoomSnapshot(Box<RoomSnapshot>),

    /// Human-readable failure for a create/join request
    ErrorMessage { text: String },

    /// The host closed the room
    RoomClosed { text: String },
}

/// Lobby listing entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyRoom {
    pub room_code: String,
    pub players: usize,
    pub max_players: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub max_pickups: usize,
    pub round_duration_seconds: u32,
    pub allowed_cards: Vec<CardType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldView {
    pub width: f32,
    pub height: f32,
}

/// Complete externally visible state of a room
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_code: String,
    pub host_id: Uuid,
    pub state: RoomState,
    pub settings: SettingsView,
    pub countdown_remaining: f32,
    pub round_remaining: f32,
    pub world: WorldView,
    pub obstacles: &'static [Rect],
    pub players: Vec<PlayerSnapshot>,
    pub pickups: Vec<PickupSnapshot>,
    pub bullets: Vec<BulletSnapshot>,
    pub bombs: Vec<BombSnapshot>,
    pub ranking: Vec<RankingEntry>,
}

/// Player state in a snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
    pub kills: u32,
    pub deaths: u32,
    pub alive: bool,
    pub inventory: Vec<Option<CardType>>,
    pub facing_x: f32,
    pub vx: f32,
    pub vy: f32,
    pub on_ground: bool,
    pub speed_buff: bool,
    pub sliding: bool,
    pub jumping: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupSnapshot {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub card: CardType,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulletSnapshot {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BombSnapshot {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    /// Display-only arc height
    pub z: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingEntry {
    pub id: Uuid,
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
}
