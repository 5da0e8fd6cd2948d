//! Authoritative player state

use uuid::Uuid;

use super::cards::CardType;
use super::constants::{
    AIM_COORD_LIMIT, AIM_FALLBACK_DISTANCE, DEFAULT_PLAYER_NAME, INVENTORY_SLOTS, MAX_NAME_CHARS,
    PLAYER_HALF_HEIGHT, PLAYER_MAX_HEALTH, PLAYER_SLIDE_HALF_HEIGHT, RESPAWN_SECONDS,
    SLIDE_COOLDOWN_SECONDS, SLIDE_SECONDS,
};
use super::geometry::{clamp, Vec2};

/// Stable per-connection identity
pub type PlayerId = Uuid;

/// Latest intent received from the client; last write wins
#[derive(Debug, Clone, Default)]
pub struct PlayerInput {
    /// Horizontal move axis in [-1, 1]
    pub move_x: f32,
    pub jump: bool,
    pub slide: bool,
    /// Aim target in world coordinates
    pub target: Vec2,
}

/// Countdown timers for timed abilities, in seconds remaining.
///
/// A timer is active while its value is above zero. All of them are advanced
/// by the tick delta, never compared against wall-clock instants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbilityTimers {
    pub speed_buff: f32,
    pub slide: f32,
    pub slide_cooldown: f32,
    pub jump: f32,
    pub jump_cooldown: f32,
    pub wall_jump_lock: f32,
    pub wall_jump_cooldown: f32,
}

impl AbilityTimers {
    pub fn advance(&mut self, dt: f32) {
        for timer in [
            &mut self.speed_buff,
            &mut self.slide,
            &mut self.slide_cooldown,
            &mut self.jump,
            &mut self.jump_cooldown,
            &mut self.wall_jump_lock,
            &mut self.wall_jump_cooldown,
        ] {
            *timer = (*timer - dt).max(0.0);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn speed_buffed(&self) -> bool {
        self.speed_buff > 0.0
    }

    pub fn sliding(&self) -> bool {
        self.slide > 0.0
    }

    pub fn wall_jump_locked(&self) -> bool {
        self.wall_jump_lock > 0.0
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,

    // Movement
    pub position: Vec2,
    pub velocity: Vec2,
    /// +1 facing right, -1 facing left
    pub facing: f32,
    pub grounded: bool,
    /// Using the reduced slide hitbox; stays set until there is room to stand
    pub crouched: bool,
    pub slide_dir: f32,
    pub wall_jump_dir: f32,
    pub timers: AbilityTimers,

    // Combat
    pub health: f32,
    pub alive: bool,
    pub respawn_in: f32,
    pub last_damaged_by: Option<PlayerId>,
    pub inventory: [Option<CardType>; INVENTORY_SLOTS],

    // Stats
    pub kills: u32,
    pub deaths: u32,

    pub input: PlayerInput,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, spawn: Vec2) -> Self {
        Self {
            id,
            name: sanitize_name(name),
            position: spawn,
            velocity: Vec2::ZERO,
            facing: 1.0,
            grounded: false,
            crouched: false,
            slide_dir: 1.0,
            wall_jump_dir: 0.0,
            timers: AbilityTimers::default(),
            health: PLAYER_MAX_HEALTH,
            alive: true,
            respawn_in: 0.0,
            last_damaged_by: None,
            inventory: [None; INVENTORY_SLOTS],
            kills: 0,
            deaths: 0,
            input: PlayerInput {
                target: Vec2::new(spawn.x + AIM_FALLBACK_DISTANCE, spawn.y),
                ..PlayerInput::default()
            },
        }
    }

    /// Collision half-height; shrinks while crouched
    pub fn half_height(&self) -> f32 {
        if self.crouched {
            PLAYER_SLIDE_HALF_HEIGHT
        } else {
            PLAYER_HALF_HEIGHT
        }
    }

    /// Switch to the slide hitbox, keeping the feet on the ground when grounded
    pub fn crouch(&mut self) {
        if self.crouched {
            return;
        }
        self.crouched = true;
        if self.grounded {
            self.position.y += PLAYER_HALF_HEIGHT - PLAYER_SLIDE_HALF_HEIGHT;
        }
    }

    /// Start a slide of the standard duration in direction `dir`
    pub fn start_slide(&mut self, dir: f32) {
        self.slide_dir = dir;
        self.timers.slide = SLIDE_SECONDS;
        self.timers.slide_cooldown = SLIDE_COOLDOWN_SECONDS;
        self.crouch();
    }

    /// Aim point used when the client sends a non-finite coordinate
    pub fn fallback_target(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.facing * AIM_FALLBACK_DISTANCE,
            self.position.y,
        )
    }

    /// Resolve a client-supplied aim point, substituting the fallback per axis
    pub fn resolve_target(&self, x: Option<f64>, y: Option<f64>) -> Vec2 {
        let fallback = self.fallback_target();
        Vec2::new(
            clamp(finite_or(x, fallback.x), -AIM_COORD_LIMIT, AIM_COORD_LIMIT),
            clamp(finite_or(y, fallback.y), -AIM_COORD_LIMIT, AIM_COORD_LIMIT),
        )
    }

    pub fn apply_input(
        &mut self,
        move_x: Option<f64>,
        jump: bool,
        slide: bool,
        target_x: Option<f64>,
        target_y: Option<f64>,
    ) {
        let target = self.resolve_target(target_x, target_y);
        self.input = PlayerInput {
            move_x: clamp(finite_or(move_x, 0.0), -1.0, 1.0),
            jump,
            slide,
            target,
        };
    }

    pub fn free_slot(&self) -> Option<usize> {
        self.inventory.iter().position(Option::is_none)
    }

    /// Remove and return the card in `slot`, if any
    pub fn take_card(&mut self, slot: usize) -> Option<CardType> {
        self.inventory.get_mut(slot).and_then(Option::take)
    }

    /// Move to `spawn` with a clean body; keeps score and name
    fn reset_body(&mut self, spawn: Vec2) {
        self.position = spawn;
        self.velocity = Vec2::ZERO;
        self.grounded = false;
        self.crouched = false;
        self.wall_jump_dir = 0.0;
        self.timers.clear();
        self.health = PLAYER_MAX_HEALTH;
        self.alive = true;
        self.respawn_in = 0.0;
        self.last_damaged_by = None;
    }

    /// Full reset at the start of a round
    pub fn reset_for_round(&mut self, spawn: Vec2) {
        self.reset_body(spawn);
        self.kills = 0;
        self.deaths = 0;
        self.inventory = [None; INVENTORY_SLOTS];
        self.input.jump = false;
        self.input.slide = false;
    }

    pub fn respawn(&mut self, spawn: Vec2) {
        self.reset_body(spawn);
    }

    /// Count down the respawn timer; returns true once the player should respawn
    pub fn tick_respawn(&mut self, dt: f32) -> bool {
        self.respawn_in -= dt;
        self.respawn_in <= 0.0
    }

    /// Transition to dead. Buffs, movement state and cards are lost.
    pub fn die(&mut self) {
        self.alive = false;
        self.health = 0.0;
        self.deaths += 1;
        self.respawn_in = RESPAWN_SECONDS;
        self.timers.clear();
        self.velocity = Vec2::ZERO;
        self.grounded = false;
        self.crouched = false;
        self.wall_jump_dir = 0.0;
        self.inventory = [None; INVENTORY_SLOTS];
    }
}

/// Narrow to f32, treating values that are non-finite after the cast as missing
fn finite_or(value: Option<f64>, fallback: f32) -> f32 {
    value
        .map(|v| v as f32)
        .filter(|v| v.is_finite())
        .unwrap_or(fallback)
}

/// Trim, cap at 16 characters, default when blank
pub fn sanitize_name(raw: &str) -> String {
    let clean = raw.trim();
    if clean.is_empty() {
        return DEFAULT_PLAYER_NAME.to_string();
    }
    clean.chars().take(MAX_NAME_CHARS).collect()
}
