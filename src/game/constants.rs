//! Gameplay tuning values

pub const MAX_PLAYERS: usize = 6;
pub const COUNTDOWN_SECONDS: f32 = 3.0;
pub const DEFAULT_ROUND_DURATION_SECONDS: u32 = 120;
pub const ROUND_DURATION_OPTIONS: [u32; 4] = [120, 180, 240, 300];
pub const DEFAULT_MAX_PICKUPS: usize = 6;
pub const MAX_PICKUP_OPTIONS: [usize; 4] = [6, 7, 8, 9];

// Player body
pub const PLAYER_RADIUS: f32 = 18.0;
pub const PLAYER_HALF_WIDTH: f32 = 14.0;
pub const PLAYER_HALF_HEIGHT: f32 = 24.0;
pub const PLAYER_SLIDE_HALF_HEIGHT: f32 = 16.0;
pub const PLAYER_MAX_HEALTH: f32 = 100.0;
pub const INVENTORY_SLOTS: usize = 3;

// Movement
pub const BASE_SPEED: f32 = 220.0;
pub const AIRBORNE_SPEED_FACTOR: f32 = 0.9;
pub const SPEED_BUFF_MULTIPLIER: f32 = 1.6;
pub const SPEED_BUFF_SECONDS: f32 = 3.0;
pub const MOVE_DEADZONE: f32 = 0.05;
pub const AIM_FACING_THRESHOLD: f32 = 2.0;
pub const AIM_FALLBACK_DISTANCE: f32 = 100.0;
/// Aim coordinates are clamped to this magnitude so aim math stays finite
pub const AIM_COORD_LIMIT: f32 = 100_000.0;

pub const SLIDE_SECONDS: f32 = 0.28;
pub const SLIDE_SPEED: f32 = 520.0;
pub const SLIDE_COOLDOWN_SECONDS: f32 = 0.22;

pub const JUMP_SECONDS: f32 = 0.24;
pub const JUMP_COOLDOWN_SECONDS: f32 = 0.12;
pub const JUMP_VELOCITY: f32 = -780.0;
pub const GRAVITY: f32 = 1900.0;
pub const MAX_FALL_SPEED: f32 = 980.0;

pub const WALL_JUMP_VELOCITY: f32 = -740.0;
pub const WALL_JUMP_HORIZONTAL_SPEED: f32 = 360.0;
pub const WALL_JUMP_LOCK_SECONDS: f32 = 0.16;
pub const WALL_JUMP_COOLDOWN_SECONDS: f32 = 0.05;
/// Horizontal distance at which an obstacle edge counts as touched
pub const WALL_CONTACT_TOLERANCE: f32 = 2.0;
/// Horizontal distance at which a world edge counts as touched
pub const WORLD_EDGE_TOLERANCE: f32 = 0.5;

pub const RESPAWN_SECONDS: f32 = 2.0;

// Pickups
pub const PICKUP_SPAWN_INTERVAL: f32 = 10.0;
pub const PICKUP_SPAWN_COUNT: usize = 2;
pub const PICKUP_COLLECT_RADIUS: f32 = 36.0;
pub const PICKUP_CLEARANCE_RADIUS: f32 = 22.0;
pub const PICKUP_PLACEMENT_ATTEMPTS: usize = 40;
pub const PICKUP_MARGIN_X: f32 = 80.0;
pub const PICKUP_MARGIN_Y: f32 = 90.0;

// Cards
pub const BULLET_SPEED: f32 = 760.0;
pub const BULLET_DAMAGE: f32 = 35.0;
pub const BULLET_LIFE_SECONDS: f32 = 1.0;
pub const BULLET_RADIUS: f32 = 5.0;
pub const BULLET_SPAWN_OFFSET: f32 = 28.0;
pub const BULLET_BOUNDS_MARGIN: f32 = 20.0;

pub const BOMB_SPEED: f32 = 380.0;
pub const BOMB_DAMAGE: f32 = 30.0;
pub const BOMB_BLAST_RADIUS: f32 = 90.0;
pub const BOMB_FLIGHT_SECONDS: f32 = 0.9;
pub const BOMB_SPAWN_OFFSET: f32 = 18.0;
pub const BOMB_ARC_HEIGHT: f32 = 90.0;

pub const HEAL_AMOUNT: f32 = 20.0;

// Names and codes
pub const DEFAULT_PLAYER_NAME: &str = "Player";
pub const MAX_NAME_CHARS: usize = 16;
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LEN: usize = 4;
