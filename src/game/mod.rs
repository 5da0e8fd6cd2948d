//! Game simulation modules

pub mod cards;
pub mod combat;
pub mod constants;
pub mod geometry;
pub mod physics;
pub mod pickups;
pub mod player;
pub mod room;
pub mod settings;
pub mod snapshot;
pub mod world;

pub use player::PlayerId;
pub use room::{Room, RoomState};
pub use snapshot::SnapshotBuilder;
