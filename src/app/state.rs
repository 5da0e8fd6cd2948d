//! Application state shared across routes

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::lobby::RoomManager;
use crate::ws::hub::SessionHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// All room state; every mutation happens under this lock
    pub rooms: Arc<Mutex<RoomManager>>,
    pub hub: Arc<SessionHub>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_manager(config, RoomManager::from_entropy())
    }

    pub fn with_manager(config: Config, manager: RoomManager) -> Self {
        Self {
            config: Arc::new(config),
            rooms: Arc::new(Mutex::new(manager)),
            hub: Arc::new(SessionHub::new()),
        }
    }
}
