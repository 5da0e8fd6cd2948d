//! Fixed-rate tick driver for every room

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::util::time::TICK_DURATION;
use crate::ws::hub::SessionHub;

use super::manager::RoomManager;

/// Tick all rooms at the simulation rate and fan their snapshots out.
/// Runs until the task is dropped.
pub async fn run_scheduler(manager: Arc<Mutex<RoomManager>>, hub: Arc<SessionHub>) {
    info!(tick_ms = TICK_DURATION.as_millis() as u64, "Room scheduler started");

    let mut tick_interval = interval(TICK_DURATION);
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick_interval.tick().await;

        // Release the lock before any delivery happens
        let outbox = manager.lock().tick_all(Instant::now());
        hub.deliver(outbox);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn pushes_snapshots_to_room_members() {
        let manager = Arc::new(Mutex::new(RoomManager::new(7)));
        let hub = Arc::new(SessionHub::new());
        let player = Uuid::new_v4();
        let mut rx = hub.register(player);
        manager.lock().create_room(player, "ticker");

        let task = tokio::spawn(run_scheduler(manager.clone(), hub.clone()));

        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("scheduler should tick")
            .expect("session open");
        assert!(frame.contains("\"type\":\"room_snapshot\""));

        task.abort();
    }
}
