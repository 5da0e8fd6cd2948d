//! Connected sessions and outbound delivery

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::game::PlayerId;
use crate::lobby::{Outbox, Recipient};

/// Per-session outbound queue depth, in frames
pub const OUTBOUND_BUFFER: usize = 256;

/// Serialized JSON text frame shared by every recipient
pub type Frame = Arc<str>;

/// Registry of live sessions keyed by player id
#[derive(Default)]
pub struct SessionHub {
    sessions: DashMap<PlayerId, mpsc::Sender<Frame>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return the receiving end of its outbound queue
    pub fn register(&self, player_id: PlayerId) -> mpsc::Receiver<Frame> {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        self.sessions.insert(player_id, tx);
        rx
    }

    pub fn unregister(&self, player_id: PlayerId) {
        self.sessions.remove(&player_id);
    }

    #[cfg(test)]
    pub fn is_registered(&self, player_id: PlayerId) -> bool {
        self.sessions.contains_key(&player_id)
    }

    /// Serialize each message once and queue it for its recipients.
    /// Never waits: a session whose queue is full misses the frame.
    pub fn deliver(&self, outbox: Outbox) {
        for envelope in outbox {
            let frame: Frame = match serde_json::to_string(&envelope.msg) {
                Ok(json) => json.into(),
                Err(e) => {
                    error!(error = %e, "Failed to serialize server message");
                    continue;
                }
            };

            match envelope.to {
                Recipient::Player(player_id) => self.send_to(player_id, &frame),
                Recipient::Players(player_ids) => {
                    for player_id in player_ids {
                        self.send_to(player_id, &frame);
                    }
                }
                Recipient::Everyone => {
                    for entry in self.sessions.iter() {
                        push(*entry.key(), entry.value(), &frame);
                    }
                }
            }
        }
    }

    fn send_to(&self, player_id: PlayerId, frame: &Frame) {
        if let Some(tx) = self.sessions.get(&player_id) {
            push(player_id, tx.value(), frame);
        }
    }
}

fn push(player_id: PlayerId, tx: &mpsc::Sender<Frame>, frame: &Frame) {
    match tx.try_send(frame.clone()) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(player_id = %player_id, "Outbound queue full, dropping frame");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(player_id = %player_id, "Outbound queue closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::ServerMsg;
    use uuid::Uuid;

    #[test]
    fn delivers_by_recipient() {
        let hub = SessionHub::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = hub.register(a);
        let mut rx_b = hub.register(b);

        let mut out = Outbox::new();
        out.to_player(a, ServerMsg::ErrorMessage { text: "a".into() });
        out.to_players(vec![b], ServerMsg::RoomClosed { text: "b".into() });
        out.to_everyone(ServerMsg::LobbyRooms { rooms: vec![] });
        hub.deliver(out);

        let a_frames: Vec<Frame> = std::iter::from_fn(|| rx_a.try_recv().ok()).collect();
        let b_frames: Vec<Frame> = std::iter::from_fn(|| rx_b.try_recv().ok()).collect();
        assert_eq!(a_frames.len(), 2);
        assert_eq!(b_frames.len(), 2);
        assert!(a_frames[0].contains("error_message"));
        assert!(b_frames[0].contains("room_closed"));
        assert!(b_frames[1].contains("lobby_rooms"));
    }

    #[test]
    fn full_or_missing_sessions_do_not_block() {
        let hub = SessionHub::new();
        let slow = Uuid::new_v4();
        let _rx = hub.register(slow);

        for _ in 0..(OUTBOUND_BUFFER + 10) {
            let mut out = Outbox::new();
            out.to_player(slow, ServerMsg::LobbyRooms { rooms: vec![] });
            out.to_player(Uuid::new_v4(), ServerMsg::LobbyRooms { rooms: vec![] });
            hub.deliver(out);
        }

        assert!(hub.is_registered(slow));
        hub.unregister(slow);
        assert!(!hub.is_registered(slow));
    }
}
