//! Addressed outbound messages produced while the room lock is held

use crate::game::PlayerId;
use crate::ws::protocol::ServerMsg;

#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    Player(PlayerId),
    /// Members of one room, captured at send time
    Players(Vec<PlayerId>),
    /// Every connected session
    Everyone,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub to: Recipient,
    pub msg: ServerMsg,
}

/// Messages to deliver once the manager lock has been released
#[derive(Debug, Default)]
pub struct Outbox {
    envelopes: Vec<Envelope>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, to: Recipient, msg: ServerMsg) {
        self.envelopes.push(Envelope { to, msg });
    }

    pub fn to_player(&mut self, player_id: PlayerId, msg: ServerMsg) {
        self.push(Recipient::Player(player_id), msg);
    }

    pub fn to_players(&mut self, player_ids: Vec<PlayerId>, msg: ServerMsg) {
        if !player_ids.is_empty() {
            self.push(Recipient::Players(player_ids), msg);
        }
    }

    pub fn to_everyone(&mut self, msg: ServerMsg) {
        self.push(Recipient::Everyone, msg);
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Envelope> {
        self.envelopes.iter()
    }
}

impl IntoIterator for Outbox {
    type Item = Envelope;
    type IntoIter = std::vec::IntoIter<Envelope>;

    fn into_iter(self) -> Self::IntoIter {
        self.envelopes.into_iter()
    }
}
