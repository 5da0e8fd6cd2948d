//! Room registry, membership and the tick scheduler

pub mod manager;
pub mod outbox;
pub mod scheduler;

pub use manager::RoomManager;
pub use outbox::{Outbox, Recipient};
pub use scheduler::run_scheduler;
