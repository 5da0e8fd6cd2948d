//! Time utilities for game simulation

use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 30;
pub const TICK_DURATION: Duration = Duration::from_micros(1_000_000 / SIMULATION_TPS as u64);

/// Upper bound on a single tick's delta, in seconds
pub const MAX_TICK_DELTA: f32 = 0.05;

/// Seconds elapsed between two instants, clamped to `[0, MAX_TICK_DELTA]`
pub fn clamped_delta(previous: Instant, now: Instant) -> f32 {
    now.saturating_duration_since(previous)
        .as_secs_f32()
        .min(MAX_TICK_DELTA)
}
