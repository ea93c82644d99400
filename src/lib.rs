// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod history;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod stage;
pub mod util;

/// Tick interval for the UI event loop, in milliseconds.
pub const TICK_RATE_MS: u64 = 100;
