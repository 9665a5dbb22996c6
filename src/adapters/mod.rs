//! Adapters implementing the port traits.
//!
//! - `live`: real processes, `PATH` lookup, and a console host.
//! - `recording` / `replaying`: cassette capture and playback.
//! - `scripted` / `memory`: deterministic executors and hosts for tests.

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;
pub mod scripted;
