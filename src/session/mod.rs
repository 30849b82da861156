//! Ephemeral per-session conversation state.
//!
//! Nothing here survives a restart. Idle sessions expire after a TTL,
//! either lazily on their next access or through [`spawn_sweeper`].

mod store;
mod types;

pub use store::{
    spawn_sweeper, MemorySessionStore, SessionStore, DEFAULT_SESSION_TTL, DEFAULT_SWEEP_INTERVAL,
};
pub use types::{SessionEntry, SessionState};
