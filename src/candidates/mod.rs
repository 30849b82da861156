//! Candidate data model and the adapter boundary to candidate storage.
//!
//! The recommendation core only ever sees [`CandidatePool`]. Two sources
//! ship with the crate:
//!
//! - [`InMemoryPool`] for tests and preloaded data
//! - [`SqlitePool`] reading a local SQLite file populated by [`import`]

pub mod import;
mod pool;
mod sqlite;
mod types;

pub use pool::{size_matches, CandidatePool, InMemoryPool, PoolQuery, DEFAULT_SIZE_WINDOW};
pub use sqlite::{SqlitePool, DEFAULT_CANDIDATE_LIMIT};
pub use types::*;
