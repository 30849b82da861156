pub mod candidates;
pub mod config;
pub mod conversation;
mod error;
pub mod render;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod slots;

pub use config::Settings;
pub use conversation::{Conversation, Preview, RankRequest, Turn};
pub use error::TvPickError;

/// Install the global tracing subscriber, honoring `RUST_LOG` and
/// defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
