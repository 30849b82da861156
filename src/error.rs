use thiserror::Error;

#[derive(Debug, Error)]
pub enum TvPickError {
    /// The candidate data source could not be reached or returned garbage.
    #[error("Candidate source error: {0}")]
    Adapter(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Profile error: {0}")]
    Profile(String),

    #[error("Unknown scene '{0}'")]
    UnknownScene(String),

    #[error("Import error: {0}")]
    Import(String),
}
