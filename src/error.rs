use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("telemetry route is required")]
    MissingRoute,

    #[error("payload read: {0}")]
    PayloadRead(#[source] io::Error),

    #[error("log config read: {0}")]
    ConfigRead(#[source] io::Error),

    #[error("log config parse: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
