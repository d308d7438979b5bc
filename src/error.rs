//! Errors of the fallible outer layers. The sampling core itself never fails.

/// Errors raised while loading configuration or exporting baked layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read a config file from disk.
    #[error("failed to read config: {0}")]
    ConfigRead(#[source] std::io::Error),

    /// Failed to write a config file to disk.
    #[error("failed to write config: {0}")]
    ConfigWrite(#[source] std::io::Error),

    /// Config file is not valid JSON for `TerrainConfig`.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[source] serde_json::Error),

    /// Failed to create the output directory.
    #[error("failed to create output directory: {0}")]
    OutputDir(#[source] std::io::Error),

    /// PNG encoding or saving failed.
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
