use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatclipError {
    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Probe failed for {path}: {reason}")]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("Transcode failed for {path}: {reason}")]
    TranscodeFailed { path: PathBuf, reason: String },

    #[error("Could not parse {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Precondition violated: {reason}")]
    PreconditionViolated { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ChatclipError>;
