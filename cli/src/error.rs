use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] vault_core::ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No content provided (pass it as an argument or on stdin)")]
    EmptyContent,
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
}
