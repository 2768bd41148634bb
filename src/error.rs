use std::fmt;

use thiserror::Error;

use crate::db::models::PostId;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// The step of a reconciliation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Fetch,
    TopicResolve,
    IndexWrite,
    IndexDelete,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStage::Fetch => write!(f, "fetch"),
            SyncStage::TopicResolve => write!(f, "topic-resolve"),
            SyncStage::IndexWrite => write!(f, "index-write"),
            SyncStage::IndexDelete => write!(f, "index-delete"),
        }
    }
}

/// Failure to bring the search index in line with a post.
///
/// Reported next to a committed store mutation, never instead of it.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("failed to fetch post {post_id} for indexing: {reason}")]
    FetchFailed { post_id: PostId, reason: String },

    #[error("failed to write index record for post {post_id}: {reason}")]
    IndexWriteFailed { post_id: PostId, reason: String },

    #[error("failed to delete index record for post {post_id}: {reason}")]
    IndexDeleteFailed { post_id: PostId, reason: String },
}

impl SyncError {
    pub fn post_id(&self) -> PostId {
        match self {
            SyncError::FetchFailed { post_id, .. }
            | SyncError::IndexWriteFailed { post_id, .. }
            | SyncError::IndexDeleteFailed { post_id, .. } => *post_id,
        }
    }

    pub fn stage(&self) -> SyncStage {
        match self {
            SyncError::FetchFailed { .. } => SyncStage::Fetch,
            SyncError::IndexWriteFailed { .. } => SyncStage::IndexWrite,
            SyncError::IndexDeleteFailed { .. } => SyncStage::IndexDelete,
        }
    }
}
