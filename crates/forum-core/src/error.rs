//! Error types for `forum-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("principal not found: {0}")]
  PrincipalNotFound(Uuid),

  #[error("community not found: {0}")]
  CommunityNotFound(Uuid),

  #[error("post not found: {0}")]
  PostNotFound(Uuid),

  #[error("comment not found: {0}")]
  CommentNotFound(Uuid),

  #[error("forbidden")]
  Forbidden,

  #[error("validation failed: {0}")]
  Validation(String),

  /// Failure reported by the storage collaborator. Never retried here.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }

  pub(crate) fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::PrincipalNotFound(_)
        | Self::CommunityNotFound(_)
        | Self::PostNotFound(_)
        | Self::CommentNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
