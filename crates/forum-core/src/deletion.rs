//! Deletion policy.
//!
//! A comment with replies is soft-deleted: its body becomes
//! [`DELETED_SENTINEL`] and the node stays in place so the thread below it
//! remains connected. A comment without replies is removed outright. A
//! sentinel is never revisited, even once its last reply is gone.
//!
//! The capability check and the write are separate storage calls; nothing
//! guards the gap between them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  capability::capabilities,
  content::{Comment, DELETED_SENTINEL, existing_comment, existing_post},
  principal::Principal,
  store::ForumStore,
};

/// What a successful delete did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deletion {
  /// The body was replaced by the sentinel; the node remains.
  Soft,
  /// The row is gone.
  Hard,
}

async fn has_subtree<S: ForumStore>(store: &S, comment: &Comment) -> Result<bool> {
  if comment.has_descendants {
    return Ok(true);
  }
  let replies = store
    .count_replies(comment.comment_id)
    .await
    .map_err(Error::storage)?;
  Ok(replies > 0)
}

/// Delete a comment on behalf of `actor`.
pub async fn delete_comment<S: ForumStore>(
  store: &S,
  comment_id: Uuid,
  actor: Option<&Principal>,
) -> Result<Deletion> {
  let comment = existing_comment(store, comment_id).await?;
  let post = existing_post(store, comment.post_id).await?;

  let caps = capabilities(store, actor, post.community_id, Some(comment.author_id)).await?;
  if !caps.can_delete {
    return Err(Error::Forbidden);
  }

  if has_subtree(store, &comment).await? {
    store
      .update_comment_body(comment_id, DELETED_SENTINEL.to_owned(), Utc::now())
      .await
      .map_err(Error::storage)?;
    debug!(comment = %comment_id, "comment has replies; soft-deleted");
    Ok(Deletion::Soft)
  } else {
    store
      .delete_comment(comment_id)
      .await
      .map_err(Error::storage)?;
    debug!(comment = %comment_id, "comment removed");
    Ok(Deletion::Hard)
  }
}

/// Delete a post and all of its comments. Same permission rule as comments.
pub async fn delete_post<S: ForumStore>(
  store: &S,
  post_id: Uuid,
  actor: Option<&Principal>,
) -> Result<Deletion> {
  let post = existing_post(store, post_id).await?;

  let caps = capabilities(store, actor, post.community_id, Some(post.author_id)).await?;
  if !caps.can_delete {
    return Err(Error::Forbidden);
  }

  store.delete_post(post_id).await.map_err(Error::storage)?;
  debug!(post = %post_id, "post removed");
  Ok(Deletion::Hard)
}
