//! Posts and comments, plus the content validation rules shared by every
//! write path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::ForumStore};

/// Body written over a soft-deleted comment.
pub const DELETED_SENTINEL: &str = "[This message was deleted]";

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_BODY_CHARS: usize = 20_000;

// ─── Posts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:      Uuid,
  pub community_id: Uuid,
  pub author_id:    Uuid,
  pub title:        String,
  pub body:         String,
  pub created_at:   DateTime<Utc>,
  /// Set on every edit; `None` means never edited.
  pub edited_at:    Option<DateTime<Utc>>,
}

impl Post {
  pub fn is_edited(&self) -> bool { self.edited_at.is_some() }
}

/// Input to [`crate::store::ForumStore::insert_post`]. Already validated.
#[derive(Debug, Clone)]
pub struct NewPost {
  pub community_id: Uuid,
  pub author_id:    Uuid,
  pub title:        String,
  pub body:         String,
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:      Uuid,
  pub post_id:         Uuid,
  /// `None` for a top-level comment.
  pub parent_id:       Option<Uuid>,
  pub author_id:       Uuid,
  pub body:            String,
  pub created_at:      DateTime<Utc>,
  pub edited_at:       Option<DateTime<Utc>>,
  /// Set once the first reply is attached; never cleared.
  pub has_descendants: bool,
}

impl Comment {
  pub fn is_edited(&self) -> bool { self.edited_at.is_some() }

  /// Whether this comment has been soft-deleted.
  pub fn is_deleted(&self) -> bool { self.body == DELETED_SENTINEL }
}

/// Input to [`crate::store::ForumStore::insert_comment`]. Already validated.
#[derive(Debug, Clone)]
pub struct NewComment {
  pub post_id:   Uuid,
  pub parent_id: Option<Uuid>,
  pub author_id: Uuid,
  pub body:      String,
}

// ─── Lookups ────────────────────────────────────────────────────────────────

pub async fn existing_post<S: ForumStore>(store: &S, id: Uuid) -> Result<Post> {
  store
    .get_post(id)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::PostNotFound(id))
}

pub async fn existing_comment<S: ForumStore>(store: &S, id: Uuid) -> Result<Comment> {
  store
    .get_comment(id)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::CommentNotFound(id))
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Trim `value` and check it is non-empty and at most `max` characters.
pub(crate) fn required_text(field: &str, value: &str, max: usize) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::validation(format!("{field} is required")));
  }
  if trimmed.chars().count() > max {
    return Err(Error::validation(format!(
      "{field} exceeds {max} characters"
    )));
  }
  Ok(trimmed.to_owned())
}

/// Like [`required_text`], but an empty value is accepted.
pub(crate) fn optional_text(field: &str, value: &str, max: usize) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.chars().count() > max {
    return Err(Error::validation(format!(
      "{field} exceeds {max} characters"
    )));
  }
  Ok(trimmed.to_owned())
}

pub(crate) fn validate_title(title: &str) -> Result<String> {
  required_text("title", title, MAX_TITLE_CHARS)
}

/// Bodies keep their inner formatting; only emptiness and length are checked.
pub(crate) fn validate_body(body: &str) -> Result<String> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return Err(Error::validation("content is required"));
  }
  if trimmed == DELETED_SENTINEL {
    return Err(Error::validation("content is reserved"));
  }
  if body.chars().count() > MAX_BODY_CHARS {
    return Err(Error::validation(format!(
      "content exceeds {MAX_BODY_CHARS} characters"
    )));
  }
  Ok(body.to_owned())
}
