//! Creating and editing posts and comments.
//!
//! New content needs an authenticated principal and an approved community.
//! Edits are reserved to the author; rank never grants them.

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  capability::{Capabilities, require_principal},
  community::writable_community,
  content::{
    Comment, NewComment, NewPost, Post, existing_comment, existing_post, validate_body,
    validate_title,
  },
  principal::Principal,
  rank::CommunityRank,
  store::ForumStore,
};

fn require_author(actor: Option<&Principal>, author_id: Uuid) -> Result<()> {
  // Editing does not depend on community rank.
  let caps = Capabilities::evaluate(actor, CommunityRank::None, Some(author_id));
  if caps.can_edit_own_content { Ok(()) } else { Err(Error::Forbidden) }
}

pub async fn create_post<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  community_id: Uuid,
  title: &str,
  body: &str,
) -> Result<Post> {
  let author = require_principal(actor)?;
  let title = validate_title(title)?;
  let body = validate_body(body)?;
  writable_community(store, community_id).await?;

  store
    .insert_post(NewPost {
      community_id,
      author_id: author.principal_id,
      title,
      body,
    })
    .await
    .map_err(Error::storage)
}

pub async fn edit_post<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  post_id: Uuid,
  title: &str,
  body: &str,
) -> Result<Post> {
  let title = validate_title(title)?;
  let body = validate_body(body)?;
  let post = existing_post(store, post_id).await?;
  require_author(actor, post.author_id)?;

  let edited_at = Utc::now();
  store
    .update_post(post_id, title.clone(), body.clone(), edited_at)
    .await
    .map_err(Error::storage)?;

  Ok(Post { title, body, edited_at: Some(edited_at), ..post })
}

/// Add a comment to `post_id`, optionally as a reply to `parent_id`.
///
/// The parent must already exist under the same post. Once the comment is
/// stored, the parent's has-descendants flag is raised.
pub async fn reply<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  post_id: Uuid,
  parent_id: Option<Uuid>,
  body: &str,
) -> Result<Comment> {
  let author = require_principal(actor)?;
  let body = validate_body(body)?;
  let post = existing_post(store, post_id).await?;
  writable_community(store, post.community_id).await?;

  if let Some(parent_id) = parent_id {
    let parent = store
      .get_comment(parent_id)
      .await
      .map_err(Error::storage)?;
    match parent {
      Some(p) if p.post_id == post_id => {}
      Some(_) => return Err(Error::validation("parent comment belongs to another post")),
      None => return Err(Error::validation("parent comment does not exist")),
    }
  }

  let comment = store
    .insert_comment(NewComment {
      post_id,
      parent_id,
      author_id: author.principal_id,
      body,
    })
    .await
    .map_err(Error::storage)?;

  if let Some(parent_id) = parent_id {
    store
      .mark_has_descendants(parent_id)
      .await
      .map_err(Error::storage)?;
  }

  Ok(comment)
}

pub async fn edit_comment<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  comment_id: Uuid,
  body: &str,
) -> Result<Comment> {
  let body = validate_body(body)?;
  let comment = existing_comment(store, comment_id).await?;
  require_author(actor, comment.author_id)?;
  if comment.is_deleted() {
    return Err(Error::validation("comment was deleted"));
  }

  let edited_at = Utc::now();
  store
    .update_comment_body(comment_id, body.clone(), edited_at)
    .await
    .map_err(Error::storage)?;

  Ok(Comment { body, edited_at: Some(edited_at), ..comment })
}
