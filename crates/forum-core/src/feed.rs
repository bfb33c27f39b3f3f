//! Cross-community reading: the home feed, follows between principals, and
//! profiles.
//!
//! Feeds only draw from approved communities. A view that needs a principal
//! (subscribed, following) reads as [`FeedView::Latest`] for anonymous
//! callers.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  capability::require_principal,
  content::Post,
  principal::{Principal, existing_principal},
  rank::Outcome,
  store::ForumStore,
};

/// Most entries returned by a feed or a profile.
pub const FEED_LIMIT: usize = 50;

/// Which slice of the forum a feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedView {
  /// Every post in every approved community.
  #[default]
  Latest,
  /// Posts in communities the caller holds any rank in.
  Subscribed,
  /// Posts written by principals the caller follows.
  Following,
}

/// Row filter handed to [`ForumStore::list_feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
  All,
  SubscribedBy(Uuid),
  FollowedBy(Uuid),
}

impl FeedScope {
  /// Resolve a requested view against the caller.
  pub fn resolve(view: FeedView, actor: Option<&Principal>) -> Self {
    match (view, actor) {
      (FeedView::Subscribed, Some(p)) => Self::SubscribedBy(p.principal_id),
      (FeedView::Following, Some(p)) => Self::FollowedBy(p.principal_id),
      _ => Self::All,
    }
  }
}

/// A post as listed in a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
  #[serde(flatten)]
  pub post:          Post,
  /// Live comments, soft-deleted ones included.
  pub comment_count: u64,
}

/// A principal together with their recent posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  #[serde(flatten)]
  pub principal:    Principal,
  pub posts:        Vec<FeedEntry>,
  /// Whether the caller follows this principal. Always false when anonymous.
  pub is_following: bool,
}

// ─── Feed ─────────────────────────────────────────────────────────────────────

/// Newest posts first, at most [`FEED_LIMIT`].
pub async fn feed<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  view: FeedView,
) -> Result<Vec<FeedEntry>> {
  let scope = FeedScope::resolve(view, actor);
  debug!(?view, ?scope, "listing feed");
  store
    .list_feed(scope, FEED_LIMIT)
    .await
    .map_err(Error::storage)
}

// ─── Follows ──────────────────────────────────────────────────────────────────

pub async fn follow<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  target: Uuid,
) -> Result<Outcome> {
  let me = require_principal(actor)?;
  if me.principal_id == target {
    return Err(Error::validation("cannot follow yourself"));
  }
  existing_principal(store, target).await?;

  let rows = store
    .follow(target, me.principal_id)
    .await
    .map_err(Error::storage)?;
  Ok(Outcome::from_affected(rows))
}

pub async fn unfollow<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  target: Uuid,
) -> Result<Outcome> {
  let me = require_principal(actor)?;
  existing_principal(store, target).await?;

  let rows = store
    .unfollow(target, me.principal_id)
    .await
    .map_err(Error::storage)?;
  Ok(Outcome::from_affected(rows))
}

// ─── Profiles ─────────────────────────────────────────────────────────────────

pub async fn profile<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  id: Uuid,
) -> Result<Profile> {
  let principal = existing_principal(store, id).await?;
  let posts = store
    .list_posts_by(id, FEED_LIMIT)
    .await
    .map_err(Error::storage)?;
  let is_following = match actor {
    Some(me) if me.principal_id != id => store
      .is_following(id, me.principal_id)
      .await
      .map_err(Error::storage)?,
    _ => false,
  };
  Ok(Profile { principal, posts, is_following })
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::rank::GlobalRank;

  fn someone() -> Principal {
    Principal {
      principal_id: Uuid::now_v7(),
      external_id:  "ext".into(),
      display_name: "someone".into(),
      avatar:       None,
      rank:         GlobalRank::Member,
      created_at:   Utc::now(),
    }
  }

  #[test]
  fn anonymous_views_fall_back_to_latest() {
    for view in [FeedView::Latest, FeedView::Subscribed, FeedView::Following] {
      assert_eq!(FeedScope::resolve(view, None), FeedScope::All);
    }
  }

  #[test]
  fn views_bind_to_the_caller() {
    let me = someone();
    assert_eq!(
      FeedScope::resolve(FeedView::Subscribed, Some(&me)),
      FeedScope::SubscribedBy(me.principal_id)
    );
    assert_eq!(
      FeedScope::resolve(FeedView::Following, Some(&me)),
      FeedScope::FollowedBy(me.principal_id)
    );
    assert_eq!(FeedScope::resolve(FeedView::Latest, Some(&me)), FeedScope::All);
  }

  #[test]
  fn view_parses_snake_case() {
    let view: FeedView = serde_json::from_str("\"subscribed\"").unwrap();
    assert_eq!(view, FeedView::Subscribed);
  }
}
