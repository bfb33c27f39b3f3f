//! The `ForumStore` trait — the storage collaborator.
//!
//! The trait is implemented by storage backends (e.g. `forum-store-sqlite`).
//! Every method is one storage call. The core never spans a transaction across
//! several of them; the only concurrency control it relies on is per-key
//! uniqueness and the atomic merge primitives
//! ([`ForumStore::upsert_principal`], [`ForumStore::merge_membership_rank`]).
//!
//! Mutations that may legitimately match nothing return the number of affected
//! rows rather than an error.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  community::{Community, Membership, NewCommunity},
  content::{Comment, NewComment, NewPost, Post},
  feed::{FeedEntry, FeedScope},
  principal::{ExternalIdentity, Principal},
  rank::{CommunityRank, GlobalRank, Merge},
};

/// Abstraction over a forum storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ForumStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Principals ────────────────────────────────────────────────────────

  /// Number of principals whose global rank is at least
  /// [`GlobalRank::Admin`].
  fn count_global_admins(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Insert a principal keyed by `identity.external_id`, or update the
  /// existing one. Display name and avatar are overwritten; the rank is
  /// merged with [`Merge::Max`] so it never goes down. Returns the stored row.
  fn upsert_principal(
    &self,
    identity: ExternalIdentity,
    rank: GlobalRank,
  ) -> impl Future<Output = Result<Principal, Self::Error>> + Send + '_;

  fn get_principal(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + '_;

  /// Overwrite a principal's global rank.
  fn set_global_rank(
    &self,
    id: Uuid,
    rank: GlobalRank,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Principals whose display name contains `text`, ordered by name.
  fn search_principals(
    &self,
    text: String,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Principal>, Self::Error>> + Send + '_;

  // ── Communities ───────────────────────────────────────────────────────

  fn insert_community(
    &self,
    input: NewCommunity,
  ) -> impl Future<Output = Result<Community, Self::Error>> + Send + '_;

  fn get_community(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Community>, Self::Error>> + Send + '_;

  /// All communities ordered by name.
  fn list_communities(
    &self,
    approved_only: bool,
  ) -> impl Future<Output = Result<Vec<Community>, Self::Error>> + Send + '_;

  fn set_community_approved(
    &self,
    id: Uuid,
    approved: bool,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Remove a community together with its memberships, posts and comments.
  fn delete_community(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Memberships ───────────────────────────────────────────────────────

  fn get_membership(
    &self,
    community_id: Uuid,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<Option<Membership>, Self::Error>> + Send + '_;

  /// All memberships of a community, highest rank first.
  fn list_memberships(
    &self,
    community_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Membership>, Self::Error>> + Send + '_;

  /// Atomically insert a membership row or merge `rank` into the existing
  /// one. Returns 0 when the stored row already satisfied the write.
  fn merge_membership_rank(
    &self,
    community_id: Uuid,
    principal_id: Uuid,
    rank: CommunityRank,
    merge: Merge,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Set the rank to `new` only where it is currently exactly `expected`.
  fn replace_membership_rank(
    &self,
    community_id: Uuid,
    principal_id: Uuid,
    expected: CommunityRank,
    new: CommunityRank,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn delete_membership(
    &self,
    community_id: Uuid,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Persist a new post. `created_at` is set by the store.
  fn insert_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Posts of a community, newest first.
  fn list_posts(
    &self,
    community_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  fn update_post(
    &self,
    id: Uuid,
    title: String,
    body: String,
    edited_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Remove a post and every comment under it.
  fn delete_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Posts of approved communities matching `scope`, newest first, each with
  /// its comment count.
  fn list_feed(
    &self,
    scope: FeedScope,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<FeedEntry>, Self::Error>> + Send + '_;

  /// Posts written by `author_id` in approved communities, newest first.
  fn list_posts_by(
    &self,
    author_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<FeedEntry>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Persist a new comment. `created_at` is set by the store.
  fn insert_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Every comment of a post, in no guaranteed order.
  fn list_comments(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Live count of comments whose parent is `id`.
  fn count_replies(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn mark_has_descendants(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn update_comment_body(
    &self,
    id: Uuid,
    body: String,
    edited_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn delete_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Follows ───────────────────────────────────────────────────────────

  /// Record that `follower_id` follows `followee_id`. Returns 0 when the
  /// pair already exists.
  fn follow(
    &self,
    followee_id: Uuid,
    follower_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn unfollow(
    &self,
    followee_id: Uuid,
    follower_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn is_following(
    &self,
    followee_id: Uuid,
    follower_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
