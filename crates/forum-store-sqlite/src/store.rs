//! [`SqliteStore`] — the SQLite implementation of [`ForumStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use forum_core::{
  community::{Community, Membership, NewCommunity},
  content::{Comment, NewComment, NewPost, Post},
  feed::{FeedEntry, FeedScope},
  principal::{ExternalIdentity, Principal},
  rank::{CommunityRank, GlobalRank, Merge},
  store::ForumStore,
};
use rusqlite::{OptionalExtension as _, Row, types::Value};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawComment, RawCommunity, RawFeedEntry, RawMembership, RawPost, RawPrincipal,
    encode_community_rank, encode_dt, encode_global_rank, encode_uuid, now,
  },
  schema::SCHEMA,
};

type RowMapper<T> = fn(&Row<'_>) -> rusqlite::Result<T>;

/// Escape `text` for use inside a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(text: &str) -> String {
  let mut pattern = String::with_capacity(text.len() + 2);
  pattern.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A forum store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single write statement and return the affected row count.
  async fn execute(&self, sql: &'static str, params: Vec<Value>) -> Result<u64> {
    let rows = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params_from_iter(params))?))
      .await?;
    Ok(rows as u64)
  }

  async fn query_opt<T>(
    &self,
    sql: String,
    params: Vec<Value>,
    map: RowMapper<T>,
  ) -> Result<Option<T>>
  where
    T: Send + 'static,
  {
    let row = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(params), map)
            .optional()?,
        )
      })
      .await?;
    Ok(row)
  }

  async fn query_all<T>(
    &self,
    sql: String,
    params: Vec<Value>,
    map: RowMapper<T>,
  ) -> Result<Vec<T>>
  where
    T: Send + 'static,
  {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), map)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn count(&self, sql: &'static str, params: Vec<Value>) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(sql, rusqlite::params_from_iter(params), |r| r.get(0))?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }
}

// ─── ForumStore impl ─────────────────────────────────────────────────────────

impl ForumStore for SqliteStore {
  type Error = Error;

  // ── Principals ────────────────────────────────────────────────────────────

  async fn count_global_admins(&self) -> Result<u64> {
    self
      .count(
        "SELECT COUNT(*) FROM principals WHERE rank >= ?1",
        vec![encode_global_rank(GlobalRank::Admin).into()],
      )
      .await
  }

  async fn upsert_principal(
    &self,
    identity: ExternalIdentity,
    rank: GlobalRank,
  ) -> Result<Principal> {
    let id_str   = encode_uuid(Uuid::now_v7());
    let at_str   = encode_dt(now());
    let rank_raw = encode_global_rank(rank);
    let select   = format!(
      "SELECT {} FROM principals WHERE external_id = ?1",
      RawPrincipal::COLUMNS
    );

    let raw: RawPrincipal = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO principals
             (principal_id, external_id, display_name, avatar, rank, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (external_id) DO UPDATE SET
             display_name = excluded.display_name,
             avatar       = excluded.avatar,
             rank         = max(principals.rank, excluded.rank)",
          rusqlite::params![
            id_str,
            identity.external_id,
            identity.display_name,
            identity.avatar,
            rank_raw,
            at_str,
          ],
        )?;
        let raw = tx.query_row(
          &select,
          rusqlite::params![identity.external_id],
          RawPrincipal::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_principal()
  }

  async fn get_principal(&self, id: Uuid) -> Result<Option<Principal>> {
    self
      .query_opt(
        format!("SELECT {} FROM principals WHERE principal_id = ?1", RawPrincipal::COLUMNS),
        vec![encode_uuid(id).into()],
        RawPrincipal::from_row,
      )
      .await?
      .map(RawPrincipal::into_principal)
      .transpose()
  }

  async fn set_global_rank(&self, id: Uuid, rank: GlobalRank) -> Result<u64> {
    self
      .execute(
        "UPDATE principals SET rank = ?2 WHERE principal_id = ?1",
        vec![encode_uuid(id).into(), encode_global_rank(rank).into()],
      )
      .await
  }

  async fn search_principals(&self, text: String, limit: usize) -> Result<Vec<Principal>> {
    let raws = self
      .query_all(
        format!(
          "SELECT {} FROM principals
           WHERE display_name LIKE ?1 ESCAPE '\\'
           ORDER BY display_name ASC
           LIMIT ?2",
          RawPrincipal::COLUMNS
        ),
        vec![like_pattern(&text).into(), (limit as i64).into()],
        RawPrincipal::from_row,
      )
      .await?;

    raws.into_iter().map(RawPrincipal::into_principal).collect()
  }

  // ── Communities ───────────────────────────────────────────────────────────

  async fn insert_community(&self, input: NewCommunity) -> Result<Community> {
    let community = Community {
      community_id: Uuid::now_v7(),
      name:         input.name,
      description:  input.description,
      approved:     input.approved,
      created_at:   now(),
    };

    self
      .execute(
        "INSERT INTO communities (community_id, name, description, approved, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          encode_uuid(community.community_id).into(),
          community.name.clone().into(),
          community.description.clone().into(),
          community.approved.into(),
          encode_dt(community.created_at).into(),
        ],
      )
      .await?;

    Ok(community)
  }

  async fn get_community(&self, id: Uuid) -> Result<Option<Community>> {
    self
      .query_opt(
        format!("SELECT {} FROM communities WHERE community_id = ?1", RawCommunity::COLUMNS),
        vec![encode_uuid(id).into()],
        RawCommunity::from_row,
      )
      .await?
      .map(RawCommunity::into_community)
      .transpose()
  }

  async fn list_communities(&self, approved_only: bool) -> Result<Vec<Community>> {
    let raws = self
      .query_all(
        format!(
          "SELECT {} FROM communities
           WHERE ?1 = 0 OR approved = 1
           ORDER BY name ASC, community_id ASC",
          RawCommunity::COLUMNS
        ),
        vec![approved_only.into()],
        RawCommunity::from_row,
      )
      .await?;

    raws.into_iter().map(RawCommunity::into_community).collect()
  }

  async fn set_community_approved(&self, id: Uuid, approved: bool) -> Result<u64> {
    self
      .execute(
        "UPDATE communities SET approved = ?2 WHERE community_id = ?1",
        vec![encode_uuid(id).into(), approved.into()],
      )
      .await
  }

  async fn delete_community(&self, id: Uuid) -> Result<u64> {
    self
      .execute(
        "DELETE FROM communities WHERE community_id = ?1",
        vec![encode_uuid(id).into()],
      )
      .await
  }

  // ── Memberships ───────────────────────────────────────────────────────────

  async fn get_membership(
    &self,
    community_id: Uuid,
    principal_id: Uuid,
  ) -> Result<Option<Membership>> {
    self
      .query_opt(
        format!(
          "SELECT {} FROM memberships WHERE community_id = ?1 AND principal_id = ?2",
          RawMembership::COLUMNS
        ),
        vec![encode_uuid(community_id).into(), encode_uuid(principal_id).into()],
        RawMembership::from_row,
      )
      .await?
      .map(RawMembership::into_membership)
      .transpose()
  }

  async fn list_memberships(&self, community_id: Uuid) -> Result<Vec<Membership>> {
    let raws = self
      .query_all(
        "SELECT m.community_id, m.principal_id, m.rank
         FROM memberships m
         JOIN principals p ON p.principal_id = m.principal_id
         WHERE m.community_id = ?1
         ORDER BY m.rank DESC, p.display_name ASC"
          .to_owned(),
        vec![encode_uuid(community_id).into()],
        RawMembership::from_row,
      )
      .await?;

    raws.into_iter().map(RawMembership::into_membership).collect()
  }

  async fn merge_membership_rank(
    &self,
    community_id: Uuid,
    principal_id: Uuid,
    rank: CommunityRank,
    merge: Merge,
  ) -> Result<u64> {
    // The WHERE on the update arm turns an already-satisfied row into a
    // zero-row change.
    let sql = match merge {
      Merge::Max => {
        "INSERT INTO memberships (community_id, principal_id, rank)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (community_id, principal_id) DO UPDATE SET rank = excluded.rank
         WHERE excluded.rank > memberships.rank"
      }
      Merge::Overwrite => {
        "INSERT INTO memberships (community_id, principal_id, rank)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (community_id, principal_id) DO UPDATE SET rank = excluded.rank
         WHERE excluded.rank != memberships.rank"
      }
    };

    self
      .execute(
        sql,
        vec![
          encode_uuid(community_id).into(),
          encode_uuid(principal_id).into(),
          encode_community_rank(rank).into(),
        ],
      )
      .await
  }

  async fn replace_membership_rank(
    &self,
    community_id: Uuid,
    principal_id: Uuid,
    expected: CommunityRank,
    new: CommunityRank,
  ) -> Result<u64> {
    self
      .execute(
        "UPDATE memberships SET rank = ?4
         WHERE community_id = ?1 AND principal_id = ?2 AND rank = ?3",
        vec![
          encode_uuid(community_id).into(),
          encode_uuid(principal_id).into(),
          encode_community_rank(expected).into(),
          encode_community_rank(new).into(),
        ],
      )
      .await
  }

  async fn delete_membership(&self, community_id: Uuid, principal_id: Uuid) -> Result<u64> {
    self
      .execute(
        "DELETE FROM memberships WHERE community_id = ?1 AND principal_id = ?2",
        vec![encode_uuid(community_id).into(), encode_uuid(principal_id).into()],
      )
      .await
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn insert_post(&self, input: NewPost) -> Result<Post> {
    let post = Post {
      post_id:      Uuid::now_v7(),
      community_id: input.community_id,
      author_id:    input.author_id,
      title:        input.title,
      body:         input.body,
      created_at:   now(),
      edited_at:    None,
    };

    self
      .execute(
        "INSERT INTO posts (post_id, community_id, author_id, title, body, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        vec![
          encode_uuid(post.post_id).into(),
          encode_uuid(post.community_id).into(),
          encode_uuid(post.author_id).into(),
          post.title.clone().into(),
          post.body.clone().into(),
          encode_dt(post.created_at).into(),
        ],
      )
      .await?;

    Ok(post)
  }

  async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
    self
      .query_opt(
        format!("SELECT {} FROM posts WHERE post_id = ?1", RawPost::COLUMNS),
        vec![encode_uuid(id).into()],
        RawPost::from_row,
      )
      .await?
      .map(RawPost::into_post)
      .transpose()
  }

  async fn list_posts(&self, community_id: Uuid, limit: usize) -> Result<Vec<Post>> {
    let raws = self
      .query_all(
        format!(
          "SELECT {} FROM posts
           WHERE community_id = ?1
           ORDER BY created_at DESC, post_id DESC
           LIMIT ?2",
          RawPost::COLUMNS
        ),
        vec![encode_uuid(community_id).into(), (limit as i64).into()],
        RawPost::from_row,
      )
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  async fn list_feed(&self, scope: FeedScope, limit: usize) -> Result<Vec<FeedEntry>> {
    let mut params: Vec<Value> = vec![(limit as i64).into()];
    let filter = match scope {
      FeedScope::All => "",
      FeedScope::SubscribedBy(id) => {
        params.push(encode_uuid(id).into());
        "JOIN memberships m
           ON m.community_id = p.community_id AND m.principal_id = ?2 AND m.rank >= 1"
      }
      FeedScope::FollowedBy(id) => {
        params.push(encode_uuid(id).into());
        "JOIN follows f
           ON f.followee_id = p.author_id AND f.follower_id = ?2"
      }
    };

    let raws = self
      .query_all(
        format!(
          "SELECT {} FROM posts p
           JOIN communities t ON t.community_id = p.community_id AND t.approved = 1
           {filter}
           ORDER BY p.created_at DESC, p.post_id DESC
           LIMIT ?1",
          RawFeedEntry::COLUMNS
        ),
        params,
        RawFeedEntry::from_row,
      )
      .await?;

    raws.into_iter().map(RawFeedEntry::into_entry).collect()
  }

  async fn list_posts_by(&self, author_id: Uuid, limit: usize) -> Result<Vec<FeedEntry>> {
    let raws = self
      .query_all(
        format!(
          "SELECT {} FROM posts p
           JOIN communities t ON t.community_id = p.community_id AND t.approved = 1
           WHERE p.author_id = ?1
           ORDER BY p.created_at DESC, p.post_id DESC
           LIMIT ?2",
          RawFeedEntry::COLUMNS
        ),
        vec![encode_uuid(author_id).into(), (limit as i64).into()],
        RawFeedEntry::from_row,
      )
      .await?;

    raws.into_iter().map(RawFeedEntry::into_entry).collect()
  }

  async fn update_post(
    &self,
    id: Uuid,
    title: String,
    body: String,
    edited_at: DateTime<Utc>,
  ) -> Result<u64> {
    self
      .execute(
        "UPDATE posts SET title = ?2, body = ?3, edited_at = ?4 WHERE post_id = ?1",
        vec![
          encode_uuid(id).into(),
          title.into(),
          body.into(),
          encode_dt(edited_at).into(),
        ],
      )
      .await
  }

  async fn delete_post(&self, id: Uuid) -> Result<u64> {
    self
      .execute("DELETE FROM posts WHERE post_id = ?1", vec![encode_uuid(id).into()])
      .await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn insert_comment(&self, input: NewComment) -> Result<Comment> {
    let comment = Comment {
      comment_id:      Uuid::now_v7(),
      post_id:         input.post_id,
      parent_id:       input.parent_id,
      author_id:       input.author_id,
      body:            input.body,
      created_at:      now(),
      edited_at:       None,
      has_descendants: false,
    };

    self
      .execute(
        "INSERT INTO comments (comment_id, post_id, parent_id, author_id, body, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        vec![
          encode_uuid(comment.comment_id).into(),
          encode_uuid(comment.post_id).into(),
          comment.parent_id.map(encode_uuid).into(),
          encode_uuid(comment.author_id).into(),
          comment.body.clone().into(),
          encode_dt(comment.created_at).into(),
        ],
      )
      .await?;

    Ok(comment)
  }

  async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
    self
      .query_opt(
        format!("SELECT {} FROM comments WHERE comment_id = ?1", RawComment::COLUMNS),
        vec![encode_uuid(id).into()],
        RawComment::from_row,
      )
      .await?
      .map(RawComment::into_comment)
      .transpose()
  }

  async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
    let raws = self
      .query_all(
        format!(
          "SELECT {} FROM comments
           WHERE post_id = ?1
           ORDER BY created_at ASC, comment_id ASC",
          RawComment::COLUMNS
        ),
        vec![encode_uuid(post_id).into()],
        RawComment::from_row,
      )
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn count_replies(&self, id: Uuid) -> Result<u64> {
    self
      .count(
        "SELECT COUNT(*) FROM comments WHERE parent_id = ?1",
        vec![encode_uuid(id).into()],
      )
      .await
  }

  async fn mark_has_descendants(&self, id: Uuid) -> Result<u64> {
    self
      .execute(
        "UPDATE comments SET has_descendants = 1
         WHERE comment_id = ?1 AND has_descendants = 0",
        vec![encode_uuid(id).into()],
      )
      .await
  }

  async fn update_comment_body(
    &self,
    id: Uuid,
    body: String,
    edited_at: DateTime<Utc>,
  ) -> Result<u64> {
    self
      .execute(
        "UPDATE comments SET body = ?2, edited_at = ?3 WHERE comment_id = ?1",
        vec![encode_uuid(id).into(), body.into(), encode_dt(edited_at).into()],
      )
      .await
  }

  async fn delete_comment(&self, id: Uuid) -> Result<u64> {
    self
      .execute("DELETE FROM comments WHERE comment_id = ?1", vec![encode_uuid(id).into()])
      .await
  }

  // ── Follows ───────────────────────────────────────────────────────────────

  async fn follow(&self, followee_id: Uuid, follower_id: Uuid) -> Result<u64> {
    self
      .execute(
        "INSERT OR IGNORE INTO follows (followee_id, follower_id, created_at)
         VALUES (?1, ?2, ?3)",
        vec![
          encode_uuid(followee_id).into(),
          encode_uuid(follower_id).into(),
          encode_dt(now()).into(),
        ],
      )
      .await
  }

  async fn unfollow(&self, followee_id: Uuid, follower_id: Uuid) -> Result<u64> {
    self
      .execute(
        "DELETE FROM follows WHERE followee_id = ?1 AND follower_id = ?2",
        vec![encode_uuid(followee_id).into(), encode_uuid(follower_id).into()],
      )
      .await
  }

  async fn is_following(&self, followee_id: Uuid, follower_id: Uuid) -> Result<bool> {
    let n = self
      .count(
        "SELECT COUNT(*) FROM follows WHERE followee_id = ?1 AND follower_id = ?2",
        vec![encode_uuid(followee_id).into(), encode_uuid(follower_id).into()],
      )
      .await?;
    Ok(n > 0)
  }
}

#[cfg(test)]
mod like_tests {
  use super::like_pattern;

  #[test]
  fn wildcards_are_escaped() {
    assert_eq!(like_pattern("a%b_c"), "%a\\%b\\_c%");
    assert_eq!(like_pattern("plain"), "%plain%");
  }
}
