//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so they sort lexically. UUIDs are stored as
//! hyphenated lowercase strings. Ranks are the only place raw integers appear.

use chrono::{DateTime, SecondsFormat, Utc};
use forum_core::{
  community::{Community, Membership},
  content::{Comment, Post},
  feed::FeedEntry,
  principal::Principal,
  rank::{CommunityRank, GlobalRank},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Current time, truncated to what [`encode_dt`] keeps.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  // Round-tripping through the column format keeps returned values equal to
  // what a later read produces.
  decode_dt(&encode_dt(now)).unwrap_or(now)
}

// ─── Ranks ───────────────────────────────────────────────────────────────────

pub fn encode_global_rank(rank: GlobalRank) -> i64 {
  match rank {
    GlobalRank::Anonymous => 0,
    GlobalRank::Member => 1,
    GlobalRank::Admin => 9,
  }
}

/// Values between thresholds decode to the rank they reach.
pub fn decode_global_rank(raw: i64) -> GlobalRank {
  match raw {
    i64::MIN..=0 => GlobalRank::Anonymous,
    1..=8 => GlobalRank::Member,
    _ => GlobalRank::Admin,
  }
}

pub fn encode_community_rank(rank: CommunityRank) -> i64 {
  match rank {
    CommunityRank::None => 0,
    CommunityRank::Subscriber => 1,
    CommunityRank::Admin => 9,
    CommunityRank::Owner => 10,
  }
}

pub fn decode_community_rank(raw: i64) -> CommunityRank {
  match raw {
    i64::MIN..=0 => CommunityRank::None,
    1..=8 => CommunityRank::Subscriber,
    9 => CommunityRank::Admin,
    _ => CommunityRank::Owner,
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `principals` row.
pub struct RawPrincipal {
  pub principal_id: String,
  pub external_id:  String,
  pub display_name: String,
  pub avatar:       Option<String>,
  pub rank:         i64,
  pub created_at:   String,
}

impl RawPrincipal {
  pub const COLUMNS: &'static str =
    "principal_id, external_id, display_name, avatar, rank, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      principal_id: row.get(0)?,
      external_id:  row.get(1)?,
      display_name: row.get(2)?,
      avatar:       row.get(3)?,
      rank:         row.get(4)?,
      created_at:   row.get(5)?,
    })
  }

  pub fn into_principal(self) -> Result<Principal> {
    Ok(Principal {
      principal_id: decode_uuid(&self.principal_id)?,
      external_id:  self.external_id,
      display_name: self.display_name,
      avatar:       self.avatar,
      rank:         decode_global_rank(self.rank),
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `communities` row.
pub struct RawCommunity {
  pub community_id: String,
  pub name:         String,
  pub description:  String,
  pub approved:     bool,
  pub created_at:   String,
}

impl RawCommunity {
  pub const COLUMNS: &'static str = "community_id, name, description, approved, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      community_id: row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      approved:     row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_community(self) -> Result<Community> {
    Ok(Community {
      community_id: decode_uuid(&self.community_id)?,
      name:         self.name,
      description:  self.description,
      approved:     self.approved,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `memberships` row.
pub struct RawMembership {
  pub community_id: String,
  pub principal_id: String,
  pub rank:         i64,
}

impl RawMembership {
  pub const COLUMNS: &'static str = "community_id, principal_id, rank";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      community_id: row.get(0)?,
      principal_id: row.get(1)?,
      rank:         row.get(2)?,
    })
  }

  pub fn into_membership(self) -> Result<Membership> {
    Ok(Membership {
      community_id: decode_uuid(&self.community_id)?,
      principal_id: decode_uuid(&self.principal_id)?,
      rank:         decode_community_rank(self.rank),
    })
  }
}

/// Raw values read directly from a `posts` row.
pub struct RawPost {
  pub post_id:      String,
  pub community_id: String,
  pub author_id:    String,
  pub title:        String,
  pub body:         String,
  pub created_at:   String,
  pub edited_at:    Option<String>,
}

impl RawPost {
  pub const COLUMNS: &'static str =
    "post_id, community_id, author_id, title, body, created_at, edited_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:      row.get(0)?,
      community_id: row.get(1)?,
      author_id:    row.get(2)?,
      title:        row.get(3)?,
      body:         row.get(4)?,
      created_at:   row.get(5)?,
      edited_at:    row.get(6)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:      decode_uuid(&self.post_id)?,
      community_id: decode_uuid(&self.community_id)?,
      author_id:    decode_uuid(&self.author_id)?,
      title:        self.title,
      body:         self.body,
      created_at:   decode_dt(&self.created_at)?,
      edited_at:    self.edited_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// A `posts` row joined with its comment count.
pub struct RawFeedEntry {
  pub post:          RawPost,
  pub comment_count: i64,
}

impl RawFeedEntry {
  /// Same column order as [`RawPost::COLUMNS`] on the `p` alias, plus the
  /// count.
  pub const COLUMNS: &'static str = "p.post_id, p.community_id, p.author_id, p.title, p.body, \
     p.created_at, p.edited_at, \
     (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.post_id)";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { post: RawPost::from_row(row)?, comment_count: row.get(7)? })
  }

  pub fn into_entry(self) -> Result<FeedEntry> {
    Ok(FeedEntry {
      post:          self.post.into_post()?,
      comment_count: self.comment_count.max(0) as u64,
    })
  }
}

/// Raw values read directly from a `comments` row.
pub struct RawComment {
  pub comment_id:      String,
  pub post_id:         String,
  pub parent_id:       Option<String>,
  pub author_id:       String,
  pub body:            String,
  pub created_at:      String,
  pub edited_at:       Option<String>,
  pub has_descendants: bool,
}

impl RawComment {
  pub const COLUMNS: &'static str =
    "comment_id, post_id, parent_id, author_id, body, created_at, edited_at, has_descendants";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:      row.get(0)?,
      post_id:         row.get(1)?,
      parent_id:       row.get(2)?,
      author_id:       row.get(3)?,
      body:            row.get(4)?,
      created_at:      row.get(5)?,
      edited_at:       row.get(6)?,
      has_descendants: row.get(7)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:      decode_uuid(&self.comment_id)?,
      post_id:         decode_uuid(&self.post_id)?,
      parent_id:       self.parent_id.as_deref().map(decode_uuid).transpose()?,
      author_id:       decode_uuid(&self.author_id)?,
      body:            self.body,
      created_at:      decode_dt(&self.created_at)?,
      edited_at:       self.edited_at.as_deref().map(decode_dt).transpose()?,
      has_descendants: self.has_descendants,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ranks_round_trip_through_integers() {
    for rank in [GlobalRank::Anonymous, GlobalRank::Member, GlobalRank::Admin] {
      assert_eq!(decode_global_rank(encode_global_rank(rank)), rank);
    }
    for rank in [
      CommunityRank::None,
      CommunityRank::Subscriber,
      CommunityRank::Admin,
      CommunityRank::Owner,
    ] {
      assert_eq!(decode_community_rank(encode_community_rank(rank)), rank);
    }
  }

  #[test]
  fn unknown_rank_integers_floor_to_threshold() {
    assert_eq!(decode_community_rank(5), CommunityRank::Subscriber);
    assert_eq!(decode_community_rank(42), CommunityRank::Owner);
    assert_eq!(decode_community_rank(-3), CommunityRank::None);
    assert_eq!(decode_global_rank(10), GlobalRank::Admin);
  }

  #[test]
  fn timestamps_are_fixed_width() {
    let a = encode_dt(decode_dt("2024-01-01T00:00:00Z").unwrap());
    let b = encode_dt(decode_dt("2024-01-01T00:00:00.5Z").unwrap());
    assert_eq!(a.len(), b.len());
    assert!(a < b);
  }
}
