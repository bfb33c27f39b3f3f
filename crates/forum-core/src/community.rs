//! Communities and memberships.
//!
//! An unapproved community is invisible to ordinary browsing and cannot
//! receive new content. Approval and removal are reserved to global admins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  capability::{require_global_admin, require_principal},
  content::{optional_text, required_text},
  principal::Principal,
  rank::{CommunityRank, Outcome},
  store::ForumStore,
};

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
  pub community_id: Uuid,
  pub name:         String,
  pub description:  String,
  pub approved:     bool,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`ForumStore::insert_community`].
#[derive(Debug, Clone)]
pub struct NewCommunity {
  pub name:        String,
  pub description: String,
  pub approved:    bool,
}

/// One row of the membership ledger. Unique per (community, principal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
  pub community_id: Uuid,
  pub principal_id: Uuid,
  pub rank:         CommunityRank,
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

/// Fetch a community regardless of approval.
pub async fn existing_community<S: ForumStore>(store: &S, id: Uuid) -> Result<Community> {
  store
    .get_community(id)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::CommunityNotFound(id))
}

/// Fetch a community as ordinary browsing sees it: unapproved ones do not
/// exist.
pub async fn visible_community<S: ForumStore>(store: &S, id: Uuid) -> Result<Community> {
  match store.get_community(id).await.map_err(Error::storage)? {
    Some(c) if c.approved => Ok(c),
    _ => Err(Error::CommunityNotFound(id)),
  }
}

/// Fetch a community that may receive new content.
pub(crate) async fn writable_community<S: ForumStore>(
  store: &S,
  id: Uuid,
) -> Result<Community> {
  let community = existing_community(store, id).await?;
  if !community.approved {
    return Err(Error::validation("community is not approved"));
  }
  Ok(community)
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Suggest a new community. Any authenticated principal may do this; the
/// community starts unapproved.
pub async fn suggest_community<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  name: &str,
  description: &str,
) -> Result<Community> {
  require_principal(actor)?;
  let name = required_text("name", name, MAX_NAME_CHARS)?;
  let description = optional_text("description", description, MAX_DESCRIPTION_CHARS)?;

  store
    .insert_community(NewCommunity { name, description, approved: false })
    .await
    .map_err(Error::storage)
}

pub async fn approve_community<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  id: Uuid,
) -> Result<Outcome> {
  let admin = require_global_admin(actor)?;
  let community = existing_community(store, id).await?;
  if community.approved {
    return Ok(Outcome::Unchanged);
  }

  let rows = store
    .set_community_approved(id, true)
    .await
    .map_err(Error::storage)?;
  info!(community = %id, by = %admin.principal_id, "community approved");
  Ok(Outcome::from_affected(rows))
}

/// Delete a community and everything in it.
pub async fn remove_community<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  id: Uuid,
) -> Result<()> {
  let admin = require_global_admin(actor)?;
  existing_community(store, id).await?;

  store.delete_community(id).await.map_err(Error::storage)?;
  info!(community = %id, by = %admin.principal_id, "community removed");
  Ok(())
}
