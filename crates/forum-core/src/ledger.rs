//! Membership ledger: the only way community ranks change.
//!
//! Every mutation is a single atomic storage primitive, so each is idempotent
//! and safe under concurrent callers without any read-then-write here.
//! Grants ([`grant_community_admin`], [`grant_community_owner`],
//! [`set_global_admin`]) carry no actor; callers gate them behind
//! [`crate::capability::require_global_admin`].

use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  capability::capabilities,
  community::{existing_community, writable_community},
  principal::{Principal, existing_principal},
  rank::{CommunityRank, GlobalRank, Merge, Outcome},
  store::ForumStore,
};

async fn merge<S: ForumStore>(
  store: &S,
  community_id: Uuid,
  principal_id: Uuid,
  rank: CommunityRank,
  merge: Merge,
) -> Result<Outcome> {
  let rows = store
    .merge_membership_rank(community_id, principal_id, rank, merge)
    .await
    .map_err(Error::storage)?;
  Ok(Outcome::from_affected(rows))
}

/// Ensure `principal_id` holds at least [`CommunityRank::Subscriber`].
/// Never lowers a higher rank.
pub async fn subscribe<S: ForumStore>(
  store: &S,
  community_id: Uuid,
  principal_id: Uuid,
) -> Result<Outcome> {
  writable_community(store, community_id).await?;
  existing_principal(store, principal_id).await?;
  merge(store, community_id, principal_id, CommunityRank::Subscriber, Merge::Max).await
}

/// Ensure `principal_id` holds at least [`CommunityRank::Admin`].
pub async fn grant_community_admin<S: ForumStore>(
  store: &S,
  community_id: Uuid,
  principal_id: Uuid,
) -> Result<Outcome> {
  existing_community(store, community_id).await?;
  existing_principal(store, principal_id).await?;
  let outcome =
    merge(store, community_id, principal_id, CommunityRank::Admin, Merge::Max).await?;
  if outcome.is_applied() {
    info!(community = %community_id, principal = %principal_id, "granted community admin");
  }
  Ok(outcome)
}

/// Make `principal_id` an owner, unconditionally.
pub async fn grant_community_owner<S: ForumStore>(
  store: &S,
  community_id: Uuid,
  principal_id: Uuid,
) -> Result<Outcome> {
  existing_community(store, community_id).await?;
  existing_principal(store, principal_id).await?;
  let outcome =
    merge(store, community_id, principal_id, CommunityRank::Owner, Merge::Overwrite).await?;
  if outcome.is_applied() {
    info!(community = %community_id, principal = %principal_id, "granted community owner");
  }
  Ok(outcome)
}

/// Drop a community admin back to subscriber.
///
/// `actor` must be able to manage members in the community. Targets that are
/// not exactly [`CommunityRank::Admin`] are left alone; owners in particular
/// cannot be demoted through here.
pub async fn demote_admin<S: ForumStore>(
  store: &S,
  community_id: Uuid,
  principal_id: Uuid,
  actor: &Principal,
) -> Result<Outcome> {
  existing_community(store, community_id).await?;

  let caps = capabilities(store, Some(actor), community_id, None).await?;
  if !caps.can_manage_members {
    return Err(Error::Forbidden);
  }

  let rows = store
    .replace_membership_rank(
      community_id,
      principal_id,
      CommunityRank::Admin,
      CommunityRank::Subscriber,
    )
    .await
    .map_err(Error::storage)?;

  let outcome = Outcome::from_affected(rows);
  if outcome.is_applied() {
    info!(
      community = %community_id,
      principal = %principal_id,
      by = %actor.principal_id,
      "demoted community admin"
    );
  }
  Ok(outcome)
}

/// Remove the membership row entirely. Any elevated rank is forfeited.
pub async fn unsubscribe<S: ForumStore>(
  store: &S,
  community_id: Uuid,
  principal_id: Uuid,
) -> Result<Outcome> {
  let rows = store
    .delete_membership(community_id, principal_id)
    .await
    .map_err(Error::storage)?;
  Ok(Outcome::from_affected(rows))
}

/// Raise `principal_id` to global admin. Community ranks are untouched.
///
/// The write is unconditional. The outcome reports whether the rank read just
/// before it was already admin.
pub async fn set_global_admin<S: ForumStore>(store: &S, principal_id: Uuid) -> Result<Outcome> {
  let before = existing_principal(store, principal_id).await?.rank;

  let rows = store
    .set_global_rank(principal_id, GlobalRank::Admin)
    .await
    .map_err(Error::storage)?;
  if rows == 0 {
    return Err(Error::PrincipalNotFound(principal_id));
  }

  if before == GlobalRank::Admin {
    return Ok(Outcome::Unchanged);
  }
  info!(principal = %principal_id, "granted global admin");
  Ok(Outcome::Applied)
}
