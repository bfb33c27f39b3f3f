//! Role hierarchy: what a principal may do at a given scope.
//!
//! [`Capabilities::evaluate`] is a pure function of the ranks it is handed.
//! [`capabilities`] reads the community rank from the store on every call;
//! verdicts must never be cached across requests since ranks change.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  principal::{Principal, global_rank},
  rank::CommunityRank,
  store::ForumStore,
};

/// The capability set handed to presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
  /// Only ever granted to the content's author, never by rank.
  pub can_edit_own_content: bool,
  pub can_delete:           bool,
  /// Demote a community admin.
  pub can_manage_members:   bool,
}

impl Capabilities {
  pub fn evaluate(
    principal: Option<&Principal>,
    community_rank: CommunityRank,
    content_owner: Option<Uuid>,
  ) -> Self {
    let Some(principal) = principal else {
      return Self::default();
    };

    let global = global_rank(Some(principal));
    let is_owner_of_content = content_owner == Some(principal.principal_id);

    Self {
      can_edit_own_content: is_owner_of_content,
      can_delete:           is_owner_of_content
        || global.is_admin()
        || community_rank.is_admin(),
      can_manage_members:   community_rank.is_owner() || global.is_admin(),
    }
  }
}

/// Rank of `principal` in `community_id`; [`CommunityRank::None`] when either
/// the principal or the membership row is absent.
pub async fn community_rank<S: ForumStore>(
  store: &S,
  principal: Option<&Principal>,
  community_id: Uuid,
) -> Result<CommunityRank> {
  let Some(principal) = principal else {
    return Ok(CommunityRank::None);
  };
  let membership = store
    .get_membership(community_id, principal.principal_id)
    .await
    .map_err(Error::storage)?;
  Ok(membership.map_or(CommunityRank::None, |m| m.rank))
}

/// Evaluate the capabilities of `principal` over content owned by
/// `content_owner` inside `community_id`, against current ledger state.
pub async fn capabilities<S: ForumStore>(
  store: &S,
  principal: Option<&Principal>,
  community_id: Uuid,
  content_owner: Option<Uuid>,
) -> Result<Capabilities> {
  let rank = community_rank(store, principal, community_id).await?;
  Ok(Capabilities::evaluate(principal, rank, content_owner))
}

/// Reject anonymous callers.
pub fn require_principal(principal: Option<&Principal>) -> Result<&Principal> {
  principal.ok_or(Error::Forbidden)
}

/// Reject anyone below global admin.
pub fn require_global_admin(principal: Option<&Principal>) -> Result<&Principal> {
  match principal {
    Some(p) if p.rank.is_admin() => Ok(p),
    _ => Err(Error::Forbidden),
  }
}
