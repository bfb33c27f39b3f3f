//! Principals — authenticated participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  capability::require_global_admin,
  rank::GlobalRank,
  store::ForumStore,
};

/// Cap on [`search_principals`] results.
pub const SEARCH_LIMIT: usize = 20;

/// A participant known to the forum. Created on first successful
/// authentication; its rank is only ever raised automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub principal_id: Uuid,
  /// Stable identifier assigned by the external identity provider.
  pub external_id:  String,
  pub display_name: String,
  pub avatar:       Option<String>,
  pub rank:         GlobalRank,
  pub created_at:   DateTime<Utc>,
}

/// A verified identity tuple delivered once per successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
  pub external_id:  String,
  pub display_name: String,
  #[serde(default)]
  pub avatar:       Option<String>,
}

/// Global rank of an optional principal; absent means anonymous.
pub fn global_rank(principal: Option<&Principal>) -> GlobalRank {
  principal.map_or(GlobalRank::Anonymous, |p| p.rank)
}

pub async fn existing_principal<S: ForumStore>(store: &S, id: Uuid) -> Result<Principal> {
  store
    .get_principal(id)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::PrincipalNotFound(id))
}

/// Admin lookup by display-name substring. An empty query matches nothing.
pub async fn search_principals<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  query: &str,
) -> Result<Vec<Principal>> {
  require_global_admin(actor)?;
  let query = query.trim();
  if query.is_empty() {
    return Ok(Vec::new());
  }

  store
    .search_principals(query.to_owned(), SEARCH_LIMIT)
    .await
    .map_err(Error::storage)
}
