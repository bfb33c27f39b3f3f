//! Admin bootstrap, run on every successful authentication.
//!
//! The first principal to log in while no global admin exists becomes one, as
//! does the configured designated identity on each of its logins.
//!
//! The admin count and the upsert are two separate storage calls. Two
//! first-time logins racing before either write commits can therefore both be
//! granted admin; that window is accepted.

use tracing::info;

use crate::{
  Error, Result,
  principal::{ExternalIdentity, Principal},
  rank::GlobalRank,
  store::ForumStore,
};

/// Bootstrap settings, usually loaded from server configuration.
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
  /// External id that is always elevated to global admin on login.
  pub designated_admin: Option<String>,
}

impl BootstrapConfig {
  fn is_designated(&self, identity: &ExternalIdentity) -> bool {
    self
      .designated_admin
      .as_deref()
      .is_some_and(|id| id == identity.external_id)
  }
}

/// Create or refresh the principal for `identity` and resolve its global rank.
///
/// The written rank is merged upward, so an elevated principal is never
/// downgraded by a later ordinary login.
pub async fn bootstrap<S: ForumStore>(
  store: &S,
  config: &BootstrapConfig,
  identity: ExternalIdentity,
) -> Result<Principal> {
  if identity.external_id.trim().is_empty() {
    return Err(Error::validation("external identity is required"));
  }

  let has_any_admin = store.count_global_admins().await.map_err(Error::storage)? > 0;
  let should_be_admin = config.is_designated(&identity) || !has_any_admin;

  let rank = if should_be_admin { GlobalRank::Admin } else { GlobalRank::Member };

  let principal = store
    .upsert_principal(identity, rank)
    .await
    .map_err(Error::storage)?;

  if should_be_admin {
    info!(
      principal = %principal.principal_id,
      first_admin = !has_any_admin,
      "login elevated to global admin"
    );
  }

  Ok(principal)
}
