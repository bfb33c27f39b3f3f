//! `POST /auth/identity`: called by the authentication layer after the
//! identity provider has verified a login.

use axum::{Json, extract::State};
use forum_core::{
  bootstrap::bootstrap,
  principal::{ExternalIdentity, Principal},
  store::ForumStore,
};

use crate::{AppState, error::ApiError};

/// Body: an [`ExternalIdentity`]. Returns the stored principal; its id is what
/// later requests carry in the principal header.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(identity): Json<ExternalIdentity>,
) -> Result<Json<Principal>, ApiError>
where
  S: ForumStore + 'static,
{
  let principal = bootstrap(state.store.as_ref(), &state.bootstrap, identity).await?;
  Ok(Json(principal))
}
