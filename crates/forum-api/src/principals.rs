//! Handlers for `/principals` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/principals?q=..` | Global admin; display-name substring, at most 20 |
//! | `GET`  | `/principals/:id` | Profile: the principal, their posts, whether the caller follows them |
//! | `POST` | `/principals/:id/admin` | Global admin; raises the target to global admin |
//! | `POST` | `/principals/:id/follow` | Logged in; following yourself is a 400 |
//! | `POST` | `/principals/:id/unfollow` | Logged in |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use forum_core::{
  capability::require_global_admin,
  feed::{self, Profile},
  ledger::set_global_admin,
  principal::{Principal, search_principals},
  store::ForumStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, OutcomeBody, actor::Actor, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

/// `GET /principals?q=<text>`
pub async fn search<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Principal>>, ApiError>
where
  S: ForumStore + 'static,
{
  let found = search_principals(state.store.as_ref(), actor.principal(), &params.q).await?;
  Ok(Json(found))
}

/// `GET /principals/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError>
where
  S: ForumStore + 'static,
{
  let profile = feed::profile(state.store.as_ref(), actor.principal(), id).await?;
  Ok(Json(profile))
}

/// `POST /principals/:id/admin`
pub async fn make_admin<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<OutcomeBody>, ApiError>
where
  S: ForumStore + 'static,
{
  require_global_admin(actor.principal())?;
  let outcome = set_global_admin(state.store.as_ref(), id).await?;
  Ok(Json(outcome.into()))
}

/// `POST /principals/:id/follow`
pub async fn follow<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<OutcomeBody>, ApiError>
where
  S: ForumStore + 'static,
{
  let outcome = feed::follow(state.store.as_ref(), actor.principal(), id).await?;
  Ok(Json(outcome.into()))
}

/// `POST /principals/:id/unfollow`
pub async fn unfollow<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<OutcomeBody>, ApiError>
where
  S: ForumStore + 'static,
{
  let outcome = feed::unfollow(state.store.as_ref(), actor.principal(), id).await?;
  Ok(Json(outcome.into()))
}
