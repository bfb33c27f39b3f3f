//! Handlers for `/communities` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/communities` | Approved only, unless the caller is a global admin |
//! | `POST`   | `/communities` | Body: `{"name":"..","description":".."}`; created unapproved |
//! | `GET`    | `/communities/:id` | 404 for unapproved communities (admins excepted) |
//! | `DELETE` | `/communities/:id` | Global admin |
//! | `POST`   | `/communities/:id/approve` | Global admin |
//! | `POST`   | `/communities/:id/subscribe` | Caller subscribes |
//! | `POST`   | `/communities/:id/unsubscribe` | Caller leaves, forfeiting any rank |
//! | `GET`    | `/communities/:id/members` | Roster grouped by rank |
//! | `POST`   | `/communities/:id/admins` | Global admin; body: `{"principal_id":".."}` |
//! | `POST`   | `/communities/:id/owners` | Global admin; body: `{"principal_id":".."}` |
//! | `POST`   | `/communities/:id/admins/:principal/demote` | Owner or global admin |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use forum_core::{
  capability::{capabilities, community_rank, require_global_admin, require_principal},
  community::{
    Community, approve_community, existing_community, remove_community, suggest_community,
    visible_community,
  },
  ledger,
  principal::{Principal, global_rank},
  rank::CommunityRank,
  store::ForumStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, OutcomeBody, actor::Actor, error::ApiError};

/// Global admins see unapproved communities too.
pub(crate) async fn readable_community<S: ForumStore>(
  store: &S,
  actor: Option<&Principal>,
  id: Uuid,
) -> Result<Community, ApiError> {
  let community = if global_rank(actor).is_admin() {
    existing_community(store, id).await?
  } else {
    visible_community(store, id).await?
  };
  Ok(community)
}

// ─── List / suggest ───────────────────────────────────────────────────────────

/// `GET /communities`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
) -> Result<Json<Vec<Community>>, ApiError>
where
  S: ForumStore + 'static,
{
  let approved_only = !global_rank(actor.principal()).is_admin();
  let communities = state
    .store
    .list_communities(approved_only)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(communities))
}

#[derive(Debug, Deserialize)]
pub struct SuggestBody {
  pub name:        String,
  #[serde(default)]
  pub description: String,
}

/// `POST /communities` — returns 201 + the unapproved community.
pub async fn suggest<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Json(body): Json<SuggestBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore + 'static,
{
  let community =
    suggest_community(state.store.as_ref(), actor.principal(), &body.name, &body.description)
      .await?;
  Ok((StatusCode::CREATED, Json(community)))
}

// ─── Get / remove / approve ───────────────────────────────────────────────────

/// A community together with the caller's standing in it.
#[derive(Debug, Serialize)]
pub struct CommunityView {
  pub community:          Community,
  pub rank:               CommunityRank,
  pub can_manage_members: bool,
}

/// `GET /communities/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<CommunityView>, ApiError>
where
  S: ForumStore + 'static,
{
  let store = state.store.as_ref();
  let community = readable_community(store, actor.principal(), id).await?;
  let rank = community_rank(store, actor.principal(), id).await?;
  let caps = capabilities(store, actor.principal(), id, None).await?;
  Ok(Json(CommunityView {
    community,
    rank,
    can_manage_members: caps.can_manage_members,
  }))
}

/// `DELETE /communities/:id` — 204 on success.
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ForumStore + 'static,
{
  remove_community(state.store.as_ref(), actor.principal(), id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /communities/:id/approve`
pub async fn approve<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<OutcomeBody>, ApiError>
where
  S: ForumStore + 'static,
{
  let outcome = approve_community(state.store.as_ref(), actor.principal(), id).await?;
  Ok(Json(outcome.into()))
}

// ─── Membership ───────────────────────────────────────────────────────────────

/// `POST /communities/:id/subscribe`
pub async fn subscribe<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<OutcomeBody>, ApiError>
where
  S: ForumStore + 'static,
{
  let me = require_principal(actor.principal())?;
  let outcome = ledger::subscribe(state.store.as_ref(), id, me.principal_id).await?;
  Ok(Json(outcome.into()))
}

/// `POST /communities/:id/unsubscribe`
pub async fn unsubscribe<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<OutcomeBody>, ApiError>
where
  S: ForumStore + 'static,
{
  let me = require_principal(actor.principal())?;
  let outcome = ledger::unsubscribe(state.store.as_ref(), id, me.principal_id).await?;
  Ok(Json(outcome.into()))
}

/// Members of a community, highest rank first.
#[derive(Debug, Default, Serialize)]
pub struct Roster {
  pub owners:             Vec<Uuid>,
  pub admins:             Vec<Uuid>,
  pub subscribers:        Vec<Uuid>,
  /// Whether the caller may demote the listed admins.
  pub can_manage_members: bool,
}

/// `GET /communities/:id/members`
pub async fn members<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Roster>, ApiError>
where
  S: ForumStore + 'static,
{
  let store = state.store.as_ref();
  readable_community(store, actor.principal(), id).await?;

  let memberships = store.list_memberships(id).await.map_err(ApiError::store)?;
  let caps = capabilities(store, actor.principal(), id, None).await?;

  let mut roster = Roster {
    can_manage_members: caps.can_manage_members,
    ..Roster::default()
  };
  for m in memberships {
    match m.rank {
      CommunityRank::Owner => roster.owners.push(m.principal_id),
      CommunityRank::Admin => roster.admins.push(m.principal_id),
      CommunityRank::Subscriber => roster.subscribers.push(m.principal_id),
      CommunityRank::None => {}
    }
  }
  Ok(Json(roster))
}

#[derive(Debug, Deserialize)]
pub struct GrantBody {
  pub principal_id: Uuid,
}

/// `POST /communities/:id/admins`
pub async fn grant_admin<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<GrantBody>,
) -> Result<Json<OutcomeBody>, ApiError>
where
  S: ForumStore + 'static,
{
  require_global_admin(actor.principal())?;
  let outcome = ledger::grant_community_admin(state.store.as_ref(), id, body.principal_id).await?;
  Ok(Json(outcome.into()))
}

/// `POST /communities/:id/owners`
pub async fn grant_owner<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<GrantBody>,
) -> Result<Json<OutcomeBody>, ApiError>
where
  S: ForumStore + 'static,
{
  require_global_admin(actor.principal())?;
  let outcome = ledger::grant_community_owner(state.store.as_ref(), id, body.principal_id).await?;
  Ok(Json(outcome.into()))
}

/// `POST /communities/:id/admins/:principal/demote`
pub async fn demote<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path((id, principal_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OutcomeBody>, ApiError>
where
  S: ForumStore + 'static,
{
  let me = require_principal(actor.principal())?;
  let outcome = ledger::demote_admin(state.store.as_ref(), id, principal_id, me).await?;
  Ok(Json(outcome.into()))
}
