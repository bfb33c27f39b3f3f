//! Handler for the home feed.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/feed?view=..` | `latest` (default), `subscribed` or `following`; at most 50 |

use axum::{
  Json,
  extract::{Query, State},
};
use forum_core::{
  feed::{self, FeedEntry, FeedView},
  store::ForumStore,
};
use serde::Deserialize;

use crate::{AppState, actor::Actor, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct FeedParams {
  #[serde(default)]
  pub view: FeedView,
}

/// `GET /feed[?view=latest|subscribed|following]`
pub async fn home<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Query(params): Query<FeedParams>,
) -> Result<Json<Vec<FeedEntry>>, ApiError>
where
  S: ForumStore + 'static,
{
  let entries = feed::feed(state.store.as_ref(), actor.principal(), params.view).await?;
  Ok(Json(entries))
}
