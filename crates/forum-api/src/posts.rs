//! Handlers for posts and comments.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/communities/:id/posts` | Newest first; optional `?limit` (default 50, max 100) |
//! | `POST`   | `/posts` | Body: [`NewPostBody`]; returns 201 |
//! | `GET`    | `/posts/:id` | Post, ordered comment tree, per-item capabilities |
//! | `PUT`    | `/posts/:id` | Author only |
//! | `DELETE` | `/posts/:id` | Author, community admin/owner, global admin |
//! | `POST`   | `/posts/:id/comments` | Body: `{"parent_id":..,"body":".."}`; returns 201 |
//! | `PUT`    | `/comments/:id` | Author only |
//! | `DELETE` | `/comments/:id` | Soft when the comment has replies, hard otherwise |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use forum_core::{
  authoring,
  capability::{Capabilities, community_rank},
  content::{Comment, Post, existing_post},
  deletion::{self, Deletion},
  store::ForumStore,
  tree::build_tree,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, actor::Actor, communities::readable_community, error::ApiError};

const DEFAULT_PAGE: usize = 50;
const MAX_PAGE: usize = 100;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /communities/:id/posts[?limit=N]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(community_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: ForumStore + 'static,
{
  let store = state.store.as_ref();
  readable_community(store, actor.principal(), community_id).await?;

  let limit = params.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
  let posts = store
    .list_posts(community_id, limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(posts))
}

// ─── Create / edit / delete ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewPostBody {
  pub community_id: Uuid,
  pub title:        String,
  pub body:         String,
}

/// `POST /posts`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Json(body): Json<NewPostBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore + 'static,
{
  let post = authoring::create_post(
    state.store.as_ref(),
    actor.principal(),
    body.community_id,
    &body.title,
    &body.body,
  )
  .await?;
  Ok((StatusCode::CREATED, Json(post)))
}

#[derive(Debug, Deserialize)]
pub struct EditPostBody {
  pub title: String,
  pub body:  String,
}

/// `PUT /posts/:id`
pub async fn edit<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<EditPostBody>,
) -> Result<Json<Post>, ApiError>
where
  S: ForumStore + 'static,
{
  let post =
    authoring::edit_post(state.store.as_ref(), actor.principal(), id, &body.title, &body.body)
      .await?;
  Ok(Json(post))
}

#[derive(Debug, Serialize)]
pub struct DeletionBody {
  pub deletion: Deletion,
}

/// `DELETE /posts/:id`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<DeletionBody>, ApiError>
where
  S: ForumStore + 'static,
{
  let deletion = deletion::delete_post(state.store.as_ref(), id, actor.principal()).await?;
  Ok(Json(DeletionBody { deletion }))
}

// ─── Thread view ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ThreadEntry {
  #[serde(flatten)]
  pub comment:      Comment,
  pub depth:        usize,
  pub capabilities: Capabilities,
}

/// A post with its comments in display order.
#[derive(Debug, Serialize)]
pub struct ThreadView {
  pub post:         Post,
  pub capabilities: Capabilities,
  pub comments:     Vec<ThreadEntry>,
}

/// `GET /posts/:id`
///
/// The community rank is read once; each entry's capabilities are then
/// evaluated against its own author.
pub async fn thread<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<ThreadView>, ApiError>
where
  S: ForumStore + 'static,
{
  let store = state.store.as_ref();
  let me = actor.principal();

  let post = existing_post(store, id).await?;
  readable_community(store, me, post.community_id).await?;
  let rank = community_rank(store, me, post.community_id).await?;

  let comments = store.list_comments(id).await.map_err(ApiError::store)?;
  let comments = build_tree(comments)
    .into_iter()
    .map(|(comment, depth)| ThreadEntry {
      capabilities: Capabilities::evaluate(me, rank, Some(comment.author_id)),
      comment,
      depth,
    })
    .collect();

  Ok(Json(ThreadView {
    capabilities: Capabilities::evaluate(me, rank, Some(post.author_id)),
    post,
    comments,
  }))
}

// ─── Comments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReplyBody {
  #[serde(default)]
  pub parent_id: Option<Uuid>,
  pub body:      String,
}

/// `POST /posts/:id/comments`
pub async fn reply<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(post_id): Path<Uuid>,
  Json(body): Json<ReplyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore + 'static,
{
  let comment = authoring::reply(
    state.store.as_ref(),
    actor.principal(),
    post_id,
    body.parent_id,
    &body.body,
  )
  .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Debug, Deserialize)]
pub struct EditCommentBody {
  pub body: String,
}

/// `PUT /comments/:id`
pub async fn edit_comment<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<EditCommentBody>,
) -> Result<Json<Comment>, ApiError>
where
  S: ForumStore + 'static,
{
  let comment =
    authoring::edit_comment(state.store.as_ref(), actor.principal(), id, &body.body).await?;
  Ok(Json(comment))
}

/// `DELETE /comments/:id`
pub async fn remove_comment<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<DeletionBody>, ApiError>
where
  S: ForumStore + 'static,
{
  let deletion = deletion::delete_comment(state.store.as_ref(), id, actor.principal()).await?;
  Ok(Json(DeletionBody { deletion }))
}
