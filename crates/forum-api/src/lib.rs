//! JSON REST API for the forum.
//!
//! Exposes an axum [`Router`] backed by any [`forum_core::store::ForumStore`].
//! Authentication against the identity provider happens in front of this
//! router; see [`actor`] for how the acting principal is passed in.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", forum_api::api_router(state))
//! ```

pub mod actor;
pub mod communities;
pub mod error;
pub mod feed;
pub mod identity;
pub mod posts;
pub mod principals;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use forum_core::{bootstrap::BootstrapConfig, rank::Outcome, store::ForumStore};
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub bootstrap: Arc<BootstrapConfig>,
}

impl<S> AppState<S> {
  pub fn new(store: S, bootstrap: BootstrapConfig) -> Self {
    Self {
      store:     Arc::new(store),
      bootstrap: Arc::new(bootstrap),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      bootstrap: Arc::clone(&self.bootstrap),
    }
  }
}

/// Response body of ledger mutations.
#[derive(Debug, Serialize)]
pub struct OutcomeBody {
  pub outcome: Outcome,
}

impl From<Outcome> for OutcomeBody {
  fn from(outcome: Outcome) -> Self { Self { outcome } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: ForumStore + 'static,
{
  Router::new()
    // Identity
    .route("/auth/identity", post(identity::login::<S>))
    // Communities
    .route("/communities", get(communities::list::<S>).post(communities::suggest::<S>))
    .route(
      "/communities/{id}",
      get(communities::get_one::<S>).delete(communities::remove::<S>),
    )
    .route("/communities/{id}/approve", post(communities::approve::<S>))
    .route("/communities/{id}/subscribe", post(communities::subscribe::<S>))
    .route("/communities/{id}/unsubscribe", post(communities::unsubscribe::<S>))
    .route("/communities/{id}/members", get(communities::members::<S>))
    .route("/communities/{id}/admins", post(communities::grant_admin::<S>))
    .route("/communities/{id}/owners", post(communities::grant_owner::<S>))
    .route(
      "/communities/{id}/admins/{principal}/demote",
      post(communities::demote::<S>),
    )
    .route("/communities/{id}/posts", get(posts::list::<S>))
    // Posts and comments
    .route("/posts", post(posts::create::<S>))
    .route(
      "/posts/{id}",
      get(posts::thread::<S>)
        .put(posts::edit::<S>)
        .delete(posts::remove::<S>),
    )
    .route("/posts/{id}/comments", post(posts::reply::<S>))
    .route(
      "/comments/{id}",
      put(posts::edit_comment::<S>).delete(posts::remove_comment::<S>),
    )
    // Feed
    .route("/feed", get(feed::home::<S>))
    // Principals
    .route("/principals", get(principals::search::<S>))
    .route("/principals/{id}", get(principals::get_one::<S>))
    .route("/principals/{id}/admin", post(principals::make_admin::<S>))
    .route("/principals/{id}/follow", post(principals::follow::<S>))
    .route("/principals/{id}/unfollow", post(principals::unfollow::<S>))
    .with_state(state)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
