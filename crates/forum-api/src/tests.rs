//! Router tests against an in-memory SQLite store.

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use forum_core::bootstrap::BootstrapConfig;
use forum_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, actor::PRINCIPAL_HEADER, api_router};

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(AppState::new(store, BootstrapConfig::default()))
}

async fn call(
  app: &Router,
  method: &str,
  uri: &str,
  principal: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(p) = principal {
    builder = builder.header(PRINCIPAL_HEADER, p);
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };

  let resp = app
    .clone()
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

/// Log `name` in and return its principal id.
async fn login(app: &Router, name: &str) -> String {
  let (status, principal) = call(
    app,
    "POST",
    "/auth/identity",
    None,
    Some(json!({ "external_id": format!("ext-{name}"), "display_name": name })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  principal["principal_id"].as_str().unwrap().to_owned()
}

/// An approved community created by `admin`.
async fn community(app: &Router, admin: &str, name: &str) -> String {
  let (status, c) = call(
    app,
    "POST",
    "/communities",
    Some(admin),
    Some(json!({ "name": name, "description": "" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = c["community_id"].as_str().unwrap().to_owned();
  let (status, _) = call(app, "POST", &format!("/communities/{id}/approve"), Some(admin), None).await;
  assert_eq!(status, StatusCode::OK);
  id
}

// ── Identity ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_identity_is_admin() {
  let app = app().await;
  let first = login(&app, "first").await;
  let second = login(&app, "second").await;

  let (_, p) = call(&app, "GET", &format!("/principals/{first}"), None, None).await;
  assert_eq!(p["rank"], "admin");
  let (_, p) = call(&app, "GET", &format!("/principals/{second}"), None, None).await;
  assert_eq!(p["rank"], "member");
}

#[tokio::test]
async fn principal_header_is_checked() {
  let app = app().await;

  let body = json!({ "name": "x" });
  let (status, _) = call(&app, "POST", "/communities", None, Some(body.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, err) = call(&app, "POST", "/communities", Some("nope"), Some(body.clone())).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(err["error"].is_string());

  let stranger = Uuid::now_v7().to_string();
  let (status, _) = call(&app, "POST", "/communities", Some(&stranger), Some(body)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Communities ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn unapproved_community_hidden_until_approved() {
  let app = app().await;
  let admin = login(&app, "admin").await;
  let member = login(&app, "member").await;

  let (status, c) = call(
    &app,
    "POST",
    "/communities",
    Some(&member),
    Some(json!({ "name": "Gardening" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(c["approved"], false);
  let id = c["community_id"].as_str().unwrap();

  let (_, listed) = call(&app, "GET", "/communities", Some(&member), None).await;
  assert_eq!(listed.as_array().unwrap().len(), 0);
  let (_, listed) = call(&app, "GET", "/communities", Some(&admin), None).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);

  let uri = format!("/communities/{id}");
  let (status, _) = call(&app, "GET", &uri, Some(&member), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let approve = format!("/communities/{id}/approve");
  let (status, _) = call(&app, "POST", &approve, Some(&member), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, body) = call(&app, "POST", &approve, Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["outcome"], "applied");

  let (status, view) = call(&app, "GET", &uri, Some(&member), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(view["community"]["name"], "Gardening");
  assert_eq!(view["rank"], "none");
}

#[tokio::test]
async fn subscribe_twice_reports_unchanged() {
  let app = app().await;
  let admin = login(&app, "admin").await;
  let member = login(&app, "member").await;
  let c = community(&app, &admin, "Rust").await;

  let uri = format!("/communities/{c}/subscribe");
  let (_, first) = call(&app, "POST", &uri, Some(&member), None).await;
  let (_, second) = call(&app, "POST", &uri, Some(&member), None).await;
  assert_eq!(first["outcome"], "applied");
  assert_eq!(second["outcome"], "unchanged");

  let (_, roster) = call(&app, "GET", &format!("/communities/{c}/members"), None, None).await;
  assert_eq!(roster["subscribers"], json!([member]));

  let (_, left) = call(&app, "POST", &format!("/communities/{c}/unsubscribe"), Some(&member), None).await;
  assert_eq!(left["outcome"], "applied");
  let (_, roster) = call(&app, "GET", &format!("/communities/{c}/members"), None, None).await;
  assert_eq!(roster["subscribers"], json!([]));
}

#[tokio::test]
async fn grants_are_admin_only_and_demote_needs_owner() {
  let app = app().await;
  let admin = login(&app, "admin").await;
  let owner = login(&app, "owner").await;
  let moderator = login(&app, "moderator").await;
  let c = community(&app, &admin, "Rust").await;

  let grant_admin = format!("/communities/{c}/admins");
  let (status, _) = call(
    &app,
    "POST",
    &grant_admin,
    Some(&owner),
    Some(json!({ "principal_id": moderator })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(
    &app,
    "POST",
    &format!("/communities/{c}/owners"),
    Some(&admin),
    Some(json!({ "principal_id": owner })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = call(
    &app,
    "POST",
    &grant_admin,
    Some(&admin),
    Some(json!({ "principal_id": moderator })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, roster) = call(&app, "GET", &format!("/communities/{c}/members"), Some(&owner), None).await;
  assert_eq!(roster["owners"], json!([owner]));
  assert_eq!(roster["admins"], json!([moderator]));
  assert_eq!(roster["can_manage_members"], true);

  let demote_owner = format!("/communities/{c}/admins/{owner}/demote");
  let (status, _) = call(&app, "POST", &demote_owner, Some(&moderator), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (_, body) = call(&app, "POST", &demote_owner, Some(&admin), None).await;
  assert_eq!(body["outcome"], "unchanged");

  let demote = format!("/communities/{c}/admins/{moderator}/demote");
  let (_, body) = call(&app, "POST", &demote, Some(&owner), None).await;
  assert_eq!(body["outcome"], "applied");

  let (_, roster) = call(&app, "GET", &format!("/communities/{c}/members"), None, None).await;
  assert_eq!(roster["admins"], json!([]));
  assert_eq!(roster["subscribers"], json!([moderator]));
}

// ── Posts and comments ───────────────────────────────────────────────────────

#[tokio::test]
async fn thread_view_carries_tree_and_capabilities() {
  let app = app().await;
  let admin = login(&app, "admin").await;
  let owner = login(&app, "owner").await;
  let member = login(&app, "member").await;
  let visitor = login(&app, "visitor").await;
  let c = community(&app, &admin, "Rust").await;

  call(
    &app,
    "POST",
    &format!("/communities/{c}/owners"),
    Some(&admin),
    Some(json!({ "principal_id": owner })),
  )
  .await;

  let (status, post) = call(
    &app,
    "POST",
    "/posts",
    Some(&member),
    Some(json!({ "community_id": c, "title": "Hello", "body": "First" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let post_id = post["post_id"].as_str().unwrap().to_owned();
  let comments = format!("/posts/{post_id}/comments");

  let (status, x) = call(&app, "POST", &comments, Some(&member), Some(json!({ "body": "X" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  let x_id = x["comment_id"].as_str().unwrap().to_owned();
  let (_, y) = call(
    &app,
    "POST",
    &comments,
    Some(&visitor),
    Some(json!({ "parent_id": x_id, "body": "Y" })),
  )
  .await;
  let y_id = y["comment_id"].as_str().unwrap().to_owned();

  let thread = format!("/posts/{post_id}");
  let (_, view) = call(&app, "GET", &thread, Some(&visitor), None).await;
  let entries = view["comments"].as_array().unwrap();
  assert_eq!(entries.len(), 2);
  assert_eq!((entries[0]["comment_id"].as_str(), entries[0]["depth"].as_u64()), (Some(x_id.as_str()), Some(0)));
  assert_eq!((entries[1]["comment_id"].as_str(), entries[1]["depth"].as_u64()), (Some(y_id.as_str()), Some(1)));
  assert_eq!(entries[0]["capabilities"]["can_delete"], false);
  assert_eq!(entries[1]["capabilities"]["can_delete"], true);
  assert_eq!(entries[1]["capabilities"]["can_edit_own_content"], true);

  let (_, view) = call(&app, "GET", &thread, Some(&owner), None).await;
  assert_eq!(view["capabilities"]["can_delete"], true);
  assert_eq!(view["capabilities"]["can_edit_own_content"], false);

  let (_, deleted) = call(&app, "DELETE", &format!("/comments/{x_id}"), Some(&owner), None).await;
  assert_eq!(deleted["deletion"], "soft");
  let (_, deleted) = call(&app, "DELETE", &format!("/comments/{y_id}"), Some(&owner), None).await;
  assert_eq!(deleted["deletion"], "hard");

  let (_, view) = call(&app, "GET", &thread, None, None).await;
  let entries = view["comments"].as_array().unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0]["body"], forum_core::content::DELETED_SENTINEL);
  assert_eq!(entries[0]["capabilities"]["can_delete"], false);
}

#[tokio::test]
async fn authoring_errors_map_to_statuses() {
  let app = app().await;
  let admin = login(&app, "admin").await;
  let member = login(&app, "member").await;
  let c = community(&app, &admin, "Rust").await;

  let (status, err) = call(
    &app,
    "POST",
    "/posts",
    Some(&member),
    Some(json!({ "community_id": c, "title": "   ", "body": "b" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(err["error"].as_str().unwrap().contains("title"));

  let (_, post) = call(
    &app,
    "POST",
    "/posts",
    Some(&member),
    Some(json!({ "community_id": c, "title": "t", "body": "b" })),
  )
  .await;
  let post_id = post["post_id"].as_str().unwrap();

  let (status, _) = call(
    &app,
    "PUT",
    &format!("/posts/{post_id}"),
    Some(&admin),
    Some(json!({ "title": "mine now", "body": "b" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, edited) = call(
    &app,
    "PUT",
    &format!("/posts/{post_id}"),
    Some(&member),
    Some(json!({ "title": "t2", "body": "b2" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(edited["edited_at"].is_string());

  let (status, _) = call(
    &app,
    "POST",
    &format!("/posts/{post_id}/comments"),
    Some(&member),
    Some(json!({ "parent_id": Uuid::now_v7(), "body": "orphan" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let missing = Uuid::now_v7();
  let (status, _) = call(&app, "GET", &format!("/posts/{missing}"), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = call(&app, "DELETE", &format!("/posts/{post_id}"), Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["deletion"], "hard");

  let (_, listed) = call(&app, "GET", &format!("/communities/{c}/posts"), None, None).await;
  assert_eq!(listed, json!([]));
}

// ── Principals ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn principal_search_and_promotion_are_admin_only() {
  let app = app().await;
  let admin = login(&app, "admin").await;
  let alice = login(&app, "alice").await;
  login(&app, "bob").await;

  let (status, _) = call(&app, "GET", "/principals?q=ali", Some(&alice), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, found) = call(&app, "GET", "/principals?q=ali", Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK);
  let found = found.as_array().unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0]["display_name"], "alice");

  let promote = format!("/principals/{alice}/admin");
  let (status, _) = call(&app, "POST", &promote, Some(&alice), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (_, body) = call(&app, "POST", &promote, Some(&admin), None).await;
  assert_eq!(body["outcome"], "applied");

  // The new rank applies on the very next request.
  let (status, _) = call(&app, "GET", "/principals?q=bo", Some(&alice), None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn profile_lists_posts_and_follow_state() {
  let app = app().await;
  let admin = login(&app, "admin").await;
  let ada = login(&app, "ada").await;
  let reader = login(&app, "reader").await;
  let c = community(&app, &admin, "Rust").await;

  call(
    &app,
    "POST",
    "/posts",
    Some(&ada),
    Some(json!({ "community_id": c, "title": "Hello", "body": "First" })),
  )
  .await;

  let profile = format!("/principals/{ada}");
  let (status, p) = call(&app, "GET", &profile, Some(&reader), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(p["display_name"], "ada");
  assert_eq!(p["is_following"], false);
  assert_eq!(p["posts"].as_array().unwrap().len(), 1);
  assert_eq!(p["posts"][0]["comment_count"], 0);

  let (_, body) = call(&app, "POST", &format!("{profile}/follow"), Some(&reader), None).await;
  assert_eq!(body["outcome"], "applied");
  let (_, body) = call(&app, "POST", &format!("{profile}/follow"), Some(&reader), None).await;
  assert_eq!(body["outcome"], "unchanged");
  let (_, p) = call(&app, "GET", &profile, Some(&reader), None).await;
  assert_eq!(p["is_following"], true);

  let (status, _) = call(&app, "POST", &format!("{profile}/follow"), Some(&ada), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = call(&app, "POST", &format!("{profile}/follow"), None, None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (_, body) = call(&app, "POST", &format!("{profile}/unfollow"), Some(&reader), None).await;
  assert_eq!(body["outcome"], "applied");

  let missing = format!("/principals/{}/follow", Uuid::now_v7());
  let (status, _) = call(&app, "POST", &missing, Some(&reader), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Feed ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feed_views_filter_by_caller() {
  let app = app().await;
  let admin = login(&app, "admin").await;
  let ada = login(&app, "ada").await;
  let reader = login(&app, "reader").await;
  let rust = community(&app, &admin, "Rust").await;
  let go = community(&app, &admin, "Go").await;

  for (author, c) in [(&ada, &rust), (&admin, &go)] {
    let (status, _) = call(
      &app,
      "POST",
      "/posts",
      Some(author.as_str()),
      Some(json!({ "community_id": c, "title": "Hello", "body": "First" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }
  call(&app, "POST", &format!("/communities/{rust}/subscribe"), Some(&reader), None).await;
  call(&app, "POST", &format!("/principals/{admin}/follow"), Some(&reader), None).await;

  let (status, all) = call(&app, "GET", "/feed", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(all.as_array().unwrap().len(), 2);
  assert_eq!(all[0]["community_id"], go.as_str());

  let (_, subscribed) = call(&app, "GET", "/feed?view=subscribed", Some(&reader), None).await;
  let subscribed = subscribed.as_array().unwrap();
  assert_eq!(subscribed.len(), 1);
  assert_eq!(subscribed[0]["community_id"], rust.as_str());

  let (_, following) = call(&app, "GET", "/feed?view=following", Some(&reader), None).await;
  let following = following.as_array().unwrap();
  assert_eq!(following.len(), 1);
  assert_eq!(following[0]["author_id"], admin.as_str());

  let (status, _) = call(&app, "GET", "/feed?view=sideways", None, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
