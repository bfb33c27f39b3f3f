//! The acting principal of a request.
//!
//! The fronting authentication layer passes the principal id in
//! [`PRINCIPAL_HEADER`]. The principal is loaded from the store on every
//! request, so rank changes apply to the very next call.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use forum_core::{principal::Principal, store::ForumStore};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const PRINCIPAL_HEADER: &str = "x-forum-principal";

/// `None` for anonymous requests.
pub struct Actor(pub Option<Principal>);

impl Actor {
  pub fn principal(&self) -> Option<&Principal> { self.0.as_ref() }
}

/// Principal id carried by `headers`, if any.
pub fn principal_id(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
  let Some(value) = headers.get(PRINCIPAL_HEADER) else {
    return Ok(None);
  };
  value
    .to_str()
    .ok()
    .and_then(|v| Uuid::parse_str(v.trim()).ok())
    .map(Some)
    .ok_or_else(|| ApiError::Unauthorized(format!("malformed {PRINCIPAL_HEADER} header")))
}

impl<S> FromRequestParts<AppState<S>> for Actor
where
  S: ForumStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Some(id) = principal_id(&parts.headers)? else {
      return Ok(Actor(None));
    };
    let principal = state
      .store
      .get_principal(id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::Unauthorized(format!("unknown principal {id}")))?;
    Ok(Actor(Some(principal)))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn absent_header_is_anonymous() {
    assert_eq!(principal_id(&HeaderMap::new()).unwrap(), None);
  }

  #[test]
  fn header_must_be_a_uuid() {
    let id = Uuid::now_v7();
    let mut headers = HeaderMap::new();
    headers.insert(PRINCIPAL_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
    assert_eq!(principal_id(&headers).unwrap(), Some(id));

    headers.insert(PRINCIPAL_HEADER, HeaderValue::from_static("not-a-uuid"));
    assert!(matches!(principal_id(&headers), Err(ApiError::Unauthorized(_))));
  }
}
