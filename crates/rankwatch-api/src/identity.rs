//! The authenticated caller, as established by the hosting server.
//!
//! This crate does not authenticate anyone. The server's auth layer inserts
//! an [`Identity`] into the request extensions; handlers that scope data to a
//! user extract it and reject the request with 401 if it is missing.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::ApiError;

/// Identifier of the signed-in user; owns the sites it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
  pub fn as_str(&self) -> &str { &self.0 }
}

impl<St> FromRequestParts<St> for Identity
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Identity>()
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}
