use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use dhandraft_core::{AuthError, User, UserProfile};
use tracing::debug;

use crate::{error::ApiError, state::AppState};

/// The caller identified by `Authorization: Bearer <jwt>`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(&self.0)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Verifies `token` and loads its user.
pub async fn resolve_user(state: &AppState, token: &str) -> Result<User, ApiError> {
    let claims = state.jwt.verify(token)?;
    state
        .db
        .users()
        .get(&claims.uid)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let user = resolve_user(state, token).await?;

        if !state.api_limiter.check(&user.id) {
            debug!(user_id = %user.id, "api rate limit exceeded");
            return Err(ApiError::TooManyRequests(
                "Too many requests. Slow down.".to_string(),
            ));
        }

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/me");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
