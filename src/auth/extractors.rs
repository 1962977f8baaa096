use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Auth gate for protected routes. Pulls the bearer token from the
/// Authorization header, verifies it as an access token, then resolves the
/// embedded id to a live user row. A token for a since-deleted user is as
/// unauthorized as a bad signature. One store lookup per request, no
/// blacklist: tokens stay valid until their natural expiry.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_access(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for unknown user");
                ApiError::unauthorized("User no longer exists")
            })?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    use crate::auth::jwt::{Claims, TokenKind};

    fn parts_with_auth(header: Option<&str>) -> axum::http::request::Parts {
        let mut builder = axum::http::Request::builder().uri("/api/v1/auth/me");
        if let Some(value) = header {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        builder.body(()).expect("request").into_parts().0
    }

    async fn gate_status(header: Option<&str>) -> StatusCode {
        let state = AppState::fake();
        let mut parts = parts_with_auth(header);
        CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("gate should reject")
            .status()
    }

    #[tokio::test]
    async fn gate_rejects_missing_header() {
        assert_eq!(gate_status(None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn gate_rejects_non_bearer_scheme() {
        assert_eq!(gate_status(Some("Token abc")).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn gate_rejects_malformed_token() {
        assert_eq!(
            gate_status(Some("Bearer not.a.jwt")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn gate_rejects_expired_token() {
        // Signed with the fake state's access secret but an hour past exp.
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (now - Duration::hours(2)).unix_timestamp() as usize,
            exp: (now - Duration::hours(1)).unix_timestamp() as usize,
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
            kind: TokenKind::Access,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-access-secret"),
        )
        .expect("encode");
        let header = format!("Bearer {token}");
        assert_eq!(gate_status(Some(&header)).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn gate_rejects_refresh_token_on_protected_route() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_refresh(Uuid::new_v4()).expect("sign refresh");
        let header = format!("Bearer {token}");
        assert_eq!(gate_status(Some(&header)).await, StatusCode::UNAUTHORIZED);
    }
}
