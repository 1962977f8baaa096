use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, MessageResponse, RefreshRequest, RefreshResponse,
            ResetPasswordRequest, SendOtpRequest, SignupRequest, VerifyOtpRequest,
            VerifyOtpResponse,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        otp,
        password::{hash_password, verify_password},
        repo_types::User,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/auth/send-otp", post(send_otp))
        .route("/auth/forgot-password", post(send_otp))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/reset-password", patch(reset_password).put(reset_password))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/users", get(list_users))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn token_pair(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user,
    })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = normalize_email(&payload.email);

    if payload.fullname.trim().is_empty() || payload.phonenumber.trim().is_empty() {
        return Err(ApiError::validation("Fullname and phone number are required"));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::validation("Password too short"));
    }
    if payload.password != payload.password_confirm {
        return Err(ApiError::validation("Passwords do not match"));
    }

    // Early uniqueness check; a concurrent race still lands on the unique
    // constraint and surfaces as the same Duplicate error.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::duplicate("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        payload.fullname.trim(),
        payload.phonenumber.trim(),
        &payload.email,
        &hash,
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    let response = token_pair(&state, user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::unauthorized("Invalid credentials")
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(token_pair(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    // A missing token is as unauthorized as a bad one; the wire format
    // keeps the field optional so the 401 is ours, not the deserializer's.
    let token = payload
        .refresh_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing refresh token"))?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired refresh token"))?;

    // The user must still exist; the refresh token itself is not rotated.
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    let access_token = keys.sign_access(user.id)?;
    info!(user_id = %user.id, "access token refreshed");
    Ok(Json(RefreshResponse { access_token }))
}

/// Always answers with the same generic 200, whether or not the email is
/// registered, so the endpoint cannot be used to enumerate accounts.
#[instrument(skip(state, payload))]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = normalize_email(&payload.email);

    if let Some(user) = User::find_by_email(&state.db, &email).await? {
        let code = otp::generate_otp();
        User::set_reset_otp(&state.db, user.id, &otp::hash_otp(&code), otp::otp_deadline())
            .await?;

        if let Err(e) = state
            .mailer
            .send_otp_email(&user.email, &user.fullname, &code)
            .await
        {
            error!(error = %e, user_id = %user.id, "otp email delivery failed");
            // Disarm the flow rather than leave a code the user never saw.
            User::clear_reset_otp(&state.db, user.id).await?;
            return Err(ApiError::Internal(e));
        }
        info!(user_id = %user.id, "otp issued");
    } else {
        info!("otp requested for unknown email");
    }

    Ok(Json(MessageResponse {
        message: "If that email is registered, a reset code has been sent".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    let invalid = || ApiError::validation("Invalid or expired OTP");

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(invalid)?;

    let stored_hash = user.reset_otp_hash.as_deref().ok_or_else(invalid)?;
    let expires_at = user.reset_otp_expires_at.ok_or_else(invalid)?;

    if !otp::otp_is_valid(
        &payload.otp,
        stored_hash,
        expires_at,
        OffsetDateTime::now_utc(),
    ) {
        warn!(user_id = %user.id, "otp verification failed");
        return Err(invalid());
    }

    // Repurpose the hash column as the one-shot reset ticket; the stored
    // deadline stays in place and is checked again on consumption.
    let ticket = otp::generate_reset_ticket();
    User::set_reset_ticket(&state.db, user.id, &ticket).await?;

    info!(user_id = %user.id, "otp verified, reset ticket issued");
    Ok(Json(VerifyOtpResponse {
        temporary_reset_token: ticket,
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.new_password.is_empty() {
        return Err(ApiError::validation("New password is required"));
    }
    if payload.new_password != payload.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }
    if payload.new_password.len() < 8 {
        return Err(ApiError::validation("Password too short"));
    }

    let user = User::find_by_reset_ticket(&state.db, &payload.temporary_reset_token)
        .await?
        .ok_or_else(|| ApiError::validation("Invalid or expired reset token"))?;

    // The ticket inherits the OTP deadline, keeping the whole flow inside
    // the original 10-minute window.
    if !otp::ticket_window_open(user.reset_otp_expires_at, OffsetDateTime::now_utc()) {
        User::clear_reset_otp(&state.db, user.id).await?;
        return Err(ApiError::validation("Invalid or expired reset token"));
    }

    let hash = hash_password(&payload.new_password)?;
    // Writes the hash and clears the reset state in one statement, so the
    // consumed ticket can never be replayed.
    let user = User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(token_pair(&state, user)?))
}

/// Tokens are stateless, so logout is an acknowledgement; the client
/// discards its pair.
#[instrument(skip_all)]
pub async fn logout(CurrentUser(user): CurrentUser) -> Json<MessageResponse> {
    info!(user_id = %user.id, "user logged out");
    Json(MessageResponse {
        message: "Logged out".into(),
    })
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = User::list(&state.db).await?;
    if users.is_empty() {
        return Err(ApiError::not_found("No users found"));
    }
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("user.name@sub.domain.io"));
    }

    #[test]
    fn email_validation_rejects_garbage() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  A@B.Com "), "a@b.com");
    }

    async fn refresh_status(token: Option<&str>) -> StatusCode {
        let state = crate::state::AppState::fake();
        refresh_token(
            State(state),
            Json(RefreshRequest {
                refresh_token: token.map(str::to_string),
            }),
        )
        .await
        .err()
        .expect("refresh should reject")
        .status()
    }

    #[tokio::test]
    async fn refresh_rejects_missing_token_as_unauthorized() {
        assert_eq!(refresh_status(None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_rejects_empty_token_as_unauthorized() {
        assert_eq!(refresh_status(Some("")).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_rejects_garbage_token_as_unauthorized() {
        assert_eq!(
            refresh_status(Some("not.a.jwt")).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
