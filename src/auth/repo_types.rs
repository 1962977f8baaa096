use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Flat role string, closed to two values. No role-gated routes exist yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// User record in the database. The password hash and the reset-OTP state
/// never appear in JSON responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub phonenumber: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub reset_otp_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_otp_expires_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            fullname: "A B".into(),
            phonenumber: "+100".into(),
            email: "a@b.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            role: Role::default(),
            reset_otp_hash: Some("deadbeef".into()),
            reset_otp_expires_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serialization_hides_password_and_reset_state() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("passwordHash"));
        assert!(!json.contains("deadbeef"));
        assert!(!json.contains("resetOtp"));
        assert!(json.contains("a@b.com"));
        assert!(json.contains(r#""role":"user""#));
    }

    #[test]
    fn role_round_trips_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        let role: Role = serde_json::from_str(r#""user""#).unwrap();
        assert_eq!(role, Role::User);
    }
}
