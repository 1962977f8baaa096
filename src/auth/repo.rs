use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::ApiError;

const USER_COLUMNS: &str = "id, fullname, phonenumber, email, password_hash, role, \
     reset_otp_hash, reset_otp_expires_at, created_at, updated_at";

impl User {
    /// Insert a new user. The password arrives already hashed; uniqueness of
    /// email and phone number is enforced by the store's constraints, and a
    /// violation surfaces as `ApiError::Duplicate` via the From impl.
    pub async fn create(
        db: &PgPool,
        fullname: &str,
        phonenumber: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (fullname, phonenumber, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(fullname)
        .bind(phonenumber)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE email = $1"#
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list(db: &PgPool) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"#
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Arm the reset flow: store the hashed OTP and its deadline.
    pub async fn set_reset_otp(
        db: &PgPool,
        id: Uuid,
        otp_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_otp_hash = $2, reset_otp_expires_at = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(otp_hash)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Overwrite the OTP hash with the opaque reset ticket. The stored
    /// expiry is left untouched so the original 10-minute window keeps
    /// covering the ticket.
    pub async fn set_reset_ticket(db: &PgPool, id: Uuid, ticket: &str) -> Result<(), ApiError> {
        sqlx::query(
            r#"UPDATE users SET reset_otp_hash = $2, updated_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .bind(ticket)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn find_by_reset_ticket(db: &PgPool, ticket: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE reset_otp_hash = $1"#
        ))
        .bind(ticket)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Drop any outstanding reset state without touching the password.
    pub async fn clear_reset_otp(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_otp_hash = NULL, reset_otp_expires_at = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Write a new password hash and hand back the updated row. Clearing
    /// the reset fields happens in the same statement: any password change
    /// invalidates outstanding OTP state. Hashing is the caller's job and
    /// happens only because the password itself is the field being changed.
    pub async fn update_password(
        db: &PgPool,
        id: Uuid,
        new_password_hash: &str,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET password_hash = $2,
                reset_otp_hash = NULL,
                reset_otp_expires_at = NULL,
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new_password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}
