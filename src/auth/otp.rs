use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

/// How long a sent OTP stays valid.
pub const OTP_TTL: Duration = Duration::minutes(10);

/// Generates a 6-digit numeric code, uniform over [100000, 999999].
pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    code.to_string()
}

/// The OTP is stored only as its SHA-256 digest, hex-encoded.
pub fn hash_otp(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    hex::encode(digest)
}

pub fn otp_deadline() -> OffsetDateTime {
    OffsetDateTime::now_utc() + OTP_TTL
}

/// Opaque reset ticket handed out after a successful OTP verification:
/// 20 random bytes, hex-encoded to 40 characters.
pub fn generate_reset_ticket() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Decides whether a candidate code unlocks the stored reset state at
/// `now`. A missed deadline rejects before the digest is compared. Once the
/// hash column has been overwritten with a reset ticket the original code
/// no longer matches, so a consumed code can never verify twice.
pub fn otp_is_valid(
    candidate: &str,
    stored_hash: &str,
    expires_at: OffsetDateTime,
    now: OffsetDateTime,
) -> bool {
    now <= expires_at && hash_otp(candidate) == stored_hash
}

/// Whether the reset ticket may still be consumed. The ticket inherits the
/// OTP deadline; a row with no deadline has no open window.
pub fn ticket_window_open(expires_at: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    matches!(expires_at, Some(deadline) if now <= deadline)
}
