use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

/// Request body for signup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub fullname: String,
    pub phonenumber: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh. The token is optional on the wire so a
/// missing field answers 401 like any other bad credential, instead of a
/// deserializer 422.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Request body for send-otp / forgot-password.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub email: String,
}

/// Request body for verify-otp.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Request body for reset-password.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub temporary_reset_token: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Response returned after signup, login or reset-password.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Response returned after a refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Generic acknowledgement body (send-otp, logout).
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response returned after a successful OTP verification.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub temporary_reset_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_request_uses_camel_case_wire_names() {
        let body = r#"{
            "fullname": "A B",
            "phonenumber": "+100",
            "email": "a@b.com",
            "password": "secret1",
            "passwordConfirm": "secret1"
        }"#;
        let req: SignupRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.password_confirm, "secret1");
    }

    #[test]
    fn reset_request_uses_camel_case_wire_names() {
        let body = r#"{
            "temporaryResetToken": "abc",
            "newPassword": "n",
            "confirmPassword": "n"
        }"#;
        let req: ResetPasswordRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.temporary_reset_token, "abc");
    }

    #[test]
    fn refresh_request_tolerates_missing_token_field() {
        let req: RefreshRequest = serde_json::from_str("{}").unwrap();
        assert!(req.refresh_token.is_none());
    }

    #[test]
    fn verify_otp_response_serializes_camel_case() {
        let json = serde_json::to_string(&VerifyOtpResponse {
            temporary_reset_token: "t".into(),
        })
        .unwrap();
        assert!(json.contains("temporaryResetToken"));
    }
}
