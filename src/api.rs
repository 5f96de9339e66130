//! Backend API client helpers: OTP authentication, sessions, profile.
//!
//! The backend speaks a uniform envelope: every response carries
//! `{"ok": bool}` plus an `error` string on failure. These helpers wrap
//! the auth endpoints; the shell worker never looks inside any of this,
//! it only routes the HTTP exchanges.

use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::error::{Error, Result};

/// An authenticated user as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Backend user id.
    pub id: i64,
    /// Phone number, the account's username.
    pub phone: String,
    /// Role: "customer", "owner" or "admin".
    pub role: String,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    /// The logged-in user.
    pub user: User,
    /// Whether the account was created by this login.
    pub created: bool,
}

/// Result of requesting an OTP.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    /// Human-readable status message.
    pub message: String,
    /// The code itself, echoed back only by dev-mode backends.
    pub dev_otp: Option<String>,
}

/// The uniform response envelope every backend endpoint uses.
#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    otp: Option<String>,
    #[serde(default)]
    created: Option<bool>,
    #[serde(default)]
    token: Option<String>,
}

/// Parses a response body and folds transport status + envelope `ok` into
/// one success/failure decision.
fn parse_envelope(status: u16, body: &[u8]) -> Result<Envelope> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    if (200..300).contains(&status) && envelope.ok {
        Ok(envelope)
    } else {
        let message = envelope
            .error
            .or(envelope.message)
            .unwrap_or_else(|| "request failed".to_string());
        Err(Error::Api { status, message })
    }
}

fn require_user(envelope: &mut Envelope) -> Result<User> {
    envelope.user.take().ok_or(Error::Api {
        status: 200,
        message: "response missing user".to_string(),
    })
}

/// Client for the Kukaya backend API.
///
/// Holds an optional bearer token and sends it on every request once a
/// login succeeded; there is no other session state. Callers keep whatever
/// they need from the returned [`Session`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client against the given base URL
    /// (e.g. `https://api.kukaya.app/api/`).
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            token: None,
        })
    }

    /// Creates a client with a caller-supplied `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid absolute URL.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            token: None,
        })
    }

    /// The current bearer token, if a login succeeded.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Installs a bearer token, e.g. one restored from persistent storage.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Drops the bearer token without calling the backend.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Envelope> {
        let url = self.base_url.join(path)?;
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        parse_envelope(status, &bytes)
    }

    /// Requests an OTP for the given phone number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if the backend rejects the phone number.
    pub async fn request_otp(&self, phone: &str) -> Result<OtpChallenge> {
        let envelope = self
            .send(
                reqwest::Method::POST,
                "auth/request-otp/",
                Some(json!({ "phone": phone })),
            )
            .await?;
        Ok(OtpChallenge {
            message: envelope.message.unwrap_or_default(),
            dev_otp: envelope.otp,
        })
    }

    /// Verifies an OTP and logs in, storing the returned bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] on an invalid or expired code.
    pub async fn verify_otp(&mut self, phone: &str, otp: &str) -> Result<Session> {
        let mut envelope = self
            .send(
                reqwest::Method::POST,
                "auth/verify-otp/",
                Some(json!({ "phone": phone, "otp": otp })),
            )
            .await?;
        if let Some(token) = envelope.token.take() {
            self.token = Some(token);
        }
        Ok(Session {
            user: require_user(&mut envelope)?,
            created: envelope.created.unwrap_or(false),
        })
    }

    /// Logs in an admin with phone and password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with status 403 on non-admin credentials.
    pub async fn admin_login(&mut self, phone: &str, password: &str) -> Result<Session> {
        let mut envelope = self
            .send(
                reqwest::Method::POST,
                "auth/admin-login/",
                Some(json!({ "phone": phone, "password": password })),
            )
            .await?;
        if let Some(token) = envelope.token.take() {
            self.token = Some(token);
        }
        Ok(Session {
            user: require_user(&mut envelope)?,
            created: false,
        })
    }

    /// Fetches the current session's user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the session is missing or expired.
    pub async fn profile(&self) -> Result<User> {
        let mut envelope = self.send(reqwest::Method::GET, "auth/profile/", None).await?;
        require_user(&mut envelope)
    }

    /// Updates the current user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if the backend rejects the update.
    pub async fn update_profile(&self, phone: &str) -> Result<User> {
        let mut envelope = self
            .send(
                reqwest::Method::PUT,
                "auth/profile/update/",
                Some(json!({ "phone": phone })),
            )
            .await?;
        require_user(&mut envelope)
    }

    /// Exchanges the current bearer token for a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with status 401 when there is no session to
    /// refresh or the backend declines.
    pub async fn refresh(&mut self) -> Result<()> {
        if self.token.is_none() {
            return Err(Error::Api {
                status: 401,
                message: "no session token to refresh".to_string(),
            });
        }
        let envelope = self
            .send(reqwest::Method::POST, "auth/refresh/", None)
            .await?;
        if let Some(token) = envelope.token {
            self.token = Some(token);
        }
        Ok(())
    }

    /// Logs out and drops the bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if the backend rejects the logout; the local
    /// token is cleared regardless.
    pub async fn logout(&mut self) -> Result<()> {
        let result = self.send(reqwest::Method::POST, "auth/logout/", None).await;
        self.token = None;
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_response_parses() {
        let body = br#"{
            "ok": true,
            "user": {"id": 12, "phone": "+255700000001", "role": "customer"},
            "created": true,
            "message": "Login successful."
        }"#;
        let envelope = parse_envelope(200, body).unwrap();
        let user = envelope.user.unwrap();
        assert_eq!(user.id, 12);
        assert_eq!(user.phone, "+255700000001");
        assert_eq!(user.role, "customer");
        assert_eq!(envelope.created, Some(true));
    }

    #[test]
    fn otp_response_carries_dev_code() {
        let body = br#"{"ok": true, "message": "OTP sent successfully (dev mode)", "otp": "4821"}"#;
        let envelope = parse_envelope(200, body).unwrap();
        assert_eq!(envelope.otp.as_deref(), Some("4821"));
    }

    #[test]
    fn error_envelope_maps_to_api_error() {
        let body = br#"{"ok": false, "error": "Invalid OTP."}"#;
        let err = parse_envelope(400, body).unwrap_err();
        assert!(
            matches!(err, Error::Api { status: 400, ref message } if message == "Invalid OTP.")
        );
    }

    #[test]
    fn not_ok_body_fails_even_with_success_status() {
        let body = br#"{"ok": false, "error": "OTP not found."}"#;
        assert!(matches!(
            parse_envelope(200, body),
            Err(Error::Api { status: 200, .. })
        ));
    }

    #[test]
    fn admin_rejection_keeps_status() {
        let body = br#"{"ok": false, "error": "Invalid admin credentials."}"#;
        let err = parse_envelope(403, body).unwrap_err();
        assert!(matches!(err, Error::Api { status: 403, .. }));
    }

    #[test]
    fn missing_error_field_gets_generic_message() {
        let body = br#"{"ok": false}"#;
        let err = parse_envelope(500, body).unwrap_err();
        assert!(matches!(err, Error::Api { ref message, .. } if message == "request failed"));
    }

    #[test]
    fn garbage_body_is_a_json_error() {
        assert!(matches!(
            parse_envelope(200, b"<html>gateway timeout</html>"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn token_round_trip() {
        let mut client = ApiClient::new("https://api.kukaya.app/api/").unwrap();
        assert!(client.token().is_none());
        client.set_token("abc123");
        assert_eq!(client.token(), Some("abc123"));
        client.clear_token();
        assert!(client.token().is_none());
    }

    #[test]
    fn relative_endpoints_resolve_against_base() {
        let client = ApiClient::new("https://api.kukaya.app/api/").unwrap();
        let url = client.base_url.join("auth/request-otp/").unwrap();
        assert_eq!(url.as_str(), "https://api.kukaya.app/api/auth/request-otp/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }

    #[tokio::test]
    async fn refresh_without_token_is_unauthorized() {
        let mut client = ApiClient::new("https://api.kukaya.app/api/").unwrap();
        let err = client.refresh().await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 401, .. }));
    }
}
