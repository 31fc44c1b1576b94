//! OAuth client for the external identity provider.
//!
//! The storefront never sees passwords; users authenticate at the identity
//! provider and come back with an authorization code, which this client
//! exchanges for short-lived bearer tokens.
//!
//! # OAuth Flow
//!
//! 1. Generate authorization URL with `authorization_url()`
//! 2. Redirect the user to the provider's login page
//! 3. The provider redirects back with an authorization code
//! 4. Exchange the code for tokens with `exchange_code()`
//! 5. Attach the access token to showroom API calls; refresh on rotation
//!
//! # Example
//!
//! ```rust,ignore
//! use autohaus_storefront::identity::IdentityClient;
//!
//! let client = IdentityClient::new(&config.identity);
//!
//! let auth_url = client.authorization_url("https://example.com/auth/callback", &state, &nonce);
//!
//! // After the OAuth callback:
//! let tokens = client.exchange_code(&code, "https://example.com/auth/callback").await?;
//! let user = client.userinfo(&tokens.access_token).await?;
//! ```

use std::sync::Arc;

use chrono::Utc;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::IdentityConfig;

/// Tokens are considered stale this many seconds before their actual expiry
/// so a request never leaves with a credential about to rotate away.
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 30;

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("OAuth error: {0}")]
    OAuth(String),
}

/// A short-lived bearer credential attached to each authenticated request.
#[derive(Debug, Clone)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw access token.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token value for the Authorization header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Token set returned by the provider's token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// Unix timestamp of when the token was obtained.
    pub obtained_at: i64,
}

impl AccessToken {
    /// Whether the token is still usable, honoring the expiry skew.
    #[must_use]
    pub fn is_fresh(&self, now: i64) -> bool {
        now < self.obtained_at + self.expires_in - TOKEN_EXPIRY_SKEW_SECS
    }

    /// The bearer credential for this token.
    #[must_use]
    pub fn bearer(&self) -> BearerToken {
        BearerToken::new(self.access_token.clone())
    }
}

/// The authenticated user as reported by the provider's userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityUser {
    /// Provider-side subject identifier.
    pub sub: String,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

// =============================================================================
// Identity Client
// =============================================================================

/// Client for the identity provider's OAuth and userinfo endpoints.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    issuer: String,
    client_id: String,
    client_secret: String,
}

impl IdentityClient {
    /// Create a new identity provider client.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            inner: Arc::new(IdentityClientInner {
                client: reqwest::Client::new(),
                issuer: config.issuer.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.expose_secret().to_string(),
            }),
        }
    }

    /// Get the OAuth client ID (safe to expose in frontend).
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // OAuth Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate the authorization URL for login.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL to redirect to after authentication
    /// * `state` - A random string stored in the session to prevent CSRF attacks
    /// * `nonce` - A random string for `OpenID` Connect replay protection
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str, nonce: &str) -> String {
        format!(
            "{}/oauth/authorize?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20profile&\
            state={}&\
            nonce={}",
            self.inner.issuer,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(nonce)
        )
    }

    /// Generate the logout URL.
    ///
    /// # Arguments
    ///
    /// * `post_logout_redirect_uri` - Where to redirect after logout
    #[must_use]
    pub fn logout_url(&self, post_logout_redirect_uri: &str) -> String {
        format!(
            "{}/oauth/logout?\
            client_id={}&\
            post_logout_redirect_uri={}",
            self.inner.issuer,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(post_logout_redirect_uri)
        )
    }

    /// Exchange an authorization code for access tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken, IdentityError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", &self.inner.client_id),
            ("client_secret", &self.inner.client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        self.token_request(&params).await
    }

    /// Refresh an access token using a refresh token.
    ///
    /// The provider rotates refresh tokens, so the stored token set must be
    /// replaced with the returned one.
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh fails.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, IdentityError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", &self.inner.client_id),
            ("client_secret", &self.inner.client_secret),
            ("refresh_token", refresh_token),
        ];

        self.token_request(&params).await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<AccessToken, IdentityError> {
        let url = format!("{}/oauth/token", self.inner.issuer);

        let response = self.inner.client.post(&url).form(params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IdentityError::OAuth(format!("Token request failed: {text}")));
        }

        let token_response: TokenResponse = response.json().await?;

        Ok(AccessToken {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
            expires_in: token_response.expires_in,
            obtained_at: Utc::now().timestamp(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Userinfo
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the authenticated user's identity claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the userinfo request fails.
    pub async fn userinfo(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let url = format!("{}/oauth/userinfo", self.inner.issuer);

        let response = self
            .inner
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(IdentityError::OAuth(format!(
                "Userinfo request failed ({status}): {text}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(obtained_at: i64, expires_in: i64) -> AccessToken {
        AccessToken {
            access_token: "tok_abc".to_string(),
            refresh_token: Some("ref_abc".to_string()),
            expires_in,
            obtained_at,
        }
    }

    #[test]
    fn test_token_fresh_within_lifetime() {
        let t = token(1_000, 3_600);
        assert!(t.is_fresh(1_000));
        assert!(t.is_fresh(1_000 + 3_600 - TOKEN_EXPIRY_SKEW_SECS - 1));
    }

    #[test]
    fn test_token_stale_inside_skew_window() {
        let t = token(1_000, 3_600);
        // Still technically alive, but inside the rotation skew
        assert!(!t.is_fresh(1_000 + 3_600 - TOKEN_EXPIRY_SKEW_SECS));
        assert!(!t.is_fresh(1_000 + 3_600 + 1));
    }

    #[test]
    fn test_bearer_exposes_raw_token() {
        let t = token(0, 60);
        assert_eq!(t.bearer().as_str(), "tok_abc");
    }
}
