//! Token provider: a per-request accessor for a fresh bearer credential.
//!
//! Tokens from the identity provider are short-lived and rotate. Every
//! showroom API call asks this provider for a credential immediately before
//! use; the provider reuses the session's token while it is comfortably
//! inside its lifetime and refreshes it through the identity client
//! otherwise. An absent session yields `Ok(None)` - callers must surface a
//! "please sign in" condition instead of attempting the call.

use chrono::Utc;
use thiserror::Error;
use tower_sessions::Session;

use crate::identity::{AccessToken, BearerToken, IdentityClient, IdentityError};
use crate::models::session_keys;

/// Errors that can occur while producing a bearer credential.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Identity provider rejected the refresh.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

/// Asynchronous accessor for a fresh bearer credential.
#[derive(Clone)]
pub struct TokenProvider {
    identity: IdentityClient,
}

impl TokenProvider {
    /// Create a token provider backed by the given identity client.
    #[must_use]
    pub const fn new(identity: IdentityClient) -> Self {
        Self { identity }
    }

    /// Return a valid bearer token, or `None` when no session exists.
    ///
    /// A stored token past its expiry skew is refreshed and the rotated set
    /// written back to the session. A failed refresh signs the session out
    /// rather than erroring: the user simply has to sign in again.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session store itself fails.
    pub async fn fresh_token(&self, session: &Session) -> Result<Option<BearerToken>, AuthError> {
        let Some(tokens) = session
            .get::<AccessToken>(session_keys::IDENTITY_TOKENS)
            .await?
        else {
            return Ok(None);
        };

        if tokens.is_fresh(Utc::now().timestamp()) {
            return Ok(Some(tokens.bearer()));
        }

        let Some(refresh_token) = tokens.refresh_token.as_deref() else {
            // Expired with nothing to refresh with: signed out
            session
                .remove::<AccessToken>(session_keys::IDENTITY_TOKENS)
                .await?;
            return Ok(None);
        };

        match self.identity.refresh(refresh_token).await {
            Ok(renewed) => {
                session
                    .insert(session_keys::IDENTITY_TOKENS, &renewed)
                    .await?;
                Ok(Some(renewed.bearer()))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed, clearing session tokens");
                session
                    .remove::<AccessToken>(session_keys::IDENTITY_TOKENS)
                    .await?;
                Ok(None)
            }
        }
    }

    /// Store a freshly issued token set in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn store_tokens(
        &self,
        session: &Session,
        tokens: &AccessToken,
    ) -> Result<(), AuthError> {
        session
            .insert(session_keys::IDENTITY_TOKENS, tokens)
            .await?;
        Ok(())
    }

    /// Drop the session's token set (logout).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear_tokens(&self, session: &Session) -> Result<(), AuthError> {
        session
            .remove::<AccessToken>(session_keys::IDENTITY_TOKENS)
            .await?;
        Ok(())
    }
}
