//! Identity provider OAuth route handlers.
//!
//! Handles the OAuth flow against the external identity provider:
//! - Login: Redirects to the provider's authorization page
//! - Callback: Validates state, exchanges the code for tokens, establishes
//!   the session user, and primes the membership caches from the profile
//! - Logout: Clears the session and redirects to the provider logout

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;

use crate::middleware::auth::{clear_current_user, set_current_user};
use crate::models::{SessionUser, session_keys, store_membership};
use crate::services::toggle::ToggleSet;
use crate::showroom::Relation;
use crate::state::AppState;

/// Query parameters from the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// Generate a cryptographically secure random string.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            // SAFETY: idx is always within bounds since random_range returns 0..CHARSET.len()
            char::from(*CHARSET.get(idx).expect("idx within bounds"))
        })
        .collect()
}

/// Initiate login at the identity provider.
///
/// Generates state and nonce parameters, stores them in the session, and
/// redirects to the provider's authorization page.
///
/// # Route
///
/// `GET /auth/login`
pub async fn login(State(state): State<AppState>, session: Session) -> Response {
    // Generate CSRF state and OpenID nonce
    let oauth_state = generate_random_string(32);
    let nonce = generate_random_string(32);

    // Store in session for validation on callback
    if let Err(e) = session
        .insert(session_keys::OAUTH_STATE, &oauth_state)
        .await
    {
        tracing::error!("Failed to store OAuth state in session: {}", e);
        return Redirect::to("/?error=session").into_response();
    }

    if let Err(e) = session.insert(session_keys::OAUTH_NONCE, &nonce).await {
        tracing::error!("Failed to store OAuth nonce in session: {}", e);
        return Redirect::to("/?error=session").into_response();
    }

    // Build the redirect URI
    let redirect_uri = format!("{}/auth/callback", state.config().base_url);

    // Generate and redirect to authorization URL
    let auth_url = state
        .identity()
        .authorization_url(&redirect_uri, &oauth_state, &nonce);

    Redirect::to(&auth_url).into_response()
}

/// Handle the OAuth callback.
///
/// Validates the state parameter, exchanges the authorization code for
/// tokens, stores the token set in the session, and primes the membership
/// caches from the showroom profile.
///
/// # Route
///
/// `GET /auth/callback`
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    // Check for OAuth errors from the provider
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!("OAuth error: {} - {}", error, description);
        return Redirect::to("/?error=denied").into_response();
    }

    // Verify we have an authorization code
    let Some(code) = query.code else {
        tracing::warn!("OAuth callback missing code");
        return Redirect::to("/?error=missing_code").into_response();
    };

    // Verify state parameter (CSRF protection)
    let Some(returned_state) = query.state else {
        tracing::warn!("OAuth callback missing state");
        return Redirect::to("/?error=missing_state").into_response();
    };

    let stored_state: Option<String> = session
        .get(session_keys::OAUTH_STATE)
        .await
        .ok()
        .flatten();

    if stored_state.as_ref() != Some(&returned_state) {
        tracing::warn!("OAuth state mismatch");
        return Redirect::to("/?error=invalid_state").into_response();
    }

    // Clear the stored state (one-time use)
    let _ = session.remove::<String>(session_keys::OAUTH_STATE).await;
    let _ = session.remove::<String>(session_keys::OAUTH_NONCE).await;

    // Exchange the code for tokens
    let redirect_uri = format!("{}/auth/callback", state.config().base_url);
    let tokens = match state.identity().exchange_code(&code, &redirect_uri).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!("Token exchange failed: {}", e);
            return Redirect::to("/?error=exchange_failed").into_response();
        }
    };

    // Establish who signed in
    let identity_user = match state.identity().userinfo(&tokens.access_token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Userinfo request failed: {}", e);
            return Redirect::to("/?error=userinfo_failed").into_response();
        }
    };

    if let Err(e) = state.auth().store_tokens(&session, &tokens).await {
        tracing::error!("Failed to store tokens in session: {}", e);
        return Redirect::to("/?error=session").into_response();
    }

    // Prime the membership caches from the showroom profile. A failure here
    // is not fatal: the caches start empty and reconcile on the next profile
    // fetch.
    let mut user_id = None;
    match state.showroom().profile(&tokens.bearer()).await {
        Ok(profile) => {
            user_id = Some(profile.user);
            let favorites: ToggleSet = profile.favorite_cars.iter().copied().collect();
            let bookmarks: ToggleSet = profile.bookmarked_cars.iter().copied().collect();
            if let Err(e) = store_membership(&session, Relation::Favorites, &favorites).await {
                tracing::warn!("Failed to prime favorites cache: {}", e);
            }
            if let Err(e) = store_membership(&session, Relation::Bookmarks, &bookmarks).await {
                tracing::warn!("Failed to prime bookmarks cache: {}", e);
            }
        }
        Err(e) => {
            tracing::warn!("Failed to fetch profile after login: {}", e);
        }
    }

    let username = identity_user
        .preferred_username
        .unwrap_or_else(|| identity_user.sub.clone());
    let session_user = SessionUser {
        user_id,
        name: identity_user.name.unwrap_or_else(|| username.clone()),
        username,
    };

    if let Err(e) = set_current_user(&session, &session_user).await {
        tracing::error!("Failed to store user in session: {}", e);
        return Redirect::to("/?error=session").into_response();
    }

    Redirect::to("/").into_response()
}

/// Log out: clear the session and redirect to the provider logout.
///
/// # Route
///
/// `POST /auth/logout`
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::warn!("Failed to clear user from session: {}", e);
    }
    if let Err(e) = state.auth().clear_tokens(&session).await {
        tracing::warn!("Failed to clear tokens from session: {}", e);
    }
    let _ = session.flush().await;

    let logout_url = state.identity().logout_url(&state.config().base_url);
    Redirect::to(&logout_url).into_response()
}
