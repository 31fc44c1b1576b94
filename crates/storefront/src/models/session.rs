//! Session keys and the session-resident user model.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use autohaus_core::UserId;

use crate::services::toggle::ToggleSet;
use crate::showroom::Relation;

/// Keys under which session values are stored.
pub mod session_keys {
    /// The signed-in user ([`super::SessionUser`]).
    pub const CURRENT_USER: &str = "current_user";
    /// Token set from the identity provider ([`crate::identity::AccessToken`]).
    pub const IDENTITY_TOKENS: &str = "identity_tokens";
    /// OAuth CSRF state (one-time use).
    pub const OAUTH_STATE: &str = "oauth_state";
    /// OAuth replay nonce (one-time use).
    pub const OAUTH_NONCE: &str = "oauth_nonce";
    /// Session-scoped favorite membership cache.
    pub const FAVORITE_CARS: &str = "favorite_cars";
    /// Session-scoped bookmark membership cache.
    pub const BOOKMARKED_CARS: &str = "bookmarked_cars";
}

/// The signed-in user, as established during the OAuth callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    /// Showroom-side user id (from the profile endpoint).
    pub user_id: Option<UserId>,
    /// Login handle from the identity provider.
    pub username: String,
    /// Display name.
    pub name: String,
}

/// Session key for a relation's membership cache.
const fn membership_key(relation: Relation) -> &'static str {
    match relation {
        Relation::Favorites => session_keys::FAVORITE_CARS,
        Relation::Bookmarks => session_keys::BOOKMARKED_CARS,
    }
}

/// Load a relation's membership cache from the session.
///
/// An absent or unreadable value yields an empty set; the next full profile
/// fetch reconciles it.
pub async fn load_membership(session: &Session, relation: Relation) -> ToggleSet {
    session
        .get::<ToggleSet>(membership_key(relation))
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store a relation's membership cache in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_membership(
    session: &Session,
    relation: Relation,
    set: &ToggleSet,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(membership_key(relation), set).await
}
