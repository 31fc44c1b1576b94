//! Activity log actions generated server-side by the showroom API.

use serde::{Deserialize, Serialize};

/// What a user did with a vehicle, as recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Purchase,
    View,
    Bookmark,
    Favorite,
}

impl ActivityAction {
    /// Human-readable line shown in the activity feed.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Purchase => "Purchased a car",
            Self::View => "Viewed a car",
            Self::Bookmark => "Bookmarked a car",
            Self::Favorite => "Favorited a car",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let wire = match self {
            Self::Purchase => "purchase",
            Self::View => "view",
            Self::Bookmark => "bookmark",
            Self::Favorite => "favorite",
        };
        f.write_str(wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serde() {
        let back: ActivityAction = serde_json::from_str("\"purchase\"").expect("deserialize");
        assert_eq!(back, ActivityAction::Purchase);
        assert_eq!(back.label(), "Purchased a car");
    }

    #[test]
    fn test_action_display_matches_wire() {
        for action in [
            ActivityAction::Purchase,
            ActivityAction::View,
            ActivityAction::Bookmark,
            ActivityAction::Favorite,
        ] {
            let json = serde_json::to_string(&action).expect("serialize");
            assert_eq!(json, format!("\"{action}\""));
        }
    }
}
