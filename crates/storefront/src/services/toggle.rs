//! Optimistic toggle controller for the saved-car relations.
//!
//! One reusable controller covers both the favorite and the bookmark
//! relation; they are independent instances of the same membership pattern.
//!
//! # Protocol
//!
//! 1. [`ToggleSet::begin`] reads the current membership and synchronously
//!    writes the opposite state - the optimistic apply. This is the only
//!    step the caller can rely on happening before the request settles.
//! 2. The caller issues the matching add/remove request.
//! 3. [`ToggleSet::settle`] finalizes:
//!    - success: the optimistic state is final (`Applied`)
//!    - the server reports the state was already as desired: the optimistic
//!      state is kept and the notice is informational (`KeptOptimistic`)
//!    - any other failure: the pre-toggle state is restored (`RolledBack`)
//!
//! Concurrent toggles on the same pair are not coordinated; the last write
//! wins and the next full profile refetch reconciles. This is an accepted
//! limitation of the design, not something the controller papers over.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use autohaus_core::ProductId;

use crate::showroom::{Relation, ShowroomError, ToggleAction};

/// Session-scoped membership cache for one relation.
///
/// The optimistic copy is a hint, not the source of truth; it reconciles to
/// the server's sets on the next full profile fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToggleSet {
    members: HashSet<ProductId>,
}

/// An optimistic apply awaiting settlement.
#[derive(Debug, Clone, Copy)]
pub struct PendingToggle {
    car: ProductId,
    action: ToggleAction,
    was_member: bool,
}

impl PendingToggle {
    /// The request direction the optimistic apply committed to.
    #[must_use]
    pub const fn action(&self) -> ToggleAction {
        self.action
    }
}

/// How a toggle settled.
#[derive(Debug)]
pub enum ToggleOutcome {
    /// The server accepted the mutation; the optimistic state is final.
    Applied { action: ToggleAction },
    /// The server reported the state was already as desired; the optimistic
    /// state is kept and the notice is informational, not an error.
    KeptOptimistic { action: ToggleAction },
    /// The mutation failed; the membership was restored to its pre-toggle
    /// state.
    RolledBack {
        action: ToggleAction,
        error: ShowroomError,
    },
}

impl ToggleOutcome {
    /// User-facing notification line for this settlement.
    #[must_use]
    pub fn notification(&self, relation: Relation) -> String {
        match self {
            Self::Applied {
                action: ToggleAction::Add,
            } => format!("Added to {}", relation.noun()),
            Self::Applied {
                action: ToggleAction::Remove,
            } => format!("Removed from {}", relation.noun()),
            Self::KeptOptimistic {
                action: ToggleAction::Add,
            } => format!("This vehicle is already in your {}", relation.noun()),
            Self::KeptOptimistic {
                action: ToggleAction::Remove,
            } => format!("This vehicle was already removed from your {}", relation.noun()),
            Self::RolledBack { .. } => format!("Failed to update {}", relation.noun()),
        }
    }

    /// Whether the notification is an error (vs. success or info).
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::RolledBack { .. })
    }
}

impl ToggleSet {
    /// Current membership.
    #[must_use]
    pub fn contains(&self, car: ProductId) -> bool {
        self.members.contains(&car)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Replace the cache with the server's authoritative set (full refetch
    /// reconciliation).
    pub fn reconcile(&mut self, server_ids: impl IntoIterator<Item = ProductId>) {
        self.members = server_ids.into_iter().collect();
    }

    /// Optimistically flip membership for `car` and return the pending
    /// record needed to settle.
    ///
    /// This is synchronous from the caller's perspective; the cache already
    /// holds the new state when this returns.
    pub fn begin(&mut self, car: ProductId) -> PendingToggle {
        let was_member = self.members.contains(&car);
        let action = if was_member {
            self.members.remove(&car);
            ToggleAction::Remove
        } else {
            self.members.insert(car);
            ToggleAction::Add
        };

        PendingToggle {
            car,
            action,
            was_member,
        }
    }

    /// Settle a pending toggle against the request's result.
    pub fn settle(
        &mut self,
        pending: PendingToggle,
        result: Result<(), ShowroomError>,
    ) -> ToggleOutcome {
        match result {
            Ok(()) => ToggleOutcome::Applied {
                action: pending.action,
            },
            Err(error) if error.is_idempotent_conflict() => ToggleOutcome::KeptOptimistic {
                action: pending.action,
            },
            Err(error) => {
                // Revert to the pre-toggle state
                if pending.was_member {
                    self.members.insert(pending.car);
                } else {
                    self.members.remove(&pending.car);
                }
                ToggleOutcome::RolledBack {
                    action: pending.action,
                    error,
                }
            }
        }
    }
}

impl FromIterator<ProductId> for ToggleSet {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

/// The reusable toggle function: optimistic apply, one mutating request,
/// settle.
///
/// `send` receives the direction the optimistic apply committed to and
/// issues the corresponding add/remove request.
pub async fn toggle<F, Fut>(set: &mut ToggleSet, car: ProductId, send: F) -> ToggleOutcome
where
    F: FnOnce(ToggleAction) -> Fut,
    Fut: Future<Output = Result<(), ShowroomError>>,
{
    let pending = set.begin(car);
    let result = send(pending.action()).await;
    set.settle(pending, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car(id: i32) -> ProductId {
        ProductId::new(id)
    }

    fn conflict(detail: &str) -> ShowroomError {
        ShowroomError::Api {
            status: 409,
            detail: Some(detail.to_string()),
        }
    }

    fn server_error() -> ShowroomError {
        ShowroomError::Api {
            status: 500,
            detail: Some("server exploded".to_string()),
        }
    }

    // =========================================================================
    // Optimistic apply
    // =========================================================================

    #[test]
    fn test_begin_flips_membership_synchronously() {
        let mut set = ToggleSet::default();

        let pending = set.begin(car(42));
        assert!(set.contains(car(42)), "optimistic add is visible immediately");
        assert!(matches!(pending.action(), ToggleAction::Add));

        let pending = set.begin(car(42));
        assert!(!set.contains(car(42)), "optimistic remove is visible immediately");
        assert!(matches!(pending.action(), ToggleAction::Remove));
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    #[tokio::test]
    async fn test_add_success_keeps_optimistic_state() {
        // Favorite toggle on car 42, currently absent, server returns 200
        let mut set = ToggleSet::default();

        let outcome = toggle(&mut set, car(42), |action| async move {
            assert!(matches!(action, ToggleAction::Add));
            Ok(())
        })
        .await;

        assert!(set.contains(car(42)));
        assert!(matches!(outcome, ToggleOutcome::Applied { action: ToggleAction::Add }));
        assert_eq!(outcome.notification(Relation::Favorites), "Added to favorites");
        assert!(!outcome.is_error());
    }

    #[tokio::test]
    async fn test_remove_success_keeps_optimistic_state() {
        let mut set: ToggleSet = [car(42)].into_iter().collect();

        let outcome = toggle(&mut set, car(42), |action| async move {
            assert!(matches!(action, ToggleAction::Remove));
            Ok(())
        })
        .await;

        assert!(!set.contains(car(42)));
        assert!(matches!(outcome, ToggleOutcome::Applied { action: ToggleAction::Remove }));
        assert_eq!(
            outcome.notification(Relation::Favorites),
            "Removed from favorites"
        );
    }

    #[tokio::test]
    async fn test_idempotent_conflict_keeps_optimistic_state() {
        // Toggle on car 42, currently present, server 409 "already removed":
        // final state absent (keep optimistic), informational notice
        let mut set: ToggleSet = [car(42)].into_iter().collect();

        let outcome =
            toggle(&mut set, car(42), |_| async { Err(conflict("already removed")) }).await;

        assert!(!set.contains(car(42)), "optimistic state is kept");
        assert!(matches!(outcome, ToggleOutcome::KeptOptimistic { .. }));
        assert!(!outcome.is_error(), "idempotent conflict is not an error");
    }

    #[tokio::test]
    async fn test_failed_add_rolls_back() {
        // Non-idempotent failure: membership after settlement equals the
        // membership before the toggle was initiated
        let mut set = ToggleSet::default();

        let outcome = toggle(&mut set, car(42), |_| async { Err(server_error()) }).await;

        assert!(!set.contains(car(42)), "rolled back to pre-toggle state");
        assert!(matches!(outcome, ToggleOutcome::RolledBack { .. }));
        assert!(outcome.is_error());
        assert_eq!(
            outcome.notification(Relation::Bookmarks),
            "Failed to update bookmarks"
        );
    }

    #[tokio::test]
    async fn test_failed_remove_rolls_back() {
        let mut set: ToggleSet = [car(7), car(42)].into_iter().collect();

        let outcome = toggle(&mut set, car(42), |_| async { Err(server_error()) }).await;

        assert!(set.contains(car(42)), "rolled back to pre-toggle state");
        assert!(set.contains(car(7)), "unrelated members untouched");
        assert!(matches!(outcome, ToggleOutcome::RolledBack { .. }));
    }

    #[tokio::test]
    async fn test_relations_are_independent() {
        // The favorite and bookmark relations are separate controller
        // instances; settling one never touches the other
        let mut favorites = ToggleSet::default();
        let mut bookmarks: ToggleSet = [car(42)].into_iter().collect();

        let outcome = toggle(&mut favorites, car(42), |_| async { Ok(()) }).await;
        assert!(matches!(outcome, ToggleOutcome::Applied { .. }));

        assert!(favorites.contains(car(42)));
        assert!(bookmarks.contains(car(42)));

        let outcome = toggle(&mut bookmarks, car(42), |_| async { Err(server_error()) }).await;
        assert!(matches!(outcome, ToggleOutcome::RolledBack { .. }));
        assert!(bookmarks.contains(car(42)), "bookmark remove rolled back");
        assert!(favorites.contains(car(42)), "favorite state untouched");
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    #[test]
    fn test_reconcile_replaces_with_server_state() {
        let mut set: ToggleSet = [car(1), car(2)].into_iter().collect();
        set.reconcile([car(2), car(3)]);

        assert!(!set.contains(car(1)));
        assert!(set.contains(car(2)));
        assert!(set.contains(car(3)));
        assert_eq!(set.len(), 2);
    }
}
