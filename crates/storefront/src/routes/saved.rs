//! Favorite/bookmark toggle fragments (HTMX).
//!
//! Each handler drives the optimistic toggle controller against the
//! session-scoped membership cache for its relation: flip locally, issue the
//! mutating request, keep or revert on settlement, and render the refreshed
//! button with a transient notification.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use autohaus_core::ProductId;

use crate::error::AppError;
use crate::models::{load_membership, store_membership};
use crate::routes::Flash;
use crate::services::toggle;
use crate::showroom::Relation;
use crate::state::AppState;

/// Toggle button fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/toggle.html")]
pub struct ToggleTemplate {
    pub car_id: i32,
    /// Path segment of the toggle endpoint ("favorite" or "bookmark").
    pub endpoint: &'static str,
    pub glyph: &'static str,
    pub active: bool,
    pub flash: Option<Flash>,
}

impl ToggleTemplate {
    const fn endpoint_for(relation: Relation) -> &'static str {
        match relation {
            Relation::Favorites => "favorite",
            Relation::Bookmarks => "bookmark",
        }
    }

    const fn glyph_for(relation: Relation) -> &'static str {
        match relation {
            Relation::Favorites => "♥",
            Relation::Bookmarks => "🔖",
        }
    }
}

/// Toggle the favorite relation for a vehicle.
#[instrument(skip(state, session))]
pub async fn favorite(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    toggle_relation(&state, &session, ProductId::new(id), Relation::Favorites).await
}

/// Toggle the bookmark relation for a vehicle.
#[instrument(skip(state, session))]
pub async fn bookmark(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    toggle_relation(&state, &session, ProductId::new(id), Relation::Bookmarks).await
}

/// One implementation for both relations; they are independent instances of
/// the same controller and never read each other's state.
async fn toggle_relation(
    state: &AppState,
    session: &Session,
    car: ProductId,
    relation: Relation,
) -> Result<Response, AppError> {
    let endpoint = ToggleTemplate::endpoint_for(relation);
    let glyph = ToggleTemplate::glyph_for(relation);

    // No session: short-circuit with a notification, no request
    let Some(token) = state.auth().fresh_token(session).await? else {
        return Ok(ToggleTemplate {
            car_id: car.as_i32(),
            endpoint,
            glyph,
            active: false,
            flash: Some(Flash::error(format!(
                "Please sign in to add {}",
                relation.noun()
            ))),
        }
        .into_response());
    };

    let mut members = load_membership(session, relation).await;

    let outcome = toggle::toggle(&mut members, car, |action| {
        state.showroom().update_membership(&token, relation, action, car)
    })
    .await;

    store_membership(session, relation, &members)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let flash = if outcome.is_error() {
        Flash::error(outcome.notification(relation))
    } else if matches!(outcome, toggle::ToggleOutcome::KeptOptimistic { .. }) {
        Flash::info(outcome.notification(relation))
    } else {
        Flash::success(outcome.notification(relation))
    };

    Ok(ToggleTemplate {
        car_id: car.as_i32(),
        endpoint,
        glyph,
        active: members.contains(car),
        flash: Some(flash),
    }
    .into_response())
}
