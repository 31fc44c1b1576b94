//! Profile route handlers.
//!
//! Own profile (display, edit, paginated activity), plus the read-only
//! "stalk" view of another user's profile. The profile fetch is also the
//! reconciliation point for the session's optimistic membership caches: the
//! server's favorite/bookmark sets replace whatever the toggles left behind.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use autohaus_core::{ActivityAction, ProductId, UserId};

use crate::error::AppError;
use crate::filters;
use crate::identity::BearerToken;
use crate::middleware::RequireAuth;
use crate::models::store_membership;
use crate::routes::cars::CarCardView;
use crate::routes::{Flash, format_date, format_time};
use crate::services::activity::{ActivityFeed, fetch_next};
use crate::services::toggle::ToggleSet;
use crate::showroom::types::ActivityItem;
use crate::showroom::{FileUpload, Product, Profile, ProfileUpdate, Relation};
use crate::state::AppState;

// =============================================================================
// View Models
// =============================================================================

/// Profile display data.
#[derive(Clone)]
pub struct ProfileView {
    pub user_id: i32,
    pub name: String,
    pub location: String,
    pub contact_info: String,
    pub bio: String,
    pub picture: Option<String>,
    pub member_since: Option<String>,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.user.as_i32(),
            name: profile.name.clone(),
            location: profile.location.clone(),
            contact_info: profile.contact_info.clone(),
            bio: profile.bio.clone(),
            picture: profile.profile_picture_url.clone(),
            member_since: profile.member_since.as_ref().map(format_date),
        }
    }
}

/// Activity entry display data.
#[derive(Clone)]
pub struct ActivityItemView {
    pub action: &'static str,
    pub action_label: &'static str,
    pub car_name: String,
    pub date: String,
    pub time: String,
}

/// Resolve activity entries against a vehicle-name map.
fn activity_views(
    items: &[ActivityItem],
    car_names: &HashMap<ProductId, String>,
) -> Vec<ActivityItemView> {
    items
        .iter()
        .map(|item| ActivityItemView {
            action: match item.action {
                ActivityAction::Purchase => "purchase",
                ActivityAction::View => "view",
                ActivityAction::Bookmark => "bookmark",
                ActivityAction::Favorite => "favorite",
            },
            action_label: item.action.label(),
            car_name: car_names
                .get(&item.product)
                .cloned()
                .unwrap_or_else(|| format!("Car ID: {}", item.product)),
            date: format_date(&item.timestamp),
            time: format_time(&item.timestamp),
        })
        .collect()
}

fn name_map(cars: &[Product]) -> HashMap<ProductId, String> {
    cars.iter().map(|car| (car.id, car.name.clone())).collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Own profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/show.html")]
pub struct ProfileTemplate {
    pub username: String,
    pub profile: Option<ProfileView>,
    pub favorites: Vec<CarCardView>,
    pub bookmarks: Vec<CarCardView>,
    pub activity: Vec<ActivityItemView>,
    pub next_activity_page: Option<u32>,
    pub purchase_count: usize,
    pub activity_count: usize,
    pub flash: Option<Flash>,
    pub error: Option<String>,
}

impl ProfileTemplate {
    fn failed(username: String, flash: Option<Flash>) -> Self {
        Self {
            username,
            profile: None,
            favorites: Vec::new(),
            bookmarks: Vec::new(),
            activity: Vec::new(),
            next_activity_page: None,
            purchase_count: 0,
            activity_count: 0,
            flash,
            error: Some("Failed to load your profile. Please try again.".to_string()),
        }
    }
}

/// Stalk view template (another user's redacted profile).
#[derive(Template, WebTemplate)]
#[template(path = "profile/stalk.html")]
pub struct StalkTemplate {
    pub profile: Option<ProfileView>,
    pub activity: Vec<ActivityItemView>,
    pub next_activity_page: Option<u32>,
    pub purchase_count: usize,
    pub activity_count: usize,
    pub error: Option<String>,
}

/// Activity page fragment template (for HTMX "load more").
#[derive(Template, WebTemplate)]
#[template(path = "partials/activity.html")]
pub struct ActivityFragmentTemplate {
    pub items: Vec<ActivityItemView>,
    pub next_page: Option<u32>,
    pub endpoint: String,
}

// =============================================================================
// Own Profile
// =============================================================================

/// Profile page query parameters.
#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub flash: Option<String>,
}

/// Display the current user's profile.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ProfileQuery>,
) -> Result<Response, AppError> {
    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let flash = match query.flash.as_deref() {
        Some("updated") => Some(Flash::success("Your profile has been successfully updated.")),
        Some("update_failed") => {
            Some(Flash::error("Failed to update profile. Please try again."))
        }
        _ => None,
    };

    let profile = match state.showroom().profile(&token).await {
        Ok(profile) => profile,
        Err(err) => {
            tracing::error!(error = %err, "Failed to fetch profile");
            return Ok(ProfileTemplate::failed(user.username, flash).into_response());
        }
    };

    // Reconcile the session's optimistic membership caches to the server's
    // authoritative sets
    let mut favorites = ToggleSet::default();
    favorites.reconcile(profile.favorite_cars.iter().copied());
    let mut bookmarks = ToggleSet::default();
    bookmarks.reconcile(profile.bookmarked_cars.iter().copied());
    store_membership(&session, Relation::Favorites, &favorites)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    store_membership(&session, Relation::Bookmarks, &bookmarks)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    // One listing fetch covers the saved-car grids and the activity names
    let all_cars = match state.showroom().list_cars(&token).await {
        Ok(cars) => cars,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to fetch vehicles for profile");
            Vec::new()
        }
    };
    let names = name_map(&all_cars);

    let favorite_cards: Vec<CarCardView> = all_cars
        .iter()
        .filter(|car| favorites.contains(car.id))
        .map(|car| CarCardView::from_product(car, &favorites, &bookmarks))
        .collect();
    let bookmark_cards: Vec<CarCardView> = all_cars
        .iter()
        .filter(|car| bookmarks.contains(car.id))
        .map(|car| CarCardView::from_product(car, &favorites, &bookmarks))
        .collect();

    // First page of the activity feed
    let mut feed = ActivityFeed::new();
    if let Err(err) = fetch_next(&mut feed, |page| state.showroom().activity(&token, page)).await {
        tracing::warn!(error = %err, "Failed to fetch activity log");
    }

    let purchase_count = feed
        .items()
        .iter()
        .filter(|item| item.action == ActivityAction::Purchase)
        .count();

    Ok(ProfileTemplate {
        username: user.username,
        profile: Some(ProfileView::from(&profile)),
        favorites: favorite_cards,
        bookmarks: bookmark_cards,
        activity: activity_views(feed.items(), &names),
        next_activity_page: feed.next_page(),
        purchase_count,
        activity_count: feed.items().len(),
        flash,
        error: None,
    }
    .into_response())
}

/// Update the current user's profile from the multipart edit form.
#[instrument(skip(state, session, multipart))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let mut update = ProfileUpdate::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "profile_picture" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if !bytes.is_empty() {
                update.profile_picture = Some(FileUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        // Empty inputs are "leave as is", matching PATCH semantics
        if value.trim().is_empty() {
            continue;
        }
        match name.as_str() {
            "name" => update.name = Some(value),
            "location" => update.location = Some(value),
            "contact_info" => update.contact_info = Some(value),
            "bio" => update.bio = Some(value),
            _ => {}
        }
    }

    match state.showroom().update_profile(&token, update).await {
        Ok(_) => Ok(Redirect::to("/profile?flash=updated").into_response()),
        Err(err) => {
            tracing::error!(error = %err, "Failed to update profile");
            Ok(Redirect::to("/profile?flash=update_failed").into_response())
        }
    }
}

// =============================================================================
// Activity Fragments
// =============================================================================

/// Activity fragment query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Load one more page of the current user's activity (HTMX).
#[instrument(skip(state, session))]
pub async fn activity_fragment(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Err(AppError::AuthRequired);
    };

    let page = query.page.unwrap_or(1);
    let fetched = state.showroom().activity(&token, page).await?;

    render_activity_fragment(&state, &token, fetched, "/profile/activity".to_string()).await
}

/// Load one more page of another user's activity (HTMX).
#[instrument(skip(state, session))]
pub async fn stalk_activity_fragment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Err(AppError::AuthRequired);
    };

    let page = query.page.unwrap_or(1);
    let fetched = state
        .showroom()
        .stalk_activity(&token, UserId::new(id), page)
        .await?;

    render_activity_fragment(
        &state,
        &token,
        fetched,
        format!("/profile/stalk/{id}/activity"),
    )
    .await
}

async fn render_activity_fragment(
    state: &AppState,
    token: &BearerToken,
    fetched: crate::showroom::ActivityPage,
    endpoint: String,
) -> Result<Response, AppError> {
    let names = match state.showroom().list_cars(token).await {
        Ok(cars) => name_map(&cars),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to fetch vehicles for activity names");
            HashMap::new()
        }
    };

    Ok(ActivityFragmentTemplate {
        items: activity_views(&fetched.results, &names),
        next_page: fetched.next_page_number(),
        endpoint,
    }
    .into_response())
}

// =============================================================================
// Stalk View
// =============================================================================

/// Display another user's profile, redacted by the server.
#[instrument(skip(state, session))]
pub async fn stalk(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let user = UserId::new(id);

    let profile = match state.showroom().stalk(&token, user).await {
        Ok(profile) => profile,
        Err(err) => {
            tracing::error!(error = %err, "Failed to fetch stalked profile");
            return Ok(StalkTemplate {
                profile: None,
                activity: Vec::new(),
                next_activity_page: None,
                purchase_count: 0,
                activity_count: 0,
                error: Some("Failed to load this profile. Please try again.".to_string()),
            }
            .into_response());
        }
    };

    let names = match state.showroom().list_cars(&token).await {
        Ok(cars) => name_map(&cars),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to fetch vehicles for activity names");
            HashMap::new()
        }
    };

    let mut feed = ActivityFeed::new();
    if let Err(err) = fetch_next(&mut feed, |page| {
        state.showroom().stalk_activity(&token, user, page)
    })
    .await
    {
        tracing::warn!(error = %err, "Failed to fetch stalked activity log");
    }

    let purchase_count = feed
        .items()
        .iter()
        .filter(|item| item.action == ActivityAction::Purchase)
        .count();

    Ok(StalkTemplate {
        profile: Some(ProfileView::from(&profile)),
        activity: activity_views(feed.items(), &names),
        next_activity_page: feed.next_page(),
        purchase_count,
        activity_count: feed.items().len(),
        error: None,
    }
    .into_response())
}
