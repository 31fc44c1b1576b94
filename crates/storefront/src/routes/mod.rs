//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (featured vehicles)
//! GET  /health                 - Health check
//! GET  /about                  - About page
//! GET  /contact                - Contact form
//! POST /contact                - Contact form submission (validation-only)
//!
//! # Vehicles
//! GET  /cars                   - Vehicle listing (?car_type= filters)
//! GET  /cars/new               - Add-vehicle form
//! POST /cars/new               - Create vehicle listing
//! GET  /cars/{id}              - Vehicle detail (specs, reviews, similar)
//! POST /cars/{id}/reviews      - Submit review (returns reviews fragment)
//!
//! # Saved cars (HTMX fragments)
//! POST /cars/{id}/favorite     - Toggle favorite (returns button fragment)
//! POST /cars/{id}/bookmark     - Toggle bookmark (returns button fragment)
//!
//! # Profile
//! GET  /profile                - Own profile (requires auth)
//! POST /profile                - Update profile (multipart)
//! GET  /profile/activity       - Activity page fragment (?page=)
//! GET  /profile/stalk/{id}     - Another user's profile (redacted)
//! GET  /profile/stalk/{id}/activity - Their activity fragment (?page=)
//!
//! # Checkout
//! GET  /checkout/{id}          - Payment widget page (?quantity=)
//! GET  /payment/confirmation   - Post-redirect verification route
//!
//! # Auth (OAuth against the identity provider)
//! GET  /auth/login             - Redirect to identity provider
//! GET  /auth/callback          - Handle OAuth callback
//! POST /auth/logout            - Clear session, redirect to provider logout
//! ```

pub mod auth;
pub mod cars;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod pages;
pub mod profile;
pub mod saved;

use axum::{
    Router,
    routing::{get, post},
};
use chrono::{DateTime, Utc};

use crate::state::AppState;

/// A transient user notification rendered with a fragment or page.
#[derive(Debug, Clone)]
pub struct Flash {
    /// One of "success", "info", "error" - picks the banner style.
    pub kind: &'static str,
    pub message: String,
}

impl Flash {
    /// A success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success",
            message: message.into(),
        }
    }

    /// An informational notification.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: "info",
            message: message.into(),
        }
    }

    /// An error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "error",
            message: message.into(),
        }
    }
}

/// Format a timestamp as a long date, e.g. "March 5, 2026".
pub(crate) fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format("%B %-d, %Y").to_string()
}

/// Format a timestamp as a short time, e.g. "03:42 PM".
pub(crate) fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%I:%M %p").to_string()
}

/// Create the vehicle routes router.
pub fn car_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cars::index))
        .route("/new", get(cars::new_form).post(cars::create))
        .route("/{id}", get(cars::show))
        .route("/{id}/reviews", post(cars::create_review))
        .route("/{id}/favorite", post(saved::favorite))
        .route("/{id}/bookmark", post(saved::bookmark))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).post(profile::update))
        .route("/activity", get(profile::activity_fragment))
        .route("/stalk/{id}", get(profile::stalk))
        .route("/stalk/{id}/activity", get(profile::stalk_activity_fragment))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Static pages
        .route("/about", get(pages::about))
        .route("/contact", get(contact::show).post(contact::submit))
        // Vehicle routes
        .nest("/cars", car_routes())
        // Profile routes
        .nest("/profile", profile_routes())
        // Checkout
        .route("/checkout/{id}", get(checkout::pay))
        .route("/payment/confirmation", get(checkout::confirmation))
        // Auth routes
        .nest("/auth", auth_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn test_format_date() {
        let ts = Utc
            .with_ymd_and_hms(2026, 3, 5, 15, 42, 0)
            .single()
            .expect("valid date");
        assert_eq!(format_date(&ts), "March 5, 2026");
    }

    #[test]
    fn test_format_time() {
        let ts = Utc
            .with_ymd_and_hms(2026, 3, 5, 15, 42, 0)
            .single()
            .expect("valid date");
        assert_eq!(format_time(&ts), "03:42 PM");
    }
}
