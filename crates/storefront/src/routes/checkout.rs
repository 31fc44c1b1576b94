//! Checkout route handlers.
//!
//! `GET /checkout/{id}` starts the orchestrator: it requests a payment
//! intent and renders the page that mounts the hosted payment widget with
//! the returned client secret. The widget confirms in-page when it can;
//! otherwise it redirects back to `GET /payment/confirmation`, which
//! re-derives the intent parameters from the URL and verifies server-side.
//!
//! Every failure collapses to one user-facing failure screen with a
//! "Return to Showroom" affordance.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use autohaus_core::{Price, ProductId};

use crate::error::AppError;
use crate::filters;
use crate::routes::format_date;
use crate::services::checkout::{self, CartLine, CheckoutStage, RedirectQuery};
use crate::state::AppState;

// =============================================================================
// View Models
// =============================================================================

/// Cart line summary shown beside the widget.
#[derive(Clone)]
pub struct OrderLineView {
    pub car_name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub total: String,
}

/// Verified order summary.
#[derive(Clone)]
pub struct OrderView {
    pub order_id: String,
    pub amount: String,
    pub car_name: Option<String>,
    pub date: String,
}

fn format_amount(amount: f64) -> String {
    Decimal::try_from(amount)
        .map(|decimal| Price::new(decimal).display_whole())
        .unwrap_or_else(|_| format!("${amount}"))
}

// =============================================================================
// Templates
// =============================================================================

/// Payment widget page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/pay.html")]
pub struct CheckoutTemplate {
    pub line: Option<OrderLineView>,
    /// Client secret driving the widget; absent when intent creation failed.
    pub client_secret: Option<String>,
    pub publishable_key: String,
    pub return_url: String,
    pub error: Option<String>,
}

/// Payment confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    /// `Some` renders the success screen; `None` the single failure screen.
    pub order: Option<OrderView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Checkout query parameters.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub quantity: Option<u32>,
}

/// Start a checkout for one vehicle and render the widget page.
#[instrument(skip(state, session))]
pub async fn pay(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Query(query): Query<CheckoutQuery>,
) -> Result<Response, AppError> {
    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let car_id = ProductId::new(id);
    let quantity = query.quantity.unwrap_or(1).max(1);
    let publishable_key = state.config().payments.publishable_key.clone();
    let return_url = format!("{}/payment/confirmation", state.config().base_url);

    let line = match state.showroom().get_car(&token, car_id).await {
        Ok(car) => {
            let total = Price::new(car.price.amount() * Decimal::from(quantity));
            Some(OrderLineView {
                car_name: car.name,
                unit_price: car.price.display_whole(),
                quantity,
                total: total.display_whole(),
            })
        }
        Err(err) => {
            tracing::warn!(error = %err, "Failed to fetch vehicle for checkout summary");
            None
        }
    };

    let stage = checkout::begin(
        state.showroom(),
        &token,
        CartLine {
            car: car_id,
            quantity,
        },
    )
    .await;

    let template = match stage {
        Ok(CheckoutStage::Confirming { client_secret }) => CheckoutTemplate {
            line,
            client_secret: Some(client_secret),
            publishable_key,
            return_url,
            error: None,
        },
        Ok(CheckoutStage::VerifyingAfterRedirect { .. }) => {
            // begin() only ever produces the confirming stage
            return Err(AppError::Internal(
                "checkout started in verification stage".to_string(),
            ));
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to initialize payment");
            CheckoutTemplate {
                line,
                client_secret: None,
                publishable_key,
                return_url,
                error: Some("Failed to initialize payment. Please try again.".to_string()),
            }
        }
    };

    Ok(template.into_response())
}

/// Handle the widget's redirect back and verify the payment.
///
/// Mounted without the redirect parameters (direct navigation), this reaches
/// the failure screen immediately - no network call is issued.
#[instrument(skip(state, session, query))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, AppError> {
    let Ok(stage) = query.into_stage() else {
        return Ok(ConfirmationTemplate { order: None }.into_response());
    };

    let Some(token) = state.auth().fresh_token(&session).await? else {
        // Session evaporated across the redirect; same failure screen
        tracing::warn!("Payment confirmation reached without a session");
        return Ok(ConfirmationTemplate { order: None }.into_response());
    };

    let template = match checkout::verify(state.showroom(), &token, &stage).await {
        Ok(order) => {
            // The purchase changed stock counts server-side
            state.showroom().invalidate_all().await;
            ConfirmationTemplate {
                order: Some(OrderView {
                    order_id: order.order_id,
                    amount: format_amount(order.amount),
                    car_name: order.car_name,
                    date: format_date(&Utc::now()),
                }),
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "Payment verification failed");
            ConfirmationTemplate { order: None }
        }
    };

    Ok(template.into_response())
}
