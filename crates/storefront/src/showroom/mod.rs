//! Showroom REST API client.
//!
//! # Architecture
//!
//! - One typed async method per endpoint; each issues exactly one HTTP
//!   request with a fresh bearer token and parses the JSON payload
//! - The API is the source of truth - NO local sync, direct calls only
//! - Vehicles are cached in a normalized keyed cache (`moka`, id -> entity,
//!   5 minute TTL) so every view reads the same copy and invalidates together
//! - Non-2xx responses are never retried; the failure propagates to the
//!   caller for view-level handling
//!
//! # Example
//!
//! ```rust,ignore
//! use autohaus_storefront::showroom::ShowroomClient;
//!
//! let client = ShowroomClient::new(&config);
//!
//! // Fetch a vehicle
//! let car = client.get_car(&token, ProductId::new(7)).await?;
//!
//! // Toggle a favorite
//! client
//!     .update_membership(&token, Relation::Favorites, ToggleAction::Add, car.id)
//!     .await?;
//! ```

pub mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::multipart;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use autohaus_core::{CarType, ProductId, UserId};

use crate::config::ShowroomConfig;
use crate::identity::BearerToken;

/// How long a cached vehicle stays fresh.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when talking to the showroom API.
#[derive(Debug, Error)]
pub enum ShowroomError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-2xx response.
    #[error("API error: {status}{}", .detail.as_deref().map(|d| format!(" - {d}")).unwrap_or_default())]
    Api {
        status: u16,
        /// Server-supplied message (`detail` or `message` field), when present.
        detail: Option<String>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ShowroomError {
    /// Whether the API rejected a membership mutation because the state was
    /// already as desired ("already favorited", "already removed", ...).
    ///
    /// The toggle controller treats this as success and keeps its optimistic
    /// state.
    #[must_use]
    pub fn is_idempotent_conflict(&self) -> bool {
        matches!(self, Self::Api { detail: Some(detail), .. } if detail.contains("already"))
    }
}

/// Pull the server-supplied message out of an error body.
///
/// The API emits `{"detail": "..."}` (and occasionally `{"message": "..."}`);
/// anything else falls back to the raw body, truncated.
fn extract_detail(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        detail: Option<String>,
        message: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(detail) = parsed.detail.or(parsed.message)
    {
        return Some(detail);
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(200).collect())
    }
}

// =============================================================================
// Request/response bodies
// =============================================================================

#[derive(Debug, Serialize)]
struct MembershipRequest {
    car_id: i32,
}

#[derive(Debug, Serialize)]
struct NewReviewRequest<'a> {
    review: &'a str,
}

#[derive(Debug, Serialize)]
struct IntentRequest {
    car_id: i32,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    payment_intent_id: &'a str,
    payment_intent_client_secret: &'a str,
}

// =============================================================================
// ShowroomClient
// =============================================================================

/// Client for the showroom REST API.
///
/// Cheaply cloneable; vehicles are cached for 5 minutes.
#[derive(Clone)]
pub struct ShowroomClient {
    inner: Arc<ShowroomClientInner>,
}

struct ShowroomClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<ProductId, Product>,
}

impl ShowroomClient {
    /// Create a new showroom API client.
    #[must_use]
    pub fn new(config: &ShowroomConfig) -> Self {
        Self::with_base_url(config.api_url.clone())
    }

    /// Create a client against an explicit base URL (used by tests).
    #[must_use]
    pub fn with_base_url(base_url: String) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(ShowroomClientInner {
                client: reqwest::Client::new(),
                base_url,
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Parse a response: non-2xx becomes `ShowroomError::Api` with the
    /// server-supplied detail, success bodies deserialize into `T`.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ShowroomError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ShowroomError::Api {
                status: status.as_u16(),
                detail: extract_detail(&text),
            });
        }

        serde_json::from_str(&text).map_err(ShowroomError::Parse)
    }

    /// Like [`Self::parse_response`] but for endpoints whose success body we
    /// don't consume.
    async fn expect_success(response: reqwest::Response) -> Result<(), ShowroomError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await?;
        Err(ShowroomError::Api {
            status: status.as_u16(),
            detail: extract_detail(&text),
        })
    }

    // =========================================================================
    // Vehicle Methods
    // =========================================================================

    /// List every vehicle in the showroom.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_cars(&self, token: &BearerToken) -> Result<Vec<Product>, ShowroomError> {
        let response = self
            .inner
            .client
            .get(self.url("/api/"))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Get a single vehicle by id.
    ///
    /// Served from the keyed cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the vehicle is not found or the request fails.
    #[instrument(skip(self, token), fields(car = %id))]
    pub async fn get_car(
        &self,
        token: &BearerToken,
        id: ProductId,
    ) -> Result<Product, ShowroomError> {
        if let Some(car) = self.inner.cache.get(&id).await {
            debug!("Cache hit for vehicle");
            return Ok(car);
        }

        let response = self
            .inner
            .client
            .get(self.url(&format!("/api/{id}/")))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let car: Product = Self::parse_response(response).await?;
        self.inner.cache.insert(id, car.clone()).await;

        Ok(car)
    }

    /// List vehicles of one category, optionally limited.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn cars_by_type(
        &self,
        token: &BearerToken,
        car_type: CarType,
        limit: Option<u32>,
    ) -> Result<Vec<Product>, ShowroomError> {
        let mut url = format!("{}?car_type={car_type}", self.url("/api/filtered/"));
        if let Some(limit) = limit {
            url.push_str(&format!("&limit={limit}"));
        }

        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the vehicles matching a set of ids.
    ///
    /// The API has no bulk-by-id endpoint, so this fetches the full listing
    /// and filters it down, preserving the listing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, ids))]
    pub async fn cars_by_ids(
        &self,
        token: &BearerToken,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, ShowroomError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let all = self.list_cars(token).await?;
        Ok(all.into_iter().filter(|car| ids.contains(&car.id)).collect())
    }

    /// Create a vehicle listing.
    ///
    /// Sends multipart form data when an image is attached (the content-type
    /// header is left to the transport so the boundary is generated
    /// correctly), plain JSON otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the listing or the request fails.
    #[instrument(skip(self, token, car), fields(sku = %car.sku))]
    pub async fn create_car(
        &self,
        token: &BearerToken,
        car: NewProduct,
    ) -> Result<Product, ShowroomError> {
        let request = self
            .inner
            .client
            .post(self.url("/api/"))
            .bearer_auth(token.as_str());

        let response = if car.image.is_some() {
            request.multipart(new_product_form(car)?).send().await?
        } else {
            request.json(&car).send().await?
        };

        let created: Product = Self::parse_response(response).await?;

        // Listings changed; drop every cached vehicle
        self.invalidate_all().await;

        Ok(created)
    }

    // =========================================================================
    // Review Methods
    // =========================================================================

    /// List reviews for a vehicle.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(car = %car))]
    pub async fn reviews(
        &self,
        token: &BearerToken,
        car: ProductId,
    ) -> Result<Vec<Review>, ShowroomError> {
        let response = self
            .inner
            .client
            .get(self.url(&format!("/api/{car}/reviews/")))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Submit a review for a vehicle.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the review or the request fails.
    #[instrument(skip(self, token, body), fields(car = %car))]
    pub async fn create_review(
        &self,
        token: &BearerToken,
        car: ProductId,
        body: &str,
    ) -> Result<Review, ShowroomError> {
        let response = self
            .inner
            .client
            .post(self.url(&format!("/api/{car}/reviews/create/")))
            .bearer_auth(token.as_str())
            .json(&NewReviewRequest { review: body })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // =========================================================================
    // Profile Methods (not cached - mutable state)
    // =========================================================================

    /// Get the current user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &BearerToken) -> Result<Profile, ShowroomError> {
        let response = self
            .inner
            .client
            .get(self.url("/profiles/"))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Update the current user's profile.
    ///
    /// Always multipart: the content-type header is left to the transport so
    /// the boundary is generated correctly.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update or the request fails.
    #[instrument(skip(self, token, update))]
    pub async fn update_profile(
        &self,
        token: &BearerToken,
        update: ProfileUpdate,
    ) -> Result<Profile, ShowroomError> {
        let response = self
            .inner
            .client
            .patch(self.url("/profiles/"))
            .bearer_auth(token.as_str())
            .multipart(profile_update_form(update)?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Mutate a saved-car relation.
    ///
    /// One function covers both relations and both directions - the endpoint
    /// shape is `/profiles/{relation}/{action}/{id}/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the mutation or the request fails.
    /// An idempotent conflict surfaces as `ShowroomError::Api` for which
    /// [`ShowroomError::is_idempotent_conflict`] is true.
    #[instrument(skip(self, token), fields(relation = ?relation, action = ?action, car = %car))]
    pub async fn update_membership(
        &self,
        token: &BearerToken,
        relation: Relation,
        action: ToggleAction,
        car: ProductId,
    ) -> Result<(), ShowroomError> {
        let path = format!(
            "/profiles/{}/{}/{car}/",
            relation.path_segment(),
            action.path_segment()
        );

        let response = self
            .inner
            .client
            .patch(self.url(&path))
            .bearer_auth(token.as_str())
            .json(&MembershipRequest {
                car_id: car.as_i32(),
            })
            .send()
            .await?;

        Self::expect_success(response).await
    }

    /// Get one page of the current user's activity log.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn activity(
        &self,
        token: &BearerToken,
        page: u32,
    ) -> Result<ActivityPage, ShowroomError> {
        let response = self
            .inner
            .client
            .get(format!("{}?page={page}", self.url("/profiles/activity/")))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Get another user's profile, redacted by the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(user = %user))]
    pub async fn stalk(&self, token: &BearerToken, user: UserId) -> Result<Profile, ShowroomError> {
        let response = self
            .inner
            .client
            .get(self.url(&format!("/profiles/stalk/{user}/")))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Get one page of another user's activity log.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(user = %user))]
    pub async fn stalk_activity(
        &self,
        token: &BearerToken,
        user: UserId,
        page: u32,
    ) -> Result<ActivityPage, ShowroomError> {
        let response = self
            .inner
            .client
            .get(format!(
                "{}?page={page}",
                self.url(&format!("/profiles/{user}/activity/"))
            ))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Create a payment intent for one cart line.
    ///
    /// The returned client secret drives the hosted payment widget.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(car = %car))]
    pub async fn create_payment_intent(
        &self,
        token: &BearerToken,
        car: ProductId,
        quantity: u32,
    ) -> Result<PaymentIntent, ShowroomError> {
        let response = self
            .inner
            .client
            .post(self.url("/payment/intent/"))
            .bearer_auth(token.as_str())
            .json(&IntentRequest {
                car_id: car.as_i32(),
                quantity,
            })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Verify a confirmed payment and materialize the order summary.
    ///
    /// # Errors
    ///
    /// Returns an error if verification fails or the request fails.
    #[instrument(skip(self, token, client_secret))]
    pub async fn verify_payment(
        &self,
        token: &BearerToken,
        payment_intent: &str,
        client_secret: &str,
    ) -> Result<OrderDetails, ShowroomError> {
        let response = self
            .inner
            .client
            .post(self.url("/payment/verify/"))
            .bearer_auth(token.as_str())
            .json(&VerifyRequest {
                payment_intent_id: payment_intent,
                payment_intent_client_secret: client_secret,
            })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached vehicle.
    pub async fn invalidate_car(&self, id: ProductId) {
        self.inner.cache.invalidate(&id).await;
    }

    /// Invalidate every cached vehicle.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

// =============================================================================
// Multipart builders
// =============================================================================

/// Build the multipart form for a profile update.
///
/// Absent fields are omitted entirely (PATCH semantics); the picture becomes
/// a file part.
fn profile_update_form(update: ProfileUpdate) -> Result<multipart::Form, ShowroomError> {
    let mut form = multipart::Form::new();

    if let Some(name) = update.name {
        form = form.text("name", name);
    }
    if let Some(location) = update.location {
        form = form.text("location", location);
    }
    if let Some(contact_info) = update.contact_info {
        form = form.text("contact_info", contact_info);
    }
    if let Some(bio) = update.bio {
        form = form.text("bio", bio);
    }
    if let Some(picture) = update.profile_picture {
        form = form.part("profile_picture", file_part(picture)?);
    }

    Ok(form)
}

/// Build the multipart form for a new vehicle listing with an image.
fn new_product_form(car: NewProduct) -> Result<multipart::Form, ShowroomError> {
    let key_features = serde_json::to_string(&car.key_features)?;

    let mut form = multipart::Form::new()
        .text("name", car.name)
        .text("description", car.description)
        .text("price", car.price)
        .text("stock_quantity", car.stock_quantity.to_string())
        .text("sku", car.sku)
        .text("category", car.category.to_string())
        .text("availability", car.availability.as_str())
        .text("car_type", car.car_type.to_string())
        .text("key_features", key_features)
        .text("engine", car.engine)
        .text("power", car.power)
        .text("torque", car.torque)
        .text("transmission", car.transmission)
        .text("acceleration_0_100", car.acceleration_0_100)
        .text("top_speed", car.top_speed)
        .text("fuel_economy", car.fuel_economy)
        .text("dimensions", car.dimensions)
        .text("weight_kg", car.weight_kg.to_string())
        .text("wheelbase_mm", car.wheelbase_mm.to_string())
        .text("fuel_tank_capacity", car.fuel_tank_capacity.to_string())
        .text("trunk_capacity_liters", car.trunk_capacity_liters.to_string());

    if let Some(image) = car.image {
        form = form.part("image", file_part(image)?);
    }

    Ok(form)
}

fn file_part(upload: FileUpload) -> Result<multipart::Part, ShowroomError> {
    Ok(multipart::Part::bytes(upload.bytes)
        .file_name(upload.filename)
        .mime_str(&upload.content_type)?)
}
