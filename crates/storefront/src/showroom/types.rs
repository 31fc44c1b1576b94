//! Domain types for the showroom REST API.
//!
//! These mirror the JSON the API serves. Every entity is owned by the
//! backend; the storefront only ever holds a transient, read-through copy.

use autohaus_core::{ActivityAction, Availability, CarType, CategoryId, Price, ProductId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog
// =============================================================================

/// A vehicle listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Decimal string on the wire (preserves precision).
    pub price: Price,
    pub stock_quantity: u32,
    pub sku: String,
    pub category: CategoryId,
    pub availability: Availability,
    pub car_type: CarType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub key_features: Vec<String>,
    // Technical specification sheet
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub power: String,
    #[serde(default)]
    pub torque: String,
    #[serde(default)]
    pub transmission: String,
    #[serde(default)]
    pub acceleration_0_100: String,
    #[serde(default)]
    pub top_speed: String,
    #[serde(default)]
    pub fuel_economy: String,
    #[serde(default)]
    pub dimensions: String,
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default)]
    pub wheelbase_mm: u32,
    #[serde(default)]
    pub fuel_tank_capacity: f64,
    #[serde(default)]
    pub trunk_capacity_liters: f64,
}

/// Fields for the create-only add-vehicle form.
///
/// Serialized as JSON when no image is attached; otherwise flattened into a
/// multipart form by the client.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    /// Decimal string, validated non-negative before any request is sent.
    pub price: String,
    pub stock_quantity: u32,
    pub sku: String,
    pub category: CategoryId,
    pub availability: Availability,
    pub car_type: CarType,
    pub key_features: Vec<String>,
    pub engine: String,
    pub power: String,
    pub torque: String,
    pub transmission: String,
    pub acceleration_0_100: String,
    pub top_speed: String,
    pub fuel_economy: String,
    pub dimensions: String,
    pub weight_kg: f64,
    pub wheelbase_mm: u32,
    pub fuel_tank_capacity: f64,
    pub trunk_capacity_liters: f64,
    /// Image upload, sent as a multipart file part when present.
    #[serde(skip)]
    pub image: Option<FileUpload>,
}

/// An uploaded file forwarded to the API as a multipart part.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// =============================================================================
// Profiles
// =============================================================================

/// A user profile.
///
/// The stalk endpoint serves a redacted subset of these fields, so all
/// display fields default when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub favorite_cars: Vec<ProductId>,
    #[serde(default)]
    pub bookmarked_cars: Vec<ProductId>,
    #[serde(default)]
    pub member_since: Option<DateTime<Utc>>,
}

/// Partial profile update, sent as multipart form data.
///
/// `None` fields are omitted from the form entirely (PATCH semantics).
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub contact_info: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<FileUpload>,
}

/// The two saved-car relations a profile carries.
///
/// They are independent instances of the same membership pattern and are
/// never coupled to each other's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Favorites,
    Bookmarks,
}

impl Relation {
    /// Path segment in the membership endpoints.
    #[must_use]
    pub const fn path_segment(&self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::Bookmarks => "bookmarks",
        }
    }

    /// Noun used in user-facing notifications.
    #[must_use]
    pub const fn noun(&self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::Bookmarks => "bookmarks",
        }
    }
}

/// Direction of a membership mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleAction {
    Add,
    Remove,
}

impl ToggleAction {
    /// Path segment in the membership endpoints.
    #[must_use]
    pub const fn path_segment(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// A review left on a vehicle. Append-only from the storefront's side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub reviewer: String,
    #[serde(default)]
    pub reviewer_id: Option<UserId>,
    pub car: ProductId,
    pub review: String,
    #[serde(rename = "reviewer_Profile_pic", default)]
    pub reviewer_profile_pic: Option<String>,
    pub time_written: DateTime<Utc>,
}

// =============================================================================
// Activity
// =============================================================================

/// One entry of the server-generated activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: i64,
    pub profile: UserId,
    pub product: ProductId,
    pub action: ActivityAction,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: Option<String>,
}

/// One page of the activity log paginator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPage {
    pub count: i64,
    /// URL of the next page, absent on the last page.
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<ActivityItem>,
}

impl ActivityPage {
    /// Extract the page number the paginator's `next` link points at.
    ///
    /// The API emits absolute URLs (`...?page=3`); only the `page` query
    /// parameter is meaningful to us.
    #[must_use]
    pub fn next_page_number(&self) -> Option<u32> {
        let next = self.next.as_deref()?;
        let url = url::Url::parse(next).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse::<u32>().ok())
    }
}

// =============================================================================
// Payments
// =============================================================================

/// Server-issued handle for an in-progress charge, consumed by the hosted
/// payment widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub client_secret: String,
}

/// Post-confirmation order summary from the verification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub success: bool,
    pub order_id: String,
    pub amount: f64,
    #[serde(default)]
    pub car_name: Option<String>,
}
