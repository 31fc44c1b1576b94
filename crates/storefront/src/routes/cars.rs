//! Vehicle route handlers.
//!
//! Listing, detail (specs + reviews + similar vehicles), and the create-only
//! add-vehicle form. Every view renders a dedicated error state instead of
//! propagating an unhandled failure.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use autohaus_core::{Availability, CarType, CategoryId, Price, ProductId};

use crate::error::AppError;
use crate::filters;
use crate::identity::BearerToken;
use crate::models::load_membership;
use crate::routes::{Flash, format_date, format_time};
use crate::services::toggle::ToggleSet;
use crate::showroom::{FileUpload, NewProduct, Product, Relation, Review};
use crate::state::AppState;

/// How many similar vehicles the detail page shows.
const SIMILAR_LIMIT: usize = 3;

// =============================================================================
// View Models
// =============================================================================

/// Vehicle card display data for grids.
#[derive(Clone)]
pub struct CarCardView {
    pub id: i32,
    pub name: String,
    pub price: String,
    pub image_url: Option<String>,
    pub car_type: &'static str,
    pub availability: &'static str,
    pub is_favorite: bool,
    pub is_bookmarked: bool,
}

impl CarCardView {
    /// Build a card, marking saved state from the session membership caches.
    #[must_use]
    pub fn from_product(car: &Product, favorites: &ToggleSet, bookmarks: &ToggleSet) -> Self {
        Self {
            id: car.id.as_i32(),
            name: car.name.clone(),
            price: car.price.display_whole(),
            image_url: car.image_url.clone(),
            car_type: car.car_type.title(),
            availability: car.availability.label(),
            is_favorite: favorites.contains(car.id),
            is_bookmarked: bookmarks.contains(car.id),
        }
    }
}

/// One row of the technical specification sheet.
#[derive(Clone)]
pub struct SpecRow {
    pub label: &'static str,
    pub value: String,
}

/// Vehicle detail display data.
#[derive(Clone)]
pub struct CarDetailView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: Option<String>,
    pub car_type: &'static str,
    pub availability: &'static str,
    pub in_stock: bool,
    pub key_features: Vec<String>,
    pub specs: Vec<SpecRow>,
    pub is_favorite: bool,
    pub is_bookmarked: bool,
}

impl CarDetailView {
    fn from_product(car: &Product, favorites: &ToggleSet, bookmarks: &ToggleSet) -> Self {
        let specs = vec![
            SpecRow { label: "Engine", value: car.engine.clone() },
            SpecRow { label: "Power", value: car.power.clone() },
            SpecRow { label: "Torque", value: car.torque.clone() },
            SpecRow { label: "Transmission", value: car.transmission.clone() },
            SpecRow { label: "0-100 km/h", value: car.acceleration_0_100.clone() },
            SpecRow { label: "Top Speed", value: car.top_speed.clone() },
            SpecRow { label: "Fuel Economy", value: car.fuel_economy.clone() },
            SpecRow { label: "Dimensions", value: car.dimensions.clone() },
            SpecRow { label: "Weight", value: format!("{} kg", car.weight_kg) },
            SpecRow { label: "Wheelbase", value: format!("{} mm", car.wheelbase_mm) },
            SpecRow { label: "Fuel Tank", value: format!("{} L", car.fuel_tank_capacity) },
            SpecRow { label: "Trunk", value: format!("{} L", car.trunk_capacity_liters) },
        ];

        Self {
            id: car.id.as_i32(),
            name: car.name.clone(),
            description: car.description.clone(),
            price: car.price.display_whole(),
            image_url: car.image_url.clone(),
            car_type: car.car_type.title(),
            availability: car.availability.label(),
            in_stock: car.availability == Availability::InStock,
            key_features: car.key_features.clone(),
            specs,
            is_favorite: favorites.contains(car.id),
            is_bookmarked: bookmarks.contains(car.id),
        }
    }
}

/// Review display data.
#[derive(Clone)]
pub struct ReviewView {
    pub reviewer: String,
    pub body: String,
    pub written_date: String,
    pub written_time: String,
    pub avatar: Option<String>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            reviewer: review.reviewer.clone(),
            body: review.review.clone(),
            written_date: format_date(&review.time_written),
            written_time: format_time(&review.time_written),
            avatar: review.reviewer_profile_pic.clone(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Vehicle listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "cars/index.html")]
pub struct CarsIndexTemplate {
    pub heading: &'static str,
    pub cars: Vec<CarCardView>,
    pub signed_out: bool,
    pub error: Option<String>,
}

/// Vehicle detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "cars/show.html")]
pub struct CarShowTemplate {
    pub car: Option<CarDetailView>,
    pub reviews: Vec<ReviewView>,
    pub similar: Vec<CarCardView>,
    pub signed_out: bool,
    pub error: Option<String>,
}

/// Add-vehicle form template.
#[derive(Template, WebTemplate)]
#[template(path = "cars/new.html")]
pub struct NewCarTemplate {
    pub error: Option<String>,
}

/// Reviews fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/reviews.html")]
pub struct ReviewsFragmentTemplate {
    pub car_id: i32,
    pub reviews: Vec<ReviewView>,
    pub flash: Option<Flash>,
}

// =============================================================================
// Listing
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct CarsQuery {
    pub car_type: Option<String>,
}

/// Display the vehicle listing, optionally filtered by category.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CarsQuery>,
) -> Result<Response, AppError> {
    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Ok(CarsIndexTemplate {
            heading: "Showroom",
            cars: Vec::new(),
            signed_out: true,
            error: None,
        }
        .into_response());
    };

    let (heading, fetched) = match query.car_type.as_deref() {
        Some(raw) => {
            let car_type = raw
                .parse::<CarType>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            (
                car_type.title(),
                state.showroom().cars_by_type(&token, car_type, None).await,
            )
        }
        None => ("Showroom", state.showroom().list_cars(&token).await),
    };

    let favorites = load_membership(&session, Relation::Favorites).await;
    let bookmarks = load_membership(&session, Relation::Bookmarks).await;

    let template = match fetched {
        Ok(cars) => CarsIndexTemplate {
            heading,
            cars: cars
                .iter()
                .map(|car| CarCardView::from_product(car, &favorites, &bookmarks))
                .collect(),
            signed_out: false,
            error: None,
        },
        Err(err) => {
            tracing::error!(error = %err, "Failed to fetch vehicle listing");
            CarsIndexTemplate {
                heading,
                cars: Vec::new(),
                signed_out: false,
                error: Some("Failed to load vehicles. Please try again.".to_string()),
            }
        }
    };

    Ok(template.into_response())
}

// =============================================================================
// Detail
// =============================================================================

/// Display the vehicle detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let car_id = ProductId::new(id);

    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Ok(CarShowTemplate {
            car: None,
            reviews: Vec::new(),
            similar: Vec::new(),
            signed_out: true,
            error: None,
        }
        .into_response());
    };

    let car = match state.showroom().get_car(&token, car_id).await {
        Ok(car) => car,
        Err(err) => {
            tracing::error!(error = %err, "Failed to fetch vehicle details");
            return Ok(CarShowTemplate {
                car: None,
                reviews: Vec::new(),
                similar: Vec::new(),
                signed_out: false,
                error: Some("Failed to load car details. Please try again.".to_string()),
            }
            .into_response());
        }
    };

    // Reviews and similar vehicles are decoration; their failures stay local
    let reviews = match state.showroom().reviews(&token, car_id).await {
        Ok(reviews) => reviews.iter().map(ReviewView::from).collect(),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to fetch reviews");
            Vec::new()
        }
    };

    let favorites = load_membership(&session, Relation::Favorites).await;
    let bookmarks = load_membership(&session, Relation::Bookmarks).await;

    let similar = match state
        .showroom()
        .cars_by_type(&token, car.car_type, Some(SIMILAR_LIMIT as u32 + 1))
        .await
    {
        Ok(cars) => cars
            .iter()
            .filter(|candidate| candidate.id != car_id)
            .take(SIMILAR_LIMIT)
            .map(|candidate| CarCardView::from_product(candidate, &favorites, &bookmarks))
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to fetch similar vehicles");
            Vec::new()
        }
    };

    Ok(CarShowTemplate {
        car: Some(CarDetailView::from_product(&car, &favorites, &bookmarks)),
        reviews,
        similar,
        signed_out: false,
        error: None,
    }
    .into_response())
}

// =============================================================================
// Reviews
// =============================================================================

/// Review submission form data.
#[derive(Debug, Deserialize)]
pub struct NewReviewForm {
    pub review: String,
}

/// Submit a review and return the refreshed reviews fragment (HTMX).
///
/// An empty review is rejected in-form; nothing leaves the component.
#[instrument(skip(state, session, form))]
pub async fn create_review(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<NewReviewForm>,
) -> Result<Response, AppError> {
    let car_id = ProductId::new(id);

    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Ok(ReviewsFragmentTemplate {
            car_id: id,
            reviews: Vec::new(),
            flash: Some(Flash::error("Please sign in to submit a review")),
        }
        .into_response());
    };

    if form.review.trim().is_empty() {
        let reviews = fetch_reviews(&state, &token, car_id).await;
        return Ok(ReviewsFragmentTemplate {
            car_id: id,
            reviews,
            flash: Some(Flash::error("Please enter a review")),
        }
        .into_response());
    }

    let flash = match state
        .showroom()
        .create_review(&token, car_id, form.review.trim())
        .await
    {
        Ok(_) => Flash::success("Review submitted successfully"),
        Err(err) => {
            tracing::error!(error = %err, "Failed to submit review");
            Flash::error("Failed to submit review")
        }
    };

    // Re-fetch so the fragment shows the server's copy
    let reviews = fetch_reviews(&state, &token, car_id).await;

    Ok(ReviewsFragmentTemplate {
        car_id: id,
        reviews,
        flash: Some(flash),
    }
    .into_response())
}

async fn fetch_reviews(state: &AppState, token: &BearerToken, car: ProductId) -> Vec<ReviewView> {
    match state.showroom().reviews(token, car).await {
        Ok(reviews) => reviews.iter().map(ReviewView::from).collect(),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to fetch updated reviews");
            Vec::new()
        }
    }
}

// =============================================================================
// Create
// =============================================================================

/// Display the add-vehicle form.
#[instrument(skip(_state))]
pub async fn new_form(State(_state): State<AppState>) -> impl IntoResponse {
    NewCarTemplate { error: None }
}

/// Raw add-vehicle form fields before validation.
#[derive(Debug, Default)]
pub(crate) struct NewCarDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub stock_quantity: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub availability: Option<String>,
    pub car_type: Option<String>,
    pub key_features: Option<String>,
    pub engine: Option<String>,
    pub power: Option<String>,
    pub torque: Option<String>,
    pub transmission: Option<String>,
    pub acceleration_0_100: Option<String>,
    pub top_speed: Option<String>,
    pub fuel_economy: Option<String>,
    pub dimensions: Option<String>,
    pub weight_kg: Option<String>,
    pub wheelbase_mm: Option<String>,
    pub fuel_tank_capacity: Option<String>,
    pub trunk_capacity_liters: Option<String>,
    pub image: Option<FileUpload>,
}

impl NewCarDraft {
    fn set(&mut self, field: &str, value: String) {
        let slot = match field {
            "name" => &mut self.name,
            "description" => &mut self.description,
            "price" => &mut self.price,
            "stock_quantity" => &mut self.stock_quantity,
            "sku" => &mut self.sku,
            "category" => &mut self.category,
            "availability" => &mut self.availability,
            "car_type" => &mut self.car_type,
            "key_features" => &mut self.key_features,
            "engine" => &mut self.engine,
            "power" => &mut self.power,
            "torque" => &mut self.torque,
            "transmission" => &mut self.transmission,
            "acceleration_0_100" => &mut self.acceleration_0_100,
            "top_speed" => &mut self.top_speed,
            "fuel_economy" => &mut self.fuel_economy,
            "dimensions" => &mut self.dimensions,
            "weight_kg" => &mut self.weight_kg,
            "wheelbase_mm" => &mut self.wheelbase_mm,
            "fuel_tank_capacity" => &mut self.fuel_tank_capacity,
            "trunk_capacity_liters" => &mut self.trunk_capacity_liters,
            _ => return,
        };
        *slot = Some(value);
    }
}

fn required(value: Option<String>, message: &str) -> Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(message.to_string()),
    }
}

fn non_negative_number(value: Option<String>, message: &str) -> Result<f64, String> {
    let raw = value.unwrap_or_default();
    match raw.trim().parse::<f64>() {
        Ok(n) if n >= 0.0 => Ok(n),
        _ => Err(message.to_string()),
    }
}

fn non_negative_integer(value: Option<String>, message: &str) -> Result<u32, String> {
    value
        .unwrap_or_default()
        .trim()
        .parse::<u32>()
        .map_err(|_| message.to_string())
}

/// Validate the draft into a well-formed listing.
///
/// All checks run before any request is sent; a failure never leaves the
/// form.
pub(crate) fn validate_new_car(draft: NewCarDraft) -> Result<NewProduct, String> {
    let name = required(draft.name, "Name is required.")?;
    let description = required(draft.description, "Description is required.")?;
    let sku = required(draft.sku, "SKU is required.")?;

    let price_raw = required(draft.price, "Price is required.")?;
    let price = Price::parse(&price_raw).map_err(|_| "Price must be a non-negative number.")?;
    if price.is_negative() {
        return Err("Price must be a non-negative number.".to_string());
    }

    let stock_quantity = non_negative_integer(
        draft.stock_quantity,
        "Stock quantity must be a non-negative integer.",
    )?;
    let category = draft
        .category
        .unwrap_or_default()
        .trim()
        .parse::<i32>()
        .map(CategoryId::new)
        .map_err(|_| "Category must be a number.".to_string())?;
    let availability = match draft.availability.as_deref().unwrap_or("in_stock") {
        "in_stock" => Availability::InStock,
        "out_of_stock" => Availability::OutOfStock,
        _ => return Err("Invalid availability.".to_string()),
    };
    let car_type = draft
        .car_type
        .unwrap_or_default()
        .parse::<CarType>()
        .map_err(|_| "Invalid car type.".to_string())?;

    let weight_kg = non_negative_number(draft.weight_kg, "Weight must be a non-negative number.")?;
    let wheelbase_mm = non_negative_integer(
        draft.wheelbase_mm,
        "Wheelbase must be a non-negative number.",
    )?;
    let fuel_tank_capacity = non_negative_number(
        draft.fuel_tank_capacity,
        "Fuel tank capacity must be a non-negative number.",
    )?;
    let trunk_capacity_liters = non_negative_number(
        draft.trunk_capacity_liters,
        "Trunk capacity must be a non-negative number.",
    )?;

    let key_features = draft
        .key_features
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    Ok(NewProduct {
        name,
        description,
        price: price_raw,
        stock_quantity,
        sku,
        category,
        availability,
        car_type,
        key_features,
        engine: draft.engine.unwrap_or_default(),
        power: draft.power.unwrap_or_default(),
        torque: draft.torque.unwrap_or_default(),
        transmission: draft.transmission.unwrap_or_default(),
        acceleration_0_100: draft.acceleration_0_100.unwrap_or_default(),
        top_speed: draft.top_speed.unwrap_or_default(),
        fuel_economy: draft.fuel_economy.unwrap_or_default(),
        dimensions: draft.dimensions.unwrap_or_default(),
        weight_kg,
        wheelbase_mm,
        fuel_tank_capacity,
        trunk_capacity_liters,
        image: draft.image,
    })
}

/// Create a vehicle listing from the multipart form.
#[instrument(skip(state, session, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let mut draft = NewCarDraft::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
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
                draft.image = Some(FileUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            draft.set(&name, value);
        }
    }

    let new_car = match validate_new_car(draft) {
        Ok(new_car) => new_car,
        Err(message) => {
            // Validation never leaves the form
            return Ok(NewCarTemplate {
                error: Some(message),
            }
            .into_response());
        }
    };

    match state.showroom().create_car(&token, new_car).await {
        Ok(created) => Ok(Redirect::to(&format!("/cars/{}", created.id)).into_response()),
        Err(err) => {
            tracing::error!(error = %err, "Failed to create vehicle listing");
            Ok(NewCarTemplate {
                error: Some("Failed to create the listing. Please try again.".to_string()),
            }
            .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> NewCarDraft {
        let mut draft = NewCarDraft::default();
        draft.set("name", "Aurora GT".to_string());
        draft.set("description", "Grand tourer.".to_string());
        draft.set("price", "249999.00".to_string());
        draft.set("stock_quantity", "3".to_string());
        draft.set("sku", "AUR-GT-01".to_string());
        draft.set("category", "2".to_string());
        draft.set("availability", "in_stock".to_string());
        draft.set("car_type", "luxury".to_string());
        draft.set("key_features", "Carbon body\nAdaptive suspension\n".to_string());
        draft.set("weight_kg", "1745".to_string());
        draft.set("wheelbase_mm", "2805".to_string());
        draft.set("fuel_tank_capacity", "80".to_string());
        draft.set("trunk_capacity_liters", "285".to_string());
        draft
    }

    #[test]
    fn test_validate_valid_draft() {
        let new_car = validate_new_car(valid_draft()).expect("valid draft");
        assert_eq!(new_car.name, "Aurora GT");
        assert_eq!(new_car.car_type, CarType::Luxury);
        assert_eq!(new_car.key_features.len(), 2);
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let mut draft = valid_draft();
        draft.price = Some("-100".to_string());
        let err = validate_new_car(draft).expect_err("negative price rejected");
        assert_eq!(err, "Price must be a non-negative number.");
    }

    #[test]
    fn test_validate_rejects_malformed_price() {
        let mut draft = valid_draft();
        draft.price = Some("a lot".to_string());
        assert!(validate_new_car(draft).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_stock() {
        let mut draft = valid_draft();
        draft.stock_quantity = Some("-1".to_string());
        let err = validate_new_car(draft).expect_err("negative stock rejected");
        assert_eq!(err, "Stock quantity must be a non-negative integer.");
    }

    #[test]
    fn test_validate_requires_name() {
        let mut draft = valid_draft();
        draft.name = Some("   ".to_string());
        assert_eq!(
            validate_new_car(draft).expect_err("blank name rejected"),
            "Name is required."
        );
    }

    #[test]
    fn test_validate_rejects_unknown_car_type() {
        let mut draft = valid_draft();
        draft.car_type = Some("hovercraft".to_string());
        assert_eq!(
            validate_new_car(draft).expect_err("bad car type rejected"),
            "Invalid car type."
        );
    }
}
