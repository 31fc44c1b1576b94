//! Integration tests for Autohaus.
//!
//! The storefront's only collaborator is the showroom REST API, so the tests
//! run the real `ShowroomClient` against an in-process axum mock of that
//! API. Each test builds the routes it needs, serves them on an ephemeral
//! port, and points the client at the resulting base URL.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p autohaus-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `showroom_client` - Resource client behavior (parsing, errors, multipart)
//! - `toggle_flow` - Optimistic favorite/bookmark toggles end to end
//! - `checkout_flow` - Payment intent, confirmation, verification
//! - `activity_flow` - Paginated activity accumulation

use axum::Router;
use serde_json::{Value, json};

/// Serve a mock showroom API on an ephemeral port.
///
/// Returns the base URL to hand to `ShowroomClient::with_base_url`. The
/// server lives until the test's runtime shuts down.
///
/// # Panics
///
/// Panics if the listener cannot bind.
pub async fn serve_mock_api(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock api listener");
    let addr = listener.local_addr().expect("mock api local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock api server");
    });

    format!("http://{addr}")
}

/// A complete vehicle document as the showroom API serves it.
#[must_use]
pub fn sample_car(id: i32, name: &str, car_type: &str, price: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "A fine automobile.",
        "price": price,
        "stock_quantity": 2,
        "sku": format!("SKU-{id}"),
        "category": 1,
        "availability": "in_stock",
        "car_type": car_type,
        "created_at": "2026-01-10T09:00:00Z",
        "updated_at": "2026-02-01T12:30:00Z",
        "image_url": null,
        "key_features": ["Heated seats"],
        "engine": "3.0L I6",
        "power": "375 hp",
        "torque": "500 Nm",
        "transmission": "8-speed automatic",
        "acceleration_0_100": "4.9s",
        "top_speed": "250 km/h",
        "fuel_economy": "9.8 L/100km",
        "dimensions": "4.8m x 1.9m x 1.4m",
        "weight_kg": 1650.0,
        "wheelbase_mm": 2850,
        "fuel_tank_capacity": 65.0,
        "trunk_capacity_liters": 480.0
    })
}

/// A profile document as the showroom API serves it.
#[must_use]
pub fn sample_profile(user: i32, favorites: &[i32], bookmarks: &[i32]) -> Value {
    json!({
        "user": user,
        "name": "Margot Vance",
        "location": "Stuttgart",
        "contact_info": "margot@example.com",
        "bio": "Collector of fast things.",
        "profile_picture_url": null,
        "favorite_cars": favorites,
        "bookmarked_cars": bookmarks,
        "member_since": "2024-06-01T00:00:00Z"
    })
}

/// One page of the activity paginator.
#[must_use]
pub fn sample_activity_page(base_url: &str, next_page: Option<u32>, items: &[(i64, i32)]) -> Value {
    let results: Vec<Value> = items
        .iter()
        .map(|(id, product)| {
            json!({
                "id": id,
                "profile": 1,
                "product": product,
                "action": "view",
                "timestamp": "2026-03-05T15:42:00Z",
                "details": null
            })
        })
        .collect();

    json!({
        "count": 30,
        "next": next_page.map(|page| format!("{base_url}/profiles/activity/?page={page}")),
        "previous": null,
        "results": results
    })
}
