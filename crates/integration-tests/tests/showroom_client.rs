//! Integration tests for the showroom resource client.
//!
//! The real `ShowroomClient` runs against an in-process axum mock of the
//! showroom API: parsing, bearer attachment, error details, the keyed
//! vehicle cache, and multipart encoding.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::{Value, json};

use autohaus_core::ProductId;
use autohaus_storefront::identity::BearerToken;
use autohaus_storefront::showroom::{Relation, ShowroomClient, ShowroomError, ToggleAction};

use autohaus_integration_tests::{sample_car, sample_profile, serve_mock_api};

fn token() -> BearerToken {
    BearerToken::new("tok_test".to_string())
}

// =============================================================================
// Listing and Detail
// =============================================================================

#[tokio::test]
async fn test_list_cars_parses_and_sends_bearer() {
    let router = Router::new().route(
        "/api/",
        get(|headers: HeaderMap| async move {
            assert_eq!(
                headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .expect("authorization header present"),
                "Bearer tok_test"
            );
            Json(json!([
                sample_car(1, "Aurora GT", "luxury", "249999.00"),
                sample_car(2, "Silverline 300", "classic", "68000.00"),
            ]))
        }),
    );
    let base_url = serve_mock_api(router).await;

    let client = ShowroomClient::with_base_url(base_url);
    let cars = client.list_cars(&token()).await.expect("listing fetch");

    assert_eq!(cars.len(), 2);
    assert_eq!(cars[0].name, "Aurora GT");
    assert_eq!(cars[1].price.display_whole(), "$68,000");
}

#[tokio::test]
async fn test_get_car_uses_keyed_cache() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_for_handler = Arc::clone(&hits);

    let router = Router::new().route(
        "/api/{id}/",
        get(move || {
            let hits = Arc::clone(&hits_for_handler);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(sample_car(7, "Aurora GT", "luxury", "249999.00"))
            }
        }),
    );
    let base_url = serve_mock_api(router).await;

    let client = ShowroomClient::with_base_url(base_url);
    let first = client
        .get_car(&token(), ProductId::new(7))
        .await
        .expect("first fetch");
    let second = client
        .get_car(&token(), ProductId::new(7))
        .await
        .expect("second fetch");

    assert_eq!(first.name, second.name);
    assert_eq!(hits.load(Ordering::SeqCst), 1, "second read came from cache");

    // Invalidation forces a refetch
    client.invalidate_car(ProductId::new(7)).await;
    client
        .get_car(&token(), ProductId::new(7))
        .await
        .expect("post-invalidation fetch");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cars_by_ids_filters_listing() {
    let router = Router::new().route(
        "/api/",
        get(|| async {
            Json(json!([
                sample_car(1, "Aurora GT", "luxury", "249999.00"),
                sample_car(2, "Silverline 300", "classic", "68000.00"),
                sample_car(3, "Voltaic S", "electrical", "112000.00"),
            ]))
        }),
    );
    let base_url = serve_mock_api(router).await;

    let client = ShowroomClient::with_base_url(base_url);
    let cars = client
        .cars_by_ids(&token(), &[ProductId::new(1), ProductId::new(3)])
        .await
        .expect("filtered fetch");

    let names: Vec<&str> = cars.iter().map(|car| car.name.as_str()).collect();
    assert_eq!(names, vec!["Aurora GT", "Voltaic S"]);
}

#[tokio::test]
async fn test_cars_by_ids_empty_set_is_no_request() {
    // A bogus base URL: any request attempt would fail with a transport
    // error instead of Ok
    let client = ShowroomClient::with_base_url("http://invalid.invalid".to_string());
    let cars = client
        .cars_by_ids(&token(), &[])
        .await
        .expect("no request issued");
    assert!(cars.is_empty());
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_non_2xx_carries_status_and_detail() {
    let router = Router::new().route(
        "/api/{id}/",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({"detail": "No Product matches the given query."})),
            )
        }),
    );
    let base_url = serve_mock_api(router).await;

    let client = ShowroomClient::with_base_url(base_url);
    let err = client
        .get_car(&token(), ProductId::new(99))
        .await
        .expect_err("404 propagates");

    match err {
        ShowroomError::Api { status, detail } => {
            assert_eq!(status, 404);
            assert_eq!(detail.as_deref(), Some("No Product matches the given query."));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// =============================================================================
// Membership Mutation
// =============================================================================

#[tokio::test]
async fn test_update_membership_hits_relation_path() {
    let router = Router::new().route(
        "/profiles/favorites/add/{id}/",
        patch(|Json(body): Json<Value>| async move {
            assert_eq!(body, json!({"car_id": 42}));
            Json(json!({"status": "added"}))
        }),
    );
    let base_url = serve_mock_api(router).await;

    let client = ShowroomClient::with_base_url(base_url);
    client
        .update_membership(
            &token(),
            Relation::Favorites,
            ToggleAction::Add,
            ProductId::new(42),
        )
        .await
        .expect("membership mutation");
}

#[tokio::test]
async fn test_update_membership_conflict_detected() {
    let router = Router::new().route(
        "/profiles/bookmarks/remove/{id}/",
        patch(|| async {
            (
                StatusCode::CONFLICT,
                Json(json!({"detail": "car was already removed"})),
            )
        }),
    );
    let base_url = serve_mock_api(router).await;

    let client = ShowroomClient::with_base_url(base_url);
    let err = client
        .update_membership(
            &token(),
            Relation::Bookmarks,
            ToggleAction::Remove,
            ProductId::new(42),
        )
        .await
        .expect_err("conflict propagates");

    assert!(err.is_idempotent_conflict());
}

// =============================================================================
// Multipart
// =============================================================================

#[tokio::test]
async fn test_profile_update_is_multipart_with_boundary() {
    let router = Router::new().route(
        "/profiles/",
        patch(|headers: HeaderMap| async move {
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .expect("content-type present")
                .to_string();
            // The transport must generate the boundary itself
            assert!(content_type.starts_with("multipart/form-data"));
            assert!(content_type.contains("boundary="));
            Json(sample_profile(1, &[], &[]))
        }),
    );
    let base_url = serve_mock_api(router).await;

    let client = ShowroomClient::with_base_url(base_url);
    let update = autohaus_storefront::showroom::ProfileUpdate {
        name: Some("Margot Vance".to_string()),
        bio: Some("Collector of fast things.".to_string()),
        ..Default::default()
    };
    let profile = client
        .update_profile(&token(), update)
        .await
        .expect("profile update");

    assert_eq!(profile.name, "Margot Vance");
}
