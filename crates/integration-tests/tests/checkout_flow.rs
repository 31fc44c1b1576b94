//! End-to-end checkout orchestration against a mock showroom API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use uuid::Uuid;

use autohaus_core::ProductId;
use autohaus_storefront::identity::BearerToken;
use autohaus_storefront::services::checkout::{
    CartLine, CheckoutError, CheckoutStage, RedirectQuery, begin, verify,
};
use autohaus_storefront::showroom::ShowroomClient;

use autohaus_integration_tests::serve_mock_api;

fn token() -> BearerToken {
    BearerToken::new("tok_test".to_string())
}

#[tokio::test]
async fn test_begin_carries_client_secret() {
    // Cart [{id: 7, quantity: 1}], intent creation returns the secret
    let router = Router::new().route(
        "/payment/intent/",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body, json!({"car_id": 7, "quantity": 1}));
            Json(json!({"client_secret": "secret_abc"}))
        }),
    );
    let base_url = serve_mock_api(router).await;
    let client = ShowroomClient::with_base_url(base_url);

    let stage = begin(
        &client,
        &token(),
        CartLine {
            car: ProductId::new(7),
            quantity: 1,
        },
    )
    .await
    .expect("intent created");

    assert_eq!(
        stage,
        CheckoutStage::Confirming {
            client_secret: "secret_abc".to_string()
        }
    );
}

#[tokio::test]
async fn test_begin_maps_intent_failure() {
    let router = Router::new().route(
        "/payment/intent/",
        post(|| async {
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"detail": "processor unavailable"})),
            )
        }),
    );
    let base_url = serve_mock_api(router).await;
    let client = ShowroomClient::with_base_url(base_url);

    let result = begin(
        &client,
        &token(),
        CartLine {
            car: ProductId::new(7),
            quantity: 1,
        },
    )
    .await;

    assert!(matches!(result, Err(CheckoutError::Intent(_))));
}

#[tokio::test]
async fn test_missing_redirect_params_never_touch_the_network() {
    // Confirmation route mounted with both parameters absent must reach the
    // error terminal state without issuing any network call
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_for_handler = Arc::clone(&hits);

    let router = Router::new().route(
        "/payment/verify/",
        post(move || {
            let hits = Arc::clone(&hits_for_handler);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({"success": true, "order_id": "never", "amount": 0.0}))
            }
        }),
    );
    let base_url = serve_mock_api(router).await;
    let client = ShowroomClient::with_base_url(base_url);

    let stage = RedirectQuery::default().into_stage();
    assert!(matches!(stage, Err(CheckoutError::MissingParams)));

    // Even a stage without redirect parameters short-circuits verification
    let result = verify(
        &client,
        &token(),
        &CheckoutStage::Confirming {
            client_secret: "secret_abc".to_string(),
        },
    )
    .await;
    assert!(matches!(result, Err(CheckoutError::MissingParams)));

    assert_eq!(hits.load(Ordering::SeqCst), 0, "no network call issued");
}

#[tokio::test]
async fn test_redirect_verification_success() {
    let order_id = Uuid::new_v4().to_string();
    let order_id_for_handler = order_id.clone();

    let router = Router::new().route(
        "/payment/verify/",
        post(move |Json(body): Json<Value>| {
            let order_id = order_id_for_handler.clone();
            async move {
                assert_eq!(
                    body,
                    json!({
                        "payment_intent_id": "pi_1",
                        "payment_intent_client_secret": "secret_1"
                    })
                );
                Json(json!({
                    "success": true,
                    "order_id": order_id,
                    "amount": 249999.0,
                    "car_name": "Aurora GT"
                }))
            }
        }),
    );
    let base_url = serve_mock_api(router).await;
    let client = ShowroomClient::with_base_url(base_url);

    let stage = RedirectQuery {
        payment_intent: Some("pi_1".to_string()),
        payment_intent_client_secret: Some("secret_1".to_string()),
    }
    .into_stage()
    .expect("both params present");

    let order = verify(&client, &token(), &stage).await.expect("verified");
    assert!(order.success);
    assert_eq!(order.order_id, order_id);
    assert_eq!(order.car_name.as_deref(), Some("Aurora GT"));
}

#[tokio::test]
async fn test_redirect_verification_500_is_one_failure() {
    // Verify endpoint returns 500: the single generic failure state
    let router = Router::new().route(
        "/payment/verify/",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let base_url = serve_mock_api(router).await;
    let client = ShowroomClient::with_base_url(base_url);

    let stage = CheckoutStage::VerifyingAfterRedirect {
        payment_intent: "pi_1".to_string(),
        client_secret: "secret_1".to_string(),
    };

    let result = verify(&client, &token(), &stage).await;
    assert!(matches!(result, Err(CheckoutError::Verification(_))));
}

#[tokio::test]
async fn test_unsuccessful_order_is_declined() {
    let router = Router::new().route(
        "/payment/verify/",
        post(|| async {
            Json(json!({
                "success": false,
                "order_id": "ord_771",
                "amount": 249999.0
            }))
        }),
    );
    let base_url = serve_mock_api(router).await;
    let client = ShowroomClient::with_base_url(base_url);

    let stage = CheckoutStage::VerifyingAfterRedirect {
        payment_intent: "pi_1".to_string(),
        client_secret: "secret_1".to_string(),
    };

    let result = verify(&client, &token(), &stage).await;
    match result {
        Err(CheckoutError::Declined { order_id }) => assert_eq!(order_id, "ord_771"),
        other => panic!("expected Declined, got {other:?}"),
    }
}
