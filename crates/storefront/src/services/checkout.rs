//! Checkout orchestrator.
//!
//! Sequential protocol, no branching concurrency: request a payment intent,
//! hand the client secret to the hosted payment widget, and either finish
//! in-page (the widget confirms without leaving the page; no further network
//! call is needed) or come back through the confirmation route with
//! `payment_intent` / `payment_intent_client_secret` query parameters and
//! verify server-side.
//!
//! The two execution paths are an explicit two-state protocol -
//! [`CheckoutStage::Confirming`] and
//! [`CheckoutStage::VerifyingAfterRedirect`] - rather than something
//! inferred from which route happens to be mounted.
//!
//! Failure semantics: network failure, non-2xx responses, and a declined
//! verification all collapse to one user-facing failure screen per stage;
//! none are retried automatically.

use serde::Deserialize;
use thiserror::Error;

use autohaus_core::ProductId;

use crate::identity::BearerToken;
use crate::showroom::{OrderDetails, ShowroomClient, ShowroomError};

/// One line of the cart handed to the intent endpoint.
#[derive(Debug, Clone, Copy)]
pub struct CartLine {
    pub car: ProductId,
    pub quantity: u32,
}

/// Where a checkout currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutStage {
    /// An intent exists; the hosted widget is collecting card + address and
    /// will confirm with this client secret.
    Confirming { client_secret: String },
    /// The widget redirected back; the payment must be verified server-side
    /// before the order can be shown.
    VerifyingAfterRedirect {
        payment_intent: String,
        client_secret: String,
    },
}

/// Errors terminating a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The confirmation route was mounted without the redirect parameters
    /// (e.g. direct navigation). An immediate error state, never a hang -
    /// and never a network call.
    #[error("payment confirmation parameters are missing")]
    MissingParams,

    /// Creating the payment intent failed.
    #[error("failed to create payment intent: {0}")]
    Intent(#[source] ShowroomError),

    /// The verification endpoint failed or was unreachable.
    #[error("failed to verify payment: {0}")]
    Verification(#[source] ShowroomError),

    /// The verification endpoint answered, but the payment did not succeed.
    #[error("payment was not successful (order {order_id})")]
    Declined { order_id: String },
}

/// Query parameters the hosted widget appends on its redirect back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedirectQuery {
    pub payment_intent: Option<String>,
    pub payment_intent_client_secret: Option<String>,
}

impl RedirectQuery {
    /// Derive the verification stage from the redirect parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingParams`] when either parameter is
    /// absent, so the caller reaches the error terminal state without
    /// issuing any network call.
    pub fn into_stage(self) -> Result<CheckoutStage, CheckoutError> {
        match (self.payment_intent, self.payment_intent_client_secret) {
            (Some(payment_intent), Some(client_secret)) => {
                Ok(CheckoutStage::VerifyingAfterRedirect {
                    payment_intent,
                    client_secret,
                })
            }
            _ => Err(CheckoutError::MissingParams),
        }
    }
}

/// Start a checkout: request a payment intent for the cart line and carry
/// its client secret into the confirming stage.
///
/// # Errors
///
/// Returns [`CheckoutError::Intent`] if the intent request fails.
pub async fn begin(
    client: &ShowroomClient,
    token: &BearerToken,
    line: CartLine,
) -> Result<CheckoutStage, CheckoutError> {
    let intent = client
        .create_payment_intent(token, line.car, line.quantity)
        .await
        .map_err(CheckoutError::Intent)?;

    Ok(CheckoutStage::Confirming {
        client_secret: intent.client_secret,
    })
}

/// Verify a redirected payment and materialize the order summary.
///
/// Only the redirect stage carries anything to verify; an in-page
/// confirmation already finished inside the widget and needs no further
/// network call.
///
/// # Errors
///
/// Returns [`CheckoutError::MissingParams`] for a stage without redirect
/// parameters, [`CheckoutError::Verification`] if the endpoint fails, and
/// [`CheckoutError::Declined`] if it reports an unsuccessful payment.
pub async fn verify(
    client: &ShowroomClient,
    token: &BearerToken,
    stage: &CheckoutStage,
) -> Result<OrderDetails, CheckoutError> {
    let CheckoutStage::VerifyingAfterRedirect {
        payment_intent,
        client_secret,
    } = stage
    else {
        return Err(CheckoutError::MissingParams);
    };

    let order = client
        .verify_payment(token, payment_intent, client_secret)
        .await
        .map_err(CheckoutError::Verification)?;

    if !order.success {
        return Err(CheckoutError::Declined {
            order_id: order.order_id,
        });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_query_with_both_params() {
        let query = RedirectQuery {
            payment_intent: Some("pi_1".to_string()),
            payment_intent_client_secret: Some("secret_1".to_string()),
        };

        let stage = query.into_stage().expect("both params present");
        assert_eq!(
            stage,
            CheckoutStage::VerifyingAfterRedirect {
                payment_intent: "pi_1".to_string(),
                client_secret: "secret_1".to_string(),
            }
        );
    }

    #[test]
    fn test_redirect_query_missing_either_param() {
        // Both absent - e.g. direct navigation to the confirmation route
        let result = RedirectQuery::default().into_stage();
        assert!(matches!(result, Err(CheckoutError::MissingParams)));

        let result = RedirectQuery {
            payment_intent: Some("pi_1".to_string()),
            payment_intent_client_secret: None,
        }
        .into_stage();
        assert!(matches!(result, Err(CheckoutError::MissingParams)));

        let result = RedirectQuery {
            payment_intent: None,
            payment_intent_client_secret: Some("secret_1".to_string()),
        }
        .into_stage();
        assert!(matches!(result, Err(CheckoutError::MissingParams)));
    }

    #[tokio::test]
    async fn test_verify_rejects_confirming_stage_without_network() {
        // A stage with no redirect parameters must fail before any request
        // is issued; the bogus base URL would make any HTTP attempt error
        // with a transport failure instead of MissingParams.
        let client = ShowroomClient::with_base_url("http://invalid.invalid".to_string());
        let token = BearerToken::new("tok".to_string());
        let stage = CheckoutStage::Confirming {
            client_secret: "secret_abc".to_string(),
        };

        let result = verify(&client, &token, &stage).await;
        assert!(matches!(result, Err(CheckoutError::MissingParams)));
    }
}
