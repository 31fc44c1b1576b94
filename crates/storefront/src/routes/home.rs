//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::load_membership;
use crate::routes::cars::CarCardView;
use crate::showroom::Relation;
use crate::state::AppState;

/// How many vehicles the featured grid shows.
const FEATURED_LIMIT: usize = 6;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub greeting: Option<String>,
    pub featured: Vec<CarCardView>,
    pub signed_out: bool,
    pub error: Option<String>,
}

/// Display the home page with the featured vehicles.
///
/// Signed-out visitors get the sign-in hero; no protected call is attempted
/// without a session.
#[instrument(skip(state, session, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse, AppError> {
    let greeting = user.map(|user| user.name);

    let Some(token) = state.auth().fresh_token(&session).await? else {
        return Ok(HomeTemplate {
            greeting: None,
            featured: Vec::new(),
            signed_out: true,
            error: None,
        });
    };

    let favorites = load_membership(&session, Relation::Favorites).await;
    let bookmarks = load_membership(&session, Relation::Bookmarks).await;

    let template = match state.showroom().list_cars(&token).await {
        Ok(cars) => HomeTemplate {
            greeting,
            featured: cars
                .iter()
                .take(FEATURED_LIMIT)
                .map(|car| CarCardView::from_product(car, &favorites, &bookmarks))
                .collect(),
            signed_out: false,
            error: None,
        },
        Err(err) => {
            tracing::error!(error = %err, "Failed to fetch featured vehicles");
            HomeTemplate {
                greeting,
                featured: Vec::new(),
                signed_out: false,
                error: Some("Failed to load vehicles. Please try again.".to_string()),
            }
        }
    };

    Ok(template)
}
