//! Static page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::filters;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate;

/// Display the about page.
#[instrument]
pub async fn about() -> impl IntoResponse {
    AboutTemplate
}
