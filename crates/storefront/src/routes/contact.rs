//! Contact form route handlers.
//!
//! The form is validation-only: input is checked client-side (here, before
//! anything leaves the component) and acknowledged. Validation failures
//! never leave the form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub submitted: bool,
    pub error: Option<String>,
}

/// Display the contact form.
#[instrument(skip(_state))]
pub async fn show(State(_state): State<AppState>) -> impl IntoResponse {
    ContactTemplate {
        submitted: false,
        error: None,
    }
}

/// Handle a contact form submission.
#[instrument(skip(_state, form), fields(email = %form.email))]
pub async fn submit(
    State(_state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> impl IntoResponse {
    if let Err(message) = validate(&form) {
        return ContactTemplate {
            submitted: false,
            error: Some(message),
        };
    }

    tracing::info!(name = %form.name.trim(), "Contact form submitted");

    ContactTemplate {
        submitted: true,
        error: None,
    }
}

/// Basic email shape check.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn validate(form: &ContactForm) -> Result<(), String> {
    if form.name.trim().is_empty() || form.message.trim().is_empty() {
        return Err("Name and message are required.".to_string());
    }
    if !is_valid_email(form.email.trim()) {
        return Err("Please enter a valid email address.".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada"));
        assert!(!is_valid_email("ada@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada@.com"));
    }

    #[test]
    fn test_validate_requires_name_and_message() {
        let form = ContactForm {
            name: "  ".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            subject: None,
            message: "Hello".to_string(),
        };
        assert!(validate(&form).is_err());
    }
}
