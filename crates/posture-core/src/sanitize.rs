//! Welcome-form sanitation and validation.
//!
//! Everything typed on the welcome screen passes through here before it
//! becomes a [`ClientInfo`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FormError;
use crate::model::{ClientInfo, CloudProvider};

/// Longest value kept for any free-text field, in characters.
pub const MAX_FIELD_LEN: usize = 100;

static MARKUP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid markup regex"));

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z]{2,10})+$",
    )
    .expect("Invalid email regex")
});

fn truncate(value: &str) -> String {
    value.chars().take(MAX_FIELD_LEN).collect()
}

/// Strip markup, reserved characters and control characters, then trim and
/// cap the length.
pub fn sanitize_text(input: &str) -> String {
    let without_tags = MARKUP_REGEX.replace_all(input, "");
    let cleaned: String = without_tags
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '&') && !c.is_control())
        .collect();
    truncate(cleaned.trim())
}

/// Trim and cap an email address. No characters are removed.
pub fn normalize_email(input: &str) -> String {
    truncate(input.trim())
}

/// An empty address is valid because the field is optional.
pub fn is_valid_email(email: &str) -> bool {
    email.is_empty() || EMAIL_REGEX.is_match(email)
}

/// Raw values as entered on the welcome screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WelcomeForm {
    pub name: String,
    pub email: String,
    pub company: String,
    /// Empty selects the default provider.
    pub cloud_provider: String,
}

impl WelcomeForm {
    /// Sanitize every field and check the form can start an assessment.
    pub fn accept(&self) -> Result<ClientInfo, FormError> {
        let name = sanitize_text(&self.name);
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        let company = sanitize_text(&self.company);
        if company.is_empty() {
            return Err(FormError::MissingCompany);
        }
        let email = normalize_email(&self.email);
        if !is_valid_email(&email) {
            return Err(FormError::InvalidEmail(email));
        }
        let cloud_provider = match self.cloud_provider.trim() {
            "" => CloudProvider::default(),
            raw => raw
                .parse()
                .map_err(|_| FormError::UnknownProvider(raw.to_string()))?,
        };

        Ok(ClientInfo {
            name,
            email,
            company,
            cloud_provider,
        })
    }

    /// Whether [`WelcomeForm::accept`] would succeed.
    pub fn is_valid(&self) -> bool {
        self.accept().is_ok()
    }
}
