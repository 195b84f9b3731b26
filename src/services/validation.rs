//! Local lead validation run before any network call.

use validator::ValidateEmail;

use crate::error::ValidationErrors;
use crate::models::{LeadFormData, WebhookConfig};
use crate::services::phone_formatter;

fn label(field: &str) -> String {
    match field {
        "name" => "Name".to_string(),
        "email" => "Email".to_string(),
        "phone" => "Phone".to_string(),
        other => {
            let spaced = other.replace(['_', '-'], " ");
            let mut chars = spaced.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Check required fields plus email and phone shape.
///
/// Email and phone are shape-checked whenever they are filled in, required
/// or not.
pub fn validate_lead(form: &LeadFormData, config: &WebhookConfig) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for field in &config.required_fields {
        let filled = form
            .get(field)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !filled {
            errors.push(field, format!("{} is required", label(field)));
        }
    }

    let email = form.email.trim();
    if !email.is_empty() && !email.validate_email() {
        errors.push("email", "Invalid email address");
    }

    if !form.phone.trim().is_empty() && !phone_formatter::is_complete(&form.phone) {
        errors.push("phone", "Phone must include area code and number");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
