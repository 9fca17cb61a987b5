//! Contact form submissions.
//!
//! Messages are recorded as structured log events; there is no mail delivery.

use serde::Deserialize;

use super::ShopError;

/// A contact form submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactMessage {
    /// Sender name.
    pub name: String,
    /// Reply address.
    pub email: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub message: String,
}

/// Validate and record a contact message.
///
/// # Errors
///
/// Returns `ShopError::Validation` if a field is blank or the address is not
/// plausible.
pub fn submit_contact(message: &ContactMessage) -> Result<(), ShopError> {
    let name = message.name.trim();
    let email = message.email.trim();
    let subject = message.subject.trim();
    let body = message.message.trim();

    if [name, email, subject, body].iter().any(|f| f.is_empty()) {
        return Err(ShopError::Validation("all fields are required".to_owned()));
    }
    if !is_plausible_email(email) {
        return Err(ShopError::Validation("invalid email address".to_owned()));
    }
    if body.chars().count() > 5000 {
        return Err(ShopError::Validation(
            "message must be at most 5000 characters".to_owned(),
        ));
    }

    tracing::info!(
        target: "litus_storefront::contact",
        name,
        email,
        subject,
        message = body,
        "Contact message received"
    );
    Ok(())
}

/// `local@domain.tld` with no whitespace.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(email: &str, body: &str) -> ContactMessage {
        ContactMessage {
            name: "Deniz".to_owned(),
            email: email.to_owned(),
            subject: "Sipariş".to_owned(),
            message: body.to_owned(),
        }
    }

    #[test]
    fn test_plausible_email() {
        assert!(is_plausible_email("deniz@litus.com.tr"));
        assert!(!is_plausible_email("deniz"));
        assert!(!is_plausible_email("@litus.com"));
        assert!(!is_plausible_email("deniz@localhost"));
        assert!(!is_plausible_email("de niz@litus.com"));
        assert!(!is_plausible_email("a@b@c.com"));
    }

    #[test]
    fn test_submit_contact() {
        assert!(submit_contact(&message("deniz@litus.com", "Merhaba")).is_ok());
        assert!(matches!(
            submit_contact(&message("deniz@litus.com", "   ")),
            Err(ShopError::Validation(_))
        ));
        assert!(matches!(
            submit_contact(&message("nope", "Merhaba")),
            Err(ShopError::Validation(_))
        ));
    }
}
