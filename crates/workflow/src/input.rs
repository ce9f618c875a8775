//! Normalization of free-text fields shared by every record.

use epiccrm_core::ValidationError;

/// Trimmed, non-empty text.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

/// Trimmed text; blank means absent.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Emails are stored trimmed and lowercased, so lookups are case-insensitive.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::MissingField("email"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidEmail(email));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
    }

    #[test]
    fn email_needs_one_at_sign_with_both_sides() {
        assert_eq!(normalize_email(""), Err(ValidationError::MissingField("email")));
        assert!(matches!(normalize_email("alice"), Err(ValidationError::InvalidEmail(_))));
        assert!(matches!(normalize_email("@x.io"), Err(ValidationError::InvalidEmail(_))));
        assert!(matches!(normalize_email("a@b@c"), Err(ValidationError::InvalidEmail(_))));
        assert!(matches!(normalize_email("a b@c.io"), Err(ValidationError::InvalidEmail(_))));
    }

    #[test]
    fn blank_optional_is_absent() {
        assert_eq!(optional(Some("   ")), None);
        assert_eq!(optional(Some(" Acme ")).as_deref(), Some("Acme"));
        assert_eq!(required("first_name", " Ann ").unwrap(), "Ann");
        assert_eq!(required("last_name", ""), Err(ValidationError::MissingField("last_name")));
    }
}
