use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Registration payload. Every field is optional at the wire level so a
/// missing field surfaces as a validation error rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "PhoneNumber")]
    pub phone: Option<String>,
    #[serde(alias = "Address")]
    pub address: Option<String>,
}

/// Lowercases and trims an email, returning `None` if it doesn't look like
/// `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    EMAIL_RE.is_match(&email).then_some(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases() {
        assert_eq!(
            normalize_email("  Jane.Doe@Example.COM ").as_deref(),
            Some("jane.doe@example.com")
        );
    }

    #[test]
    fn test_normalize_email_rejects_bad_shapes() {
        assert!(normalize_email("jane").is_none());
        assert!(normalize_email("jane@example").is_none());
        assert!(normalize_email("jane doe@example.com").is_none());
        assert!(normalize_email("").is_none());
    }

    #[test]
    fn test_input_accepts_legacy_field_names() {
        let input: CustomerInput = serde_json::from_str(
            r#"{"firstName":"A","lastName":"B","email":"a@b.co","PhoneNumber":"555","Address":"1 Main St"}"#,
        )
        .unwrap();
        assert_eq!(input.phone.as_deref(), Some("555"));
        assert_eq!(input.address.as_deref(), Some("1 Main St"));
    }
}
