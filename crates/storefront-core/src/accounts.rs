use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

/// Postal address stored alongside a user or an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

/// Canonical form used for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// # Errors
///
/// Returns [`CoreError::InvalidAccount`] describing the first failed rule.
pub fn validate_signup(name: &str, email: &str, password: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::InvalidAccount("Please provide a name".to_string()));
    }
    if !email.contains('@') {
        return Err(CoreError::InvalidAccount(
            "Please provide a valid email".to_string(),
        ));
    }
    validate_password(password)
}

/// # Errors
///
/// Returns [`CoreError::InvalidAccount`] when the password is too short.
pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::InvalidAccount(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_exact_names() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }

    #[test]
    fn signup_rules() {
        assert!(validate_signup("Jane", "jane@example.com", "secret").is_ok());
        assert!(validate_signup(" ", "jane@example.com", "secret").is_err());
        assert!(validate_signup("Jane", "jane.example.com", "secret").is_err());
        let err = validate_signup("Jane", "jane@example.com", "12345").unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
    }

    #[test]
    fn address_fields_are_optional() {
        let addr: Address = serde_json::from_str(r#"{"city":"Leeds"}"#).unwrap();
        assert_eq!(addr.city.as_deref(), Some("Leeds"));
        assert!(addr.street.is_none());
    }
}
