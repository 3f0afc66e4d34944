//! Input validation utilities
//!
//! Password-policy failures are collected and reported together, not
//! first-failure-only: policy errors carry no enumeration risk, so the
//! client gets the full list in one round trip. Authentication failures,
//! by contrast, stay deliberately vague (see the error module).

use regex::Regex;
use std::sync::OnceLock;

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password strength, returning every failed rule
pub fn validate_password(password: &str) -> Result<(), Vec<String>> {
    let mut failures = Vec::new();

    if password.is_empty() {
        failures.push("Password is required".to_string());
    }

    if password.len() < 8 {
        failures.push("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        failures.push("Password must be at most 128 characters long".to_string());
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if !c.is_alphanumeric() {
            has_special = true;
        }
    }

    if !has_upper {
        failures.push("Password must contain at least one uppercase letter".to_string());
    }

    if !has_lower {
        failures.push("Password must contain at least one lowercase letter".to_string());
    }

    if !has_digit {
        failures.push("Password must contain at least one digit".to_string());
    }

    if !has_special {
        failures.push("Password must contain at least one special character".to_string());
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(validate_password("Str0ng-enough").is_ok());
    }

    #[test]
    fn test_all_failed_rules_are_listed() {
        let failures = validate_password("abc").unwrap_err();

        assert!(failures.iter().any(|f| f.contains("at least 8 characters")));
        assert!(failures.iter().any(|f| f.contains("uppercase")));
        assert!(failures.iter().any(|f| f.contains("digit")));
        assert!(failures.iter().any(|f| f.contains("special character")));
        assert_eq!(failures.len(), 4);
    }

    #[test]
    fn test_single_missing_class_reported_alone() {
        let failures = validate_password("longenough1!").unwrap_err();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("uppercase"));
    }

    #[test]
    fn test_empty_password() {
        let failures = validate_password("").unwrap_err();
        assert!(failures.iter().any(|f| f.contains("required")));
    }

    #[test]
    fn test_overlong_password() {
        let long = format!("Aa1!{}", "x".repeat(130));
        let failures = validate_password(&long).unwrap_err();
        assert!(failures.iter().any(|f| f.contains("at most 128")));
    }

    #[test]
    fn test_valid_email() {
        assert!(validate_email("alice@example.com").is_ok());
    }

    #[test]
    fn test_invalid_email() {
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
    }
}
