//! Field validation helpers
//!
//! Regex-backed validators shared by registration and student intake.

use regex::Regex;

/// Email addresses of staff accounts must belong to the institution.
pub const INSTITUTION_EMAIL_SUFFIX: &str = "@krmu.edu.in";

fn email_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn alphabetic_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z]+$").unwrap())
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{10}$").unwrap())
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

pub fn is_institution_email(email: &str) -> bool {
    email.ends_with(INSTITUTION_EMAIL_SUFFIX)
}

/// Letters only, no spaces or digits (usernames and person names).
pub fn is_alphabetic(value: &str) -> bool {
    alphabetic_pattern().is_match(value)
}

/// Exactly 10 digits.
pub fn is_valid_phone(value: &str) -> bool {
    phone_pattern().is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("counsellor@krmu.edu.in"));
        assert!(is_valid_email("someone@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("spaces in@mail.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn test_institution_suffix() {
        assert!(is_institution_email("staff@krmu.edu.in"));
        assert!(!is_institution_email("staff@gmail.com"));
        assert!(!is_institution_email("staff@krmu.edu.in.evil.com"));
    }

    #[test]
    fn test_alphabetic() {
        assert!(is_alphabetic("Priya"));
        assert!(!is_alphabetic("Priya Sharma"));
        assert!(!is_alphabetic("priya1"));
        assert!(!is_alphabetic(""));
    }

    #[test]
    fn test_phone() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("98765"));
        assert!(!is_valid_phone("98765432101"));
        assert!(!is_valid_phone("98765abc10"));
    }
}
