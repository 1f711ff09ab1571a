//! Domain-specific field checks.
//!
//! Each returns the human-readable message of the first failed condition.

use phonenumber::country;

use crate::domain::user::models::RoleKind;

pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// Length, then uppercase, lowercase, digit and special character.
pub fn check_password_complexity(password: &str) -> Result<(), String> {
    let (mut upper, mut lower, mut digit, mut special) = (false, false, false, false);
    for c in password.chars() {
        if c.is_uppercase() {
            upper = true;
        } else if c.is_lowercase() {
            lower = true;
        } else if c.is_ascii_digit() {
            digit = true;
        } else if SPECIAL_CHARACTERS.contains(c) {
            special = true;
        }
    }

    let failure = if password.chars().count() < MIN_PASSWORD_LENGTH {
        Some("Password must be at least 8 characters long")
    } else if !upper {
        Some("Password must contain at least one uppercase letter")
    } else if !lower {
        Some("Password must contain at least one lowercase letter")
    } else if !digit {
        Some("Password must contain at least one number")
    } else if !special {
        Some("Password must contain at least one special character")
    } else {
        None
    };

    failure.map_or(Ok(()), |message| Err(message.to_string()))
}

/// Phone number must parse under the region's dialing rules, be valid, and
/// belong to that same region.
pub fn check_phone(phone: &str, region: &str) -> Result<(), String> {
    if phone.is_empty() || region.trim().is_empty() {
        return Err("Phone number and country code are required".to_string());
    }

    let region = region.trim().to_ascii_uppercase();
    let expected = region.parse::<country::Id>().ok();

    let number = phonenumber::parse(expected, phone)
        .map_err(|e| format!("Invalid phone number format: {}", e))?;

    if !phonenumber::is_valid(&number) {
        return Err("Phone number is not valid for the specified country".to_string());
    }

    if expected.is_none() || number.country().id() != expected {
        return Err(
            "Phone number country code does not match the specified country".to_string(),
        );
    }

    Ok(())
}

pub fn check_year(year: &str) -> Result<(), String> {
    let year: i32 = year
        .trim()
        .parse()
        .map_err(|_| "Year must be a number".to_string())?;

    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err("Year must be between 1900 and 2100".to_string());
    }
    Ok(())
}

/// Drop repeated interests, keeping the first occurrence and the order.
pub fn dedupe_interests(interests: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(interests.len());
    for interest in interests {
        if !unique.contains(&interest) {
            unique.push(interest);
        }
    }
    unique
}

/// Every interest must be 2 to 50 characters; one bad entry fails the list.
pub fn check_interests(interests: &[String]) -> Result<(), String> {
    if interests.iter().all(|i| has_length(i, 2, 50)) {
        Ok(())
    } else {
        Err("An interest should be between 2 & 50 character".to_string())
    }
}

/// Blank defaults to student.
pub fn check_role(role: &str) -> Result<RoleKind, String> {
    let role = role.trim();
    if role.is_empty() {
        return Ok(RoleKind::default());
    }
    role.to_ascii_lowercase()
        .parse()
        .map_err(|_| "Invalid role specified".to_string())
}

/// Inclusive character-count bounds.
pub fn has_length(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}
