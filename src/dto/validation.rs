//! Validation helpers for DTOs.

use validator::ValidationError;

/// Shortest accepted username.
pub const USERNAME_MIN_LEN: usize = 3;
/// Longest accepted username.
pub const USERNAME_MAX_LEN: usize = 32;

/// Validates that a username is 3 to 32 ASCII letters, digits, `_` or `-`.
///
/// # Examples
///
/// ```ignore
/// validate_username("alice_01") // Ok
/// validate_username("al")       // Err - too short
/// validate_username("al ice")   // Err - space
/// ```
pub fn validate_username<S: AsRef<str> + ?Sized>(username: &S) -> Result<(), ValidationError> {
    let username = username.as_ref();
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!(
                "Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters (got {len})"
            )
            .into(),
        );
        return Err(err);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        let mut err = ValidationError::new("username_format");
        err.message =
            Some("Username may only contain ASCII letters, digits, '_' and '-'".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob-42").is_ok());
        assert!(validate_username("x_y").is_ok());
    }

    #[test]
    fn test_validate_username_invalid_length() {
        assert!(validate_username("al").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_validate_username_invalid_format() {
        assert!(validate_username("al ice").is_err());
        assert!(validate_username("alice!").is_err());
        assert!(validate_username("élise").is_err());
    }
}
