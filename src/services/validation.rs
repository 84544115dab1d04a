//! Field-level input checks shared by services.

use crate::models::FieldError;

pub const USERNAME_MAX_LENGTH: usize = 50;
pub const NAME_MAX_LENGTH: usize = 100;
pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const IMAGE_URL_MAX_LENGTH: usize = 2048;

/// Accumulates field errors so a caller sees every problem at once.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// `Ok(())` when nothing was recorded.
    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() { Ok(()) } else { Err(self.0) }
    }
}

pub fn check_username(errors: &mut FieldErrors, username: &str) {
    let len = username.chars().count();
    if len == 0 {
        errors.push("username", "Username is required");
    } else if len > USERNAME_MAX_LENGTH {
        errors.push(
            "username",
            format!("Username must be at most {USERNAME_MAX_LENGTH} characters"),
        );
    } else if username.chars().any(char::is_whitespace) {
        errors.push("username", "Username cannot contain whitespace");
    }
}

pub fn check_name(errors: &mut FieldErrors, name: &str) {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.push("name", "Name is required");
    } else if trimmed.chars().count() > NAME_MAX_LENGTH {
        errors.push(
            "name",
            format!("Name must be at most {NAME_MAX_LENGTH} characters"),
        );
    }
}

pub fn check_password(errors: &mut FieldErrors, password: &str, confirm_password: &str) {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.push(
            "password",
            format!("Password must be at least {PASSWORD_MIN_LENGTH} characters"),
        );
    }

    if password != confirm_password {
        errors.push("confirm_password", "Passwords do not match");
    }
}

pub fn check_image_url(errors: &mut FieldErrors, image_url: &str) {
    let image_url = image_url.trim();
    if image_url.is_empty() {
        errors.push("image_url", "Image URL cannot be empty");
    } else if image_url.len() > IMAGE_URL_MAX_LENGTH {
        errors.push("image_url", "Image URL is too long");
    } else if !(image_url.starts_with('/')
        || image_url.starts_with("http://")
        || image_url.starts_with("https://"))
    {
        errors.push(
            "image_url",
            "Image URL must be an absolute path or an http(s) URL",
        );
    }
}

/// Content bodies: non-blank after trimming, at most `max_length` characters.
pub fn check_body(errors: &mut FieldErrors, body: &str, max_length: usize) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        errors.push("body", "Body cannot be empty");
    } else if trimmed.chars().count() > max_length {
        errors.push(
            "body",
            format!("Body must be at most {max_length} characters"),
        );
    }
}

/// Validates a body and returns it trimmed.
pub fn body(body: &str, max_length: usize) -> Result<String, Vec<FieldError>> {
    let mut errors = FieldErrors::new();
    check_body(&mut errors, body, max_length);
    errors.finish()?;
    Ok(body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(f: impl FnOnce(&mut FieldErrors)) -> Vec<FieldError> {
        let mut errors = FieldErrors::new();
        f(&mut errors);
        errors.finish().err().unwrap_or_default()
    }

    #[test]
    fn test_username_bounds() {
        assert!(collect(|e| check_username(e, "alice")).is_empty());
        assert!(collect(|e| check_username(e, &"a".repeat(50))).is_empty());
        assert_eq!(collect(|e| check_username(e, "")).len(), 1);
        assert_eq!(collect(|e| check_username(e, &"a".repeat(51))).len(), 1);
        assert_eq!(collect(|e| check_username(e, "al ice")).len(), 1);
    }

    #[test]
    fn test_password_reports_each_field() {
        let errors = collect(|e| check_password(e, "abc", "abd"));
        let fields: Vec<_> = errors.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["password", "confirm_password"]);

        assert!(collect(|e| check_password(e, "secret", "secret")).is_empty());
    }

    #[test]
    fn test_body_is_trimmed_and_bounded() {
        assert_eq!(body("  hello  ", 10).unwrap(), "hello");
        assert!(body("   ", 10).is_err());
        assert!(body(&"x".repeat(11), 10).is_err());
        // Limits count characters, not bytes.
        assert!(body(&"é".repeat(10), 10).is_ok());
    }

    #[test]
    fn test_image_url() {
        assert!(collect(|e| check_image_url(e, "/user.svg")).is_empty());
        assert!(collect(|e| check_image_url(e, "https://cdn.example/a.png")).is_empty());
        assert_eq!(collect(|e| check_image_url(e, "javascript:alert(1)")).len(), 1);
    }
}
