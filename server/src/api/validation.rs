//! Input rules shared by the account and comment endpoints.
//!
//! Every check returns the first violated rule as a user-facing message.
//! Lengths are counted in characters, after trimming.

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_COMMENT_LEN: usize = 1000;

pub type Validation<T> = Result<T, String>;

/// Trimmed value of a required text field no longer than `max`.
pub fn required_text<'a>(field: &str, value: &'a str, max: usize) -> Validation<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("The {} field is required.", field));
    }
    if value.chars().count() > max {
        return Err(format!(
            "The {} may not be greater than {} characters.",
            field, max
        ));
    }
    Ok(value)
}

/// Lowercased, trimmed email address.
pub fn email(value: &str) -> Validation<String> {
    let value = required_text("email", value, MAX_EMAIL_LEN)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err("The email must be a valid email address.".to_string());
    }
    Ok(value.to_lowercase())
}

/// A new password and its confirmation.
pub fn new_password(password: &str, confirmation: &str) -> Validation<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "The password must be at least {} characters.",
            MIN_PASSWORD_LEN
        ));
    }
    if password != confirmation {
        return Err("The password confirmation does not match.".to_string());
    }
    Ok(())
}

pub fn comment_body(body: &str) -> Validation<&str> {
    required_text("comment", body, MAX_COMMENT_LEN)
}
