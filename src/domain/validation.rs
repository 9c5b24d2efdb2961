use thiserror::Error;

use super::{Cents, MINIMUM_BALANCE, display_cents, format_cents};

/// Characters that satisfy the "special character" password rule.
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must be 2-50 letters or spaces")]
    InvalidName,

    #[error("phone number must be exactly 10 digits")]
    InvalidPhone,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("city must not be empty")]
    EmptyCity,

    #[error("password must be at least 8 characters")]
    PasswordTooShort,

    #[error("password needs an uppercase letter")]
    PasswordMissingUppercase,

    #[error("password needs a lowercase letter")]
    PasswordMissingLowercase,

    #[error("password needs a digit")]
    PasswordMissingDigit,

    #[error("password needs one of {}", PASSWORD_SPECIALS)]
    PasswordMissingSpecial,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("amount must be positive, got {}", display_cents(.0))]
    NonPositiveAmount(Cents),

    #[error("opening deposit of {} is below the minimum of {}", display_cents(.0), format_cents(MINIMUM_BALANCE))]
    BelowMinimumOpening(Cents),

    #[error("amount would overflow the balance")]
    AmountOverflow,
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if !(2..=50).contains(&len) || !name.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        return Err(ValidationError::InvalidName);
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() != 10 || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(())
}

pub fn validate_city(city: &str) -> Result<(), ValidationError> {
    if city.trim().is_empty() {
        return Err(ValidationError::EmptyCity);
    }
    Ok(())
}

/// Accepts `local@domain.tld` where the final domain label is at least two letters.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    if !local_ok {
        return Err(invalid());
    }

    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());
    if !host_ok || !tld_ok {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(ValidationError::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::PasswordMissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::PasswordMissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Err(ValidationError::PasswordMissingSpecial);
    }
    Ok(())
}
