//! Client-side validation for the dashboard forms.
//!
//! These checks run before a request is sent so obvious mistakes are
//! reported without a round trip. The backend validates again.

use thiserror::Error;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Telegram's limit on a single message
pub const MAX_BROADCAST_LENGTH: usize = 4096;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Message is required")]
    EmptyMessage,

    #[error("Message must be at most {} characters", MAX_BROADCAST_LENGTH)]
    MessageTooLong,

    #[error("Bot token is required")]
    MissingBotToken,

    #[error("Bot token should look like 123456789:ABC-DEF...")]
    MalformedBotToken,
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

/// Registration form: the password is typed twice
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_login(&self.email, &self.password)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(())
    }
}

/// Check a broadcast message and return it trimmed
pub fn validate_broadcast(message: &str) -> Result<&str, ValidationError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    if message.chars().count() > MAX_BROADCAST_LENGTH {
        return Err(ValidationError::MessageTooLong);
    }
    Ok(message)
}

/// Check the shape of a token issued by @BotFather: `<bot id>:<secret>`
pub fn validate_bot_token(token: &str) -> Result<&str, ValidationError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ValidationError::MissingBotToken);
    }
    match token.split_once(':') {
        Some((id, secret))
            if !id.is_empty()
                && id.chars().all(|c| c.is_ascii_digit())
                && !secret.is_empty()
                && !secret.chars().any(char::is_whitespace) =>
        {
            Ok(token)
        }
        _ => Err(ValidationError::MalformedBotToken),
    }
}
