use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Confirm your password"))]
    pub confirm_password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// ----------------- Post Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone, Default, Validate)]
pub struct PostRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Blog post title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Subtitle is required"))]
    pub subtitle: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Blog content is required"))]
    pub body: String,
    #[serde(default)]
    #[validate(url(message = "Blog image URL must be a valid URL"))]
    pub img_url: String,
}

// ----------------- Comment Request -----------------
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct CommentRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Comment cannot be empty"))]
    pub comment: String,
}

// ----------------- Contact Request -----------------
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

impl ContactRequest {
    /// The mail body sent to the site owner, with every non-ASCII character removed.
    pub fn to_message(&self) -> String {
        let message = format!(
            "Name: {}\nEmail: {}\nPhone Number: {}\nMessage: {}",
            self.name, self.email, self.phone, self.message
        );
        strip_non_ascii(&message)
    }
}

/// Emails are stored and compared trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn strip_non_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

/// Flattens validator output into sorted, human readable messages.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages
}
