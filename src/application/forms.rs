//! Explicit form validation. Every mutating handler validates first and
//! re-renders with field errors on failure; nothing is written on an
//! invalid form.

use url::Url;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const POST_TEXT_MAX_LEN: usize = 10_000;
pub const COMMENT_TEXT_MAX_LEN: usize = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

pub type FieldErrors = Vec<FieldError>;

fn field_error(field: &'static str, message: impl Into<String>) -> FieldError {
    FieldError {
        field,
        message: message.into(),
    }
}

/// Raw post form input; empty strings from the form are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub text: String,
    pub group: Option<String>,
    pub image_url: Option<String>,
}

impl PostInput {
    pub fn normalized(self) -> Self {
        Self {
            text: self.text.trim().to_string(),
            group: self.group.filter(|s| !s.trim().is_empty()),
            image_url: self
                .image_url
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

pub fn validate_post_input(input: &PostInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if input.text.is_empty() {
        errors.push(field_error("text", "Post text must not be empty"));
    } else if input.text.chars().count() > POST_TEXT_MAX_LEN {
        errors.push(field_error("text", "Post text is too long"));
    }
    if let Some(image_url) = &input.image_url {
        let valid = Url::parse(image_url)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            errors.push(field_error("image_url", "Image URL must be an http(s) URL"));
        }
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_comment_input(text: &str) -> Result<(), FieldErrors> {
    let trimmed = text.trim();
    let mut errors = FieldErrors::new();
    if trimmed.is_empty() {
        errors.push(field_error("text", "Comment text must not be empty"));
    } else if trimmed.chars().count() > COMMENT_TEXT_MAX_LEN {
        errors.push(field_error("text", "Comment text is too long"));
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_username(username: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN || len > USERNAME_MAX_LEN {
        errors.push(field_error(
            "username",
            format!("Username must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters"),
        ));
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        errors.push(field_error(
            "username",
            "Username may contain letters, digits, '_', '.' and '-'",
        ));
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[derive(Debug, Clone, Default)]
pub struct SignupInput {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

pub fn validate_signup(input: &SignupInput) -> Result<(), FieldErrors> {
    let mut errors = validate_username(&input.username).err().unwrap_or_default();
    if input.password.chars().count() < PASSWORD_MIN_LEN {
        errors.push(field_error(
            "password",
            format!("Password must be at least {PASSWORD_MIN_LEN} characters"),
        ));
    }
    if input.password != input.password_confirm {
        errors.push(field_error("password_confirm", "Passwords do not match"));
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

pub fn validate_login(input: &LoginInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if input.username.is_empty() {
        errors.push(field_error("username", "Username is required"));
    }
    if input.password.is_empty() {
        errors.push(field_error("password", "Password is required"));
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
