use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("cannot derive a slug from {value:?}")]
    UnsluggableTitle { value: String },

    #[error("invalid username {value:?}: {reason}")]
    InvalidUsername { value: String, reason: &'static str },
}
