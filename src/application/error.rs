//! HTTP-facing error types. Handlers convert layer errors into an
//! [`HttpError`]; the response-logging middleware reads back the attached
//! [`ErrorReport`] for structured diagnostics.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::application::repos::RepoError;
use crate::config::LoadError;
use crate::infra::error::InfraError;

/// Top-level startup/runtime error reported by `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error")]
    Config(#[from] LoadError),

    #[error("infrastructure error")]
    Infra(#[from] InfraError),

    #[error("domain error")]
    Domain(#[from] crate::domain::error::DomainError),

    #[error("repository error")]
    Repo(#[from] RepoError),
}

impl AppError {
    /// Full cause chain, outermost first.
    pub fn chain(&self) -> Vec<String> {
        collect_chain(self)
    }
}

/// Diagnostic payload attached to error responses via extensions, consumed
/// by `infra::http::middleware::log_responses`.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_message(source: &'static str, status: StatusCode, message: &str) -> Self {
        Self {
            source,
            status,
            messages: vec![message.to_string()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// An error ready to leave the HTTP layer: a client-safe message plus the
/// internal cause chain for logging.
#[derive(Debug)]
pub struct HttpError {
    pub source: &'static str,
    pub status: StatusCode,
    pub public_message: String,
    pub messages: Vec<String>,
}

impl HttpError {
    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &(dyn std::error::Error + 'static),
    ) -> Self {
        Self {
            source,
            status,
            public_message: public_message.to_string(),
            messages: collect_chain(error),
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        public_message: impl Into<String>,
    ) -> Self {
        let public_message = public_message.into();
        Self {
            source,
            status,
            messages: vec![public_message.clone()],
            public_message,
        }
    }

    pub fn from_repo(source: &'static str, err: RepoError) -> Self {
        let status = match err {
            RepoError::NotFound => StatusCode::NOT_FOUND,
            RepoError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            RepoError::Duplicate { .. } => StatusCode::CONFLICT,
            RepoError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::from_error(source, status, "The request could not be completed", &err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let report = ErrorReport {
            source: self.source,
            status: self.status,
            messages: self.messages,
        };
        let mut response = (self.status, self.public_message).into_response();
        report.attach(&mut response);
        response
    }
}

fn collect_chain(error: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(cause) = current {
        messages.push(cause.to_string());
        current = cause.source();
    }
    messages
}
