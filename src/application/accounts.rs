//! Account management: signup with salted digests, constant-time login
//! verification.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::application::forms::{
    FieldErrors, LoginInput, SignupInput, validate_login, validate_signup,
};
use crate::application::repos::{CreateUserParams, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username already taken")]
    UsernameTaken,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("invalid form input")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub struct AccountService {
    users: Arc<dyn UsersRepo>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }

    pub async fn signup(&self, input: SignupInput) -> Result<UserRecord, AccountError> {
        validate_signup(&input).map_err(AccountError::Invalid)?;
        if self
            .users
            .find_user_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AccountError::UsernameTaken);
        }
        let salt = Uuid::new_v4().simple().to_string();
        let digest = password_digest(&salt, &input.password);
        let created = self
            .users
            .create_user(CreateUserParams {
                username: input.username,
                password_digest: digest,
                password_salt: salt,
            })
            .await;
        match created {
            Ok(user) => Ok(user),
            // Concurrent signup with the same name loses the race at the
            // unique index.
            Err(RepoError::Duplicate { .. }) => Err(AccountError::UsernameTaken),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn login(&self, input: LoginInput) -> Result<UserRecord, AccountError> {
        validate_login(&input).map_err(AccountError::Invalid)?;
        let user = self
            .users
            .find_user_by_username(&input.username)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;
        let presented = password_digest(&user.password_salt, &input.password);
        if verify_digest(&presented, &user.password_digest) {
            Ok(user)
        } else {
            Err(AccountError::InvalidCredentials)
        }
    }
}

pub fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn verify_digest(presented: &str, stored: &str) -> bool {
    presented.as_bytes().ct_eq(stored.as_bytes()).into()
}
