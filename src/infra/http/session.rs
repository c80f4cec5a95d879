//! Signed-cookie sessions and the auth flows. Handlers that need a signed-in
//! user take [`SessionUser`] as an extractor; its rejection is a redirect to
//! the login page, never an error status.

use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::accounts::AccountError;
use crate::application::error::HttpError;
use crate::application::forms::{LoginInput, SignupInput};
use crate::infra::http::HttpState;
use crate::presentation::views::{
    AuthFormContext, FieldErrorView, LayoutContext, LoginTemplate, SignupTemplate, ViewerView,
    build_field_errors, render_template_response,
};

pub const SESSION_COOKIE: &str = "foglio_session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}

impl SessionUser {
    pub fn viewer(&self) -> ViewerView {
        ViewerView {
            username: self.username.clone(),
        }
    }
}

/// Session extraction that tolerates anonymous requests.
pub struct OptionalSession(pub Option<SessionUser>);

pub fn session_cookie(user: &SessionUser) -> Cookie<'static> {
    let value = serde_json::to_string(user).unwrap_or_default();
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookie
}

async fn session_from_parts<S>(parts: &mut Parts, state: &S) -> Option<SessionUser>
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    let jar = match SignedCookieJar::<Key>::from_request_parts(parts, state).await {
        Ok(jar) => jar,
        Err(err) => match err {},
    };
    let cookie = jar.get(SESSION_COOKIE)?;
    serde_json::from_str(cookie.value()).ok()
}

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        session_from_parts(parts, state)
            .await
            .ok_or_else(|| Redirect::to("/auth/login"))
    }
}

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalSession(session_from_parts(parts, state).await))
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn signup_page(username: String, errors: Vec<FieldErrorView>, status: StatusCode) -> Response {
    let view = LayoutContext::new(None, AuthFormContext { username, errors });
    render_template_response(SignupTemplate { view }, status)
}

fn login_page(username: String, errors: Vec<FieldErrorView>, status: StatusCode) -> Response {
    let view = LayoutContext::new(None, AuthFormContext { username, errors });
    render_template_response(LoginTemplate { view }, status)
}

fn form_error(field: &str, message: &str) -> FieldErrorView {
    FieldErrorView {
        field: field.to_string(),
        message: message.to_string(),
    }
}

pub async fn signup_form() -> Response {
    signup_page(String::new(), Vec::new(), StatusCode::OK)
}

pub async fn signup_submit(
    State(state): State<HttpState>,
    jar: SignedCookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, HttpError> {
    let username = form.username.trim().to_string();
    let input = SignupInput {
        username: username.clone(),
        password: form.password,
        password_confirm: form.password_confirm,
    };
    match state.accounts.signup(input).await {
        Ok(user) => {
            let session = SessionUser {
                id: user.id,
                username: user.username,
            };
            let jar = jar.add(session_cookie(&session));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(AccountError::Invalid(errors)) => {
            Ok(signup_page(username, build_field_errors(&errors), StatusCode::OK))
        }
        Err(AccountError::UsernameTaken) => Ok(signup_page(
            username,
            vec![form_error("username", "This username is already taken")],
            StatusCode::OK,
        )),
        Err(AccountError::InvalidCredentials) => Ok(signup_page(
            username,
            vec![form_error("username", "Invalid input")],
            StatusCode::OK,
        )),
        Err(AccountError::Repo(err)) => Err(HttpError::from_repo(
            "infra::http::session::signup_submit",
            err,
        )),
    }
}

pub async fn login_form() -> Response {
    login_page(String::new(), Vec::new(), StatusCode::OK)
}

pub async fn login_submit(
    State(state): State<HttpState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, HttpError> {
    let username = form.username.trim().to_string();
    let input = LoginInput {
        username: username.clone(),
        password: form.password,
    };
    match state.accounts.login(input).await {
        Ok(user) => {
            let session = SessionUser {
                id: user.id,
                username: user.username,
            };
            let jar = jar.add(session_cookie(&session));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(AccountError::Invalid(errors)) => {
            Ok(login_page(username, build_field_errors(&errors), StatusCode::OK))
        }
        Err(AccountError::InvalidCredentials) | Err(AccountError::UsernameTaken) => Ok(login_page(
            username,
            vec![form_error("username", "Invalid username or password")],
            StatusCode::OK,
        )),
        Err(AccountError::Repo(err)) => Err(HttpError::from_repo(
            "infra::http::session::login_submit",
            err,
        )),
    }
}

pub async fn logout(jar: SignedCookieJar) -> Response {
    let jar = jar.remove(removal_cookie());
    (jar, Redirect::to("/")).into_response()
}
