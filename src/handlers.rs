//! Route handlers for the login flow.
//!
//! Handlers only ever touch the `username` field of the session attached to
//! the request; loading, persisting and destroying records is left to
//! [`SessionManagerLayer`](tower_sessions::SessionManagerLayer).

use axum::{
    extract::rejection::FormRejection,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::AppError;

/// Session key holding the logged-in user's name.
pub const USERNAME_KEY: &str = "username";

/// Body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
}

/// The logged-in user, if any. An empty name counts as logged out.
async fn current_user(session: &Session) -> Result<Option<String>, AppError> {
    Ok(session
        .get::<String>(USERNAME_KEY)
        .await?
        .filter(|name| !name.is_empty()))
}

fn redirect_home() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

/// `GET /`
pub async fn home(session: Session) -> Result<Html<String>, AppError> {
    let body = match current_user(&session).await? {
        Some(name) => format!(
            "You are logged in as: {}<br /><a href='/logout'>Logout here</a>",
            escape_html(&name)
        ),
        None => "You are not logged in<br /><a href='/login'>Login Here</a>".to_string(),
    };
    Ok(Html(body))
}

/// `GET /login`
pub async fn login_form(session: Session) -> Result<Response, AppError> {
    if current_user(&session).await?.is_some() {
        return Ok("You are already logged in!".into_response());
    }

    Ok(Html(concat!(
        "<form method='POST' action='/login'>",
        "<input name='username' type='text' placeholder='Enter your username' />",
        "<button type='submit'>Login</button>",
        "</form>",
    ))
    .into_response())
}

/// `POST /login`
///
/// A missing or empty `username` is rejected with a bare `400 Bad Request`
/// and the session is left untouched. Bodies the form extractor refuses
/// (wrong content type, repeated fields) count as missing.
pub async fn login(
    session: Session,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, AppError> {
    let username = match form {
        Ok(Form(form)) => form.username,
        Err(rejection) => {
            tracing::debug!(%rejection, "unusable login form");
            None
        }
    };
    let Some(username) = username.filter(|name| !name.is_empty()) else {
        return Ok(StatusCode::BAD_REQUEST.into_response());
    };

    // New id on privilege change, so a planted cookie cannot ride along.
    session.cycle_id().await?;
    session.insert(USERNAME_KEY, &username).await?;
    tracing::debug!(%username, "logged in");

    Ok(redirect_home())
}

/// `GET /logout`
///
/// The record is destroyed before the redirect is returned, so the response
/// is only finalized once the store has dropped the session.
pub async fn logout(session: Session) -> Result<Response, AppError> {
    if let Some(username) = current_user(&session).await? {
        session.flush().await?;
        tracing::debug!(%username, "logged out");
    }

    Ok(redirect_home())
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href='x'>"&"</a>"#),
            "&lt;a href=&#39;x&#39;&gt;&quot;&amp;&quot;&lt;/a&gt;"
        );
    }

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(escape_html("alice"), "alice");
    }
}
