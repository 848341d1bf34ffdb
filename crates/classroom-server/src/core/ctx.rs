use crate::core::error::Error;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const USER_HEADER: &str = "x-user";

/// Who is making the request, as established by the session layer in front
/// of this server. Anonymous when the `x-user` header is absent.
#[derive(Clone, Debug, Default)]
pub struct Ctx {
    username: Option<String>,
}

impl Ctx {
    pub fn new(username: String) -> Self {
        Self {
            username: Some(username),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self { username })
    }
}
