//! Caller identity.
//!
//! Authentication itself lives outside this service. An [`IdentityProvider`]
//! turns request headers into a [`User`]; handlers take an [`AuthUser`] and
//! never see unauthenticated requests.

use crate::error::{Error, Result};
use crate::model::User;
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use std::collections::HashMap;
use std::sync::Arc;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_IMAGE_HEADER: &str = "x-user-image";

/// Resolves the calling user from request headers.
pub trait IdentityProvider: Send + Sync {
    /// `None` when the request carries no usable identity.
    fn identify(&self, headers: &HeaderMap) -> Option<User>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Shared handle stored in the router state.
pub type SharedIdentity = Arc<dyn IdentityProvider>;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Trusts identity headers set by an authenticating proxy in front of the
/// service.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderIdentity;

impl IdentityProvider for HeaderIdentity {
    fn identify(&self, headers: &HeaderMap) -> Option<User> {
        let id = header_str(headers, USER_ID_HEADER)?;
        Some(User {
            id: id.to_string(),
            name: header_str(headers, USER_NAME_HEADER).map(str::to_string),
            email: header_str(headers, USER_EMAIL_HEADER).map(str::to_string),
            image: header_str(headers, USER_IMAGE_HEADER).map(str::to_string),
        })
    }

    fn name(&self) -> &'static str {
        "header"
    }
}

/// Fixed bearer tokens mapped to users, for local development.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIdentity {
    tokens: HashMap<String, User>,
}

impl StaticTokenIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(mut self, token: &str, user: User) -> Self {
        self.tokens.insert(token.to_string(), user);
        self
    }

    /// Parse `token=user_id` pairs separated by commas.
    ///
    /// # Errors
    ///
    /// Returns `Config` for pairs missing either half.
    pub fn parse(pairs: &str) -> Result<Self> {
        let mut identity = Self::new();
        for pair in pairs.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (token, user_id) = pair
                .split_once('=')
                .map(|(t, u)| (t.trim(), u.trim()))
                .filter(|(t, u)| !t.is_empty() && !u.is_empty())
                .ok_or_else(|| Error::Config(format!("invalid token entry '{pair}'")))?;
            identity = identity.with_token(token, User::new(user_id));
        }
        Ok(identity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl IdentityProvider for StaticTokenIdentity {
    fn identify(&self, headers: &HeaderMap) -> Option<User> {
        let value = header_str(headers, axum::http::header::AUTHORIZATION.as_str())?;
        let token = value.strip_prefix("Bearer ")?.trim();
        self.tokens.get(token).cloned()
    }

    fn name(&self) -> &'static str {
        "token"
    }
}

/// Extractor for the authenticated caller. Rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    SharedIdentity: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let identity = SharedIdentity::from_ref(state);
        identity
            .identify(&parts.headers)
            .map(AuthUser)
            .ok_or(Error::Unauthenticated)
    }
}
