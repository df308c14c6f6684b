#![cfg_attr(test, allow(unused_crate_dependencies))]

//! Resolution of the caller's claims before translation. Providers never fail a request: a
//! missing or invalid token makes the caller anonymous, and authorization rules decide what an
//! anonymous caller may see.

mod claims;
mod jwt;

use futures_util::future::BoxFuture;
use graphql_cypher_config::AuthenticationConfig;

pub use claims::Claims;
pub use jwt::JwtProvider;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Could not read the public key at {path}: {message}")]
    PublicKey { path: String, message: String },
    #[error("Invalid JWT configuration: {0}")]
    Config(String),
}

pub trait ClaimsProvider: Send + Sync {
    /// `None` for anonymous callers.
    fn claims<'a>(&'a self, headers: &'a http::HeaderMap) -> BoxFuture<'a, Option<Claims>>;
}

/// Every caller is anonymous.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousProvider;

impl ClaimsProvider for AnonymousProvider {
    fn claims<'a>(&'a self, _headers: &'a http::HeaderMap) -> BoxFuture<'a, Option<Claims>> {
        Box::pin(async { None })
    }
}

pub fn build(config: &AuthenticationConfig) -> Result<Box<dyn ClaimsProvider>, AuthError> {
    match &config.jwt {
        Some(jwt) => Ok(Box::new(JwtProvider::new(jwt)?)),
        None => Ok(Box::new(AnonymousProvider)),
    }
}
