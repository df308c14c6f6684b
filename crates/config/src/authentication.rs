use std::path::PathBuf;

use crate::ConfigError;

#[derive(Default, Debug, PartialEq, serde::Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct AuthenticationConfig {
    /// Callers are anonymous when not set.
    pub jwt: Option<JwtConfig>,
}

impl AuthenticationConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let Some(jwt) = &self.jwt else {
            return Ok(());
        };

        match (jwt.algorithm, &jwt.secret, &jwt.public_key_path) {
            (JwtAlgorithm::HS256, Some(_), None) | (JwtAlgorithm::RS256, None, Some(_)) => Ok(()),
            (JwtAlgorithm::HS256, _, _) => Err(ConfigError::Invalid(
                "authentication.jwt with HS256 requires `secret` and no `public_key_path`".into(),
            )),
            (JwtAlgorithm::RS256, _, _) => Err(ConfigError::Invalid(
                "authentication.jwt with RS256 requires `public_key_path` and no `secret`".into(),
            )),
        }
    }
}

#[derive(Debug, PartialEq, Eq, serde::Deserialize, Clone, Copy, Default)]
pub enum JwtAlgorithm {
    #[default]
    HS256,
    RS256,
}

/// Verification of bearer tokens carrying the claims.
#[derive(Debug, PartialEq, serde::Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct JwtConfig {
    #[serde(default)]
    pub algorithm: JwtAlgorithm,
    /// Shared secret of HS256 tokens.
    pub secret: Option<String>,
    /// PEM encoded public key of RS256 tokens.
    pub public_key_path: Option<PathBuf>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// The header from which to look for the token
    #[serde(default)]
    pub header: AuthenticationHeader,
}

#[derive(Debug, PartialEq, serde::Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationHeader {
    /// The name of the header the token is sent from
    pub name: String,
    /// The prefix of the header value, typically `Bearer `
    pub value_prefix: String,
}

impl Default for AuthenticationHeader {
    fn default() -> Self {
        Self {
            name: "Authorization".to_string(),
            value_prefix: "Bearer ".to_string(),
        }
    }
}
