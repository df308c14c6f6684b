use futures_util::future::BoxFuture;
use graphql_cypher_config::{JwtAlgorithm, JwtConfig};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use crate::{AuthError, Claims, ClaimsProvider};

/// Verifies a bearer token with a static key, HS256 secret or RS256 public key.
pub struct JwtProvider {
    header_name: String,
    header_value_prefix: String,
    key: DecodingKey,
    validation: Validation,
}

impl JwtProvider {
    pub fn new(config: &JwtConfig) -> Result<Self, AuthError> {
        let (key, algorithm) = match config.algorithm {
            JwtAlgorithm::HS256 => {
                let secret = config
                    .secret
                    .as_ref()
                    .ok_or_else(|| AuthError::Config("HS256 requires a secret".into()))?;

                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
            JwtAlgorithm::RS256 => {
                let path = config
                    .public_key_path
                    .as_ref()
                    .ok_or_else(|| AuthError::Config("RS256 requires a public key".into()))?;

                let public_key_error = |message: String| AuthError::PublicKey {
                    path: path.display().to_string(),
                    message,
                };

                let pem = std::fs::read(path).map_err(|err| public_key_error(err.to_string()))?;
                let key = DecodingKey::from_rsa_pem(&pem).map_err(|err| public_key_error(err.to_string()))?;

                (key, Algorithm::RS256)
            }
        };

        let mut validation = Validation::new(algorithm);

        if let Some(issuer) = config.issuer.as_ref() {
            validation.set_issuer(&[issuer]);
        }

        if let Some(audience) = config.audience.as_ref() {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        validation.validate_nbf = true;

        Ok(JwtProvider {
            header_name: config.header.name.clone(),
            header_value_prefix: config.header.value_prefix.clone(),
            key,
            validation,
        })
    }

    fn decode(&self, headers: &http::HeaderMap) -> Option<Claims> {
        let token = headers
            .get(&self.header_name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(&self.header_value_prefix))?;

        match jsonwebtoken::decode::<Map<String, Value>>(token, &self.key, &self.validation) {
            Ok(data) => Some(Claims::new(data.claims)),
            Err(err) => {
                tracing::warn!("Ignoring an invalid token: {err}");
                None
            }
        }
    }
}

impl ClaimsProvider for JwtProvider {
    fn claims<'a>(&'a self, headers: &'a http::HeaderMap) -> BoxFuture<'a, Option<Claims>> {
        Box::pin(async move { self.decode(headers) })
    }
}
