#![allow(unused_crate_dependencies)]

use graphql_cypher_auth::{AnonymousProvider, ClaimsProvider, JwtProvider};
use graphql_cypher_config::{AuthenticationHeader, JwtAlgorithm, JwtConfig};
use jsonwebtoken::{EncodingKey, Header};
use pretty_assertions::assert_eq;
use serde_json::json;

const SECRET: &str = "a-shared-secret";

fn config() -> JwtConfig {
    JwtConfig {
        algorithm: JwtAlgorithm::HS256,
        secret: Some(SECRET.to_string()),
        public_key_path: None,
        issuer: Some("https://auth.example.com".to_string()),
        audience: None,
        header: AuthenticationHeader::default(),
    }
}

fn token(claims: serde_json::Value, secret: &str) -> String {
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

fn headers(name: &str, value: &str) -> http::HeaderMap {
    let mut headers = http::HeaderMap::new();
    headers.insert(
        http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
        http::HeaderValue::from_str(value).unwrap(),
    );
    headers
}

fn valid_claims() -> serde_json::Value {
    json!({
        "sub": "user-1",
        "iss": "https://auth.example.com",
        "exp": 4_102_444_800u64,
        "roles": ["admin"],
    })
}

#[tokio::test]
async fn valid_token() {
    let provider = JwtProvider::new(&config()).unwrap();
    let headers = headers("Authorization", &format!("Bearer {}", token(valid_claims(), SECRET)));

    let claims = provider.claims(&headers).await.unwrap();

    assert_eq!(claims.get("sub"), Some(&json!("user-1")));
    assert_eq!(claims.get("roles"), Some(&json!(["admin"])));
}

#[tokio::test]
async fn invalid_tokens_are_anonymous() {
    let provider = JwtProvider::new(&config()).unwrap();

    let wrong_secret = headers("Authorization", &format!("Bearer {}", token(valid_claims(), "other")));
    assert!(provider.claims(&wrong_secret).await.is_none());

    let mut claims = valid_claims();
    claims["iss"] = json!("https://evil.example.com");
    let wrong_issuer = headers("Authorization", &format!("Bearer {}", token(claims, SECRET)));
    assert!(provider.claims(&wrong_issuer).await.is_none());

    let mut claims = valid_claims();
    claims["exp"] = json!(1_000_000_000u64);
    let expired = headers("Authorization", &format!("Bearer {}", token(claims, SECRET)));
    assert!(provider.claims(&expired).await.is_none());

    let no_prefix = headers("Authorization", &token(valid_claims(), SECRET));
    assert!(provider.claims(&no_prefix).await.is_none());

    assert!(provider.claims(&http::HeaderMap::new()).await.is_none());
}

#[tokio::test]
async fn custom_header() {
    let mut config = config();
    config.header = AuthenticationHeader {
        name: "X-Token".to_string(),
        value_prefix: String::new(),
    };

    let provider = JwtProvider::new(&config).unwrap();
    let claims = provider
        .claims(&headers("X-Token", &token(valid_claims(), SECRET)))
        .await
        .unwrap();

    assert_eq!(claims.get("sub"), Some(&json!("user-1")));
}

#[tokio::test]
async fn anonymous() {
    let headers = headers("Authorization", &format!("Bearer {}", token(valid_claims(), SECRET)));

    assert!(AnonymousProvider.claims(&headers).await.is_none());
}

#[test]
fn missing_public_key() {
    let config = JwtConfig {
        algorithm: JwtAlgorithm::RS256,
        secret: None,
        public_key_path: Some("/does/not/exist.pem".into()),
        ..config()
    };

    assert!(JwtProvider::new(&config).is_err());
}
