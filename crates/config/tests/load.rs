#![allow(unused_crate_dependencies)]

use std::io::Write;

use graphql_cypher_config::{Config, ConfigError, JwtAlgorithm};
use pretty_assertions::assert_eq;

#[test]
fn full_config() {
    let config: Config = indoc::indoc! {r#"
        [schema]
        path = "schema.graphql"

        [translation]
        default_limit = 20
        max_limit = 100

        [authentication.jwt]
        secret = "my-secret"
        issuer = "https://auth.example.com"

        [authentication.jwt.header]
        name = "X-Token"
        value_prefix = ""
    "#}
    .parse()
    .unwrap();

    insta::assert_debug_snapshot!(config, @r###"
    Config {
        schema: SchemaConfig {
            path: Some(
                "schema.graphql",
            ),
        },
        translation: TranslationConfig {
            default_limit: Some(
                20,
            ),
            max_limit: Some(
                100,
            ),
        },
        authentication: AuthenticationConfig {
            jwt: Some(
                JwtConfig {
                    algorithm: HS256,
                    secret: Some(
                        "my-secret",
                    ),
                    public_key_path: None,
                    issuer: Some(
                        "https://auth.example.com",
                    ),
                    audience: None,
                    header: AuthenticationHeader {
                        name: "X-Token",
                        value_prefix: "",
                    },
                },
            ),
        },
    }
    "###);
}

#[test]
fn default_header() {
    let config: Config = indoc::indoc! {r#"
        [authentication.jwt]
        algorithm = "RS256"
        public_key_path = "key.pem"
    "#}
    .parse()
    .unwrap();

    let jwt = config.authentication.jwt.unwrap();
    assert_eq!(jwt.algorithm, JwtAlgorithm::RS256);
    assert_eq!(jwt.header.name, "Authorization");
    assert_eq!(jwt.header.value_prefix, "Bearer ");
}

#[test]
fn inconsistent_limits() {
    let error = indoc::indoc! {r#"
        [translation]
        default_limit = 200
        max_limit = 100
    "#}
    .parse::<Config>()
    .unwrap_err();

    insta::assert_snapshot!(error, @"Invalid configuration: translation.default_limit (200) is greater than translation.max_limit (100)");
}

#[test]
fn missing_jwt_key() {
    let error = "[authentication.jwt]\nalgorithm = \"RS256\"".parse::<Config>().unwrap_err();

    assert!(matches!(error, ConfigError::Invalid(_)));
}

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[translation]\nmax_limit = 10").unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.translation.max_limit, Some(10));

    let error = Config::load(file.path().with_extension("missing")).unwrap_err();
    assert!(matches!(error, ConfigError::Io { .. }));
}
