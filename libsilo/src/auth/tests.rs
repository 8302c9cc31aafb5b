use super::*;

#[test]
fn test_credentials_anonymous() {
    let creds = Credentials::anonymous();
    assert_eq!(creds, Credentials::Anonymous);
    assert_eq!(creds.username(), "");
    assert_eq!(creds.password(), "");
}

#[test]
fn test_credentials_basic() {
    let creds = Credentials::basic("testuser", "testpass");
    assert_eq!(creds.username(), "testuser");
    assert_eq!(creds.password(), "testpass");
    assert!(creds.is_present());
}

#[test]
fn test_credentials_from_pair() {
    assert_eq!(Credentials::from_pair("", ""), Credentials::Anonymous);
    assert!(Credentials::from_pair("", "token").is_present());
    assert!(Credentials::from_pair("user", "").is_present());
}

#[test]
fn test_auth_challenge_parse_bearer() {
    let header = r#"Bearer realm="https://auth.example/token",service="registry.example",scope="repository:my/repo:pull""#;
    let challenge = AuthChallenge::parse(header).unwrap();

    assert!(challenge.is_bearer());
    assert_eq!(challenge.realm, "https://auth.example/token");
    assert_eq!(challenge.service.as_deref(), Some("registry.example"));
    assert_eq!(challenge.scope.as_deref(), Some("repository:my/repo:pull"));
}

#[test]
fn test_auth_challenge_scope_with_comma() {
    let header = r#"Bearer realm="https://auth.example/token",scope="repository:my/repo:pull,push",service="svc""#;
    let challenge = AuthChallenge::parse(header).unwrap();

    assert_eq!(
        challenge.scope.as_deref(),
        Some("repository:my/repo:pull,push")
    );
    assert_eq!(challenge.service.as_deref(), Some("svc"));
}

#[test]
fn test_auth_challenge_scheme_case_insensitive() {
    let challenge = AuthChallenge::parse(r#"bearer realm="https://auth""#).unwrap();
    assert!(challenge.is_bearer());
    assert_eq!(challenge.service, None);
}

#[test]
fn test_auth_challenge_missing_realm() {
    let result = AuthChallenge::parse(r#"Bearer service="registry""#);
    assert!(matches!(result, Err(SiloError::Validation { .. })));
}

#[test]
fn test_auth_challenge_invalid_format() {
    assert!(AuthChallenge::parse("Bearer").is_err());
}

#[test]
fn test_find_bearer_skips_basic() {
    let headers = [
        r#"Basic realm="registry""#,
        r#"Bearer realm="https://auth.example/token",service="svc""#,
    ];
    let challenge = AuthChallenge::find_bearer(headers).unwrap();

    assert_eq!(challenge.realm, "https://auth.example/token");
}

#[test]
fn test_find_bearer_none_when_only_basic() {
    assert!(AuthChallenge::find_bearer([r#"Basic realm="registry""#]).is_none());
}
