use super::*;

async fn mount_catalog(server: &mut mockito::ServerGuard, status: usize) -> mockito::Mock {
    server
        .mock("GET", "/v2/_catalog")
        .with_status(status)
        .with_body(r#"{"repositories":[]}"#)
        .create_async()
        .await
}

#[test]
fn test_classify_registry_urls() {
    assert_eq!(
        RegistryKind::classify("https://hub.docker.com"),
        RegistryKind::DockerHub
    );
    assert_eq!(
        RegistryKind::classify("https://gitlab.example.com"),
        RegistryKind::GitLab
    );
    assert_eq!(
        RegistryKind::classify("https://containeryard.example.com"),
        RegistryKind::ContainerYard
    );
    assert_eq!(
        RegistryKind::classify("https://registry.example.com:5000"),
        RegistryKind::V2
    );
}

#[test]
fn test_kind_display() {
    assert_eq!(RegistryKind::DockerHub.to_string(), "dockerhub");
    assert_eq!(RegistryKind::V2.to_string(), "v2");
}

#[test]
fn test_normalize_url_adds_https() {
    assert_eq!(normalize_url("registry.example.com"), "https://registry.example.com");
    assert_eq!(normalize_url("http://localhost:5000"), "http://localhost:5000");
    assert_eq!(normalize_url("https://localhost:5000"), "https://localhost:5000");
}

#[test]
fn test_normalize_url_host_starting_with_http() {
    assert_eq!(
        normalize_url("httpd-registry.local:5000"),
        "https://httpd-registry.local:5000"
    );
    assert_eq!(normalize_url("https-mirror.example"), "https://https-mirror.example");
}

#[tokio::test]
async fn test_create_registry_plain_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = mount_catalog(&mut server, 200).await;

    let registry = create_registry(&server.url(), "", "", "", &ClientConfig::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(registry.name(), "V2");
}

#[tokio::test]
async fn test_create_registry_falls_back_to_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = mount_catalog(&mut server, 200).await;

    let registry = create_registry(
        &server.host_with_port(),
        "",
        "",
        "",
        &ClientConfig::default().with_timeout(5),
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(registry.name(), "V2");
}

#[tokio::test]
async fn test_create_registry_reports_backend_and_reason() {
    let mut server = mockito::Server::new_async().await;
    mount_catalog(&mut server, 401).await;

    let url = server.url().replace("http://", "https://");
    let err = create_registry(&url, "", "", "", &ClientConfig::default().with_timeout(5))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, SiloError::Unreachable { .. }));
    assert!(err.to_string().contains("v2"));
    assert_eq!(err.status_code(), Some(401));
    assert!(err.operator_hint("", "").contains("requires a login"));
}

#[tokio::test]
async fn test_create_registry_http_failure_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/_catalog")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let err = create_registry(&server.url(), "", "", "", &ClientConfig::default())
        .await
        .err()
        .unwrap();

    mock.assert_async().await;
    assert_eq!(err.status_code(), Some(404));
}
