use super::*;
use crate::testing::mount_seed_image;
use mockito::Matcher;

fn hub_for(hub: &mockito::ServerGuard, content: &mockito::ServerGuard) -> DockerHubRegistry {
    DockerHubRegistry::with_content_url(
        &hub.url(),
        &content.url(),
        "geoint",
        Credentials::anonymous(),
        &ClientConfig::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_repositories_follow_next_and_filter() {
    let mut hub = mockito::Server::new_async().await;
    let content = mockito::Server::new_async().await;
    let next = format!("{}/v2/repositories/geoint/?page=2", hub.url());

    hub.mock("GET", "/v2/repositories/geoint/")
        .match_query(Matcher::Missing)
        .with_status(200)
        .with_body(
            serde_json::json!({
                "count": 3,
                "next": next,
                "results": [{"name": "my-job-0.1.0-seed"}, {"name": "alpine"}]
            })
            .to_string(),
        )
        .create_async()
        .await;
    hub.mock("GET", "/v2/repositories/geoint/")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_body(r#"{"count":3,"next":null,"results":[{"name":"other-seed"}]}"#)
        .create_async()
        .await;

    let registry = hub_for(&hub, &content);
    assert_eq!(
        registry.repositories().await.unwrap(),
        vec!["my-job-0.1.0-seed", "other-seed"]
    );
}

#[tokio::test]
async fn test_images_report_untagged_repositories_by_name() {
    let mut hub = mockito::Server::new_async().await;
    let content = mockito::Server::new_async().await;

    hub.mock("GET", "/v2/repositories/geoint/")
        .with_status(200)
        .with_body(r#"{"results":[{"name":"a-seed"},{"name":"b-seed"}]}"#)
        .create_async()
        .await;
    hub.mock("GET", "/v2/repositories/geoint/a-seed/tags")
        .with_status(200)
        .with_body(r#"{"results":[{"name":"1.0.0"},{"name":"latest"}]}"#)
        .create_async()
        .await;
    hub.mock("GET", "/v2/repositories/geoint/b-seed/tags")
        .with_status(200)
        .with_body(r#"{"results":[]}"#)
        .create_async()
        .await;

    let registry = hub_for(&hub, &content);
    assert_eq!(
        registry.images().await.unwrap(),
        vec!["a-seed:1.0.0", "a-seed:latest", "b-seed"]
    );
}

#[tokio::test]
async fn test_images_with_manifests_reads_content_host() {
    let mut hub = mockito::Server::new_async().await;
    let mut content = mockito::Server::new_async().await;

    hub.mock("GET", "/v2/repositories/geoint/")
        .with_status(200)
        .with_body(r#"{"results":[{"name":"my-job-0.1.0-seed"}]}"#)
        .create_async()
        .await;
    hub.mock("GET", "/v2/repositories/geoint/my-job-0.1.0-seed/tags")
        .with_status(200)
        .with_body(r#"{"results":[{"name":"0.1.0"},{"name":"broken"}]}"#)
        .create_async()
        .await;
    let _mocks = mount_seed_image(
        &mut content,
        "geoint/my-job-0.1.0-seed",
        "0.1.0",
        "my-job",
        "0.1.0",
        "0.1.0",
    )
    .await;

    let registry = hub_for(&hub, &content);
    let images = registry.images_with_manifests().await.unwrap();

    assert_eq!(images.len(), 2);
    assert_eq!(images[0].name, "my-job-0.1.0-seed:0.1.0");
    assert_eq!(images[0].registry, DOCKER_HUB_REGISTRY);
    assert_eq!(images[0].org, "geoint");
    assert!(images[0].manifest.contains("my-job"));
    assert_eq!(images[1].name, "my-job-0.1.0-seed:broken");
    assert!(images[1].manifest.is_empty());
}

#[tokio::test]
async fn test_ping_uses_org_listing() {
    let mut hub = mockito::Server::new_async().await;
    let content = mockito::Server::new_async().await;
    let mock = hub
        .mock("GET", "/v2/repositories/geoint/")
        .with_status(200)
        .with_body(r#"{"results":[]}"#)
        .create_async()
        .await;

    let registry = hub_for(&hub, &content);
    registry.ping().await.unwrap();
    mock.assert_async().await;
    assert_eq!(registry.name(), "DockerHub");
}

#[tokio::test]
async fn test_ping_fails_on_error_status() {
    let mut hub = mockito::Server::new_async().await;
    let content = mockito::Server::new_async().await;
    hub.mock("GET", "/v2/repositories/geoint/")
        .with_status(503)
        .create_async()
        .await;

    let registry = hub_for(&hub, &content);
    assert_eq!(registry.ping().await.unwrap_err().status_code(), Some(503));
}
