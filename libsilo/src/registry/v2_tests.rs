use super::*;
use crate::error::SiloError;
use crate::testing::{config_blob, mount_image, mount_seed_image};

fn registry_for(server: &mockito::ServerGuard) -> V2Registry {
    V2Registry::new(
        &server.url(),
        "",
        Credentials::anonymous(),
        &ClientConfig::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_repositories_keep_seed_suffix_only() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":["alpine","my-job-0.1.0-seed","seed-tools"]}"#)
        .create_async()
        .await;

    let registry = registry_for(&server);
    assert_eq!(
        registry.repositories().await.unwrap(),
        vec!["my-job-0.1.0-seed"]
    );
}

#[tokio::test]
async fn test_images_expand_tags_and_skip_failing_repositories() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":["a-seed","b-seed"]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/a-seed/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"a-seed","tags":["1.0.0","1.1.0"]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/b-seed/tags/list")
        .with_status(500)
        .create_async()
        .await;

    let registry = registry_for(&server);
    assert_eq!(
        registry.images().await.unwrap(),
        vec!["a-seed:1.0.0", "a-seed:1.1.0"]
    );
}

#[tokio::test]
async fn test_images_with_manifests_skips_unreadable_descriptors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":["my-job-0.1.0-seed","broken-seed"]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/my-job-0.1.0-seed/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"my-job-0.1.0-seed","tags":["0.1.0"]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/broken-seed/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"broken-seed","tags":["1.0.0"]}"#)
        .create_async()
        .await;
    let _good = mount_seed_image(
        &mut server,
        "my-job-0.1.0-seed",
        "0.1.0",
        "my-job",
        "0.1.0",
        "0.1.0",
    )
    .await;
    let _broken = mount_image(
        &mut server,
        "broken-seed",
        "1.0.0",
        br#"{"config":{"Labels":{}}}"#.to_vec(),
    )
    .await;

    let registry = registry_for(&server);
    let images = registry.images_with_manifests().await.unwrap();

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].name, "my-job-0.1.0-seed:0.1.0");
    assert_eq!(images[0].registry, server.url());
    assert!(images[0].manifest.contains("\"name\":\"my-job\""));
}

#[tokio::test]
async fn test_get_image_manifest_empty_descriptor() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = mount_image(
        &mut server,
        "empty-seed",
        "1.0.0",
        br#"{"config":{}}"#.to_vec(),
    )
    .await;

    let registry = registry_for(&server);
    let err = registry
        .get_image_manifest("empty-seed", "1.0.0")
        .await
        .unwrap_err();
    assert!(matches!(err, SiloError::Descriptor { .. }));
}

struct FixedExtractor;

impl DescriptorExtractor for FixedExtractor {
    fn extract(&self, _blob: &[u8]) -> Result<Option<String>> {
        Ok(Some("{\"job\":{}}".to_string()))
    }
}

#[tokio::test]
async fn test_custom_extractor_is_used() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = mount_image(&mut server, "x-seed", "1", config_blob("{}")).await;

    let registry = registry_for(&server).with_extractor(Arc::new(FixedExtractor));
    assert_eq!(
        registry.get_image_manifest("x-seed", "1").await.unwrap(),
        "{\"job\":{}}"
    );
}

#[tokio::test]
async fn test_ping_propagates_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/_catalog")
        .with_status(404)
        .create_async()
        .await;

    let registry = registry_for(&server);
    assert_eq!(registry.ping().await.unwrap_err().status_code(), Some(404));
    assert_eq!(registry.name(), "V2");
}
