use super::*;
use crate::descriptor::SEED_LABEL;
use crate::testing::mount_seed_image;
use mockito::Matcher;

fn search_body() -> String {
    let mut labels = serde_json::Map::new();
    labels.insert(SEED_LABEL.to_string(), "\"{\\\"job\\\":{}}\"".into());
    serde_json::json!({
        "results": {
            "community": {
                "geoint/my-job-0.1.0-seed": {
                    "author": "jane",
                    "labels": labels,
                    "tags": {"0.1.0": {"age": 1, "digest": "sha256:abc"}}
                },
                "geoint/unlabelled-seed": {
                    "labels": {"maintainer": "x"},
                    "tags": {"1.0.0": {}}
                },
                "other/foreign-seed": {
                    "labels": labels,
                    "tags": {"1.0.0": {}}
                }
            },
            "imports": {
                "geoint/imported-seed": {
                    "labels": labels,
                    "tags": {"2.0.0": {}, "broken": {}}
                }
            }
        }
    })
    .to_string()
}

async fn mount_search(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "-seed".into()),
            Matcher::UrlEncoded("t".into(), "json".into()),
        ]))
        .with_status(200)
        .with_body(search_body())
        .create_async()
        .await
}

fn yard_for(server: &mockito::ServerGuard) -> ContainerYardRegistry {
    ContainerYardRegistry::new(
        &server.url(),
        "geoint",
        Credentials::anonymous(),
        &ClientConfig::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_ping_searches_for_nothing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded("q".into(), PING_QUERY.into()))
        .with_status(200)
        .with_body(r#"{"results":{"community":{},"imports":{}}}"#)
        .create_async()
        .await;

    let registry = yard_for(&server);
    registry.ping().await.unwrap();
    mock.assert_async().await;
    assert_eq!(registry.name(), "ContainerYard");
}

#[tokio::test]
async fn test_ping_rejects_non_json() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>login</html>")
        .create_async()
        .await;

    assert!(yard_for(&server).ping().await.is_err());
}

#[tokio::test]
async fn test_repositories_list_community_then_imports() {
    let mut server = mockito::Server::new_async().await;
    mount_search(&mut server).await;

    assert_eq!(
        yard_for(&server).repositories().await.unwrap(),
        vec![
            "geoint/my-job-0.1.0-seed",
            "geoint/unlabelled-seed",
            "other/foreign-seed",
            "geoint/imported-seed"
        ]
    );
}

#[tokio::test]
async fn test_images_filter_org_and_label() {
    let mut server = mockito::Server::new_async().await;
    mount_search(&mut server).await;

    assert_eq!(
        yard_for(&server).images().await.unwrap(),
        vec![
            "geoint/my-job-0.1.0-seed:0.1.0",
            "geoint/imported-seed:2.0.0",
            "geoint/imported-seed:broken"
        ]
    );
}

#[tokio::test]
async fn test_tags_match_repository_exactly() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded(
            "q".into(),
            "geoint/imported-seed".into(),
        ))
        .with_status(200)
        .with_body(search_body())
        .create_async()
        .await;

    assert_eq!(
        yard_for(&server).tags("geoint/imported-seed").await.unwrap(),
        vec!["2.0.0", "broken"]
    );
}

#[tokio::test]
async fn test_images_with_manifests_split_org() {
    let mut server = mockito::Server::new_async().await;
    mount_search(&mut server).await;
    let _job = mount_seed_image(
        &mut server,
        "geoint/my-job-0.1.0-seed",
        "0.1.0",
        "my-job",
        "0.1.0",
        "0.1.0",
    )
    .await;
    let _imported = mount_seed_image(
        &mut server,
        "geoint/imported-seed",
        "2.0.0",
        "imported",
        "2.0.0",
        "1.0.0",
    )
    .await;

    let images = yard_for(&server).images_with_manifests().await.unwrap();

    assert_eq!(images.len(), 2);
    assert_eq!(images[0].name, "my-job-0.1.0-seed:0.1.0");
    assert_eq!(images[0].org, "geoint");
    assert_eq!(images[0].registry, server.url());
    assert_eq!(images[1].name, "imported-seed:2.0.0");
    assert!(images[1].manifest.contains("imported"));
}
