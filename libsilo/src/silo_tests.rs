use super::*;
use crate::catalog::RegistryRecord;
use crate::testing::mount_seed_image;
use tempfile::TempDir;

fn memory_silo() -> Silo {
    Silo::builder().in_memory().build().unwrap()
}

#[tokio::test]
async fn test_add_registry_verifies_connectivity() {
    let mut server = mockito::Server::new_async().await;
    let _catalog = server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":[]}"#)
        .create_async()
        .await;

    let silo = memory_silo();
    let id = silo
        .add_registry(RegistryRecord::new("local", server.url(), "", "", ""))
        .await
        .unwrap();

    assert_eq!(silo.registry(id).unwrap().name, "local");
    assert_eq!(silo.check_registry(id).await.unwrap(), "V2");
}

#[tokio::test]
async fn test_add_unreachable_registry_is_not_stored() {
    let mut server = mockito::Server::new_async().await;
    let _catalog = server
        .mock("GET", "/v2/_catalog")
        .with_status(404)
        .create_async()
        .await;

    let silo = memory_silo();
    let result = silo
        .add_registry(RegistryRecord::new("broken", server.url(), "", "", ""))
        .await;

    assert!(result.is_err());
    assert!(silo.registries().unwrap().is_empty());
}

#[tokio::test]
async fn test_scan_and_query_images_by_job() {
    let mut server = mockito::Server::new_async().await;
    let _catalog = server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":["job-a-1.0.0-seed","job-b-1.0.0-seed"]}"#)
        .create_async()
        .await;
    let _tags_a = server
        .mock("GET", "/v2/job-a-1.0.0-seed/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"job-a-1.0.0-seed","tags":["1.0.0"]}"#)
        .create_async()
        .await;
    let _tags_b = server
        .mock("GET", "/v2/job-b-1.0.0-seed/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"job-b-1.0.0-seed","tags":["1.0.0"]}"#)
        .create_async()
        .await;
    let _a = mount_seed_image(&mut server, "job-a-1.0.0-seed", "1.0.0", "job-a", "1.0.0", "1.0.0").await;
    let _b = mount_seed_image(&mut server, "job-b-1.0.0-seed", "1.0.0", "job-b", "1.0.0", "1.0.0").await;

    let silo = memory_silo();
    silo.add_registry(RegistryRecord::new("local", server.url(), "", "", ""))
        .await
        .unwrap();

    let outcome = silo.scan().await.unwrap();
    assert!(matches!(outcome, ScanOutcome::Completed(_)));

    assert_eq!(silo.jobs().unwrap().len(), 2);
    assert_eq!(silo.job_versions().unwrap().len(), 2);
    assert_eq!(silo.images(None).unwrap().len(), 2);
    let images = silo.images(Some("job-b")).unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].full_name, "job-b-1.0.0-seed:1.0.0");
}

#[test]
fn test_open_uses_configured_catalog_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    let mut config = Config::default();
    config.catalog.path = Some(path.clone());

    {
        let silo = Silo::open(&config).unwrap();
        silo.store()
            .add_registry(RegistryRecord::new("one", "https://one.example", "", "", ""))
            .unwrap();
    }

    assert!(path.exists());
    let reopened = Silo::open(&config).unwrap();
    assert_eq!(reopened.registries().unwrap().len(), 1);
}

#[test]
fn test_remove_registry() {
    let silo = memory_silo();
    let id = silo
        .store()
        .add_registry(RegistryRecord::new("one", "https://one.example", "", "", ""))
        .unwrap();

    silo.remove_registry(id).unwrap();
    assert!(silo.registry(id).is_err());
}
