use super::*;
use libsilo::{RegistryRecord, ScanSummary};

#[test]
fn test_busy_report() {
    let report = ScanReport::from(ScanOutcome::Busy);

    assert_eq!(report.status, "busy");
    assert!(report.format_pretty().contains("already running"));
}

#[test]
fn test_completed_report() {
    let report = ScanReport::from(ScanOutcome::Completed(ScanSummary {
        registries: 2,
        images: 5,
        undecoded: 1,
        jobs: 3,
        job_versions: 4,
    }));

    assert_eq!(report.status, "completed");
    let pretty = report.format_pretty();
    assert!(pretty.contains("5 images"));
    assert_eq!(
        report.warning().as_deref(),
        Some("1 images had no readable seed descriptor")
    );
}

#[test]
fn test_report_without_undecoded_images_has_no_warning() {
    let report = ScanReport::from(ScanOutcome::Completed(ScanSummary {
        registries: 1,
        images: 2,
        undecoded: 0,
        jobs: 1,
        job_versions: 1,
    }));

    assert_eq!(report.warning(), None);
}

#[tokio::test]
async fn test_run_scan_empty_registry() {
    let mut server = mockito::Server::new_async().await;
    let _catalog = server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":[]}"#)
        .create_async()
        .await;
    let silo = Silo::builder().in_memory().build().unwrap();
    let id = silo
        .store()
        .add_registry(RegistryRecord::new("local", server.url(), "", "", ""))
        .unwrap();

    let report = run_scan(&silo, Some(id)).await.unwrap();

    assert_eq!(report.status, "completed");
    assert_eq!(report.registries, 1);
    assert_eq!(report.images, 0);
}

#[tokio::test]
async fn test_run_scan_unknown_registry() {
    let silo = Silo::builder().in_memory().build().unwrap();
    let err = run_scan(&silo, Some(3)).await.unwrap_err();
    assert!(err.contains("not found"));
}
