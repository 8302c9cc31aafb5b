//! Fixtures shared by the unit tests.

use crate::digest::Digest;
use crate::manifest::MEDIA_TYPE_MANIFEST_V2;
use mockito::{Mock, ServerGuard};

/// Descriptor document for a job.
pub(crate) fn seed_document(name: &str, job_version: &str, package_version: &str) -> String {
    serde_json::json!({
        "seedVersion": "1.0.0",
        "job": {
            "name": name,
            "jobVersion": job_version,
            "packageVersion": package_version,
            "title": format!("{} title", name),
            "description": format!("Runs {}", name),
            "maintainer": {
                "name": "Jane Doe",
                "email": "jane@example.com",
                "organization": "Example"
            }
        }
    })
    .to_string()
}

/// Image configuration blob carrying `document` in the seed label.
pub(crate) fn config_blob(document: &str) -> Vec<u8> {
    let label = serde_json::to_string(document)
        .unwrap()
        .replace('$', "\\$")
        .replace('/', "\\/");
    let mut labels = serde_json::Map::new();
    labels.insert(
        crate::descriptor::SEED_LABEL.to_string(),
        serde_json::Value::String(label),
    );
    serde_json::to_vec(&serde_json::json!({
        "architecture": "amd64",
        "config": { "Labels": labels }
    }))
    .unwrap()
}

/// Mounts manifest and config blob mocks for `repository:tag` serving `blob`.
pub(crate) async fn mount_image(
    server: &mut ServerGuard,
    repository: &str,
    tag: &str,
    blob: Vec<u8>,
) -> Vec<Mock> {
    let digest = Digest::sha256_of(&blob).unwrap();
    let manifest = serde_json::json!({
        "schemaVersion": 2,
        "mediaType": MEDIA_TYPE_MANIFEST_V2,
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "size": blob.len(),
            "digest": digest.to_string()
        },
        "layers": []
    })
    .to_string();

    let manifest_mock = server
        .mock(
            "GET",
            format!("/v2/{}/manifests/{}", repository, tag).as_str(),
        )
        .with_status(200)
        .with_body(manifest)
        .create_async()
        .await;
    let blob_mock = server
        .mock("GET", format!("/v2/{}/blobs/{}", repository, digest).as_str())
        .with_status(200)
        .with_body(blob)
        .create_async()
        .await;

    vec![manifest_mock, blob_mock]
}

/// Mounts a seed image built from a descriptor.
pub(crate) async fn mount_seed_image(
    server: &mut ServerGuard,
    repository: &str,
    tag: &str,
    name: &str,
    job_version: &str,
    package_version: &str,
) -> Vec<Mock> {
    let blob = config_blob(&seed_document(name, job_version, package_version));
    mount_image(server, repository, tag, blob).await
}
