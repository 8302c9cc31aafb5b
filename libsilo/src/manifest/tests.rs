use super::*;

const CONFIG_DIGEST: &str =
    "sha256:7173b809ca12ec5dee4506cd86be934c4596dd234ee82c0662eac04a8c2c71dc";

fn manifest_json(schema_version: u32) -> String {
    format!(
        r#"{{
            "schemaVersion": {},
            "mediaType": "{}",
            "config": {{
                "mediaType": "{}",
                "size": 1457,
                "digest": "{}"
            }},
            "layers": [
                {{
                    "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                    "size": 977,
                    "digest": "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
                }}
            ],
            "annotations": {{"ignored": "yes"}}
        }}"#,
        schema_version, MEDIA_TYPE_MANIFEST_V2, MEDIA_TYPE_IMAGE_CONFIG, CONFIG_DIGEST
    )
}

#[test]
fn test_parse_schema_v2_manifest() {
    let manifest = ManifestV2::from_slice(manifest_json(2).as_bytes()).unwrap();

    assert_eq!(manifest.media_type, MEDIA_TYPE_MANIFEST_V2);
    assert_eq!(manifest.config.size, 1457);
    assert_eq!(manifest.layers.len(), 1);
    assert_eq!(manifest.config_digest().unwrap().to_string(), CONFIG_DIGEST);
}

#[test]
fn test_reject_schema_v1_manifest() {
    let result = ManifestV2::from_slice(manifest_json(1).as_bytes());
    assert!(matches!(result, Err(SiloError::Validation { .. })));
}

#[test]
fn test_reject_malformed_manifest() {
    let result = ManifestV2::from_slice(b"{\"schemaVersion\": 2}");
    assert!(matches!(result, Err(SiloError::Validation { .. })));
}

#[test]
fn test_config_digest_invalid() {
    let mut manifest = ManifestV2::from_slice(manifest_json(2).as_bytes()).unwrap();
    manifest.config.digest = "not-a-digest".to_string();

    assert!(manifest.config_digest().is_err());
}

#[test]
fn test_encode_keeps_camel_case() {
    let manifest = ManifestV2::from_slice(manifest_json(2).as_bytes()).unwrap();
    let encoded = String::from_utf8(manifest.to_vec().unwrap()).unwrap();

    assert!(encoded.contains("\"schemaVersion\":2"));
    assert!(encoded.contains("\"mediaType\""));
    assert!(!encoded.contains("urls"));
}
