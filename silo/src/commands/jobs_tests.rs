use super::*;
use libsilo::Image;

fn silo_with_catalog() -> Silo {
    let silo = Silo::builder().in_memory().build().unwrap();
    let store = silo.store();
    let zeta = store
        .add_job(&Job {
            name: "zeta".to_string(),
            latest_job_version: "1.2.0".to_string(),
            latest_package_version: "1.0.0".to_string(),
            ..Job::default()
        })
        .unwrap();
    store
        .add_job(&Job {
            name: "alpha".to_string(),
            latest_job_version: "0.1.0".to_string(),
            ..Job::default()
        })
        .unwrap();
    for (major, version) in [("1", "1.2.0"), ("0", "0.9.0")] {
        store
            .add_job_version(&JobVersion {
                job_id: zeta,
                job_name: "zeta".to_string(),
                major_version: major.to_string(),
                latest_job_version: version.to_string(),
                ..JobVersion::default()
            })
            .unwrap();
    }
    store
        .store_images(&[Image {
            full_name: "zeta-1.2.0-seed:1.0.0".to_string(),
            short_name: "zeta".to_string(),
            ..Image::default()
        }])
        .unwrap();
    silo
}

#[test]
fn test_list_jobs_sorted_with_versions() {
    let silo = silo_with_catalog();

    let rows = list_jobs(&silo).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "alpha");
    assert_eq!(rows[1].name, "zeta");
    assert_eq!(rows[1].versions, "0.9.0, 1.2.0");
    assert!(rows[0].versions.is_empty());
}

#[test]
fn test_list_images_by_job() {
    let silo = silo_with_catalog();

    let rows = crate::commands::images::list_images(&silo, Some("zeta")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "zeta-1.2.0-seed:1.0.0");

    let none = crate::commands::images::list_images(&silo, Some("alpha")).unwrap();
    assert!(none.is_empty());
}
