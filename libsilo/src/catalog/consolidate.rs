//! Derives the job tables from a set of cataloged images.

use super::{CatalogStore, Image, Job, JobVersion};
use std::collections::HashMap;
use tracing::{debug, error, warn};

#[cfg(test)]
#[path = "consolidate_tests.rs"]
mod tests;

/// Counts reported by [`build_jobs_list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Consolidation {
    pub jobs: usize,
    pub job_versions: usize,
    /// Images left out because their job version is malformed or their
    /// row could not be stored.
    pub skipped: usize,
}

/// Returns true when the candidate versions sort after the latest ones.
///
/// Versions are compared as plain strings, job version first, so `"9.0.0"`
/// is newer than `"10.0.0"`.
pub fn is_newer(
    candidate_job: &str,
    candidate_package: &str,
    latest_job: &str,
    latest_package: &str,
) -> bool {
    (candidate_job, candidate_package) > (latest_job, latest_package)
}

fn job_from(image: &Image) -> Job {
    Job {
        id: 0,
        name: image.short_name.clone(),
        latest_job_version: image.job_version.clone(),
        latest_package_version: image.package_version.clone(),
        title: image.title.clone(),
        maintainer: image.maintainer.clone(),
        description: image.description.clone(),
    }
}

/// Builds one [`Job`] per job name and one [`JobVersion`] per major version
/// line, keeping the newest versions seen, and writes them through `store`.
///
/// Each image gets the ids of the rows it resolved to. Store failures are
/// logged per row and the remaining images are still processed. An image
/// whose row could not be added is counted as skipped and keeps id 0 for
/// that row. The job
/// tables are expected to be empty when this runs.
pub fn build_jobs_list(store: &dyn CatalogStore, images: &mut [Image]) -> Consolidation {
    let mut jobs: HashMap<String, Job> = HashMap::new();
    let mut versions: HashMap<(String, String), JobVersion> = HashMap::new();
    let mut summary = Consolidation::default();

    for image in images.iter_mut() {
        let Some(major) = image.major_version().map(str::to_string) else {
            warn!(
                image = %image.full_name,
                job_version = %image.job_version,
                "invalid job version, skipping"
            );
            image.job_id = 0;
            image.job_version_id = 0;
            summary.skipped += 1;
            continue;
        };

        let job_id = match jobs.get_mut(&image.short_name) {
            Some(job) => {
                if is_newer(
                    &image.job_version,
                    &image.package_version,
                    &job.latest_job_version,
                    &job.latest_package_version,
                ) {
                    let id = job.id;
                    *job = Job { id, ..job_from(image) };
                    if let Err(e) = store.update_job(job) {
                        error!(job = %job.name, error = %e, "failed to update job");
                    }
                }
                job.id
            }
            None => {
                let mut job = job_from(image);
                match store.add_job(&job) {
                    Ok(id) => job.id = id,
                    Err(e) => {
                        error!(job = %job.name, error = %e, "failed to add job");
                        image.job_id = 0;
                        image.job_version_id = 0;
                        summary.skipped += 1;
                        continue;
                    }
                }
                debug!(job = %job.name, id = job.id, "added job");
                let id = job.id;
                jobs.insert(image.short_name.clone(), job);
                summary.jobs += 1;
                id
            }
        };
        image.job_id = job_id;

        let key = (image.short_name.clone(), major);
        let version_id = match versions.get_mut(&key) {
            Some(version) => {
                if is_newer(
                    &image.job_version,
                    &image.package_version,
                    &version.latest_job_version,
                    &version.latest_package_version,
                ) {
                    version.latest_job_version = image.job_version.clone();
                    version.latest_package_version = image.package_version.clone();
                    if let Err(e) = store.update_job_version(version) {
                        error!(
                            job = %version.job_name,
                            major = %version.major_version,
                            error = %e,
                            "failed to update job version"
                        );
                    }
                }
                version.id
            }
            None => {
                let mut version = JobVersion {
                    id: 0,
                    job_id,
                    job_name: key.0.clone(),
                    major_version: key.1.clone(),
                    latest_job_version: image.job_version.clone(),
                    latest_package_version: image.package_version.clone(),
                };
                match store.add_job_version(&version) {
                    Ok(id) => version.id = id,
                    Err(e) => {
                        error!(
                            job = %version.job_name,
                            major = %version.major_version,
                            error = %e,
                            "failed to add job version"
                        );
                        image.job_version_id = 0;
                        summary.skipped += 1;
                        continue;
                    }
                }
                let id = version.id;
                versions.insert(key, version);
                summary.job_versions += 1;
                id
            }
        };
        image.job_version_id = version_id;
    }

    summary
}
