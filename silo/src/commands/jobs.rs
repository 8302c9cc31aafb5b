use crate::commands::open_or_exit;
use crate::context::AppContext;
use crate::format::{self, OutputFormat};
use libsilo::{Job, JobVersion, Silo};
use serde::Serialize;
use tabled::Tabled;

/// Job row for listings
#[derive(Debug, Tabled, Serialize)]
pub struct JobDisplay {
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "LATEST")]
    pub latest_job_version: String,
    #[tabled(rename = "PACKAGE")]
    pub latest_package_version: String,
    /// Latest version of every major line, e.g. `0.4.1, 1.2.0`
    #[tabled(rename = "VERSIONS")]
    pub versions: String,
    #[tabled(rename = "TITLE")]
    pub title: String,
    #[tabled(rename = "MAINTAINER")]
    pub maintainer: String,
}

fn display(job: Job, versions: &[JobVersion]) -> JobDisplay {
    let mut lines: Vec<&JobVersion> = versions.iter().filter(|v| v.job_id == job.id).collect();
    lines.sort_by(|a, b| a.major_version.cmp(&b.major_version));
    let versions = lines
        .iter()
        .map(|v| v.latest_job_version.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    JobDisplay {
        name: job.name,
        latest_job_version: job.latest_job_version,
        latest_package_version: job.latest_package_version,
        versions,
        title: job.title,
        maintainer: job.maintainer.name,
    }
}

/// Cataloged jobs sorted by name
pub(crate) fn list_jobs(silo: &Silo) -> Result<Vec<JobDisplay>, String> {
    let jobs = silo.jobs().map_err(|e| e.to_string())?;
    let versions = silo.job_versions().map_err(|e| e.to_string())?;

    let mut rows: Vec<JobDisplay> = jobs.into_iter().map(|j| display(j, &versions)).collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rows)
}

/// Handle the jobs list subcommand
pub fn handle_jobs_list(ctx: &AppContext, format: OutputFormat) {
    let silo = open_or_exit(ctx);
    match list_jobs(&silo) {
        Ok(rows) if rows.is_empty() && format == OutputFormat::Pretty => {
            println!("No jobs cataloged. Run 'silo scan' first.");
        }
        Ok(rows) => format::print_or_exit(format::format_table(&rows, format)),
        Err(e) => format::print_or_exit(Err(e)),
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
