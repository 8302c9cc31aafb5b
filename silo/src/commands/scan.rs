use crate::commands::open_or_exit;
use crate::context::AppContext;
use crate::format::{self, Formattable, OutputFormat};
use libsilo::{ScanOutcome, Silo};
use serde::Serialize;

/// Scan report for display
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ScanReport {
    /// `completed` or `busy`
    pub status: String,
    pub registries: usize,
    pub images: usize,
    pub undecoded: usize,
    pub jobs: usize,
    pub job_versions: usize,
}

impl From<ScanOutcome> for ScanReport {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Completed(summary) => Self {
                status: "completed".to_string(),
                registries: summary.registries,
                images: summary.images,
                undecoded: summary.undecoded,
                jobs: summary.jobs,
                job_versions: summary.job_versions,
            },
            ScanOutcome::Busy => Self {
                status: "busy".to_string(),
                registries: 0,
                images: 0,
                undecoded: 0,
                jobs: 0,
                job_versions: 0,
            },
        }
    }
}

impl Formattable for ScanReport {
    fn format_pretty(&self) -> String {
        if self.status == "busy" {
            return "A scan is already running, try again later.".to_string();
        }
        format!(
            "Scanned {} registries: {} images, {} jobs, {} job versions",
            self.registries, self.images, self.jobs, self.job_versions
        )
    }
}

impl ScanReport {
    /// Soft failures worth flagging after the report
    pub fn warning(&self) -> Option<String> {
        (self.undecoded > 0).then(|| {
            format!(
                "{} images had no readable seed descriptor",
                self.undecoded
            )
        })
    }
}

/// Scan every registry, or only `registry`
pub(crate) async fn run_scan(silo: &Silo, registry: Option<i64>) -> Result<ScanReport, String> {
    let outcome = match registry {
        Some(id) => silo.scan_registry(id).await,
        None => silo.scan().await,
    };
    outcome.map(ScanReport::from).map_err(|e| e.to_string())
}

/// Handle the scan command
pub async fn handle_scan(ctx: &AppContext, registry: Option<i64>, format: OutputFormat) {
    let silo = open_or_exit(ctx);
    let formatter = format::create_formatter();

    let spinner = formatter.spinner("Scanning registries...");
    let result = run_scan(&silo, registry).await;
    spinner.finish_and_clear();

    let warning = result
        .as_ref()
        .ok()
        .and_then(ScanReport::warning)
        .filter(|_| format == OutputFormat::Pretty);
    let output = result.and_then(|report| format::format_output(&report, format));
    format::print_or_exit(output);
    if let Some(message) = warning {
        formatter.warning(&message);
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
