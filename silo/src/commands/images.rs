use crate::commands::open_or_exit;
use crate::context::AppContext;
use crate::format::{self, OutputFormat};
use libsilo::{Image, Silo};
use serde::Serialize;
use tabled::Tabled;

/// Image row for listings
#[derive(Debug, Tabled, Serialize)]
pub struct ImageDisplay {
    #[tabled(rename = "IMAGE")]
    pub name: String,
    #[tabled(rename = "JOB")]
    pub job: String,
    #[tabled(rename = "VERSION")]
    pub job_version: String,
    #[tabled(rename = "PACKAGE")]
    pub package_version: String,
    #[tabled(rename = "REGISTRY")]
    pub registry: String,
}

impl From<Image> for ImageDisplay {
    fn from(image: Image) -> Self {
        Self {
            name: image.full_name,
            job: image.short_name,
            job_version: image.job_version,
            package_version: image.package_version,
            registry: image.registry,
        }
    }
}

/// Cataloged images, optionally for one job
pub(crate) fn list_images(silo: &Silo, job: Option<&str>) -> Result<Vec<ImageDisplay>, String> {
    silo.images(job)
        .map(|images| images.into_iter().map(ImageDisplay::from).collect())
        .map_err(|e| e.to_string())
}

/// Handle the images list subcommand
pub fn handle_images_list(ctx: &AppContext, job: Option<&str>, format: OutputFormat) {
    let silo = open_or_exit(ctx);
    match list_images(&silo, job) {
        Ok(rows) if rows.is_empty() && format == OutputFormat::Pretty => {
            println!("No images found.");
        }
        Ok(rows) => format::print_or_exit(format::format_table(&rows, format)),
        Err(e) => format::print_or_exit(Err(e)),
    }
}
