/// Image command handlers
pub mod images;

/// Job command handlers
pub mod jobs;

/// Registry command handlers and logic
pub mod registry;

/// Scan command handlers
pub mod scan;

/// Version command handlers
pub mod version;

use crate::context::AppContext;
use crate::format;
use libsilo::Silo;

/// Open the catalog, or report the error and exit
pub(crate) fn open_or_exit(ctx: &AppContext) -> Silo {
    match ctx.open_silo() {
        Ok(silo) => silo,
        Err(e) => {
            format::create_formatter().error(&e);
            std::process::exit(1);
        }
    }
}
