use super::*;
use crate::commands::open_or_exit;
use crate::context::AppContext;
use crate::format::{self, OutputFormat};

/// Handle the registry add subcommand
///
/// Prompts for the password when a username is given without one.
pub async fn handle_registry_add(
    ctx: &AppContext,
    name: &str,
    url: &str,
    org: Option<&str>,
    username: Option<&str>,
    password: Option<&str>,
) {
    let formatter = format::create_formatter();
    let password = match (username, password) {
        (Some(_), None) => match rpassword::prompt_password("Password: ") {
            Ok(p) => p,
            Err(e) => {
                formatter.error(&format!("Failed to read password: {}", e));
                std::process::exit(1);
            }
        },
        (_, p) => p.unwrap_or_default().to_string(),
    };

    let silo = open_or_exit(ctx);
    let record = RegistryRecord::new(
        name,
        url,
        org.unwrap_or_default(),
        username.unwrap_or_default(),
        password,
    );

    let spinner = formatter.spinner(&format!("Connecting to {}...", url));
    let result = add_registry(&silo, record).await;
    spinner.finish_and_clear();

    match result {
        Ok(id) => formatter.success(&format!("Added registry '{}' with id {}", name, id)),
        Err(e) => {
            formatter.error(&e);
            std::process::exit(1);
        }
    }
}

/// Handle the registry list subcommand
pub fn handle_registry_list(ctx: &AppContext, format: OutputFormat) {
    let silo = open_or_exit(ctx);
    match list_registries(&silo) {
        Ok(registries) if registries.is_empty() && format == OutputFormat::Pretty => {
            println!("No registries configured.");
        }
        Ok(registries) => format::print_or_exit(format::format_table(&registries, format)),
        Err(e) => format::print_or_exit(Err(e)),
    }
}

/// Handle the registry remove subcommand
pub fn handle_registry_remove(ctx: &AppContext, id: i64) {
    let silo = open_or_exit(ctx);
    let formatter = format::create_formatter();
    match remove_registry(&silo, id) {
        Ok(record) => formatter.success(&format!("Removed registry '{}'", record.name)),
        Err(e) => {
            formatter.error(&e);
            std::process::exit(1);
        }
    }
}

/// Handle the registry check subcommand
pub async fn handle_registry_check(ctx: &AppContext, id: i64, format: OutputFormat) {
    let silo = open_or_exit(ctx);
    let output = match check_registry(&silo, id).await {
        Ok(result) => format::format_output(&result, format),
        Err(e) => Err(e),
    };
    format::print_or_exit(output);
}
