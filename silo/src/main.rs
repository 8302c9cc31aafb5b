use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod context;
mod format;

/// Silo - Seed Image Catalog
///
/// Scans container registries for seed images and catalogs the jobs they
/// implement.
#[derive(Parser, Debug)]
#[command(name = "silo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (default: ~/.config/silo/config.yaml)
    #[arg(short, long, global = true, env = "SILO_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog file, overriding the configured one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Display version information
    Version,
    /// Manage registries
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },
    /// Scan registries and rebuild the job catalog
    Scan {
        /// Only rescan the registry with this id
        #[arg(short, long)]
        registry: Option<i64>,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Explore cataloged jobs
    Jobs {
        #[command(subcommand)]
        command: JobsCommands,
    },
    /// Explore cataloged images
    Images {
        #[command(subcommand)]
        command: ImagesCommands,
    },
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum RegistryCommands {
    /// Add a registry after checking it can be reached
    Add {
        /// Registry name
        name: String,
        /// Registry URL
        url: String,
        /// Organization, group or namespace to scan
        #[arg(short, long)]
        org: Option<String>,
        /// Username
        #[arg(short, long)]
        username: Option<String>,
        /// Password or access token (will prompt if a username is given)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// List all registries
    #[command(visible_alias = "ls")]
    List {
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Remove a registry and its images
    #[command(visible_alias = "rm")]
    Remove {
        /// Registry id
        id: i64,
    },
    /// Check registry connectivity
    Check {
        /// Registry id
        id: i64,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
enum JobsCommands {
    /// List cataloged jobs
    #[command(visible_alias = "ls")]
    List {
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
enum ImagesCommands {
    /// List cataloged images
    #[command(visible_alias = "ls")]
    List {
        /// Only images of this job
        #[arg(short, long)]
        job: Option<String>,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            commands::version::print_version();
            return;
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            return;
        }
        _ => {}
    }

    let ctx = match context::AppContext::build(
        cli.config.as_deref(),
        cli.catalog,
        context::VerbosityLevel::from_count(cli.verbose),
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            format::create_formatter().error(&e);
            std::process::exit(1);
        }
    };
    ctx.init_logging();
    tracing::debug!(config = ?ctx.config, "resolved configuration");

    match cli.command {
        Commands::Registry { command } => match command {
            RegistryCommands::Add {
                name,
                url,
                org,
                username,
                password,
            } => {
                commands::registry::handlers::handle_registry_add(
                    &ctx,
                    &name,
                    &url,
                    org.as_deref(),
                    username.as_deref(),
                    password.as_deref(),
                )
                .await;
            }
            RegistryCommands::List { format } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::registry::handlers::handle_registry_list(&ctx, fmt);
            }
            RegistryCommands::Remove { id } => {
                commands::registry::handlers::handle_registry_remove(&ctx, id);
            }
            RegistryCommands::Check { id, format } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::registry::handlers::handle_registry_check(&ctx, id, fmt).await;
            }
        },
        Commands::Scan { registry, format } => {
            let fmt = format::OutputFormat::from(format.as_str());
            commands::scan::handle_scan(&ctx, registry, fmt).await;
        }
        Commands::Jobs { command } => match command {
            JobsCommands::List { format } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::jobs::handle_jobs_list(&ctx, fmt);
            }
        },
        Commands::Images { command } => match command {
            ImagesCommands::List { job, format } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::images::handle_images_list(&ctx, job.as_deref(), fmt);
            }
        },
        Commands::Version | Commands::Completion { .. } => {}
    }
}
