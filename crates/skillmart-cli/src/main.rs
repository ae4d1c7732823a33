mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    api::ApiSubcommand, config::ConfigSubcommand, flag::FlagSubcommand, plugin::EditSubcommand,
    secrets::SecretsSubcommand,
};
use skillmart_core::types::AssetType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "skillmart",
    about = "Manage a skill marketplace: registry assets, plugins, and content tooling",
    version,
    propagate_version = true
)]
struct Cli {
    /// Marketplace root (default: auto-detect from registry/ or plugins/)
    #[arg(long, global = true, env = "SKILLMART_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show marketplace statistics, plugins, and health
    Dashboard,

    /// List registry assets
    List {
        /// Only list one asset type (commands, agents, skills)
        #[arg(long = "type", short = 't')]
        asset_type: Option<AssetType>,
    },

    /// List plugins and their asset counts
    Plugins,

    /// Show which plugins use each asset
    Usage,

    /// Search assets by name or description
    Search { query: String },

    /// List assets no plugin uses
    Orphans,

    /// List assets used by more than one plugin
    Shared,

    /// Copy a file or directory into the registry
    Add {
        source: PathBuf,
        #[arg(long = "type", short = 't')]
        asset_type: AssetType,
        /// Registry name (default: source file stem)
        #[arg(long, short = 'n')]
        name: Option<String>,
    },

    /// Create an empty plugin
    Create {
        name: String,
        #[arg(long, short = 'd', default_value = "")]
        description: String,
    },

    /// Add or remove assets from a plugin
    Edit {
        #[command(subcommand)]
        subcommand: EditSubcommand,
    },

    /// Rename a registry asset and relink every plugin using it
    Rename {
        old: String,
        new: String,
        #[arg(long = "type", short = 't')]
        asset_type: AssetType,
    },

    /// Rename a plugin
    RenamePlugin { old: String, new: String },

    /// Delete a registry asset
    Delete {
        name: String,
        #[arg(long = "type", short = 't')]
        asset_type: AssetType,
        /// Delete even when plugins still link to the asset
        #[arg(long)]
        force: bool,
    },

    /// Check every plugin link
    Validate,

    /// Fix or remove broken plugin links
    Repair {
        #[arg(long)]
        dry_run: bool,
        /// Remove broken links instead of re-pointing them
        #[arg(long)]
        remove_only: bool,
    },

    /// Recreate plugin links from the registry
    Rebuild {
        #[arg(long, short = 'p')]
        plugin: Option<String>,
    },

    /// Link assets into plugins from a YAML manifest
    Link { manifest: PathBuf },

    /// Move plugin-local assets into the registry and link them back
    Migrate,

    /// Export the marketplace catalog as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Import every new asset from a directory
    Sync {
        source: PathBuf,
        #[arg(long = "type", short = 't')]
        asset_type: AssetType,
        #[arg(long)]
        dry_run: bool,
    },

    /// Feature-flag config generation and test coverage
    Flag {
        #[command(subcommand)]
        subcommand: FlagSubcommand,
    },

    /// OpenAPI linting and error-schema generation
    Api {
        #[command(subcommand)]
        subcommand: ApiSubcommand,
    },

    /// Scan for hardcoded secrets
    Secrets {
        #[command(subcommand)]
        subcommand: SecretsSubcommand,
    },

    /// Inspect and validate .skillmart.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color || cli.json {
        colored::control::set_override(false);
    }

    let root = root::resolve_root(cli.root.as_deref());
    let json = cli.json;

    let result = match cli.command {
        Commands::Dashboard => cmd::health::dashboard(&root, json),
        Commands::List { asset_type } => cmd::asset::list(&root, asset_type, json),
        Commands::Plugins => cmd::plugin::list(&root, json),
        Commands::Usage => cmd::health::usage(&root, json),
        Commands::Search { query } => cmd::asset::search(&root, &query, json),
        Commands::Orphans => cmd::health::orphans(&root, json),
        Commands::Shared => cmd::health::shared(&root, json),
        Commands::Add {
            source,
            asset_type,
            name,
        } => cmd::asset::add(&root, &source, asset_type, name.as_deref(), json),
        Commands::Create { name, description } => {
            cmd::plugin::create(&root, &name, &description, json)
        }
        Commands::Edit { subcommand } => cmd::plugin::edit(&root, subcommand, json),
        Commands::Rename {
            old,
            new,
            asset_type,
        } => cmd::asset::rename(&root, &old, &new, asset_type, json),
        Commands::RenamePlugin { old, new } => cmd::plugin::rename(&root, &old, &new, json),
        Commands::Delete {
            name,
            asset_type,
            force,
        } => cmd::asset::delete(&root, &name, asset_type, force, json),
        Commands::Validate => cmd::health::validate(&root, json),
        Commands::Repair {
            dry_run,
            remove_only,
        } => cmd::health::repair(&root, dry_run, remove_only, json),
        Commands::Rebuild { plugin } => cmd::health::rebuild(&root, plugin.as_deref(), json),
        Commands::Link { manifest } => cmd::health::link(&root, &manifest, json),
        Commands::Migrate => cmd::health::migrate(&root, json),
        Commands::Export { output } => cmd::health::export(&root, output.as_deref()),
        Commands::Sync {
            source,
            asset_type,
            dry_run,
        } => cmd::asset::sync(&root, &source, asset_type, dry_run, json),
        Commands::Flag { subcommand } => cmd::flag::run(&root, subcommand, json),
        Commands::Api { subcommand } => cmd::api::run(&root, subcommand, json),
        Commands::Secrets { subcommand } => cmd::secrets::run(&root, subcommand, json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
