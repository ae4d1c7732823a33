use crate::output::{failure, heading, print_json, print_table, success, warning};
use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use skillmart_core::{
    config::Config,
    flags::{self, config as flag_config, CoverageStatus, FlagRequest, FlagType},
    types::OutputFormat,
};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum FlagSubcommand {
    /// Generate a feature-flag config file
    New {
        /// Flag name
        #[arg(long = "flag")]
        name: String,
        /// Flag type: release, experiment, ops, or permission
        #[arg(long = "type", default_value = "release")]
        flag_type: FlagType,
        /// Start enabled regardless of the type default
        #[arg(long)]
        enabled: bool,
        /// Rollout percentage (0-100)
        #[arg(long, allow_negative_numbers = true)]
        rollout: Option<i64>,
        /// Comma-separated environment names
        #[arg(long, value_delimiter = ',')]
        environments: Option<Vec<String>>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// ts, json, or yaml (default: from --output extension, else ts)
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Output file (default: <flag>.flag.<ext>)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,
        /// Print the config instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

    /// Report which flags have enabled and disabled test contexts
    Coverage {
        /// Directory to scan
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
        /// Exit 1 unless every flag is fully tested
        #[arg(long)]
        fail_on_missing: bool,
        /// Exit 1 when coverage is below this percentage
        #[arg(long)]
        threshold: Option<u32>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: FlagSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    match subcmd {
        FlagSubcommand::New {
            name,
            flag_type,
            enabled,
            rollout,
            environments,
            owner,
            description,
            format,
            output,
            force,
            stdout,
        } => {
            let req = FlagRequest {
                name,
                flag_type,
                enabled,
                rollout,
                environments,
                owner,
                description,
            };
            new(&config, &req, format, output.as_deref(), force, stdout, json)
        }
        FlagSubcommand::Coverage {
            path,
            format,
            fail_on_missing,
            threshold,
        } => {
            let as_json = json || format == ReportFormat::Json;
            coverage(&config, &path, as_json, fail_on_missing, threshold)
        }
    }
}

// ---------------------------------------------------------------------------
// new
// ---------------------------------------------------------------------------

fn new(
    config: &Config,
    req: &FlagRequest,
    format: Option<OutputFormat>,
    output: Option<&Path>,
    force: bool,
    stdout: bool,
    json: bool,
) -> anyhow::Result<()> {
    let flag = flag_config::build(req, &config.flags)?;
    let format = flag_config::resolve_format(format, output);

    if stdout {
        print!("{}", flag_config::render(&flag, format)?);
        return Ok(());
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| flag_config::default_output(&flag.name, format));
    flag_config::write(&flag, &path, format, force)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "flag": flag,
            "path": path,
            "format": format,
        }))?;
    } else {
        success(&format!(
            "Created {} flag '{}' at {}",
            flag.flag_type.as_str(),
            flag.name,
            path.display()
        ));
        if flag.temporary {
            println!("  Temporary flag: remove it once fully rolled out.");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// coverage
// ---------------------------------------------------------------------------

fn coverage(
    config: &Config,
    path: &Path,
    json: bool,
    fail_on_missing: bool,
    threshold: Option<u32>,
) -> anyhow::Result<()> {
    let report = flags::coverage::scan(path, config)
        .with_context(|| format!("failed to scan {}", path.display()))?;

    if json {
        print_json(&report)?;
    } else {
        heading("Feature Flag Test Coverage");
        println!("  Total flags:      {}", report.total);
        println!("  Fully tested:     {}", report.fully_tested);
        println!("  Partially tested: {}", report.partially_tested);
        println!("  Untested:         {}", report.untested);
        println!("  Coverage:         {}%", report.coverage_percent);
        println!();

        if !report.flags.is_empty() {
            let rows = report
                .flags
                .iter()
                .map(|f| {
                    vec![
                        f.name.clone(),
                        f.status.to_string(),
                        yes_no(f.enabled_tested),
                        yes_no(f.disabled_tested),
                        f.sources.len().to_string(),
                    ]
                })
                .collect();
            print_table(&["FLAG", "STATUS", "ENABLED", "DISABLED", "SOURCES"], rows);
            println!();
        }

        for f in &report.flags {
            match f.status {
                CoverageStatus::FullyTested => {}
                CoverageStatus::PartiallyTested => {
                    let hint = match (f.enabled_tested, f.disabled_tested) {
                        (true, true) => "enabled and disabled cases are in different test files",
                        (true, false) => "add a test with the flag disabled",
                        _ => "add a test with the flag enabled",
                    };
                    warning(&format!("{}: {hint}", f.name));
                }
                CoverageStatus::Untested => {
                    failure(&format!("{}: no tests mention this flag", f.name));
                }
            }
        }
    }

    if !report.passes(fail_on_missing, threshold) {
        match threshold {
            Some(t) if report.coverage_percent < t => anyhow::bail!(
                "flag coverage {}% is below threshold {t}%",
                report.coverage_percent
            ),
            _ => anyhow::bail!(
                "{} of {} flag(s) are not fully tested",
                report.total - report.fully_tested,
                report.total
            ),
        }
    }
    Ok(())
}

fn yes_no(b: bool) -> String {
    if b { "yes" } else { "no" }.to_string()
}
