use crate::output::{failure, heading, print_json, success};
use anyhow::Context;
use clap::Subcommand;
use skillmart_core::{
    config::Config,
    io,
    openapi::{
        self,
        errors::{self, ErrorSchemaRequest, SchemaKind},
        naming::{self, NamingReport, Scope},
        validate::{self, Report},
    },
    types::{OutputFormat, Severity},
};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ApiSubcommand {
    /// Lint an OpenAPI document against the REST design rules
    Validate {
        spec: PathBuf,
        /// Minimum severity to report: ERROR, WARNING, or INFO
        #[arg(long, default_value = "WARNING")]
        severity: Severity,
    },

    /// Check path, parameter, field, and enum naming
    Naming {
        spec: PathBuf,
        /// all, paths, parameters, fields, or enums
        #[arg(long = "type", default_value = "all")]
        scope: Scope,
    },

    /// Generate RFC 9457 error schemas
    Errors {
        /// standard, business, responses, or catalog
        #[arg(long = "type")]
        kind: SchemaKind,
        /// Business error code (business)
        #[arg(long)]
        code: Option<String>,
        /// Business error title (business)
        #[arg(long)]
        title: Option<String>,
        /// Extra string fields, comma-separated (business)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// API name (catalog)
        #[arg(long)]
        api_name: Option<String>,
        /// API base path (catalog)
        #[arg(long)]
        base_path: Option<String>,
        /// json or yaml
        #[arg(long, default_value = "json")]
        format: OutputFormat,
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ApiSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ApiSubcommand::Validate { spec, severity } => validate_spec(&spec, severity, json),
        ApiSubcommand::Naming { spec, scope } => check_naming(&spec, scope, json),
        ApiSubcommand::Errors {
            kind,
            code,
            title,
            fields,
            api_name,
            base_path,
            format,
            output,
        } => {
            let req = ErrorSchemaRequest {
                code,
                title,
                fields,
                api_name,
                base_path,
            };
            generate_errors(root, kind, &req, format, output.as_deref())
        }
    }
}

fn load(spec: &Path) -> anyhow::Result<serde_yaml::Value> {
    openapi::load(spec).with_context(|| format!("failed to load {}", spec.display()))
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate_spec(spec: &Path, min: Severity, json: bool) -> anyhow::Result<()> {
    let doc = load(spec)?;
    let report = Report::new(spec.display().to_string(), validate::validate(&doc), min);

    if json {
        print_json(&report)?;
    } else if report.issues.is_empty() {
        success(&format!("{}: no issues found", report.file));
    } else {
        heading(&format!("{}: {} issue(s)", report.file, report.total_issues));
        for severity in Severity::all() {
            let group = report.by_severity(*severity);
            if group.is_empty() {
                continue;
            }
            println!();
            println!("{} ({})", severity, group.len());
            for issue in group {
                println!("{issue}");
            }
        }
    }

    if report.has_errors() {
        anyhow::bail!("{} has validation errors", report.file);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// naming
// ---------------------------------------------------------------------------

fn check_naming(spec: &Path, scope: Scope, json: bool) -> anyhow::Result<()> {
    let doc = load(spec)?;
    let report = NamingReport::new(spec.display().to_string(), naming::check(&doc, scope));

    if json {
        print_json(&report)?;
    } else if report.issues.is_empty() {
        success(&format!("{}: naming follows conventions", report.file));
    } else {
        heading(&format!("{}: {} naming issue(s)", report.file, report.total_issues));
        for (issue_type, issues) in report.grouped() {
            println!();
            println!("{issue_type} ({})", issues.len());
            for issue in issues {
                failure(&issue.to_string());
            }
        }
    }

    if report.total_issues > 0 {
        anyhow::bail!("{} has naming issues", report.file);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// errors
// ---------------------------------------------------------------------------

fn generate_errors(
    root: &Path,
    kind: SchemaKind,
    req: &ErrorSchemaRequest,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let doc = errors::generate(kind, req, &config.errors.base_uri)?;
    let body = errors::render(&doc, format)?;

    match output {
        Some(path) => {
            io::atomic_write(path, body.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            success(&format!("Wrote error schemas to {}", path.display()));
        }
        None => print!("{body}"),
    }
    Ok(())
}
