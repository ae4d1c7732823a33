use crate::output::{failure, heading, print_json, success, warning};
use anyhow::Context;
use clap::Subcommand;
use skillmart_core::{
    config::Config,
    io,
    secrets::{self, Finding, SecretsReport},
};
use std::path::{Path, PathBuf};

const PREVIEW_LIMIT: usize = 10;

#[derive(Subcommand)]
pub enum SecretsSubcommand {
    /// Scan files for hardcoded credentials
    Scan {
        /// File or directory to scan
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Write the JSON report to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// JSON file of custom patterns (replaces the defaults)
        #[arg(long)]
        patterns: Option<PathBuf>,
    },
}

pub fn run(root: &Path, subcmd: SecretsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SecretsSubcommand::Scan {
            path,
            output,
            patterns,
        } => scan(root, &path, output.as_deref(), patterns.as_deref(), json),
    }
}

fn scan(
    root: &Path,
    path: &Path,
    output: Option<&Path>,
    patterns_file: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    let configured = config.secrets.patterns_file.as_ref().map(|p| root.join(p));
    let patterns = match patterns_file.or(configured.as_deref()) {
        Some(p) => secrets::load_patterns(p)
            .with_context(|| format!("failed to load patterns from {}", p.display()))?,
        None => secrets::default_patterns()?,
    };

    let report = secrets::scan(path, &patterns, &config)
        .with_context(|| format!("failed to scan {}", path.display()))?;

    if let Some(out) = output {
        let mut data = serde_json::to_string_pretty(&report)?;
        data.push('\n');
        io::atomic_write(out, data.as_bytes())
            .with_context(|| format!("failed to write {}", out.display()))?;
    }

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
        if let Some(out) = output {
            println!();
            println!("Full report written to {}", out.display());
        }
    }

    if report.summary.requires_review > 0 {
        anyhow::bail!(
            "{} high-confidence finding(s) require review",
            report.summary.requires_review
        );
    }
    Ok(())
}

fn print_finding(f: &Finding) {
    println!("    {}:{} [{}] {}", f.file, f.line, f.pattern, f.matched);
}

fn print_report(report: &SecretsReport) {
    let s = &report.summary;
    heading("Secrets Scan");
    println!("  Total matches:        {}", s.total_matches);
    println!("  High confidence:      {}", s.high_confidence);
    println!("  Likely test fixtures: {}", s.likely_test_fixtures);
    println!("  Requires review:      {}", s.requires_review);
    println!();

    if s.total_matches == 0 {
        success("No potential secrets found");
        return;
    }

    let review = report.needs_review();
    if !review.is_empty() {
        failure("High confidence, review required:");
        review.iter().for_each(|f| print_finding(f));
    }

    let fixtures = report.test_fixtures();
    if !fixtures.is_empty() {
        warning(&format!("Likely test fixtures ({}):", fixtures.len()));
        fixtures.iter().take(PREVIEW_LIMIT).for_each(|f| print_finding(f));
        if fixtures.len() > PREVIEW_LIMIT {
            println!("    ... and {} more", fixtures.len() - PREVIEW_LIMIT);
        }
    }

    let others = report.others();
    if !others.is_empty() {
        warning(&format!("Lower confidence ({}):", others.len()));
        others.iter().take(PREVIEW_LIMIT).for_each(|f| print_finding(f));
        if others.len() > PREVIEW_LIMIT {
            println!("    ... and {} more", others.len() - PREVIEW_LIMIT);
        }
    }
}
