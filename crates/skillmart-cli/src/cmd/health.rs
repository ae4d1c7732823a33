use crate::output::{failure, heading, print_json, print_table, success, warning};
use anyhow::Context;
use skillmart_core::{
    config::Config,
    io, marketplace,
    marketplace::{IssueKind, UsageInfo},
    plugin,
};
use std::path::Path;

const DASHBOARD_PREVIEW: usize = 3;

fn usage_rows(usage: &[UsageInfo]) -> Vec<Vec<String>> {
    usage
        .iter()
        .map(|u| {
            vec![
                u.asset_name.clone(),
                u.asset_type.singular().to_string(),
                u.usage_count().to_string(),
                u.plugins.join(", "),
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// dashboard
// ---------------------------------------------------------------------------

pub fn dashboard(root: &Path, json: bool) -> anyhow::Result<()> {
    let stats = marketplace::stats(root).context("failed to compute stats")?;
    let plugins = plugin::list(root)?;
    let orphans = marketplace::orphans(root)?;
    let shared = marketplace::shared(root)?;
    let (valid, issues) = marketplace::validate(root)?;

    if json {
        let orphan_preview: Vec<&UsageInfo> = orphans.iter().take(DASHBOARD_PREVIEW).collect();
        let shared_preview: Vec<&UsageInfo> = shared.iter().take(DASHBOARD_PREVIEW).collect();
        return print_json(&serde_json::json!({
            "stats": stats,
            "plugins": plugins,
            "orphans": orphan_preview,
            "shared": shared_preview,
            "links_valid": valid,
            "link_issues": issues.len(),
        }));
    }

    heading("Marketplace");
    println!(
        "  Assets:  {} ({} commands, {} agents, {} skills)",
        stats.total_assets, stats.commands, stats.agents, stats.skills
    );
    println!(
        "  Plugins: {} (avg {:.1} assets each)",
        stats.plugins, stats.avg_assets_per_plugin
    );
    println!("  Size:    {} KB", stats.total_size_kb);
    println!();

    heading("Plugins");
    if plugins.is_empty() {
        println!("  none");
    }
    for p in &plugins {
        println!(
            "  {:<24} {} commands, {} agents, {} skills",
            p.name,
            p.commands.len(),
            p.agents.len(),
            p.skills.len()
        );
    }
    println!();

    heading("Health");
    if orphans.is_empty() {
        success("No orphaned assets");
    } else {
        warning(&format!("{} orphaned asset(s)", orphans.len()));
        for u in orphans.iter().take(DASHBOARD_PREVIEW) {
            println!("    {}/{}", u.asset_type, u.asset_name);
        }
    }
    if !shared.is_empty() {
        println!("  {} shared asset(s)", shared.len());
        for u in shared.iter().take(DASHBOARD_PREVIEW) {
            println!(
                "    {}/{} ({} plugins)",
                u.asset_type,
                u.asset_name,
                u.usage_count()
            );
        }
    }
    if valid {
        success("All plugin links valid");
    } else {
        let broken = issues.iter().filter(|i| i.kind == IssueKind::Broken).count();
        failure(&format!("{broken} broken link(s); run `skillmart repair`"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// usage / orphans / shared
// ---------------------------------------------------------------------------

pub fn usage(root: &Path, json: bool) -> anyhow::Result<()> {
    let usage = marketplace::usage(root).context("failed to compute usage")?;

    if json {
        return print_json(&usage);
    }
    if usage.is_empty() {
        println!("No assets in registry.");
        return Ok(());
    }
    print_table(&["ASSET", "TYPE", "USED BY", "PLUGINS"], usage_rows(&usage));
    Ok(())
}

pub fn orphans(root: &Path, json: bool) -> anyhow::Result<()> {
    let orphans = marketplace::orphans(root).context("failed to compute usage")?;

    if json {
        return print_json(&orphans);
    }
    if orphans.is_empty() {
        success("Every asset is used by at least one plugin.");
        return Ok(());
    }
    for u in &orphans {
        println!("{}/{}", u.asset_type, u.asset_name);
    }
    println!("{} orphaned asset(s)", orphans.len());
    Ok(())
}

pub fn shared(root: &Path, json: bool) -> anyhow::Result<()> {
    let shared = marketplace::shared(root).context("failed to compute usage")?;

    if json {
        return print_json(&shared);
    }
    if shared.is_empty() {
        println!("No asset is shared between plugins.");
        return Ok(());
    }
    print_table(&["ASSET", "TYPE", "USED BY", "PLUGINS"], usage_rows(&shared));
    Ok(())
}

// ---------------------------------------------------------------------------
// validate / repair / rebuild
// ---------------------------------------------------------------------------

pub fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let (valid, issues) = marketplace::validate(root).context("failed to validate links")?;

    if json {
        print_json(&serde_json::json!({
            "valid": valid,
            "issues": issues,
        }))?;
    } else if issues.is_empty() {
        success("All plugin links valid.");
    } else {
        for issue in &issues {
            let line = format!("{}: {}", issue.path.display(), issue.message);
            match issue.kind {
                IssueKind::Broken => failure(&line),
                IssueKind::Warning => warning(&line),
            }
        }
    }

    if !valid {
        anyhow::bail!("link validation found broken links");
    }
    Ok(())
}

pub fn repair(root: &Path, dry_run: bool, remove_only: bool, json: bool) -> anyhow::Result<()> {
    let report =
        marketplace::repair(root, dry_run, remove_only).context("failed to repair links")?;

    if json {
        return print_json(&report);
    }
    if report.broken == 0 {
        success("No broken links.");
        return Ok(());
    }

    let prefix = if dry_run { "[dry-run] " } else { "" };
    for (link, target) in &report.fixed {
        success(&format!(
            "{prefix}{} -> {}",
            link.display(),
            target.display()
        ));
    }
    for link in &report.removed {
        warning(&format!("{prefix}removed {}", link.display()));
    }
    println!(
        "{prefix}{} broken, {} fixed, {} removed",
        report.broken,
        report.fixed.len(),
        report.removed.len()
    );
    Ok(())
}

pub fn rebuild(root: &Path, plugin: Option<&str>, json: bool) -> anyhow::Result<()> {
    let relinked = marketplace::rebuild(root, plugin).context("failed to rebuild links")?;

    if json {
        print_json(&serde_json::json!({ "relinked": relinked }))?;
    } else {
        success(&format!("Rebuilt {relinked} link(s)"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// link / migrate / export
// ---------------------------------------------------------------------------

pub fn link(root: &Path, manifest_path: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = marketplace::load_link_manifest(manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    let config = Config::load(root).context("failed to load config")?;
    let report = marketplace::link_manifest(root, &manifest, &config)?;

    if json {
        return print_json(&report);
    }
    for name in &report.created {
        success(&format!("Created plugin '{name}'"));
    }
    for entry in &report.missing {
        warning(&format!("Not in registry: {entry}"));
    }
    println!(
        "Linked {} asset(s) across {} plugin(s)",
        report.linked.len(),
        manifest.len()
    );
    Ok(())
}

pub fn migrate(root: &Path, json: bool) -> anyhow::Result<()> {
    let report = marketplace::migrate(root).context("failed to migrate plugins")?;

    if json {
        return print_json(&report);
    }
    for entry in &report.moved {
        success(&format!("Moved {entry} into registry"));
    }
    for entry in &report.duplicates {
        warning(&format!("Dropped duplicate {entry}"));
    }
    println!(
        "Moved {}, dropped {} duplicate(s), created {} link(s)",
        report.moved.len(),
        report.duplicates.len(),
        report.linked
    );
    Ok(())
}

pub fn export(root: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let export = marketplace::export(root).context("failed to export marketplace")?;

    match output {
        Some(path) => {
            let mut data = serde_json::to_string_pretty(&export)?;
            data.push('\n');
            io::atomic_write(path, data.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Exported catalog to {}", path.display());
            Ok(())
        }
        None => print_json(&export),
    }
}
