use crate::output::{print_json, print_table, success, warning};
use anyhow::Context;
use skillmart_core::{marketplace, registry, registry::Asset, types::AssetType};
use std::path::Path;

fn asset_rows(assets: &[Asset]) -> Vec<Vec<String>> {
    assets
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                a.asset_type.singular().to_string(),
                format!("{:.1} KB", a.size_bytes as f64 / 1024.0),
                a.description.clone(),
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// list / search
// ---------------------------------------------------------------------------

pub fn list(root: &Path, asset_type: Option<AssetType>, json: bool) -> anyhow::Result<()> {
    let assets = registry::list(root, asset_type).context("failed to list registry")?;

    if json {
        return print_json(&assets);
    }
    if assets.is_empty() {
        println!("No assets in registry.");
        return Ok(());
    }
    print_table(&["NAME", "TYPE", "SIZE", "DESCRIPTION"], asset_rows(&assets));
    Ok(())
}

pub fn search(root: &Path, query: &str, json: bool) -> anyhow::Result<()> {
    let assets = registry::search(root, query).context("failed to search registry")?;

    if json {
        return print_json(&assets);
    }
    if assets.is_empty() {
        println!("No assets match '{query}'.");
        return Ok(());
    }
    print_table(&["NAME", "TYPE", "SIZE", "DESCRIPTION"], asset_rows(&assets));
    Ok(())
}

// ---------------------------------------------------------------------------
// add / sync
// ---------------------------------------------------------------------------

pub fn add(
    root: &Path,
    source: &Path,
    asset_type: AssetType,
    name: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let asset = registry::add(root, source, asset_type, name)
        .with_context(|| format!("failed to add {}", source.display()))?;

    if json {
        print_json(&asset)?;
    } else {
        success(&format!(
            "Added {} '{}' to {}",
            asset.asset_type.singular(),
            asset.name,
            asset.registry_path().display()
        ));
    }
    Ok(())
}

pub fn sync(
    root: &Path,
    source: &Path,
    asset_type: AssetType,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let report = registry::sync(root, source, asset_type, dry_run)
        .with_context(|| format!("failed to sync from {}", source.display()))?;

    if json {
        return print_json(&report);
    }

    let verb = if dry_run { "Would add" } else { "Added" };
    for name in &report.added {
        success(&format!("{verb} {}/{name}", asset_type));
    }
    println!(
        "{verb} {} {}, skipped {} already in registry.",
        report.added.len(),
        asset_type,
        report.skipped.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// rename / delete
// ---------------------------------------------------------------------------

pub fn rename(
    root: &Path,
    old: &str,
    new: &str,
    asset_type: AssetType,
    json: bool,
) -> anyhow::Result<()> {
    let relinked = marketplace::rename_asset(root, old, new, asset_type)
        .with_context(|| format!("failed to rename {asset_type}/{old}"))?;

    if json {
        print_json(&serde_json::json!({
            "asset_type": asset_type,
            "old": old,
            "new": new,
            "relinked": relinked,
        }))?;
    } else {
        success(&format!(
            "Renamed {asset_type}/{old} to {asset_type}/{new} ({relinked} plugin link(s) updated)"
        ));
    }
    Ok(())
}

pub fn delete(
    root: &Path,
    name: &str,
    asset_type: AssetType,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    let users = marketplace::usage(root)?
        .into_iter()
        .find(|u| u.asset_type == asset_type && u.asset_name == name)
        .map(|u| u.plugins)
        .unwrap_or_default();

    marketplace::delete_asset(root, name, asset_type, force)
        .with_context(|| format!("failed to delete {asset_type}/{name}"))?;

    if json {
        print_json(&serde_json::json!({
            "asset_type": asset_type,
            "name": name,
            "unlinked_from": users,
        }))?;
    } else {
        if !users.is_empty() {
            warning(&format!("Removed links from: {}", users.join(", ")));
        }
        success(&format!("Deleted {asset_type}/{name}"));
    }
    Ok(())
}
