use crate::output::{print_json, print_table, success, warning};
use anyhow::Context;
use clap::Subcommand;
use skillmart_core::{config::Config, plugin, types::AssetType};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum EditSubcommand {
    /// Link a registry asset into a plugin
    Add {
        plugin: String,
        asset: String,
        #[arg(long = "type", short = 't')]
        asset_type: AssetType,
    },
    /// Remove an asset from a plugin
    Remove {
        plugin: String,
        asset: String,
        #[arg(long = "type", short = 't')]
        asset_type: AssetType,
    },
}

// ---------------------------------------------------------------------------
// list / create / rename
// ---------------------------------------------------------------------------

pub fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let plugins = plugin::list(root).context("failed to list plugins")?;

    if json {
        return print_json(&plugins);
    }
    if plugins.is_empty() {
        println!("No plugins.");
        return Ok(());
    }

    let rows = plugins
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                p.version.clone(),
                p.commands.len().to_string(),
                p.agents.len().to_string(),
                p.skills.len().to_string(),
                p.description.clone(),
            ]
        })
        .collect();
    print_table(
        &["PLUGIN", "VERSION", "COMMANDS", "AGENTS", "SKILLS", "DESCRIPTION"],
        rows,
    );
    Ok(())
}

pub fn create(root: &Path, name: &str, description: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let created = plugin::create(root, name, description, &config)
        .with_context(|| format!("failed to create plugin {name}"))?;

    if json {
        print_json(&created)?;
    } else {
        success(&format!(
            "Created plugin '{}' at {}",
            created.name,
            created.dir(root).display()
        ));
    }
    Ok(())
}

pub fn rename(root: &Path, old: &str, new: &str, json: bool) -> anyhow::Result<()> {
    plugin::rename(root, old, new).with_context(|| format!("failed to rename plugin {old}"))?;

    if json {
        print_json(&serde_json::json!({ "old": old, "new": new }))?;
    } else {
        success(&format!("Renamed plugin '{old}' to '{new}'"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// edit
// ---------------------------------------------------------------------------

pub fn edit(root: &Path, subcmd: EditSubcommand, json: bool) -> anyhow::Result<()> {
    let (action, plugin_name, asset, asset_type, changed) = match subcmd {
        EditSubcommand::Add {
            plugin,
            asset,
            asset_type,
        } => {
            let changed = plugin::add_asset(root, &plugin, &asset, asset_type)
                .with_context(|| format!("failed to add {asset_type}/{asset} to {plugin}"))?;
            ("added", plugin, asset, asset_type, changed)
        }
        EditSubcommand::Remove {
            plugin,
            asset,
            asset_type,
        } => {
            let changed = plugin::remove_asset(root, &plugin, &asset, asset_type)
                .with_context(|| format!("failed to remove {asset_type}/{asset} from {plugin}"))?;
            ("removed", plugin, asset, asset_type, changed)
        }
    };

    if json {
        print_json(&serde_json::json!({
            "plugin": plugin_name,
            "asset": asset,
            "asset_type": asset_type,
            "action": action,
            "changed": changed,
        }))?;
    } else if changed {
        let verb = if action == "added" { "Linked" } else { "Removed" };
        success(&format!("{verb} {asset_type}/{asset} in '{plugin_name}'"));
    } else if action == "added" {
        warning(&format!("'{plugin_name}' already has {asset_type}/{asset}"));
    } else {
        warning(&format!("'{plugin_name}' has no {asset_type}/{asset}"));
    }
    Ok(())
}
