//! Shared utilities for CLI commands.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use er_core::{EventRank, Ranked};

/// Loads a model from a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<EventRank> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    EventRank::from_json(&json).with_context(|| format!("invalid snapshot {}", path.display()))
}

/// Writes a pretty-printed snapshot, creating parent directories.
pub fn save_snapshot(model: &EventRank, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = model.to_json(true).context("failed to serialize snapshot")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    tracing::debug!(path = %path.display(), "saved snapshot");
    Ok(())
}

/// Writes ranked correspondents as a table or as JSON.
pub fn write_ranked<W: Write>(writer: &mut W, ranked: &[Ranked], json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *writer, ranked)?;
        writeln!(writer)?;
        return Ok(());
    }

    if ranked.is_empty() {
        writeln!(writer, "No correspondents ranked.")?;
        return Ok(());
    }

    let width = ranked
        .iter()
        .map(|r| r.id.chars().count())
        .max()
        .unwrap_or(0)
        .max("CORRESPONDENT".len());

    writeln!(writer, "{:<4}  {:<width$}  VALUE", "RANK", "CORRESPONDENT")?;
    for (position, entry) in ranked.iter().enumerate() {
        writeln!(
            writer,
            "{:<4}  {:<width$}  {:.6}",
            position + 1,
            entry.id,
            entry.value
        )?;
    }
    Ok(())
}
