//! Get command: ranks of named correspondents in a saved snapshot.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::commands::util::{load_snapshot, write_ranked};

pub fn run<W: Write>(writer: &mut W, snapshot: &Path, ids: &[String], json: bool) -> Result<()> {
    let mut model = load_snapshot(snapshot)?;
    let ranked = model.get(ids);
    for id in ids {
        if !ranked.iter().any(|r| &r.id == id) {
            tracing::warn!(id = id.as_str(), "unknown correspondent");
        }
    }
    write_ranked(writer, &ranked, json)
}
