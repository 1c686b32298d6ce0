//! Top command: leaders of a saved snapshot.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::commands::util::{load_snapshot, write_ranked};

pub fn run<W: Write>(writer: &mut W, snapshot: &Path, n: usize, json: bool) -> Result<()> {
    let mut model = load_snapshot(snapshot)?;
    model.done();
    write_ranked(writer, &model.top(n), json)
}
