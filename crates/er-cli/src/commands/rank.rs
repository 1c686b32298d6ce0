//! Rank command: replay an event log and print the leaders.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use er_core::{EventInput, EventRank, RankError};

use crate::Config;
use crate::commands::util::{load_snapshot, save_snapshot, write_ranked};
use crate::input;

#[derive(Debug, Args)]
pub struct RankArgs {
    /// Event log (JSON array or JSON Lines). Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,

    /// How many correspondents to show.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Apply equal-timestamp events one at a time instead of as buckets.
    #[arg(long)]
    pub sequential: bool,

    /// Only rank these correspondents (repeatable).
    #[arg(long = "include", value_name = "ID")]
    pub include: Vec<String>,

    /// Continue from a saved snapshot. Its parameters and correspondents win
    /// over the configuration.
    #[arg(long, value_name = "SNAPSHOT")]
    pub resume: Option<PathBuf>,

    /// Write the final snapshot to this path.
    #[arg(long, value_name = "SNAPSHOT")]
    pub save: Option<PathBuf>,

    /// Log and skip events the engine rejects instead of aborting.
    #[arg(long)]
    pub skip_invalid: bool,
}

/// Counts of processed input records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankSummary {
    pub applied: usize,
    pub skipped: usize,
    /// Buckets rejected after some of their events had already moved ranks.
    pub partial: usize,
}

pub fn run<W: Write>(writer: &mut W, args: &RankArgs, config: &Config) -> Result<RankSummary> {
    let inputs = input::read_events(args.input.as_deref())?;
    let inputs = if config.bucket && !args.sequential {
        input::group_by_time(inputs)
    } else {
        inputs
    };

    let mut model = match &args.resume {
        Some(path) => {
            if !args.include.is_empty() {
                tracing::warn!("--include is ignored when resuming from a snapshot");
            }
            load_snapshot(path)?
        }
        None => {
            let correspondents = er_core::event::correspondents_of(input::flatten(&inputs));
            EventRank::new(config.options(correspondents, args.include.clone()))
                .context("invalid model configuration")?
        }
    };

    let summary = apply(&mut model, inputs, args.skip_invalid)?;
    model.done();
    tracing::debug!(
        applied = summary.applied,
        skipped = summary.skipped,
        partial = summary.partial,
        total_rank = model.total_rank(),
        "ranked events"
    );

    if let Some(path) = &args.save {
        save_snapshot(&model, path)?;
    }

    write_ranked(writer, &model.top(args.top), args.json)?;
    Ok(summary)
}

fn apply(model: &mut EventRank, inputs: Vec<EventInput>, skip_invalid: bool) -> Result<RankSummary> {
    let mut summary = RankSummary::default();
    for input in inputs {
        let applied_before = model.decay_history().len();
        match model.step(input).map(|_| ()) {
            Ok(()) => summary.applied += 1,
            Err(err) if skip_invalid && is_skippable(&err) => {
                let moved = model.decay_history().len() - applied_before;
                if moved > 0 {
                    tracing::warn!(
                        error = %err,
                        applied_events = moved,
                        "bucket partially applied, skipping the rest"
                    );
                    summary.partial += 1;
                } else {
                    tracing::warn!(error = %err, "skipping event");
                    summary.skipped += 1;
                }
            }
            Err(err) => return Err(err).context("failed to rank events"),
        }
    }
    Ok(summary)
}

/// Invariant violations always abort.
const fn is_skippable(err: &RankError) -> bool {
    matches!(
        err,
        RankError::MalformedEvent { .. } | RankError::Causality { .. }
    )
}
