//! Construction options.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::decay::ONE_DAY;
use crate::event::Event;
use crate::model::{DEFAULT_FLOW, ModelKind};
use crate::types::{CorrespondenceEntry, DecayEntry, Rank};

/// Everything needed to build an [`EventRank`](crate::EventRank).
///
/// Field names on the wire match snapshots produced by
/// [`EventRank::to_json`](crate::EventRank::to_json), so a parsed snapshot is
/// a valid set of options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Correspondent universe. Derived from `events` when absent.
    #[serde(default)]
    pub correspondents: Option<Vec<String>>,

    /// Events replayed by `compute`.
    #[serde(default)]
    pub events: Vec<Event>,

    /// Precomputed ranks. Start ranks are assigned when absent.
    #[serde(default)]
    pub ranks: Option<BTreeMap<String, Rank>>,

    #[serde(default, rename = "correspondanceMatrix")]
    pub correspondence_matrix: Option<BTreeMap<String, CorrespondenceEntry>>,

    #[serde(default)]
    pub decay_history: Option<Vec<DecayEntry>>,

    #[serde(default)]
    pub model: ModelKind,

    /// Recharge constant `G`, in event time units.
    #[serde(default = "default_duration", rename = "G")]
    pub recharge: f64,

    /// Half-life constant `H`, in event time units.
    #[serde(default = "default_duration", rename = "H")]
    pub half_life: f64,

    /// Flow fraction `f`.
    #[serde(default = "default_flow", rename = "f")]
    pub flow: f64,

    /// Ids to rank. Everyone else is ignored as sender and recipient.
    #[serde(default)]
    pub include: Option<BTreeSet<String>>,
}

const fn default_duration() -> f64 {
    ONE_DAY
}

const fn default_flow() -> f64 {
    DEFAULT_FLOW
}

impl Default for Options {
    fn default() -> Self {
        Self {
            correspondents: None,
            events: Vec::new(),
            ranks: None,
            correspondence_matrix: None,
            decay_history: None,
            model: ModelKind::default(),
            recharge: ONE_DAY,
            half_life: ONE_DAY,
            flow: DEFAULT_FLOW,
            include: None,
        }
    }
}

impl Options {
    /// Options for a fixed set of correspondents and no events.
    pub fn with_correspondents<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            correspondents: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Options whose universe is derived from `events`.
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }
}
