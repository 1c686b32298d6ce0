//! State records held per correspondent and per processed event.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::Timestamp;

/// Current rank of one correspondent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    /// Share of the total potential, in \[0, 1\].
    pub value: f64,
    /// Time of the last update applied to `value`.
    #[serde(default)]
    pub time: Timestamp,
}

/// Per-correspondent bookkeeping in the correspondence matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrespondenceEntry {
    /// How many decay history entries are already folded into the rank.
    #[serde(default)]
    pub last_update: usize,
    /// Last time this correspondent sent anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent: Option<Timestamp>,
    /// Last time this correspondent received from each sender.
    #[serde(default)]
    pub received: BTreeMap<String, Timestamp>,
}

impl CorrespondenceEntry {
    pub(crate) fn record_send(&mut self, time: Timestamp) {
        self.sent = Some(time);
    }

    pub(crate) fn record_receipt(&mut self, from: &str, time: Timestamp) {
        self.received.insert(from.to_string(), time);
    }
}

/// One decay history entry, appended once per applied event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayEntry {
    /// Fraction of rank every non-participant loses for this event.
    pub value: f64,
    pub time: Timestamp,
}

/// A correspondent and its rank, as returned by `top` and `get`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked {
    pub id: String,
    pub value: f64,
    pub time: Timestamp,
}

impl Ranked {
    pub(crate) fn new(id: &str, rank: Rank) -> Self {
        Self {
            id: id.to_string(),
            value: rank.value,
            time: rank.time,
        }
    }
}

/// Send/receive times captured while a bucket is in flight.
#[derive(Debug, Clone, Default)]
pub(crate) struct StagedTimes {
    sent: BTreeMap<String, Timestamp>,
    received: BTreeMap<String, BTreeMap<String, Timestamp>>,
}

impl StagedTimes {
    pub(crate) fn record(&mut self, from: &str, recipients: &[&str], time: Timestamp) {
        self.sent.insert(from.to_string(), time);
        for recipient in recipients {
            self.received
                .entry((*recipient).to_string())
                .or_default()
                .insert(from.to_string(), time);
        }
    }

    /// Writes every staged time into the committed matrix.
    pub(crate) fn merge_into(self, matrix: &mut BTreeMap<String, CorrespondenceEntry>) {
        for (id, time) in self.sent {
            matrix.entry(id).or_default().record_send(time);
        }
        for (id, senders) in self.received {
            let entry = matrix.entry(id).or_default();
            for (from, time) in senders {
                entry.record_receipt(&from, time);
            }
        }
    }
}
