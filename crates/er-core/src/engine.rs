//! The incremental EventRank engine.
//!
//! # Algorithm Summary
//!
//! 1. Every correspondent starts with an equal share of the potential.
//! 2. Each event moves a fraction `α` of the non-participant mass onto the
//!    sender and recipients, proportionally to their room to grow.
//! 3. Non-participants are not touched. Instead `α` is appended to the decay
//!    history, and each correspondent keeps a cursor into that history. The
//!    decay it missed is applied on its next touch (`catch_up`) or on `done`.
//! 4. Buckets of simultaneous events read send/receive times as they stood
//!    before the bucket, and merge their own times only once the whole bucket
//!    has been applied.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::RankError;
use crate::event::{Bucket, Event, EventInput, Timestamp, correspondents_of};
use crate::model::{ModelKind, Params};
use crate::options::Options;
use crate::types::{CorrespondenceEntry, DecayEntry, Rank, Ranked, StagedTimes};

/// Slack allowed above 1 for the participant mass before it counts as drift.
const MASS_TOLERANCE: f64 = 9e-12;

/// Where an event's send/receive times go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeWrite {
    /// Straight into the correspondence matrix.
    Commit,
    /// Into the staging area of the bucket in flight.
    Stage,
}

/// Time-decayed influence ranking over a directed communication network.
#[derive(Debug, Clone)]
pub struct EventRank {
    pub(crate) correspondents: Vec<String>,
    pub(crate) include: BTreeSet<String>,
    pub(crate) ranks: BTreeMap<String, Rank>,
    pub(crate) matrix: BTreeMap<String, CorrespondenceEntry>,
    pub(crate) decay_history: Vec<DecayEntry>,
    pub(crate) params: Params,
    events: Vec<Event>,
    staged: Option<StagedTimes>,
}

impl EventRank {
    /// Builds a model from options.
    ///
    /// Start ranks are assigned unless `ranks` is supplied. Stored events are
    /// not processed until [`compute`](Self::compute) is called.
    pub fn new(options: Options) -> Result<Self, RankError> {
        let params = Params::new(
            options.model,
            options.recharge,
            options.half_life,
            options.flow,
        )?;

        let universe = match options.correspondents {
            Some(ids) => dedup(ids),
            None => correspondents_of(&options.events),
        };

        let include: BTreeSet<String> = match options.include {
            Some(ids) if !ids.is_empty() => ids
                .into_iter()
                .filter(|id| universe.contains(id))
                .collect(),
            _ => universe.iter().cloned().collect(),
        };

        let correspondents = universe
            .into_iter()
            .filter(|id| include.contains(id))
            .collect();

        let mut model = Self {
            correspondents,
            include,
            ranks: BTreeMap::new(),
            matrix: options.correspondence_matrix.unwrap_or_default(),
            decay_history: options.decay_history.unwrap_or_default(),
            params,
            events: options.events,
            staged: None,
        };

        match options.ranks {
            Some(ranks) => model.ranks = ranks,
            None => model.start_ranks(),
        }
        model.fill_missing();

        Ok(model)
    }

    /// Gives every correspondent rank `1/n` at time 0.
    #[expect(
        clippy::cast_precision_loss,
        reason = "correspondent counts are far below 2^52"
    )]
    fn start_ranks(&mut self) {
        let share = 1.0 / self.correspondents.len() as f64;
        self.ranks = self
            .correspondents
            .iter()
            .map(|id| (id.clone(), Rank { value: share, time: 0 }))
            .collect();
    }

    /// Every correspondent has a rank and a matrix entry, and every ranked id
    /// has a matrix entry.
    fn fill_missing(&mut self) {
        for id in &self.correspondents {
            self.ranks
                .entry(id.clone())
                .or_insert(Rank { value: 0.0, time: 0 });
        }
        for id in self.ranks.keys() {
            if !self.matrix.contains_key(id) {
                self.matrix.insert(id.clone(), CorrespondenceEntry::default());
            }
        }
    }

    /// Back to start ranks with an empty matrix and decay history.
    pub fn reset(&mut self) -> &mut Self {
        if self.include.is_empty() {
            self.include = self.correspondents.iter().cloned().collect();
        }
        let include = &self.include;
        self.correspondents.retain(|id| include.contains(id));
        self.matrix.clear();
        self.decay_history.clear();
        self.staged = None;
        self.start_ranks();
        self.fill_missing();

        tracing::debug!(
            correspondents = self.correspondents.len(),
            "reset ranks"
        );
        self
    }

    /// Resets, replays every stored event in order and finalizes.
    pub fn compute(&mut self) -> Result<&mut Self, RankError> {
        self.reset();
        tracing::debug!(event_count = self.events.len(), "computing ranks");

        let events = std::mem::take(&mut self.events);
        let result = events
            .iter()
            .try_for_each(|event| self.step_event(event, TimeWrite::Commit));
        self.events = events;
        result?;

        Ok(self.done())
    }

    /// Applies an event, a batch of inputs or a bucket.
    pub fn step(&mut self, input: impl Into<EventInput>) -> Result<&mut Self, RankError> {
        match input.into() {
            EventInput::Event(event) => self.step_event(&event, TimeWrite::Commit)?,
            EventInput::Batch(inputs) => {
                for input in inputs {
                    self.step(input)?;
                }
            }
            EventInput::Bucket(bucket) => self.step_bucket(&bucket)?,
        }
        Ok(self)
    }

    /// Applies simultaneous events so that none of them sees the others'
    /// send/receive times.
    fn step_bucket(&mut self, bucket: &Bucket) -> Result<(), RankError> {
        if let Some(stray) = bucket.events.iter().find(|e| e.time != bucket.time) {
            return Err(RankError::malformed(
                stray,
                "event time differs from its bucket",
            ));
        }

        self.staged = Some(StagedTimes::default());
        let result = bucket
            .events
            .iter()
            .try_for_each(|event| self.step_event(event, TimeWrite::Stage));

        // Events applied before a failure keep their times.
        if let Some(staged) = self.staged.take() {
            staged.merge_into(&mut self.matrix);
        }
        result
    }

    fn step_event(&mut self, event: &Event, write: TimeWrite) -> Result<(), RankError> {
        if event.from.is_empty() {
            return Err(RankError::malformed(event, "event has no sender"));
        }
        if event.to.is_empty() {
            return Err(RankError::malformed(event, "event has no recipients"));
        }
        if event.time == 0 {
            return Err(RankError::malformed(event, "event timestamp must be non-zero"));
        }

        if !self.is_ranked(&event.from) {
            tracing::trace!(from = %event.from, "ignoring event from excluded sender");
            return Ok(());
        }

        let mut recipients: Vec<&str> = Vec::with_capacity(event.to.len());
        for id in &event.to {
            if id != &event.from && self.is_ranked(id) && !recipients.contains(&id.as_str()) {
                recipients.push(id);
            }
        }
        if recipients.is_empty() {
            tracing::trace!(from = %event.from, "ignoring event without ranked recipients");
            return Ok(());
        }

        self.catch_up_one(&event.from);
        for id in &recipients {
            self.catch_up_one(id);
        }

        let alpha = match self.params.model {
            ModelKind::Baseline => self.params.potential(None, None),
            ModelKind::Reply => {
                let (since_send, since_receipt) = self.time_differentials(event, &recipients)?;
                self.params.potential(since_send, since_receipt)
            }
        };

        let mass: f64 = std::iter::once(event.from.as_str())
            .chain(recipients.iter().copied())
            .map(|id| self.ranks.get(id).map_or(0.0, |r| r.value))
            .sum();
        if !(0.0..=1.0 + MASS_TOLERANCE).contains(&mass) {
            return Err(RankError::invariant(
                event,
                format!("participant rank sum {mass} is outside [0, 1]"),
            ));
        }
        let mass = mass.min(1.0);
        let transfer = alpha * (1.0 - mass);
        if !(0.0..=1.0).contains(&transfer) {
            return Err(RankError::invariant(
                event,
                format!("transfer magnitude {transfer} is outside [0, 1]"),
            ));
        }

        // Nothing below can fail.
        if self.params.model == ModelKind::Reply {
            self.record_times(event, &recipients, write);
        }

        self.decay_history.push(DecayEntry {
            value: alpha,
            time: event.time,
        });
        let cursor = self.decay_history.len();

        #[expect(
            clippy::cast_precision_loss,
            reason = "participant counts are tiny"
        )]
        let headroom = (recipients.len() + 1) as f64 - mass;

        for id in recipients.iter().copied().chain(std::iter::once(event.from.as_str())) {
            if let Some(rank) = self.ranks.get_mut(id) {
                rank.value += transfer * (1.0 - rank.value) / headroom;
                rank.time = event.time;
            }
            if let Some(entry) = self.matrix.get_mut(id) {
                entry.last_update = cursor;
            }
        }

        tracing::trace!(
            time = event.time,
            from = %event.from,
            participants = recipients.len() + 1,
            alpha,
            transfer,
            "applied event"
        );
        Ok(())
    }

    /// Time since the sender last sent, and since the sender last received
    /// from any of the recipients. `None` when it never happened.
    fn time_differentials(
        &self,
        event: &Event,
        recipients: &[&str],
    ) -> Result<(Option<i64>, Option<i64>), RankError> {
        let sender = self.matrix.get(&event.from);

        let since_send = match sender.and_then(|entry| entry.sent) {
            Some(sent) if sent > event.time => {
                return Err(RankError::causality(
                    event,
                    format!("sender last sent at {sent}, after this event"),
                ));
            }
            Some(sent) => Some(event.time.saturating_sub(sent)),
            None => None,
        };

        let last_receipt = sender.and_then(|entry| {
            recipients
                .iter()
                .filter_map(|id| entry.received.get(*id).copied())
                .max()
        });
        let since_receipt = match last_receipt {
            Some(received) if received > event.time => {
                return Err(RankError::causality(
                    event,
                    format!("sender last received from a recipient at {received}, after this event"),
                ));
            }
            Some(received) => Some(event.time.saturating_sub(received)),
            None => None,
        };

        Ok((since_send, since_receipt))
    }

    fn record_times(&mut self, event: &Event, recipients: &[&str], write: TimeWrite) {
        match (write, self.staged.as_mut()) {
            (TimeWrite::Stage, Some(staged)) => staged.record(&event.from, recipients, event.time),
            _ => {
                if let Some(entry) = self.matrix.get_mut(&event.from) {
                    entry.record_send(event.time);
                }
                for id in recipients {
                    if let Some(entry) = self.matrix.get_mut(*id) {
                        entry.record_receipt(&event.from, event.time);
                    }
                }
            }
        }
    }

    /// Applies the decay each given correspondent missed since its last touch.
    pub fn catch_up<I, S>(&mut self, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.catch_up_one(id.as_ref());
        }
        self
    }

    fn catch_up_one(&mut self, id: &str) {
        if let (Some(rank), Some(entry)) = (self.ranks.get_mut(id), self.matrix.get_mut(id)) {
            fast_forward(rank, entry, &self.decay_history);
        }
    }

    /// Catches up every correspondent to the latest decay history entry.
    pub fn done(&mut self) -> &mut Self {
        let history = &self.decay_history;
        for (id, rank) in &mut self.ranks {
            if let Some(entry) = self.matrix.get_mut(id) {
                fast_forward(rank, entry, history);
            }
        }
        self
    }

    /// The `n` highest ranks, best first.
    ///
    /// Reads current values without catching anyone up; call
    /// [`done`](Self::done) first for a consistent view. Equal values keep
    /// correspondent order.
    pub fn top(&self, n: usize) -> Vec<Ranked> {
        let mut ranked: Vec<Ranked> = self
            .correspondents
            .iter()
            .filter_map(|id| self.ranks.get(id).map(|rank| Ranked::new(id, *rank)))
            .collect();
        ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
        ranked.truncate(n);
        ranked
    }

    /// Catches up exactly these ids and returns their ranks. Unknown ids are
    /// skipped.
    pub fn get<I, S>(&mut self, ids: I) -> Vec<Ranked>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .filter_map(|id| {
                let id = id.as_ref();
                self.catch_up_one(id);
                self.ranks.get(id).map(|rank| Ranked::new(id, *rank))
            })
            .collect()
    }

    fn is_ranked(&self, id: &str) -> bool {
        self.include.contains(id) && self.ranks.contains_key(id)
    }

    /// Current rank without catch-up.
    pub fn rank(&self, id: &str) -> Option<Rank> {
        self.ranks.get(id).copied()
    }

    /// Correspondence matrix entry for one correspondent.
    pub fn entry(&self, id: &str) -> Option<&CorrespondenceEntry> {
        self.matrix.get(id)
    }

    pub fn decay_history(&self) -> &[DecayEntry] {
        &self.decay_history
    }

    pub fn correspondents(&self) -> &[String] {
        &self.correspondents
    }

    pub fn include(&self) -> &BTreeSet<String> {
        &self.include
    }

    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Events stored at construction, replayed by `compute`.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Sum of current rank values. Equals 1 after `done`.
    pub fn total_rank(&self) -> f64 {
        self.ranks.values().map(|r| r.value).sum()
    }
}

/// Folds pending decay history entries into one rank.
fn fast_forward(rank: &mut Rank, entry: &mut CorrespondenceEntry, history: &[DecayEntry]) {
    if let Some(pending) = history.get(entry.last_update..) {
        for decay in pending {
            rank.value *= 1.0 - decay.value;
            rank.time = decay.time;
        }
    }
    entry.last_update = history.len();
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
