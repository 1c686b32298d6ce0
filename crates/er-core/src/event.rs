//! Directed, timestamped communication events.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Event time in the caller's unit (milliseconds since epoch by default).
pub type Timestamp = i64;

/// A single message from one sender to one or more recipients.
///
/// Missing fields decode to zero/empty values so that the engine can reject
/// them with a [`RankError::MalformedEvent`](crate::RankError::MalformedEvent)
/// that still carries the offending event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// When the message was sent. Zero is rejected.
    #[serde(default)]
    pub time: Timestamp,
    /// Sender id.
    #[serde(default)]
    pub from: String,
    /// Recipient ids. Accepts a bare string on input.
    #[serde(default, deserialize_with = "one_or_many")]
    pub to: Vec<String>,
}

impl Event {
    /// Creates an event from a sender to a list of recipients.
    pub fn new<I, S>(time: Timestamp, from: impl Into<String>, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            time,
            from: from.into(),
            to: to.into_iter().map(Into::into).collect(),
        }
    }

    /// Sender followed by recipients, in message order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.from.as_str()).chain(self.to.iter().map(String::as_str))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// A set of events sharing one timestamp whose relative order must not
/// influence each other's time differentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Shared timestamp of every event in the bucket.
    pub time: Timestamp,
    /// The simultaneous events.
    pub events: Vec<Event>,
}

impl Bucket {
    pub fn new(time: Timestamp, events: Vec<Event>) -> Self {
        Self { time, events }
    }
}

/// Anything the engine can step over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventInput {
    /// One event, applied immediately.
    Event(Event),
    /// A sequence of inputs, applied in order.
    Batch(Vec<EventInput>),
    /// Simultaneous events, applied with frozen time bookkeeping.
    Bucket(Bucket),
}

impl From<Event> for EventInput {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

impl From<Bucket> for EventInput {
    fn from(bucket: Bucket) -> Self {
        Self::Bucket(bucket)
    }
}

impl From<Vec<Event>> for EventInput {
    fn from(events: Vec<Event>) -> Self {
        Self::Batch(events.into_iter().map(Self::Event).collect())
    }
}

impl From<Vec<Bucket>> for EventInput {
    fn from(buckets: Vec<Bucket>) -> Self {
        Self::Batch(buckets.into_iter().map(Self::Bucket).collect())
    }
}

impl From<Vec<Self>> for EventInput {
    fn from(inputs: Vec<Self>) -> Self {
        Self::Batch(inputs)
    }
}

/// Groups a time-sorted event list so that runs of equal timestamps become
/// buckets. Lone events stay plain events.
pub fn bucket_by_time(events: Vec<Event>) -> Vec<EventInput> {
    let mut inputs = Vec::new();
    let mut run: Vec<Event> = Vec::new();

    for event in events {
        if run.last().is_some_and(|last| last.time != event.time) {
            inputs.push(close_run(std::mem::take(&mut run)));
        }
        run.push(event);
    }
    if !run.is_empty() {
        inputs.push(close_run(run));
    }
    inputs
}

fn close_run(mut run: Vec<Event>) -> EventInput {
    if run.len() == 1 {
        if let Some(event) = run.pop() {
            return EventInput::Event(event);
        }
    }
    let time = run.first().map_or(0, |e| e.time);
    EventInput::Bucket(Bucket::new(time, run))
}

/// Every sender and recipient in first-appearance order, without duplicates.
pub fn correspondents_of<'a>(events: impl IntoIterator<Item = &'a Event>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut ordered = Vec::new();
    for event in events {
        for id in event.ids() {
            if !id.is_empty() && seen.insert(id) {
                ordered.push(id.to_string());
            }
        }
    }
    ordered
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
    })
}
