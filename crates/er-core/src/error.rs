//! Error type for the ranking engine.

use thiserror::Error;

use crate::event::Event;

/// Errors raised while configuring the model or stepping over events.
///
/// None of these are retried internally. A rejected event leaves ranks
/// untouched apart from the idempotent catch-up of its participants.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RankError {
    /// Options or a snapshot could not be turned into a model.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The event is missing a sender, recipients or a timestamp.
    #[error("malformed event: {reason}: {event}")]
    MalformedEvent {
        reason: &'static str,
        event: Box<Event>,
    },

    /// The event is older than a send/receive time already recorded for
    /// the same correspondents.
    #[error("causality violation: {reason}: {event}")]
    Causality { reason: String, event: Box<Event> },

    /// Participant mass or transfer magnitude left its numeric bounds.
    #[error("invariant violation: {reason}: {event}")]
    InvariantViolation { reason: String, event: Box<Event> },
}

impl RankError {
    pub(crate) fn malformed(event: &Event, reason: &'static str) -> Self {
        Self::MalformedEvent {
            reason,
            event: Box::new(event.clone()),
        }
    }

    pub(crate) fn causality(event: &Event, reason: String) -> Self {
        Self::Causality {
            reason,
            event: Box::new(event.clone()),
        }
    }

    pub(crate) fn invariant(event: &Event, reason: String) -> Self {
        Self::InvariantViolation {
            reason,
            event: Box::new(event.clone()),
        }
    }

    /// The event that triggered the error, if any.
    pub fn event(&self) -> Option<&Event> {
        match self {
            Self::Configuration(_) => None,
            Self::MalformedEvent { event, .. }
            | Self::Causality { event, .. }
            | Self::InvariantViolation { event, .. } => Some(event.as_ref()),
        }
    }
}

impl From<serde_json::Error> for RankError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
