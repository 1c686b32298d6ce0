//! Time-decayed influence ranking for communication networks.
//!
//! This crate contains:
//! - The incremental EventRank engine with lazy catch-up of idle correspondents
//! - Bucketed processing of simultaneous events
//! - The baseline and reply model variants and their decay curves
//! - Snapshots that rebuild a model byte for byte

pub mod decay;
mod engine;
mod error;
pub mod event;
pub mod model;
mod options;
mod snapshot;
mod types;

pub use engine::EventRank;
pub use error::RankError;
pub use event::{Bucket, Event, EventInput, Timestamp, bucket_by_time};
pub use model::{ModelKind, Params};
pub use options::Options;
pub use snapshot::Snapshot;
pub use types::{CorrespondenceEntry, DecayEntry, Rank, Ranked};
