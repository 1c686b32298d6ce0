//! Plain structural snapshots of a model.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::engine::EventRank;
use crate::error::RankError;
use crate::model::ModelKind;
use crate::options::Options;
use crate::types::{CorrespondenceEntry, DecayEntry, Rank};

/// Borrowed view of everything needed to rebuild a model.
///
/// Serializes with the same keys [`Options`] reads, so
/// `EventRank::from_json(&model.to_json(false)?)` reproduces `model`.
/// Stored events and any in-flight bucket are not part of a snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<'a> {
    pub correspondents: &'a [String],
    pub include: &'a BTreeSet<String>,
    pub model: ModelKind,
    #[serde(rename = "G")]
    pub recharge: f64,
    #[serde(rename = "H")]
    pub half_life: f64,
    #[serde(rename = "f")]
    pub flow: f64,
    pub ranks: &'a BTreeMap<String, Rank>,
    #[serde(rename = "correspondanceMatrix")]
    pub correspondence_matrix: &'a BTreeMap<String, CorrespondenceEntry>,
    pub decay_history: &'a [DecayEntry],
}

impl EventRank {
    /// Snapshot of the current state.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            correspondents: &self.correspondents,
            include: &self.include,
            model: self.params.model,
            recharge: self.params.recharge,
            half_life: self.params.half_life,
            flow: self.params.flow,
            ranks: &self.ranks,
            correspondence_matrix: &self.matrix,
            decay_history: &self.decay_history,
        }
    }

    /// Snapshot as a JSON string.
    pub fn to_json(&self, pretty: bool) -> Result<String, RankError> {
        let snapshot = self.snapshot();
        let json = if pretty {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };
        Ok(json)
    }

    /// Rebuilds a model from a JSON snapshot or options record.
    pub fn from_json(json: &str) -> Result<Self, RankError> {
        let options: Options = serde_json::from_str(json)?;
        Self::new(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Bucket, Event};
    use insta::assert_snapshot;

    const DAY: i64 = 86_400_000;

    fn busy_model() -> EventRank {
        let options = Options {
            include: Some(["a", "b", "c", "d"].into_iter().map(String::from).collect()),
            ..Options::with_correspondents(["d", "a", "c", "b", "e"])
        };
        let mut model = EventRank::new(options).unwrap();
        model
            .step(vec![
                Event::new(DAY, "a", ["b", "c"]),
                Event::new(DAY + 3_600_000, "b", ["a"]),
                Event::new(2 * DAY, "c", ["d", "e"]),
            ])
            .unwrap()
            .step(Bucket::new(
                3 * DAY,
                vec![Event::new(3 * DAY, "d", ["a"]), Event::new(3 * DAY, "a", ["d"])],
            ))
            .unwrap();
        // Leave `b` and `c` with pending decay.
        model.get(["d"]);
        model
    }

    #[test]
    fn test_roundtrip_is_byte_identical() {
        let model = busy_model();
        let json = model.to_json(false).unwrap();
        let rebuilt = EventRank::from_json(&json).unwrap();
        assert_eq!(rebuilt.to_json(false).unwrap(), json);
    }

    #[test]
    fn test_pretty_roundtrip_is_byte_identical() {
        let model = busy_model();
        let json = model.to_json(true).unwrap();
        let rebuilt = EventRank::from_json(&json).unwrap();
        assert_eq!(rebuilt.to_json(true).unwrap(), json);
    }

    #[test]
    fn test_fresh_model_roundtrip() {
        let model = EventRank::new(Options::with_correspondents(["x", "y", "z"])).unwrap();
        let json = model.to_json(false).unwrap();
        assert_eq!(EventRank::from_json(&json).unwrap().to_json(false).unwrap(), json);
    }

    #[test]
    fn test_rebuilt_model_continues_identically() {
        let mut original = busy_model();
        let mut rebuilt = EventRank::from_json(&original.to_json(false).unwrap()).unwrap();

        let next = Event::new(4 * DAY, "c", ["b"]);
        original.step(next.clone()).unwrap().done();
        rebuilt.step(next).unwrap().done();

        assert_eq!(original.to_json(false).unwrap(), rebuilt.to_json(false).unwrap());
    }

    #[test]
    fn test_pretty_snapshot_layout() {
        let mut model = EventRank::new(Options::with_correspondents(["a", "b", "c"])).unwrap();
        model.step(Event::new(1, "a", ["b"])).unwrap();

        assert_snapshot!(model.to_json(true).unwrap(), @r#"
        {
          "correspondents": [
            "a",
            "b",
            "c"
          ],
          "include": [
            "a",
            "b",
            "c"
          ],
          "model": "reply",
          "G": 86400000.0,
          "H": 86400000.0,
          "f": 0.8,
          "ranks": {
            "a": {
              "value": 0.4666666666666667,
              "time": 1
            },
            "b": {
              "value": 0.4666666666666667,
              "time": 1
            },
            "c": {
              "value": 0.3333333333333333,
              "time": 0
            }
          },
          "correspondanceMatrix": {
            "a": {
              "lastUpdate": 1,
              "sent": 1,
              "received": {}
            },
            "b": {
              "lastUpdate": 1,
              "received": {
                "a": 1
              }
            },
            "c": {
              "lastUpdate": 0,
              "received": {}
            }
          },
          "decayHistory": [
            {
              "value": 0.8,
              "time": 1
            }
          ]
        }
        "#);
    }

    #[test]
    fn test_snapshot_keys() {
        let model = EventRank::new(Options::with_correspondents(["a", "b"])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&model.to_json(false).unwrap()).unwrap();
        for key in [
            "correspondents",
            "include",
            "model",
            "G",
            "H",
            "f",
            "ranks",
            "correspondanceMatrix",
            "decayHistory",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["model"], "reply");
        assert_eq!(value["include"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        assert!(matches!(
            EventRank::from_json("{\"include\": 3}"),
            Err(RankError::Configuration(_))
        ));
        assert!(matches!(
            EventRank::from_json("{\"model\": \"pagerank\"}"),
            Err(RankError::Configuration(_))
        ));
    }
}
