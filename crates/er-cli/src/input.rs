//! Event log parsing.
//!
//! Accepts either a JSON array or JSON Lines. Each record is an event
//! (`{"time", "from", "to"}`) or a bucket (`{"time", "events": [...]}`).
//! `time` is epoch milliseconds or an RFC 3339 string.

use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use er_core::{Event, EventInput, bucket_by_time};
use serde_json::Value;

/// Reads event records from a file, or stdin when `path` is `None` or `-`.
pub fn read_events(path: Option<&Path>) -> Result<Vec<EventInput>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            parse_events(BufReader::new(file))
                .with_context(|| format!("failed to parse {}", path.display()))
        }
        _ => parse_events(std::io::stdin().lock()).context("failed to parse stdin"),
    }
}

/// Parses a JSON array or JSON Lines stream of event records.
pub fn parse_events<R: BufRead>(mut reader: R) -> Result<Vec<EventInput>> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .context("failed to read events")?;

    if content.trim_start().starts_with('[') {
        let records: Vec<Value> = serde_json::from_str(&content).context("invalid JSON array")?;
        return records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| {
                parse_record(record).with_context(|| format!("invalid record {}", idx + 1))
            })
            .collect();
    }

    let mut inputs = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        let input =
            parse_record(record).with_context(|| format!("invalid record on line {}", idx + 1))?;
        inputs.push(input);
    }
    Ok(inputs)
}

fn parse_record(mut record: Value) -> Result<EventInput> {
    normalize_time(&mut record)?;

    if record.get("events").is_some_and(Value::is_array) {
        if let Some(events) = record.get_mut("events").and_then(Value::as_array_mut) {
            for event in events {
                normalize_time(event)?;
            }
        }
        let bucket = serde_json::from_value(record).context("invalid bucket")?;
        return Ok(EventInput::Bucket(bucket));
    }

    let event = serde_json::from_value(record).context("invalid event")?;
    Ok(EventInput::Event(event))
}

/// Rewrites a textual `time` into epoch milliseconds.
fn normalize_time(record: &mut Value) -> Result<()> {
    let Some(text) = record.get("time").and_then(Value::as_str).map(str::to_owned) else {
        return Ok(());
    };
    record["time"] = Value::from(parse_timestamp(&text)?);
    Ok(())
}

/// Parses epoch milliseconds or an RFC 3339 date.
pub fn parse_timestamp(text: &str) -> Result<i64> {
    if let Ok(millis) = text.trim().parse::<i64>() {
        return Ok(millis);
    }
    let parsed = DateTime::parse_from_rfc3339(text.trim()).with_context(|| {
        format!("invalid timestamp: {text}. Use epoch milliseconds or RFC 3339 (e.g., 2001-05-14T16:39:00Z)")
    })?;
    Ok(parsed.timestamp_millis())
}

/// Turns runs of equal-timestamp events into buckets. Explicit buckets are
/// kept as they are and break runs.
pub fn group_by_time(inputs: Vec<EventInput>) -> Vec<EventInput> {
    let mut grouped = Vec::with_capacity(inputs.len());
    let mut pending: Vec<Event> = Vec::new();

    for input in inputs {
        match input {
            EventInput::Event(event) => pending.push(event),
            other => {
                grouped.extend(bucket_by_time(std::mem::take(&mut pending)));
                grouped.push(other);
            }
        }
    }
    grouped.extend(bucket_by_time(pending));
    grouped
}

/// Every event in `inputs`, buckets and batches flattened.
pub fn flatten(inputs: &[EventInput]) -> Vec<&Event> {
    let mut events = Vec::new();
    for input in inputs {
        match input {
            EventInput::Event(event) => events.push(event),
            EventInput::Batch(inner) => events.extend(flatten(inner)),
            EventInput::Bucket(bucket) => events.extend(&bucket.events),
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_json_lines() {
        let input = r#"{"time": 1000, "from": "a", "to": "b"}

{"time": 2000, "from": "b", "to": ["a", "c"]}
"#;
        let inputs = parse_events(input.as_bytes()).unwrap();
        assert_eq!(
            inputs,
            vec![
                EventInput::Event(Event::new(1000, "a", ["b"])),
                EventInput::Event(Event::new(2000, "b", ["a", "c"])),
            ]
        );
    }

    #[test]
    fn test_parses_json_array_with_bucket() {
        let input = r#"[
            {"time": "1970-01-01T00:00:01Z", "from": "a", "to": "b"},
            {"time": 5000, "events": [
                {"time": 5000, "from": "b", "to": "c"},
                {"time": "5000", "from": "c", "to": "a"}
            ]}
        ]"#;
        let inputs = parse_events(input.as_bytes()).unwrap();

        assert_eq!(inputs[0], EventInput::Event(Event::new(1000, "a", ["b"])));
        match &inputs[1] {
            EventInput::Bucket(bucket) => {
                assert_eq!(bucket.time, 5000);
                assert_eq!(bucket.events[1], Event::new(5000, "c", ["a"]));
            }
            other => panic!("expected bucket, got {other:?}"),
        }
    }

    #[test]
    fn test_reports_line_of_invalid_json() {
        let input = "{\"time\": 1, \"from\": \"a\", \"to\": \"b\"}\nnot json\n";
        let err = parse_events(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn test_missing_fields_reach_the_engine() {
        let inputs = parse_events(r#"{"from": "a"}"#.as_bytes()).unwrap();
        assert_eq!(inputs, vec![EventInput::Event(Event::new(0, "a", Vec::<String>::new()))]);
    }

    #[test]
    fn test_rfc3339_offsets_are_respected() {
        assert_eq!(parse_timestamp("1970-01-01T01:00:00+01:00").unwrap(), 0);
        assert_eq!(parse_timestamp("86400000").unwrap(), 86_400_000);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_group_by_time_respects_explicit_buckets() {
        let inputs = vec![
            EventInput::Event(Event::new(1, "a", ["b"])),
            EventInput::Event(Event::new(1, "b", ["a"])),
            EventInput::Bucket(er_core::Bucket::new(2, vec![Event::new(2, "a", ["c"])])),
            EventInput::Event(Event::new(3, "c", ["a"])),
        ];

        let grouped = group_by_time(inputs);

        assert_eq!(grouped.len(), 3);
        assert!(matches!(&grouped[0], EventInput::Bucket(b) if b.events.len() == 2));
        assert!(matches!(&grouped[1], EventInput::Bucket(b) if b.time == 2));
        assert!(matches!(&grouped[2], EventInput::Event(e) if e.time == 3));
    }

    #[test]
    fn test_flatten_reaches_bucketed_events() {
        let inputs = vec![
            EventInput::Event(Event::new(1, "a", ["b"])),
            EventInput::Bucket(er_core::Bucket::new(2, vec![Event::new(2, "c", ["d"])])),
        ];
        let senders: Vec<&str> = flatten(&inputs).iter().map(|e| e.from.as_str()).collect();
        assert_eq!(senders, ["a", "c"]);
    }
}
