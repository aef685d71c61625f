//! Workout records as served by the schedule API

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use sha2::{Digest, Sha256};

use crate::Thresholds;

/// Timestamp layout used by the schedule API
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Workout identifier; the API sends numbers, pages may carry strings.
///
/// Any JSON number is accepted, including fractions and values outside the
/// `i64` range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkoutId {
    Number(Number),
    Text(String),
}

impl WorkoutId {
    /// Lookup key shared by numeric and textual ids (`7` and `"7"` join)
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutId::Number(n) => f.write_str(&number_key(n)),
            WorkoutId::Text(s) => f.write_str(s),
        }
    }
}

/// Number as a page script would print it into an attribute: integral
/// floats lose their `.0`
fn number_key(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutType {
    pub name: String,
}

/// One scheduled class instance with its booking count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: WorkoutId,
    pub num_booked: u32,
    /// `YYYY-MM-DD HH:MM:SS`
    pub start_time: String,
    pub end_time: String,
    pub workout_type: WorkoutType,
}

impl WorkoutRecord {
    pub fn name(&self) -> &str {
        &self.workout_type.name
    }

    /// Parsed start time, `None` if the API sent something unexpected
    pub fn start(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.start_time, TIMESTAMP_FORMAT).ok()
    }

    /// Date part of `start_time` (everything before the first space)
    pub fn start_date(&self) -> &str {
        self.start_time.split(' ').next().unwrap_or_default()
    }
}

/// The workouts of one fetch cycle, in API order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutCollection {
    records: Vec<WorkoutRecord>,
}

impl WorkoutCollection {
    pub fn new(records: Vec<WorkoutRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkoutRecord> {
        self.records.iter()
    }

    /// Build the id lookup used by a single reconciliation pass
    pub fn index(&self) -> WorkoutIndex<'_> {
        WorkoutIndex::build(self)
    }

    /// Records ordered by ascending start time.
    ///
    /// The sort is stable; timestamps that fail to parse go last, ordered by
    /// their raw text.
    pub fn sorted_by_start(&self) -> Vec<&WorkoutRecord> {
        let mut sorted: Vec<&WorkoutRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| match (a.start(), b.start()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.start_time.cmp(&b.start_time),
        });
        sorted
    }

    /// Records grouped by start date; groups and their rows ascend by start time
    pub fn grouped_by_date(&self) -> Vec<(String, Vec<&WorkoutRecord>)> {
        let mut groups: Vec<(String, Vec<&WorkoutRecord>)> = Vec::new();
        for record in self.sorted_by_start() {
            let date = record.start_date();
            match groups.iter_mut().find(|(d, _)| d == date) {
                Some((_, rows)) => rows.push(record),
                None => groups.push((date.to_string(), vec![record])),
            }
        }
        groups
    }

    /// SHA-256 over the serialized records, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for record in &self.records {
            // Serializing plain derived structs cannot fail
            if let Ok(bytes) = serde_json::to_vec(record) {
                hasher.update(&bytes);
            }
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

impl From<Vec<WorkoutRecord>> for WorkoutCollection {
    fn from(records: Vec<WorkoutRecord>) -> Self {
        Self::new(records)
    }
}

/// Transient id lookup over a collection
///
/// Duplicate ids resolve to the last record carrying them.
#[derive(Debug)]
pub struct WorkoutIndex<'a> {
    by_id: HashMap<String, &'a WorkoutRecord>,
}

impl<'a> WorkoutIndex<'a> {
    pub fn build(collection: &'a WorkoutCollection) -> Self {
        let by_id = collection
            .records
            .iter()
            .map(|record| (record.id.key(), record))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, key: &str) -> Option<&'a WorkoutRecord> {
        self.by_id.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// How full a class is, for colour coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Critical,
    Moderate,
    Open,
}

impl Occupancy {
    pub fn classify(num_booked: u32, thresholds: &Thresholds) -> Self {
        if num_booked >= thresholds.critical {
            Occupancy::Critical
        } else if num_booked >= thresholds.moderate {
            Occupancy::Moderate
        } else {
            Occupancy::Open
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Occupancy::Critical => "critical",
            Occupancy::Moderate => "moderate",
            Occupancy::Open => "open",
        }
    }

    /// Text colour used on the panel
    pub fn color(&self) -> &'static str {
        match self {
            Occupancy::Critical => "#e53935",
            Occupancy::Moderate => "#fb8c00",
            Occupancy::Open => "#43a047",
        }
    }
}

impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
