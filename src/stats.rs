//! Generation counters persisted as a flat JSON record
//!
//! ```json
//! { "total": 12, "byGrade": { "N": 3, "C": 4, "B": 2, "A": 2, "S": 1, "SS": 0, "SSS": 0, "SSSS": 0 } }
//! ```
//!
//! Loading is forgiving: a missing file, malformed JSON, negative or
//! non-integer counts and unknown grade labels all normalize to a valid
//! record. Unknown labels are folded into `N`. Every grade is always
//! present in `byGrade`, zero when never drawn.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::rarity::Grade;

/// Error type for reading or writing the stats file
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to access stats file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode stats: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Counts of generated characters, overall and per grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub total: u64,
    pub by_grade: BTreeMap<Grade, u64>,
}

impl Default for StatsRecord {
    fn default() -> Self {
        Self {
            total: 0,
            by_grade: Grade::ALL.iter().map(|&g| (g, 0)).collect(),
        }
    }
}

impl StatsRecord {
    /// Empty record with a zero bucket for every grade.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more generation of `grade`.
    pub fn increment(&mut self, grade: Grade) {
        self.total = self.total.saturating_add(1);
        let bucket = self.by_grade.entry(grade).or_insert(0);
        *bucket = bucket.saturating_add(1);
    }

    /// Generations recorded for `grade`.
    pub fn count(&self, grade: Grade) -> u64 {
        self.by_grade.get(&grade).copied().unwrap_or(0)
    }

    /// Generations recorded at `S` or above.
    pub fn rare_count(&self) -> u64 {
        self.by_grade.iter().filter(|(g, _)| g.is_rare()).map(|(_, n)| n).sum()
    }

    /// Build a record from arbitrary JSON, normalizing anything invalid.
    pub fn from_value(value: &Value) -> Self {
        let mut record = Self::new();
        record.total = value.get("total").and_then(count_of).unwrap_or(0);

        if let Some(map) = value.get("byGrade").and_then(Value::as_object) {
            for (label, raw) in map {
                let grade = label.parse().unwrap_or(Grade::N);
                let n = count_of(raw).unwrap_or(0);
                if n > 0 {
                    *record.by_grade.entry(grade).or_insert(0) += n;
                }
            }
        }

        // The total never trails its buckets.
        let bucket_sum: u64 = record.by_grade.values().sum();
        record.total = record.total.max(bucket_sum);
        record
    }

    /// Read a record from `path`.
    ///
    /// A missing file gives an empty record; unreadable content is
    /// logged and treated as empty. Other I/O failures are returned.
    pub fn load(path: &Path) -> Result<Self, StatsError> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Value>(&contents) {
            Ok(value) => Ok(Self::from_value(&value)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable stats file");
                Ok(Self::new())
            }
        }
    }

    /// Write the record to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), StatsError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load, increment once per grade, and save.
    pub fn record(path: &Path, grades: &[Grade]) -> Result<Self, StatsError> {
        let mut record = Self::load(path)?;
        for &grade in grades {
            record.increment(grade);
        }
        record.save(path)?;
        tracing::debug!(path = %path.display(), total = record.total, "updated stats");
        Ok(record)
    }
}

fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.floor() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_increment_updates_total_and_bucket() {
        let mut record = StatsRecord::new();
        record.increment(Grade::B);
        record.increment(Grade::B);
        record.increment(Grade::SS);
        assert_eq!(record.total, 3);
        assert_eq!(record.count(Grade::B), 2);
        assert_eq!(record.count(Grade::SS), 1);
        assert_eq!(record.count(Grade::N), 0);
        assert_eq!(record.rare_count(), 1);
    }

    #[test]
    fn test_from_value_normalizes_garbage() {
        let record = StatsRecord::from_value(&json!({
            "total": -5,
            "byGrade": { "A": 2, "X": 3, "s": "4", "B": "many", "C": 1.7 }
        }));
        assert_eq!(record.count(Grade::A), 2);
        assert_eq!(record.count(Grade::N), 3);
        assert_eq!(record.count(Grade::S), 4);
        assert_eq!(record.count(Grade::B), 0);
        assert_eq!(record.count(Grade::C), 1);
        assert_eq!(record.total, 10);
    }

    #[test]
    fn test_new_record_lists_every_grade() {
        let value = serde_json::to_value(StatsRecord::new()).unwrap();
        let by_grade = value["byGrade"].as_object().expect("byGrade should be an object");
        assert_eq!(by_grade.len(), Grade::ALL.len());
        for grade in Grade::ALL {
            assert_eq!(by_grade[&grade.to_string()], 0, "{}", grade);
        }
        assert_eq!(value["total"], 0);
    }

    #[test]
    fn test_partial_record_keeps_zero_buckets() {
        let record = StatsRecord::from_value(&json!({ "total": 2, "byGrade": { "A": 2 } }));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["byGrade"]["A"], 2);
        assert_eq!(value["byGrade"]["SSSS"], 0);
        assert_eq!(value["byGrade"]["N"], 0);
    }

    #[test]
    fn test_from_value_non_object() {
        assert_eq!(StatsRecord::from_value(&json!([1, 2, 3])), StatsRecord::new());
        assert_eq!(StatsRecord::from_value(&Value::Null), StatsRecord::new());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().expect("should create temp dir");
        let record = StatsRecord::load(&temp.path().join("stats.json")).unwrap();
        assert_eq!(record, StatsRecord::new());
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let temp = TempDir::new().expect("should create temp dir");
        let path = temp.path().join("stats.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(StatsRecord::load(&path).unwrap(), StatsRecord::new());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().expect("should create temp dir");
        let path = temp.path().join("nested").join("stats.json");

        let mut record = StatsRecord::new();
        record.increment(Grade::SSSS);
        record.increment(Grade::C);
        record.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"byGrade\""));
        assert_eq!(StatsRecord::load(&path).unwrap(), record);
    }

    #[test]
    fn test_record_accumulates_across_calls() {
        let temp = TempDir::new().expect("should create temp dir");
        let path = temp.path().join("stats.json");
        StatsRecord::record(&path, &[Grade::A, Grade::B]).unwrap();
        let record = StatsRecord::record(&path, &[Grade::A]).unwrap();
        assert_eq!(record.total, 3);
        assert_eq!(record.count(Grade::A), 2);
    }
}
