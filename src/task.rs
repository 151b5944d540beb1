//! Task records and task collections.
//!
//! A collection is read from a JSON object mapping task ids to records:
//!
//! ```json
//! {
//!   "t1": { "id": "t1", "title": "Pay rent", "deadline": 1710460800000 },
//!   "t2": { "deadline": 1710547200000 }
//! }
//! ```
//!
//! Key order in the source object is the collection's iteration order.
//! Malformed records are quarantined with their error instead of failing the
//! whole load.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A task with a deadline in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Due instant, milliseconds since the Unix epoch.
    pub deadline: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, deadline: i64) -> Self {
        Self {
            id: id.into(),
            deadline,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Insertion-ordered mapping from task id to task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollection {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

/// A record that could not be turned into a [`Task`].
#[derive(Debug)]
pub struct RejectedRecord {
    pub key: String,
    pub error: Error,
}

/// Result of loading a collection: the valid tasks plus quarantined records.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub collection: TaskCollection,
    pub rejected: Vec<RejectedRecord>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task, replacing any existing task with the same id in place.
    pub fn insert(&mut self, task: Task) -> Option<Task> {
        match self.index.get(&task.id) {
            Some(&pos) => Some(std::mem::replace(&mut self.tasks[pos], task)),
            None => {
                self.index.insert(task.id.clone(), self.tasks.len());
                self.tasks.push(task);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|&pos| &self.tasks[pos])
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Parse a JSON document holding an id-to-record object.
    pub fn from_json_str(input: &str) -> Result<LoadOutcome> {
        let value: Value = serde_json::from_str(input)
            .map_err(|err| Error::InvalidTaskRecord(format!("malformed JSON: {err}")))?;
        Self::from_json_value(value)
    }

    /// Read a task file. `-` reads stdin.
    pub fn load(path: &Path) -> Result<LoadOutcome> {
        if path == Path::new("-") {
            let mut input = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut input)?;
            return Self::from_json_str(&input);
        }
        if !path.exists() {
            return Err(Error::TaskFileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_value(value: Value) -> Result<LoadOutcome> {
        let entries = match value {
            Value::Object(entries) => entries,
            other => {
                return Err(Error::InvalidTaskRecord(format!(
                    "expected an object of task records, found {}",
                    value_kind(&other)
                )))
            }
        };

        let mut outcome = LoadOutcome::default();
        for (key, record) in entries {
            match parse_record(&key, record) {
                Ok(task) => {
                    outcome.collection.insert(task);
                }
                Err(error) => {
                    tracing::warn!(task = %key, %error, "quarantined task record");
                    outcome.rejected.push(RejectedRecord { key, error });
                }
            }
        }
        tracing::debug!(
            loaded = outcome.collection.len(),
            rejected = outcome.rejected.len(),
            "loaded task collection"
        );
        Ok(outcome)
    }
}

impl<'a> IntoIterator for &'a TaskCollection {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

impl FromIterator<Task> for TaskCollection {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        let mut collection = TaskCollection::new();
        for task in iter {
            collection.insert(task);
        }
        collection
    }
}

fn parse_record(key: &str, record: Value) -> Result<Task> {
    let mut fields: Map<String, Value> = match record {
        Value::Object(fields) => fields,
        other => {
            return Err(Error::InvalidTaskRecord(format!(
                "{key}: expected an object, found {}",
                value_kind(&other)
            )))
        }
    };

    match fields.remove("id") {
        None | Some(Value::Null) => {}
        Some(Value::String(id)) if id == key => {}
        Some(Value::String(id)) => {
            return Err(Error::InvalidTaskRecord(format!(
                "{key}: id '{id}' does not match its key"
            )))
        }
        Some(other) => {
            return Err(Error::InvalidTaskRecord(format!(
                "{key}: id must be a string, found {}",
                value_kind(&other)
            )))
        }
    }

    let deadline = match fields.remove("deadline") {
        None | Some(Value::Null) => {
            return Err(Error::InvalidDeadline {
                task_id: key.to_string(),
                reason: "missing".to_string(),
            })
        }
        Some(value) => parse_deadline(key, &value)?,
    };

    let title = match fields.remove("title") {
        Some(Value::String(title)) => Some(title),
        _ => None,
    };

    Ok(Task {
        id: key.to_string(),
        deadline,
        title,
    })
}

/// Accept integers, and floats that hold an exact integral millisecond value.
fn parse_deadline(key: &str, value: &Value) -> Result<i64> {
    let invalid = |reason: String| Error::InvalidDeadline {
        task_id: key.to_string(),
        reason,
    };

    let number = match value {
        Value::Number(number) => number,
        other => return Err(invalid(format!("expected a number, found {}", value_kind(other)))),
    };

    if let Some(millis) = number.as_i64() {
        return Ok(millis);
    }

    match number.as_f64() {
        Some(millis)
            if millis.is_finite()
                && millis.fract() == 0.0
                && millis >= i64::MIN as f64
                && millis < i64::MAX as f64 =>
        {
            Ok(millis as i64)
        }
        _ => Err(invalid(format!("{number} is not a whole millisecond timestamp"))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(collection: &TaskCollection) -> Vec<&str> {
        collection.iter().map(|task| task.id.as_str()).collect()
    }

    #[test]
    fn preserves_source_key_order() {
        let outcome = TaskCollection::from_json_str(
            r#"{"zeta": {"deadline": 3}, "alpha": {"deadline": 1}, "mid": {"deadline": 2}}"#,
        )
        .expect("load");
        assert_eq!(ids(&outcome.collection), vec!["zeta", "alpha", "mid"]);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn quarantines_bad_deadlines_without_dropping_the_rest() {
        let outcome = TaskCollection::from_json_str(
            r#"{
                "ok": {"id": "ok", "deadline": 1710460800000, "title": "Rent"},
                "missing": {"title": "No due date"},
                "text": {"deadline": "tomorrow"},
                "fractional": {"deadline": 1.5},
                "null": {"deadline": null}
            }"#,
        )
        .expect("load");

        assert_eq!(ids(&outcome.collection), vec!["ok"]);
        assert_eq!(
            outcome.collection.get("ok").and_then(|t| t.title.as_deref()),
            Some("Rent")
        );
        let rejected: Vec<&str> = outcome.rejected.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(rejected, vec!["missing", "text", "fractional", "null"]);
        for record in &outcome.rejected {
            assert!(matches!(record.error, Error::InvalidDeadline { .. }));
        }
    }

    #[test]
    fn integral_float_deadline_is_accepted() {
        let outcome =
            TaskCollection::from_json_str(r#"{"a": {"deadline": 1710460800000.0}}"#).expect("load");
        assert_eq!(
            outcome.collection.get("a").map(|t| t.deadline),
            Some(1_710_460_800_000)
        );
    }

    #[test]
    fn mismatched_id_is_rejected() {
        let outcome =
            TaskCollection::from_json_str(r#"{"a": {"id": "b", "deadline": 0}}"#).expect("load");
        assert!(outcome.collection.is_empty());
        assert!(matches!(
            outcome.rejected[0].error,
            Error::InvalidTaskRecord(_)
        ));
    }

    #[test]
    fn non_object_record_is_rejected() {
        let outcome = TaskCollection::from_json_str(r#"{"a": 42}"#).expect("load");
        assert!(outcome.collection.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[test]
    fn top_level_array_is_an_error() {
        let err = TaskCollection::from_json_str("[]").expect_err("array input");
        assert!(matches!(err, Error::InvalidTaskRecord(_)));
    }

    #[test]
    fn malformed_json_is_a_task_record_error() {
        let err = TaskCollection::from_json_str(r#"{"a": {"deadline": 1,}"#).expect_err("bad json");
        assert!(matches!(err, Error::InvalidTaskRecord(_)));
        assert_eq!(err.exit_code(), crate::error::exit_codes::USER_ERROR);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut collection: TaskCollection =
            vec![Task::new("a", 1), Task::new("b", 2)].into_iter().collect();
        let previous = collection.insert(Task::new("a", 10));
        assert_eq!(previous.map(|t| t.deadline), Some(1));
        assert_eq!(ids(&collection), vec!["a", "b"]);
        assert_eq!(collection.get("a").map(|t| t.deadline), Some(10));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.json");
        let err = TaskCollection::load(&path).expect_err("missing file");
        assert!(matches!(err, Error::TaskFileNotFound(_)));
    }
}
