//! Persistence of accelerometer axis assignments
//!
//! Assignments are kept as six string entries in a [`KeyValueStore`]: the
//! axis label of each raw slot under `AccelOrientA/B/C` and its inversion
//! flag under `AccelInvertA/B/C`. Where the entries end up (preferences file,
//! registry, a map in memory) is up to the store implementation.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::axes::{Axis, AxisAssignment};

/// Keys holding the axis label of raw slots 0, 1 and 2
pub const ORIENT_KEYS: [&str; 3] = ["AccelOrientA", "AccelOrientB", "AccelOrientC"];
/// Keys holding the inversion flag of raw slots 0, 1 and 2
pub const INVERT_KEYS: [&str; 3] = ["AccelInvertA", "AccelInvertB", "AccelInvertC"];

/// Errors raised while reading or writing persisted assignments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Stored value is not an axis label
    #[error("key '{key}' holds '{value}', expected X, Y or Z")]
    InvalidAxis { key: String, value: String },

    /// Stored value is not a boolean flag
    #[error("key '{key}' holds '{value}', expected True or False")]
    InvalidFlag { key: String, value: String },

    /// Key required by the caller is absent
    #[error("key '{0}' not found")]
    MissingKey(String),

    /// The underlying store failed
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// String key/value store the assignments are persisted in
pub trait KeyValueStore {
    /// Value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: String);

    /// Whether `key` holds a value
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Write pending changes to the backing medium
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// In-memory store, mostly for tests and hosts without persistent settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove the entry under `key`, returning its value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

fn format_flag(flag: bool) -> String {
    let label = if flag { "True" } else { "False" };
    label.to_string()
}

fn parse_flag(key: &str, value: &str) -> Result<bool, StorageError> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(StorageError::InvalidFlag {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn read<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<String, StorageError> {
    store
        .get(key)
        .ok_or_else(|| StorageError::MissingKey(key.to_string()))
}

/// Load the persisted assignment.
///
/// On first use, when any of the six keys is missing, the default
/// assignment is written to the store and returned.
///
/// # Example
/// ```
/// use tilt_compass_ahrs::AxisAssignment;
/// use tilt_compass_ahrs::storage::{KeyValueStore, MemoryStore, load_axis_assignment};
///
/// let mut store = MemoryStore::new();
/// let assignment = load_axis_assignment(&mut store).unwrap();
///
/// assert_eq!(assignment, AxisAssignment::default());
/// assert_eq!(store.get("AccelOrientB").as_deref(), Some("Y"));
/// assert_eq!(store.get("AccelInvertB").as_deref(), Some("False"));
/// ```
pub fn load_axis_assignment<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<AxisAssignment, StorageError> {
    let complete = ORIENT_KEYS.iter().chain(INVERT_KEYS.iter()).all(|key| store.contains(key));
    if !complete {
        debug!("axis assignment not stored yet, writing defaults");
        return reset_axis_assignment(store);
    }

    let mut assignment = AxisAssignment::default();
    for slot in 0..3 {
        let label = read(&*store, ORIENT_KEYS[slot])?;
        assignment.axes[slot] = label.parse::<Axis>().map_err(|_| StorageError::InvalidAxis {
            key: ORIENT_KEYS[slot].to_string(),
            value: label.clone(),
        })?;

        let flag = read(&*store, INVERT_KEYS[slot])?;
        assignment.inverted[slot] = parse_flag(INVERT_KEYS[slot], &flag)?;
    }

    Ok(assignment)
}

/// Write an assignment and flush the store
pub fn save_axis_assignment<S: KeyValueStore + ?Sized>(
    store: &mut S,
    assignment: &AxisAssignment,
) -> Result<(), StorageError> {
    for slot in 0..3 {
        store.set(ORIENT_KEYS[slot], assignment.axes[slot].to_string());
        store.set(INVERT_KEYS[slot], format_flag(assignment.inverted[slot]));
    }
    store.flush()?;

    info!("saved axis assignment {:?} inverted {:?}", assignment.axes, assignment.inverted);
    Ok(())
}

/// Overwrite the stored assignment with the default and return it
pub fn reset_axis_assignment<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<AxisAssignment, StorageError> {
    let assignment = AxisAssignment::default();
    save_axis_assignment(store, &assignment)?;
    Ok(assignment)
}
