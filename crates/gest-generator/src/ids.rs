//! Pending point identifier bookkeeping.

use chrono::{DateTime, Utc};
use gest_types::{Record, ValidationError};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::protocol::ID_KEY;

/// Tracks identifiers handed out by `suggest` that have not yet come back
/// through `ingest`.
#[derive(Debug, Clone, Default)]
pub struct IdTracker {
    pending: HashMap<Uuid, DateTime<Utc>>,
}

impl IdTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh identifier and stamp it onto `record`.
    pub fn tag(&mut self, record: &mut Record) -> Uuid {
        let id = Uuid::new_v4();
        self.pending.insert(id, Utc::now());
        record.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        id
    }

    pub fn is_pending(&self, id: &Uuid) -> bool {
        self.pending.contains_key(id)
    }

    pub fn issued_at(&self, id: &Uuid) -> Option<DateTime<Utc>> {
        self.pending.get(id).copied()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Resolve the identifiers carried by a batch without retiring anything.
    ///
    /// Records without an id are external data and are skipped. Any id that
    /// is malformed, unknown, or repeated within the batch fails the batch.
    pub fn check(&self, records: &[Record]) -> Result<Vec<Uuid>, ValidationError> {
        let mut seen = HashSet::new();
        let mut matched = Vec::new();

        for record in records {
            let Some(raw) = record.get(ID_KEY) else {
                continue;
            };
            let id = raw
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .filter(|id| self.is_pending(id))
                .ok_or_else(|| ValidationError::UnknownId(display_id(raw)))?;
            if !seen.insert(id) {
                return Err(ValidationError::DuplicateId(id.to_string()));
            }
            matched.push(id);
        }

        Ok(matched)
    }

    pub fn retire(&mut self, ids: &[Uuid]) {
        for id in ids {
            self.pending.remove(id);
        }
    }
}

fn display_id(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tagged(tracker: &mut IdTracker) -> Record {
        let mut record = Record::new();
        tracker.tag(&mut record);
        record
    }

    #[test]
    fn issued_ids_are_unique_and_pending() {
        let mut tracker = IdTracker::new();
        let a = tagged(&mut tracker);
        let b = tagged(&mut tracker);
        assert_ne!(a[ID_KEY], b[ID_KEY]);
        assert_eq!(tracker.pending_count(), 2);

        let id = Uuid::parse_str(a[ID_KEY].as_str().unwrap()).unwrap();
        assert!(tracker.issued_at(&id).is_some());
    }

    #[test]
    fn check_then_retire() {
        let mut tracker = IdTracker::new();
        let a = tagged(&mut tracker);
        let external = Record::new();

        let ids = tracker.check(&[a.clone(), external]).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(tracker.pending_count(), 1);

        tracker.retire(&ids);
        assert_eq!(tracker.pending_count(), 0);
        assert!(matches!(tracker.check(&[a]), Err(ValidationError::UnknownId(_))));
    }

    #[test]
    fn rejects_fabricated_and_malformed_ids() {
        let mut tracker = IdTracker::new();
        let _ = tagged(&mut tracker);

        let mut fabricated = Record::new();
        fabricated.insert(ID_KEY.into(), json!(Uuid::new_v4().to_string()));
        assert!(matches!(tracker.check(&[fabricated]), Err(ValidationError::UnknownId(_))));

        let mut malformed = Record::new();
        malformed.insert(ID_KEY.into(), json!(7));
        assert_eq!(
            tracker.check(&[malformed]),
            Err(ValidationError::UnknownId("7".to_string()))
        );
    }

    #[test]
    fn rejects_duplicate_ids_in_batch() {
        let mut tracker = IdTracker::new();
        let a = tagged(&mut tracker);
        assert!(matches!(
            tracker.check(&[a.clone(), a]),
            Err(ValidationError::DuplicateId(_))
        ));
        assert_eq!(tracker.pending_count(), 1);
    }
}
