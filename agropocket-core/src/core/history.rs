//! Append-only activity history for the AgroPocket workspace.
//!
//! Every create, update and delete of a crop, input or harvest is recorded as
//! a [`HistoryEntry`]. Entries are never edited or removed through this API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::collection::{load_partition, migrate_legacy_collection, partition_key};
use crate::core::record::UserOwned;
use crate::core::storage::{write_json, KeyValueStore};
use crate::{Result, Session};

/// What kind of record a history entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Crop,
    Input,
    Harvest,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Created,
    Updated,
    Deleted,
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Stable UUID for this entry.
    pub id: String,
    /// Id of the user who performed the action.
    pub user_id: String,
    /// Kind of record affected.
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub action: HistoryAction,
    /// Human-readable summary, e.g. `"Created crop: Corn"`.
    pub description: String,
    /// Wall-clock time the entry was written.
    pub timestamp: DateTime<Utc>,
    /// Id of the affected record, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
}

impl UserOwned for HistoryEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Criteria for [`HistoryLog::list_filtered`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub kind: Option<HistoryKind>,
    pub action: Option<HistoryAction>,
    /// Inclusive lower bound on `timestamp`.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub until: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    #[must_use]
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        self.kind.map_or(true, |k| entry.kind == k)
            && self.action.map_or(true, |a| entry.action == a)
            && self.since.map_or(true, |t| entry.timestamp >= t)
            && self.until.map_or(true, |t| entry.timestamp <= t)
    }
}

/// Entry counts per record kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total: usize,
    pub crops: usize,
    pub inputs: usize,
    pub harvests: usize,
}

impl HistoryStats {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let count = |kind: HistoryKind| entries.iter().filter(|e| e.kind == kind).count();
        Self {
            total: entries.len(),
            crops: count(HistoryKind::Crop),
            inputs: count(HistoryKind::Input),
            harvests: count(HistoryKind::Harvest),
        }
    }
}

/// Records mutations to per-user history partitions.
pub struct HistoryLog {
    base_key: String,
}

impl HistoryLog {
    /// Creates a log stored under `{key_prefix}_history:{userId}`.
    pub fn new(key_prefix: &str) -> Self {
        Self {
            base_key: format!("{key_prefix}_history"),
        }
    }

    /// Returns the session user's entries in the order they were written.
    pub fn list(&self, kv: &dyn KeyValueStore, session: &Session) -> Result<Vec<HistoryEntry>> {
        let Some(user_id) = session.user_id() else {
            return Ok(Vec::new());
        };
        let entries: Vec<HistoryEntry> = load_partition(kv, &partition_key(&self.base_key, user_id))?;
        Ok(entries.into_iter().filter(|e| e.user_id == user_id).collect())
    }

    /// Returns the session user's entries matching `filter`, newest first.
    pub fn list_filtered(
        &self,
        kv: &dyn KeyValueStore,
        session: &Session,
        filter: &HistoryFilter,
    ) -> Result<Vec<HistoryEntry>> {
        let mut entries: Vec<HistoryEntry> = self
            .list(kv, session)?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        // Stable sort: entries sharing a timestamp keep reverse write order.
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// Appends an entry for the session user and returns it.
    ///
    /// Does nothing and returns `Ok(None)` for an anonymous session. The
    /// timestamp never precedes the user's previous entry, even if the system
    /// clock stepped backwards.
    pub fn append(
        &self,
        kv: &dyn KeyValueStore,
        session: &Session,
        kind: HistoryKind,
        action: HistoryAction,
        description: impl Into<String>,
        related_id: Option<&str>,
    ) -> Result<Option<HistoryEntry>> {
        let Some(user_id) = session.user_id() else {
            return Ok(None);
        };
        let key = partition_key(&self.base_key, user_id);
        let mut entries: Vec<HistoryEntry> = load_partition(kv, &key)?;

        let now = Utc::now();
        let timestamp = entries
            .last()
            .map_or(now, |last| last.timestamp.max(now));

        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            action,
            description: description.into(),
            timestamp,
            related_id: related_id.map(str::to_string),
        };
        entries.push(entry.clone());
        write_json(kv, &key, &entries)?;

        log::debug!("history: {:?} {:?} by {user_id}", kind, action);
        Ok(Some(entry))
    }

    /// Moves entries from the legacy cross-user key into per-user partitions.
    ///
    /// Each merged partition is re-sorted by timestamp (stable, so equal
    /// timestamps keep their write order) so listing stays chronological.
    pub fn migrate_legacy(&self, kv: &dyn KeyValueStore) -> Result<usize> {
        migrate_legacy_collection::<HistoryEntry>(kv, &self.base_key, |entries| {
            entries.sort_by_key(|e| e.timestamp);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, User};
    use chrono::Duration;

    fn session_for(id: &str) -> Session {
        Session::for_user(User {
            id: id.to_string(),
            name: id.to_string(),
            email: format!("{id}@x.com"),
            password_hash: String::new(),
        })
    }

    #[test]
    fn test_append_stamps_user_id_and_time() {
        let kv = MemoryStore::new();
        let log = HistoryLog::new("agropocket");
        let alice = session_for("alice");

        let before = Utc::now();
        let entry = log
            .append(&kv, &alice, HistoryKind::Crop, HistoryAction::Created, "Created crop: Corn", Some("c1"))
            .unwrap()
            .unwrap();

        assert_eq!(entry.user_id, "alice");
        assert_eq!(entry.related_id.as_deref(), Some("c1"));
        assert!(entry.timestamp >= before);
        assert_eq!(log.list(&kv, &alice).unwrap(), vec![entry]);
    }

    #[test]
    fn test_append_without_session_is_a_no_op() {
        let kv = MemoryStore::new();
        let log = HistoryLog::new("agropocket");

        let result = log
            .append(&kv, &Session::anonymous(), HistoryKind::Other, HistoryAction::Created, "x", None)
            .unwrap();
        assert!(result.is_none());
        assert!(kv.get("agropocket_history").unwrap().is_none());
        assert!(kv.get("agropocket_history:").unwrap().is_none());
    }

    #[test]
    fn test_entries_grow_in_non_decreasing_time_per_user() {
        let kv = MemoryStore::new();
        let log = HistoryLog::new("agropocket");
        let alice = session_for("alice");
        let bob = session_for("bob");

        for i in 0..5 {
            log.append(&kv, &alice, HistoryKind::Input, HistoryAction::Updated, format!("a{i}"), None)
                .unwrap();
        }
        log.append(&kv, &bob, HistoryKind::Harvest, HistoryAction::Deleted, "b", None)
            .unwrap();

        let entries = log.list(&kv, &alice).unwrap();
        assert_eq!(entries.len(), 5);
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(entries.iter().all(|e| e.user_id == "alice"));
        assert_eq!(log.list(&kv, &bob).unwrap().len(), 1);
    }

    #[test]
    fn test_append_clamps_timestamp_after_clock_step_back() {
        let kv = MemoryStore::new();
        let log = HistoryLog::new("agropocket");
        let alice = session_for("alice");

        let future = Utc::now() + Duration::hours(1);
        let seeded = vec![HistoryEntry {
            id: "h0".to_string(),
            user_id: "alice".to_string(),
            kind: HistoryKind::Other,
            action: HistoryAction::Created,
            description: "seed".to_string(),
            timestamp: future,
            related_id: None,
        }];
        write_json(&kv, "agropocket_history:alice", &seeded).unwrap();

        let entry = log
            .append(&kv, &alice, HistoryKind::Crop, HistoryAction::Created, "next", None)
            .unwrap()
            .unwrap();
        assert_eq!(entry.timestamp, future);
    }

    #[test]
    fn test_list_filtered_by_kind_and_action_newest_first() {
        let kv = MemoryStore::new();
        let log = HistoryLog::new("agropocket");
        let alice = session_for("alice");

        log.append(&kv, &alice, HistoryKind::Crop, HistoryAction::Created, "first", None).unwrap();
        log.append(&kv, &alice, HistoryKind::Input, HistoryAction::Created, "input", None).unwrap();
        log.append(&kv, &alice, HistoryKind::Crop, HistoryAction::Deleted, "deleted", None).unwrap();
        log.append(&kv, &alice, HistoryKind::Crop, HistoryAction::Created, "second", None).unwrap();

        let filter = HistoryFilter {
            kind: Some(HistoryKind::Crop),
            action: Some(HistoryAction::Created),
            ..HistoryFilter::default()
        };
        let descriptions: Vec<String> = log
            .list_filtered(&kv, &alice, &filter)
            .unwrap()
            .into_iter()
            .map(|e| e.description)
            .collect();
        assert_eq!(descriptions, vec!["second", "first"]);
    }

    #[test]
    fn test_filter_time_bounds_are_inclusive() {
        let at = Utc::now();
        let entry = HistoryEntry {
            id: "h1".to_string(),
            user_id: "alice".to_string(),
            kind: HistoryKind::Harvest,
            action: HistoryAction::Updated,
            description: "Updated harvest: Corn".to_string(),
            timestamp: at,
            related_id: None,
        };
        let filter = HistoryFilter {
            since: Some(at),
            until: Some(at),
            ..HistoryFilter::default()
        };
        assert!(filter.matches(&entry));

        let later = HistoryFilter {
            since: Some(at + Duration::seconds(1)),
            ..HistoryFilter::default()
        };
        assert!(!later.matches(&entry));
    }

    #[test]
    fn test_stats_count_by_kind() {
        let kv = MemoryStore::new();
        let log = HistoryLog::new("agropocket");
        let alice = session_for("alice");
        log.append(&kv, &alice, HistoryKind::Crop, HistoryAction::Created, "c", None).unwrap();
        log.append(&kv, &alice, HistoryKind::Crop, HistoryAction::Updated, "c", None).unwrap();
        log.append(&kv, &alice, HistoryKind::Harvest, HistoryAction::Created, "h", None).unwrap();
        log.append(&kv, &alice, HistoryKind::Other, HistoryAction::Created, "o", None).unwrap();

        let stats = HistoryStats::from_entries(&log.list(&kv, &alice).unwrap());
        assert_eq!(
            stats,
            HistoryStats { total: 4, crops: 2, inputs: 0, harvests: 1 }
        );
    }

    #[test]
    fn test_migrate_legacy_merges_in_time_order() {
        let kv = MemoryStore::new();
        let log = HistoryLog::new("agropocket");
        let alice = session_for("alice");

        let recent = log
            .append(&kv, &alice, HistoryKind::Crop, HistoryAction::Created, "Created crop: Corn", None)
            .unwrap()
            .unwrap();
        let old = HistoryEntry {
            id: "legacy-1".to_string(),
            user_id: "alice".to_string(),
            kind: HistoryKind::Input,
            action: HistoryAction::Created,
            description: "Created input: Urea".to_string(),
            timestamp: "2020-01-01T00:00:00Z".parse().unwrap(),
            related_id: None,
        };
        write_json(&kv, "agropocket_history", &vec![old.clone()]).unwrap();

        assert_eq!(log.migrate_legacy(&kv).unwrap(), 1);
        assert!(kv.get("agropocket_history").unwrap().is_none());

        let entries = log.list(&kv, &alice).unwrap();
        assert_eq!(entries, vec![old, recent.clone()]);

        let next = log
            .append(&kv, &alice, HistoryKind::Crop, HistoryAction::Updated, "Updated crop: Corn", None)
            .unwrap()
            .unwrap();
        assert!(next.timestamp >= recent.timestamp);
        assert_eq!(log.migrate_legacy(&kv).unwrap(), 0);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = HistoryEntry {
            id: "h1".to_string(),
            user_id: "u1".to_string(),
            kind: HistoryKind::Input,
            action: HistoryAction::Deleted,
            description: "Deleted input: Urea".to_string(),
            timestamp: "2025-03-01T08:00:00Z".parse().unwrap(),
            related_id: Some("i1".to_string()),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"input\""));
        assert!(json.contains("\"action\":\"deleted\""));
        assert!(json.contains("\"relatedId\":\"i1\""));
        assert!(json.contains("\"userId\":\"u1\""));
    }
}
