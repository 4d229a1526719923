//! Per-user record collections over the key-value medium.
//!
//! Each collection is partitioned by owner: the crops of user `u1` live under
//! `agropocket_crops:u1`, never alongside anyone else's. Reads and writes only
//! ever touch the session user's partition, so one user's writes cannot clobber
//! another user's data and a read cannot leak it.

use std::collections::HashSet;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::record::{OwnedRecord, UserOwned};
use crate::core::storage::{read_json, write_json, KeyValueStore};
use crate::{AgroError, Result, Session};

/// Key of `user_id`'s partition of the collection stored at `base_key`.
pub(crate) fn partition_key(base_key: &str, user_id: &str) -> String {
    format!("{base_key}:{user_id}")
}

/// Loads a partition; an absent or unreadable value is an empty partition.
pub(crate) fn load_partition<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<T>> {
    Ok(read_json(kv, key)?.unwrap_or_default())
}

/// Splits a legacy cross-user array stored directly at `base_key` into per-user partitions.
///
/// Entries already present in a partition (same id) are skipped, so running the
/// migration again after an interruption is harmless. A legacy value that does
/// not parse is left in place. `arrange` runs on each merged partition before
/// it is written. Returns the number of entries moved.
pub(crate) fn migrate_legacy_collection<T>(
    kv: &dyn KeyValueStore,
    base_key: &str,
    arrange: impl Fn(&mut Vec<T>),
) -> Result<usize>
where
    T: UserOwned + Serialize + DeserializeOwned,
{
    let Some(raw) = kv.get(base_key)? else {
        return Ok(0);
    };
    let legacy: Vec<T> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("leaving unreadable legacy collection '{base_key}' in place: {e}");
            return Ok(0);
        }
    };

    // Group by owner, keeping first-seen owner order and per-owner entry order.
    let mut owners: Vec<String> = Vec::new();
    let mut groups: Vec<Vec<T>> = Vec::new();
    for entry in legacy {
        match owners.iter().position(|o| o == entry.user_id()) {
            Some(i) => groups[i].push(entry),
            None => {
                owners.push(entry.user_id().to_string());
                groups.push(vec![entry]);
            }
        }
    }

    let mut moved = 0;
    for (owner, entries) in owners.iter().zip(groups) {
        let key = partition_key(base_key, owner);
        let mut partition: Vec<T> = load_partition(kv, &key)?;
        let known: HashSet<String> = partition.iter().map(|e| e.id().to_string()).collect();
        for entry in entries {
            if !known.contains(entry.id()) {
                partition.push(entry);
                moved += 1;
            }
        }
        arrange(&mut partition);
        write_json(kv, &key, &partition)?;
    }
    kv.remove(base_key)?;

    log::info!("migrated {moved} entries from legacy collection '{base_key}'");
    Ok(moved)
}

/// Durable CRUD for one record kind, scoped to the session user.
pub struct RecordStore<T> {
    base_key: String,
    _kind: PhantomData<T>,
}

impl<T: OwnedRecord> RecordStore<T> {
    /// Creates a store whose keys start with `{key_prefix}_{collection}`.
    pub fn new(key_prefix: &str) -> Self {
        Self {
            base_key: format!("{key_prefix}_{}", T::KIND.collection_name()),
            _kind: PhantomData,
        }
    }

    /// The legacy, unpartitioned key; partition keys extend it with `:{userId}`.
    pub fn base_key(&self) -> &str {
        &self.base_key
    }

    /// Returns the session user's records in stored order.
    ///
    /// An anonymous session, a missing partition and a corrupt partition all
    /// yield an empty list.
    pub fn list(&self, kv: &dyn KeyValueStore, session: &Session) -> Result<Vec<T>> {
        let Some(user_id) = session.user_id() else {
            return Ok(Vec::new());
        };
        let records: Vec<T> = load_partition(kv, &partition_key(&self.base_key, user_id))?;
        // Partitions are written by owner, but a hand-edited value could still hold strays.
        Ok(records.into_iter().filter(|r| r.user_id() == user_id).collect())
    }

    /// Looks up one of the session user's records by id.
    pub fn get(&self, kv: &dyn KeyValueStore, session: &Session, id: &str) -> Result<Option<T>> {
        Ok(self.list(kv, session)?.into_iter().find(|r| r.id() == id))
    }

    /// Inserts `record`, or replaces the record with the same id in place.
    ///
    /// The caller sets `id` and `userId`; the store assigns neither.
    ///
    /// # Errors
    ///
    /// Returns [`AgroError::NotAuthenticated`] for an anonymous session and
    /// [`AgroError::OwnershipMismatch`] if `record` is owned by someone other
    /// than the session user.
    pub fn upsert(&self, kv: &dyn KeyValueStore, session: &Session, record: T) -> Result<()> {
        let user_id = session.user_id().ok_or(AgroError::NotAuthenticated)?;
        if record.user_id() != user_id {
            return Err(AgroError::OwnershipMismatch {
                record_id: record.id().to_string(),
            });
        }

        let key = partition_key(&self.base_key, user_id);
        let mut records: Vec<T> = load_partition(kv, &key)?;
        match records.iter().position(|r| r.id() == record.id()) {
            Some(index) => {
                log::debug!("replacing {:?} {}", T::KIND, record.id());
                records[index] = record;
            }
            None => {
                log::debug!("inserting {:?} {}", T::KIND, record.id());
                records.push(record);
            }
        }
        write_json(kv, &key, &records)
    }

    /// Removes the session user's record with `id`, returning it if it existed.
    ///
    /// Removing an unknown id, or removing with an anonymous session, changes nothing.
    pub fn remove_by_id(
        &self,
        kv: &dyn KeyValueStore,
        session: &Session,
        id: &str,
    ) -> Result<Option<T>> {
        let Some(user_id) = session.user_id() else {
            return Ok(None);
        };
        let key = partition_key(&self.base_key, user_id);
        let mut records: Vec<T> = load_partition(kv, &key)?;
        let Some(index) = records.iter().position(|r| r.id() == id) else {
            return Ok(None);
        };
        let removed = records.remove(index);
        write_json(kv, &key, &records)?;
        log::debug!("removed {:?} {id}", T::KIND);
        Ok(Some(removed))
    }

    /// Moves records from the legacy cross-user key into per-user partitions.
    pub fn migrate_legacy(&self, kv: &dyn KeyValueStore) -> Result<usize> {
        migrate_legacy_collection::<T>(kv, &self.base_key, |_| {})
    }
}
