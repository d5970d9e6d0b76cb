//! Identity mapping: legacy users to usernames, and opaque id generation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::record::LegacyKey;

/// Translates legacy user ids into target-system usernames.
///
/// Implement this trait to source the mapping from somewhere other than a
/// static table.
pub trait IdentityResolver: Send + Sync {
    /// Returns the username for `legacy_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownUser`] if the id has no mapping.
    fn resolve_user(&self, legacy_id: &LegacyKey) -> Result<String>;
}

/// Identity table fixed at configuration time.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityTable {
    users: HashMap<LegacyKey, String>,
}

impl StaticIdentityTable {
    /// Creates a table from `(legacy id, username)` pairs.
    pub fn new<I, K, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<LegacyKey>,
        S: Into<String>,
    {
        Self {
            users: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Accounts that still upload to MeTube.
    #[must_use]
    pub fn legacy_default() -> Self {
        Self::new([(1, "topongo"), (4, "saffron"), (5, "banana")])
    }

    /// Number of mapped users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// True if no user is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl IdentityResolver for StaticIdentityTable {
    fn resolve_user(&self, legacy_id: &LegacyKey) -> Result<String> {
        self.users
            .get(legacy_id)
            .cloned()
            .ok_or_else(|| Error::UnknownUser(legacy_id.clone()))
    }
}

/// Source of fresh opaque identifiers for games and media files.
pub trait IdGenerator: Send + Sync {
    /// Returns an identifier never returned before.
    fn next_id(&self) -> String;
}

/// Generates 24-hex-digit ids shaped like MongoDB ObjectIds: a 4-byte
/// timestamp followed by 8 random bytes.
#[derive(Debug, Default)]
pub struct ObjectIdGenerator;

impl IdGenerator for ObjectIdGenerator {
    fn next_id(&self) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let random = uuid::Uuid::new_v4().as_u128() as u64;
        format!("{:08x}{:016x}", secs as u32, random)
    }
}

/// Deterministic generator counting up from 1.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    /// Creates a generator starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{n:024x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_resolve_known_user() {
        let table = StaticIdentityTable::legacy_default();
        assert_eq!(table.resolve_user(&LegacyKey::Int(1)).unwrap(), "topongo");
        assert_eq!(table.resolve_user(&LegacyKey::Int(5)).unwrap(), "banana");
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_resolve_unknown_user() {
        let table = StaticIdentityTable::legacy_default();
        let err = table.resolve_user(&LegacyKey::Int(2)).unwrap_err();
        assert!(matches!(err, Error::UnknownUser(LegacyKey::Int(2))));
    }

    #[test]
    fn test_object_ids_are_unique_hex() {
        let ids = ObjectIdGenerator;
        let generated: HashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 1000);
        assert!(generated
            .iter()
            .all(|id| id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit())));
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id(), "000000000000000000000001");
        assert_eq!(ids.next_id(), "000000000000000000000002");
    }
}
