use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A write held for confirmation: the statement plus the connection it
/// must execute under.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub id: Uuid,
    pub connection: String,
    pub sql: String,
    pub summary: String,
    pub expires_at: DateTime<Utc>,
}

struct StoredWrite {
    pending: PendingWrite,
    deadline: Instant,
}

/// Process-local store of pending writes.
///
/// Tokens are single-use: `take` removes the entry whether or not it is
/// still live, so a second confirmation of the same id always misses.
/// Expired entries are purged on every access; the lock is never held
/// across I/O.
pub struct ConfirmationStore {
    ttl: Duration,
    inner: Mutex<HashMap<Uuid, StoredWrite>>,
}

impl ConfirmationStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(
        &self,
        connection: impl Into<String>,
        sql: impl Into<String>,
        summary: impl Into<String>,
    ) -> PendingWrite {
        let pending = PendingWrite {
            id: Uuid::new_v4(),
            connection: connection.into(),
            sql: sql.into(),
            summary: summary.into(),
            expires_at: Utc::now()
                + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero()),
        };

        let mut inner = self.inner.lock().expect("confirmation store poisoned");
        purge(&mut inner);
        inner.insert(
            pending.id,
            StoredWrite {
                pending: pending.clone(),
                deadline: Instant::now() + self.ttl,
            },
        );
        pending
    }

    /// Consumes a token. Returns `None` for unknown, expired, or already
    /// consumed ids.
    pub fn take(&self, id: Uuid) -> Option<PendingWrite> {
        let mut inner = self.inner.lock().expect("confirmation store poisoned");
        purge(&mut inner);
        inner.remove(&id).map(|stored| stored.pending)
    }

    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock().expect("confirmation store poisoned");
        purge(&mut inner);
        inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn purge(inner: &mut HashMap<Uuid, StoredWrite>) {
    let now = Instant::now();
    inner.retain(|_, stored| stored.deadline > now);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_single_use() {
        let store = ConfirmationStore::new(Duration::from_secs(300));
        let pending = store.insert("prod", "DELETE FROM t WHERE id = 1", "DELETE on t");

        let taken = store.take(pending.id).expect("first take succeeds");
        assert_eq!(taken.sql, "DELETE FROM t WHERE id = 1");
        assert_eq!(taken.connection, "prod");

        assert!(store.take(pending.id).is_none(), "second take must miss");
    }

    #[test]
    fn unknown_tokens_miss() {
        let store = ConfirmationStore::new(Duration::from_secs(300));
        assert!(store.take(Uuid::new_v4()).is_none());
    }

    #[test]
    fn expired_tokens_miss_and_are_purged() {
        let store = ConfirmationStore::new(Duration::ZERO);
        let pending = store.insert("prod", "UPDATE t SET a = 1", "UPDATE on t");
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.take(pending.id).is_none());
        assert!(store.is_empty());
    }
}
