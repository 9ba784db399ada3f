//! Per-user write locks.
//!
//! The commit of a generation run and the expiry sweep of the same user
//! both rewrite that user's jobs, profiles and files. Holding the user's
//! lock keeps them from interleaving. Image generation itself runs unlocked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use persona_core::types::DbId;
use tokio::sync::OwnedMutexGuard;

/// Lazily created async mutex per user id. Cheap to clone; clones share
/// the same lock table.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    inner: Arc<Mutex<HashMap<DbId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock of `user_id`. Released on drop.
    pub async fn lock(&self, user_id: DbId) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut table = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Drop entries nobody holds or waits on so the table tracks
            // active users only.
            table.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(table.entry(user_id).or_default())
        };
        mutex.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_user_waits_for_release() {
        let locks = UserLocks::new();
        let guard = locks.lock(7).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock(7).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("lock released")
            .unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_contend() {
        let locks = UserLocks::new();
        let _a = locks.lock(1).await;
        tokio::time::timeout(Duration::from_secs(1), locks.lock(2))
            .await
            .expect("independent lock");
    }
}
