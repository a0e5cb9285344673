//! Alarm scheduling (spec §4.1 "ensures an alarm is scheduled", §7 "recover
//! an overdue alarm after a crash"): the original serverless Durable Object
//! alarm becomes, in this long-running process, a persisted next-fire
//! timestamp plus a [`tokio::sync::Notify`] that wakes the run loop early
//! whenever `reschedule`/`cancel` changes it. Grounded in the teacher's
//! `infrastructure/persistence/database.rs` store-backed-durability style,
//! generalized from "survive a dropped connection" to "survive a process
//! restart".

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::domain::ports::{AlarmScheduler, StateStore};

pub struct StoreBackedAlarmScheduler {
    store: Arc<dyn StateStore>,
    notify: Arc<Notify>,
}

impl StoreBackedAlarmScheduler {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            notify: Arc::new(Notify::new()),
        }
    }

    /// A clone of the wake signal the run loop selects on alongside its
    /// sleep-until-alarm timer.
    pub fn notifier(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    /// Read back the persisted fire time; used on startup to recover an
    /// alarm an earlier process crashed before honoring (spec §7).
    pub async fn next_fire(&self) -> Result<Option<DateTime<Utc>>> {
        self.store.load_alarm().await
    }
}

#[async_trait]
impl AlarmScheduler for StoreBackedAlarmScheduler {
    async fn reschedule(&self, delay_secs: i64) -> Result<()> {
        let at = Utc::now() + chrono::Duration::seconds(delay_secs);
        self.store.save_alarm(at).await?;
        self.notify.notify_one();
        Ok(())
    }

    async fn cancel(&self) -> Result<()> {
        self.store.clear_alarm().await?;
        self.notify.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::SqliteStateStore;

    #[tokio::test]
    async fn reschedule_persists_a_future_fire_time() {
        let store = Arc::new(SqliteStateStore::new("sqlite::memory:").await.unwrap());
        let scheduler = StoreBackedAlarmScheduler::new(store);
        let before = Utc::now();
        scheduler.reschedule(30).await.unwrap();
        let fire = scheduler.next_fire().await.unwrap().unwrap();
        assert!(fire > before);
    }

    #[tokio::test]
    async fn cancel_clears_the_persisted_alarm() {
        let store = Arc::new(SqliteStateStore::new("sqlite::memory:").await.unwrap());
        let scheduler = StoreBackedAlarmScheduler::new(store);
        scheduler.reschedule(30).await.unwrap();
        scheduler.cancel().await.unwrap();
        assert!(scheduler.next_fire().await.unwrap().is_none());
    }
}
