//! Background task that drops idle search results.

use std::sync::Arc;
use std::time::Duration;

use booklens_core::session::SessionStore;
use tokio::task::JoinHandle;

/// Every `interval`, clears the results of sessions idle for longer than
/// `idle_timeout`. Preferences and persisted settings are left alone.
///
/// The first sweep happens one full interval after spawning.
pub fn spawn_sweeper(
    sessions: Arc<dyn SessionStore>,
    interval: Duration,
    idle_timeout: chrono::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval() fires immediately; skip that tick.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let cleared = sessions.sweep(chrono::Utc::now() - idle_timeout);
            if cleared > 0 {
                tracing::info!(cleared, "swept idle sessions");
            } else {
                tracing::debug!("session sweep found nothing idle");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use booklens_core::session::{InMemorySessionStore, SearchSession, UserSession};
    use booklens_core::pagination::{Cursor, PageSet};

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_clears_idle_results() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut session = UserSession::new(chrono::Utc::now() - chrono::Duration::hours(3));
        session.search = Some(SearchSession::books(
            "query",
            Cursor::new(PageSet::new(Vec::new(), 20, 0)),
        ));
        store.put(1, session);

        let handle = spawn_sweeper(
            store.clone(),
            Duration::from_secs(60),
            chrono::Duration::hours(1),
        );
        tokio::time::sleep(Duration::from_secs(61)).await;

        // default prefs: nothing left worth keeping
        assert!(store.get(1).is_none());
        handle.abort();
    }
}
