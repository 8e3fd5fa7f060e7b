//! Per-user ephemeral state: the live result set, its cursor, and the
//! session-only preferences.
//!
//! The [`SessionStore`] trait is injected into
//! [`LibraryService`](crate::service::LibraryService); the in-memory
//! implementation keeps everything in one process. Nothing here is durable:
//! a restart or an idle [`sweep`](SessionStore::sweep) drops search results.
//! Sweeping never touches [`SessionPrefs`] or the persistent settings; an
//! idle session left with nothing but default prefs is removed outright.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::models::{Book, SearchMode, SeriesEntry, SizeLimit, UserId};
use crate::pagination::Cursor;

/// What the current book pages came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchContext {
    /// A direct book search.
    Books,
    /// A series search; book pages, if any, come from a drill-down.
    Series,
}

/// The live result set of one user.
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub context: SearchContext,
    pub books: Option<Cursor<Book>>,
    pub series: Option<Cursor<SeriesEntry>>,
    /// Text of the query that produced the result set.
    pub query: String,
    /// Series currently drilled into.
    pub series_name: Option<String>,
}

impl SearchSession {
    pub fn books(query: &str, cursor: Cursor<Book>) -> Self {
        Self {
            context: SearchContext::Books,
            books: Some(cursor),
            series: None,
            query: query.to_string(),
            series_name: None,
        }
    }

    pub fn series(query: &str, cursor: Cursor<SeriesEntry>) -> Self {
        Self {
            context: SearchContext::Series,
            books: None,
            series: Some(cursor),
            query: query.to_string(),
            series_name: None,
        }
    }
}

/// Preferences that live with the session rather than the settings store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPrefs {
    pub search_mode: SearchMode,
    pub size_limit: Option<SizeLimit>,
}

/// Everything kept for one user between requests.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub prefs: SessionPrefs,
    pub search: Option<SearchSession>,
    pub last_activity: DateTime<Utc>,
}

impl UserSession {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            prefs: SessionPrefs::default(),
            search: None,
            last_activity: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }
}

/// Storage for [`UserSession`]s, keyed strictly by user.
pub trait SessionStore: Send + Sync {
    fn get(&self, user_id: UserId) -> Option<UserSession>;

    fn put(&self, user_id: UserId, session: UserSession);

    /// Runs `f` on the user's session while holding the store's lock, so
    /// concurrent updates for one user cannot overwrite each other. A
    /// missing session is created first. The session is marked active at
    /// `now`.
    fn update(&self, user_id: UserId, now: DateTime<Utc>, f: &mut dyn FnMut(&mut UserSession));

    /// Removes a user's session entirely. Returns whether one existed.
    fn evict(&self, user_id: UserId) -> bool;

    /// Drops the search results of every session idle since before
    /// `cutoff`, keeping its preferences. Returns how many were cleared.
    /// Idle sessions whose preferences are the defaults are removed.
    fn sweep(&self, cutoff: DateTime<Utc>) -> usize;
}

/// Process-local [`SessionStore`].
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<UserId, UserSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user_id: UserId) -> Option<UserSession> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(&user_id).cloned()
    }

    fn put(&self, user_id: UserId, session: UserSession) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(user_id, session);
    }

    fn update(&self, user_id: UserId, now: DateTime<Utc>, f: &mut dyn FnMut(&mut UserSession)) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let session = sessions
            .entry(user_id)
            .or_insert_with(|| UserSession::new(now));
        f(session);
        session.touch(now);
    }

    fn evict(&self, user_id: UserId) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(&user_id).is_some()
    }

    fn sweep(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let mut cleared = 0;
        sessions.retain(|_, session| {
            if session.last_activity >= cutoff {
                return true;
            }
            if session.search.take().is_some() {
                cleared += 1;
            }
            session.prefs != SessionPrefs::default()
        });
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageSet;
    use chrono::Duration;

    fn session_with_results(now: DateTime<Utc>) -> UserSession {
        let mut s = UserSession::new(now);
        s.prefs.size_limit = Some(SizeLimit::Smaller);
        s.search = Some(SearchSession::series(
            "query",
            Cursor::new(PageSet::new(Vec::new(), 20, 0)),
        ));
        s
    }

    #[test]
    fn test_sessions_keyed_by_user() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        store.put(1, session_with_results(now));
        store.put(2, UserSession::new(now));

        assert!(store.get(1).unwrap().search.is_some());
        assert!(store.get(2).unwrap().search.is_none());
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_sweep_clears_only_idle_results() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        store.put(1, session_with_results(now - Duration::hours(2)));
        store.put(2, session_with_results(now));

        let cleared = store.sweep(now - Duration::hours(1));
        assert_eq!(cleared, 1);

        let idle = store.get(1).unwrap();
        assert!(idle.search.is_none());
        assert_eq!(idle.prefs.size_limit, Some(SizeLimit::Smaller));
        assert!(store.get(2).unwrap().search.is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_sweep_twice_counts_once() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        store.put(1, session_with_results(now - Duration::hours(2)));
        assert_eq!(store.sweep(now), 1);
        assert_eq!(store.sweep(now), 0);
    }

    #[test]
    fn test_sweep_removes_sessions_with_default_prefs() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let mut plain = session_with_results(now - Duration::hours(2));
        plain.prefs = SessionPrefs::default();
        store.put(1, plain);
        store.put(2, UserSession::new(now - Duration::hours(2)));
        store.put(3, session_with_results(now - Duration::hours(2)));
        store.put(4, UserSession::new(now));

        assert_eq!(store.sweep(now - Duration::hours(1)), 2);
        assert!(store.get(1).is_none());
        assert!(store.get(2).is_none());
        assert_eq!(
            store.get(3).unwrap().prefs.size_limit,
            Some(SizeLimit::Smaller)
        );
        assert!(store.get(4).is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_update_creates_and_touches() {
        let store = InMemorySessionStore::new();
        let then = Utc::now() - Duration::hours(2);
        let now = Utc::now();

        store.update(1, then, &mut |s| s.prefs.search_mode = SearchMode::Series);
        store.update(1, now, &mut |s| s.prefs.size_limit = Some(SizeLimit::Larger));

        let session = store.get(1).unwrap();
        assert_eq!(session.prefs.search_mode, SearchMode::Series);
        assert_eq!(session.prefs.size_limit, Some(SizeLimit::Larger));
        assert_eq!(session.last_activity, now);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let store = std::sync::Arc::new(InMemorySessionStore::new());
        store.put(1, session_with_results(Utc::now()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.update(1, Utc::now(), &mut |s| {
                            if let Some(search) = s.search.as_mut() {
                                search.query.push('x');
                            }
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let query = store.get(1).unwrap().search.unwrap().query;
        assert_eq!(query.len(), "query".len() + 800);
    }

    #[test]
    fn test_evict() {
        let store = InMemorySessionStore::new();
        store.put(5, UserSession::new(Utc::now()));
        assert!(store.evict(5));
        assert!(!store.evict(5));
        assert!(store.is_empty());
    }
}
