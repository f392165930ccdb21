//! Server-side session store.
//!
//! Sessions are held in a sharded concurrent map keyed by session id. Every
//! update replaces the whole `Arc<Session>` in one operation, so a guard can
//! never observe a torn session (a new profile type next to an old access
//! token). Each entry carries a generation counter: an update that raced
//! with a newer one (a refresh resolving after a logout, a stale navigation
//! completing late) presents the generation it observed and is discarded if
//! the entry has moved on.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::types::{abbrev_uuid, Session, SessionId, UserId};

/// A snapshot of a stored session, carrying the generation observed at read
/// time for later compare-and-swap updates.
#[derive(Debug, Clone)]
pub struct SessionRef {
    pub sid: SessionId,
    pub generation: u64,
    pub session: Arc<Session>,
}

struct SessionEntry {
    generation: u64,
    session: Arc<Session>,
}

/// Concurrent map of live sessions.
#[derive(Default)]
pub struct SessionStore {
    entries: DashMap<SessionId, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly created session and return its id.
    pub fn insert(&self, session: Session) -> SessionId {
        let sid = Uuid::new_v4();
        debug!("Storing session {} for user {}", abbrev_uuid(&sid), abbrev_uuid(&session.user_id));
        self.entries.insert(
            sid,
            SessionEntry {
                generation: 0,
                session: Arc::new(session),
            },
        );
        sid
    }

    /// Read a session. Expired entries are evicted and read as absent.
    pub fn get(&self, sid: SessionId) -> Option<SessionRef> {
        if let Some(entry) = self.entries.get(&sid) {
            if !entry.session.is_expired() {
                return Some(SessionRef {
                    sid,
                    generation: entry.generation,
                    session: entry.session.clone(),
                });
            }
        } else {
            return None;
        }

        // Expired: the read guard above has been dropped, safe to remove.
        debug!("Evicting expired session {}", abbrev_uuid(&sid));
        self.entries.remove(&sid);
        None
    }

    /// Replace a session's state, but only if nothing else has replaced it
    /// since the caller observed `generation`. Returns whether the swap was
    /// applied; a `false` means the caller's state was stale and must be
    /// discarded, never applied after the fact.
    pub fn replace_if_current(&self, sid: SessionId, generation: u64, session: Session) -> bool {
        match self.entries.get_mut(&sid) {
            Some(mut entry) if entry.generation == generation => {
                entry.generation += 1;
                entry.session = Arc::new(session);
                true
            }
            Some(_) => {
                debug!("Discarding stale update for session {}", abbrev_uuid(&sid));
                false
            }
            None => false,
        }
    }

    /// Drop a session entirely (logout, or a 401 from the backend). No
    /// residual role or token data survives.
    pub fn remove(&self, sid: SessionId) -> bool {
        self.entries.remove(&sid).is_some()
    }

    /// Drop every session belonging to a user.
    pub fn remove_user(&self, user_id: UserId) -> usize {
        let sids: Vec<SessionId> = self
            .entries
            .iter()
            .filter(|entry| entry.session.user_id == user_id)
            .map(|entry| *entry.key())
            .collect();
        let count = sids.len();
        for sid in sids {
            self.entries.remove(&sid);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProfileType;
    use chrono::Utc;

    fn test_session(profile: ProfileType) -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            profile_type: profile,
            access_token: Some("token".to_string()),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = SessionStore::new();
        let session = test_session(ProfileType::Acheteur);
        let user_id = session.user_id;

        let sid = store.insert(session);
        let found = store.get(sid).unwrap();
        assert_eq!(found.session.user_id, user_id);
        assert_eq!(found.generation, 0);

        assert!(store.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_expired_sessions_are_evicted_on_read() {
        let store = SessionStore::new();
        let mut session = test_session(ProfileType::Agriculteur);
        session.expires_at = Utc::now() - chrono::Duration::seconds(1);

        let sid = store.insert(session);
        assert!(store.get(sid).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_replace_if_current_applies_and_bumps_generation() {
        let store = SessionStore::new();
        let sid = store.insert(test_session(ProfileType::Acheteur));
        let before = store.get(sid).unwrap();

        let mut refreshed = test_session(ProfileType::Acheteur);
        refreshed.email = "refreshed@example.com".to_string();
        assert!(store.replace_if_current(sid, before.generation, refreshed));

        let after = store.get(sid).unwrap();
        assert_eq!(after.generation, 1);
        assert_eq!(after.session.email, "refreshed@example.com");
    }

    #[test]
    fn test_stale_update_is_discarded() {
        let store = SessionStore::new();
        let sid = store.insert(test_session(ProfileType::Acheteur));
        let observed = store.get(sid).unwrap();

        // A concurrent refresh lands first
        assert!(store.replace_if_current(sid, observed.generation, test_session(ProfileType::Acheteur)));

        // The slower update observed generation 0 and must lose
        let mut stale = test_session(ProfileType::Acheteur);
        stale.email = "stale@example.com".to_string();
        assert!(!store.replace_if_current(sid, observed.generation, stale));

        assert_ne!(store.get(sid).unwrap().session.email, "stale@example.com");
    }

    #[test]
    fn test_remove_leaves_nothing_behind() {
        let store = SessionStore::new();
        let sid = store.insert(test_session(ProfileType::Admin));

        assert!(store.remove(sid));
        assert!(store.get(sid).is_none());
        assert!(!store.remove(sid));

        // An update against a removed session is discarded too
        assert!(!store.replace_if_current(sid, 0, test_session(ProfileType::Admin)));
    }

    #[test]
    fn test_remove_user_drops_all_their_sessions() {
        let store = SessionStore::new();
        let mut session = test_session(ProfileType::Acheteur);
        let user_id = session.user_id;
        let sid_a = store.insert(session.clone());
        session.access_token = Some("second-device".to_string());
        let sid_b = store.insert(session);
        let other = store.insert(test_session(ProfileType::Admin));

        assert_eq!(store.remove_user(user_id), 2);
        assert!(store.get(sid_a).is_none());
        assert!(store.get(sid_b).is_none());
        assert!(store.get(other).is_some());
    }
}
