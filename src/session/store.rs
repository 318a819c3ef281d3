use super::state::{ConversationState, Lookup, StateKind};
use custodybot_types::UserId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Per-user conversation state with expiry and version tokens.
///
/// Implementations are synchronous and must not hold a lock past the return
/// of any method.
pub trait SessionStore: Send + Sync {
    /// Read without consuming. Expired entries are removed and reported.
    fn get(&self, user_id: UserId) -> Lookup;

    /// Store `kind` for the user, replacing any prior state. Returns the new
    /// version.
    fn set(&self, user_id: UserId, kind: StateKind) -> u64;

    /// Commit `kind` only if the user has no state, or still has the one at
    /// `expected_version`. Returns the new version, or `None` if a newer
    /// prompt replaced it.
    fn set_if_absent_or_version(
        &self,
        user_id: UserId,
        expected_version: u64,
        kind: StateKind,
    ) -> Option<u64>;

    /// Read and remove.
    fn take(&self, user_id: UserId) -> Lookup;

    /// Remove only if the stored version matches.
    fn take_if_version(&self, user_id: UserId, version: u64) -> Option<ConversationState>;

    fn remove(&self, user_id: UserId) -> bool;

    /// Drop expired entries. Returns how many were dropped.
    fn sweep_expired(&self) -> usize;
}

/// DashMap-backed session store.
///
/// A swept state leaves a tombstone for one more TTL so the user's next
/// message still gets the expiry notice instead of being read as a fresh
/// command.
pub struct InMemorySessionStore {
    states: DashMap<UserId, ConversationState>,
    tombstones: DashMap<UserId, Instant>,
    ttl: Duration,
    next_version: AtomicU64,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            states: DashMap::new(),
            tombstones: DashMap::new(),
            ttl,
            next_version: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn bump_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn take_tombstone(&self, user_id: UserId) -> Lookup {
        match self.tombstones.remove(&user_id) {
            Some((_, expired_at)) if expired_at.elapsed() <= self.ttl => Lookup::Expired,
            _ => Lookup::Idle,
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user_id: UserId) -> Lookup {
        let expired = match self.states.get(&user_id) {
            Some(state) if !state.is_expired(self.ttl) => return Lookup::Active(state.value().clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.states
                .remove_if(&user_id, |_, s| s.is_expired(self.ttl));
            self.tombstones.insert(user_id, Instant::now());
            return Lookup::Expired;
        }

        if self
            .tombstones
            .get(&user_id)
            .is_some_and(|t| t.elapsed() <= self.ttl)
        {
            Lookup::Expired
        } else {
            Lookup::Idle
        }
    }

    fn set(&self, user_id: UserId, kind: StateKind) -> u64 {
        let version = self.bump_version();
        debug!("Session {} -> {} (v{})", user_id, kind.name(), version);
        self.tombstones.remove(&user_id);
        self.states
            .insert(user_id, ConversationState::new(user_id, kind, version));
        version
    }

    fn set_if_absent_or_version(
        &self,
        user_id: UserId,
        expected_version: u64,
        kind: StateKind,
    ) -> Option<u64> {
        let ttl = self.ttl;
        let version = match self.states.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let current = entry.get();
                if current.version != expected_version && !current.is_expired(ttl) {
                    debug!(
                        "Discarding stale session commit for {} (v{} superseded by v{})",
                        user_id, expected_version, current.version
                    );
                    return None;
                }
                let version = self.bump_version();
                entry.insert(ConversationState::new(user_id, kind, version));
                version
            }
            Entry::Vacant(entry) => {
                let version = self.bump_version();
                entry.insert(ConversationState::new(user_id, kind, version));
                version
            }
        };
        self.tombstones.remove(&user_id);
        Some(version)
    }

    fn take(&self, user_id: UserId) -> Lookup {
        match self.states.remove(&user_id) {
            Some((_, state)) if state.is_expired(self.ttl) => {
                debug!("Session {} expired in {}", user_id, state.kind.name());
                self.tombstones.remove(&user_id);
                Lookup::Expired
            }
            Some((_, state)) => {
                self.tombstones.remove(&user_id);
                Lookup::Active(state)
            }
            None => self.take_tombstone(user_id),
        }
    }

    fn take_if_version(&self, user_id: UserId, version: u64) -> Option<ConversationState> {
        self.states
            .remove_if(&user_id, |_, s| s.version == version)
            .map(|(_, state)| state)
    }

    fn remove(&self, user_id: UserId) -> bool {
        self.tombstones.remove(&user_id);
        self.states.remove(&user_id).is_some()
    }

    fn sweep_expired(&self) -> usize {
        let ttl = self.ttl;
        let expired: Vec<UserId> = self
            .states
            .iter()
            .filter(|r| r.value().is_expired(ttl))
            .map(|r| *r.key())
            .collect();

        let mut removed = 0;
        for user_id in expired {
            if self
                .states
                .remove_if(&user_id, |_, s| s.is_expired(ttl))
                .is_some()
            {
                self.tombstones.insert(user_id, Instant::now());
                removed += 1;
            }
        }

        self.tombstones.retain(|_, expired_at| expired_at.elapsed() <= ttl);

        if removed > 0 {
            debug!("Swept {} expired session(s)", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId(42);

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(Duration::from_secs(600))
    }

    fn age(store: &InMemorySessionStore, user_id: UserId, by: Duration) {
        if let Some(mut state) = store.states.get_mut(&user_id) {
            state.touched_at = Instant::now() - by;
        }
    }

    #[test]
    fn test_take_consumes_state() {
        let store = store();
        store.set(USER, StateKind::AwaitingSeedPhrase);

        assert!(matches!(
            store.take(USER),
            Lookup::Active(ConversationState {
                kind: StateKind::AwaitingSeedPhrase,
                ..
            })
        ));
        assert!(store.take(USER).is_idle());
    }

    #[test]
    fn test_set_overwrites_and_bumps_version() {
        let store = store();
        let v1 = store.set(USER, StateKind::AwaitingSeedPhrase);
        let v2 = store.set(USER, StateKind::AwaitingPrivateKey);
        assert!(v2 > v1);
        assert_eq!(store.len(), 1);

        let Lookup::Active(state) = store.get(USER) else {
            panic!("expected active state");
        };
        assert_eq!(state.version, v2);
        assert!(matches!(state.kind, StateKind::AwaitingPrivateKey));
    }

    #[test]
    fn test_expired_state_is_reported_once() {
        let store = store();
        store.set(USER, StateKind::AwaitingTokenQuery);
        age(&store, USER, Duration::from_secs(601));

        assert!(matches!(store.take(USER), Lookup::Expired));
        assert!(store.take(USER).is_idle());
    }

    #[test]
    fn test_swept_state_leaves_expiry_notice() {
        let store = store();
        store.set(USER, StateKind::AwaitingTokenQuery);
        store.set(UserId(7), StateKind::AwaitingSeedPhrase);
        age(&store, USER, Duration::from_secs(601));

        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(matches!(store.get(USER), Lookup::Expired));
        assert!(matches!(store.take(USER), Lookup::Expired));
        assert!(store.take(USER).is_idle());
    }

    #[test]
    fn test_set_clears_expiry_notice() {
        let store = store();
        store.set(USER, StateKind::AwaitingTokenQuery);
        age(&store, USER, Duration::from_secs(601));
        store.sweep_expired();

        store.set(USER, StateKind::AwaitingSeedPhrase);
        assert!(matches!(store.take(USER), Lookup::Active(_)));
    }

    #[test]
    fn test_take_if_version() {
        let store = store();
        let v1 = store.set(USER, StateKind::AwaitingSeedPhrase);
        let v2 = store.set(USER, StateKind::AwaitingPrivateKey);

        assert!(store.take_if_version(USER, v1).is_none());
        assert_eq!(store.take_if_version(USER, v2).map(|s| s.version), Some(v2));
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_commit_is_discarded() {
        let store = store();
        let consumed = store.set(USER, StateKind::AwaitingSeedPhrase);
        store.take(USER);

        // A newer prompt lands while the derivation is still running.
        let newer = store.set(USER, StateKind::AwaitingTokenQuery);

        assert!(store
            .set_if_absent_or_version(USER, consumed, StateKind::AwaitingPrivateKey)
            .is_none());
        let Lookup::Active(state) = store.get(USER) else {
            panic!("expected active state");
        };
        assert_eq!(state.version, newer);
    }

    #[test]
    fn test_commit_into_empty_slot() {
        let store = store();
        let consumed = store.set(USER, StateKind::AwaitingSeedPhrase);
        store.take(USER);

        let committed = store
            .set_if_absent_or_version(USER, consumed, StateKind::AwaitingPrivateKey)
            .unwrap();
        assert!(committed > consumed);
    }

    #[test]
    fn test_remove() {
        let store = store();
        store.set(USER, StateKind::AwaitingSeedPhrase);
        assert!(store.remove(USER));
        assert!(!store.remove(USER));
        assert!(store.get(USER).is_idle());
    }
}
