//! Pooled connection wrapper and per-connection lifecycle
//!
//! Each live backend connection travels inside a `PooledConnection` carrying
//! its identity and timing metadata. Lifecycle:
//! `Created -> Idle -> InUse -> (Idle | Closed)`, with `Closed` reachable
//! from any state via validation failure, idle-timeout eviction, or pool
//! shutdown. There is no transition out of `Closed`.

use tokio::time::Instant;
use uuid::Uuid;

/// Lifecycle state of a pooled connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Freshly opened, not yet handed out or parked
    Created,
    /// Parked in the pool, available for handout
    Idle,
    /// Checked out by a caller
    InUse,
    /// Retired; terminal state
    Closed,
}

impl ConnectionState {
    /// Whether a transition to `next` is part of the lifecycle
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Created, Self::Idle | Self::InUse | Self::Closed) => true,
            (Self::Idle, Self::InUse | Self::Closed) => true,
            (Self::InUse, Self::Idle | Self::Closed) => true,
            _ => false,
        }
    }
}

/// One live backend connection plus pool-side metadata
#[derive(Debug)]
pub struct PooledConnection<C> {
    id: Uuid,
    raw: C,
    state: ConnectionState,
    created_at: Instant,
    last_used: Instant,
}

impl<C> PooledConnection<C> {
    /// Wrap a freshly opened backend connection
    pub fn new(raw: C) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            raw,
            state: ConnectionState::Created,
            created_at: now,
            last_used: now,
        }
    }

    /// Unique identifier, stable for the connection's lifetime
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Time since the connection was opened
    #[must_use]
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Time since the connection was last handed out or returned
    #[must_use]
    pub fn idle_for(&self) -> std::time::Duration {
        self.last_used.elapsed()
    }

    /// Whether the last-used timestamp is older than `window`
    ///
    /// Used to decide if an acquire-time probe is needed; zero-width
    /// windows force a probe on every handout.
    #[must_use]
    pub fn stale(&self, window: std::time::Duration) -> bool {
        self.last_used.elapsed() > window
    }

    /// Refresh the last-used timestamp without a state change
    ///
    /// Used when ownership passes directly from a releasing caller to a
    /// waiter: the connection stays `InUse` throughout.
    pub fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    /// Mark the connection parked in the idle set
    pub fn mark_idle(&mut self) {
        debug_assert!(self.state.can_transition_to(ConnectionState::Idle));
        self.state = ConnectionState::Idle;
        self.last_used = Instant::now();
    }

    /// Mark the connection checked out by a caller
    pub fn mark_in_use(&mut self) {
        debug_assert!(self.state.can_transition_to(ConnectionState::InUse));
        self.state = ConnectionState::InUse;
        self.last_used = Instant::now();
    }

    /// Retire the connection and recover the raw backend handle
    pub fn into_raw(mut self) -> C {
        self.state = ConnectionState::Closed;
        self.raw
    }

    /// Access the raw backend connection
    #[must_use]
    pub fn raw(&self) -> &C {
        &self.raw
    }

    /// Mutable access to the raw backend connection
    pub fn raw_mut(&mut self) -> &mut C {
        &mut self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_connection_state() {
        let conn = PooledConnection::new(());
        assert_eq!(conn.state(), ConnectionState::Created);
    }

    #[test]
    fn test_unique_ids() {
        let a = PooledConnection::new(());
        let b = PooledConnection::new(());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut conn = PooledConnection::new(());
        conn.mark_idle();
        assert_eq!(conn.state(), ConnectionState::Idle);
        conn.mark_in_use();
        assert_eq!(conn.state(), ConnectionState::InUse);
        conn.mark_idle();
        assert_eq!(conn.state(), ConnectionState::Idle);
    }

    #[test]
    fn test_closed_is_terminal() {
        assert!(!ConnectionState::Closed.can_transition_to(ConnectionState::Idle));
        assert!(!ConnectionState::Closed.can_transition_to(ConnectionState::InUse));
        assert!(!ConnectionState::Closed.can_transition_to(ConnectionState::Created));
    }

    #[test]
    fn test_closed_reachable_from_all_live_states() {
        for state in [
            ConnectionState::Created,
            ConnectionState::Idle,
            ConnectionState::InUse,
        ] {
            assert!(state.can_transition_to(ConnectionState::Closed));
        }
    }

    #[test]
    fn test_no_reverse_to_created() {
        assert!(!ConnectionState::Idle.can_transition_to(ConnectionState::Created));
        assert!(!ConnectionState::InUse.can_transition_to(ConnectionState::Created));
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness_window() {
        let mut conn = PooledConnection::new(());
        conn.mark_idle();
        assert!(!conn.stale(Duration::from_secs(30)));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(conn.stale(Duration::from_secs(30)));
        assert!(!conn.stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_into_raw_recovers_handle() {
        let conn = PooledConnection::new(42u32);
        assert_eq!(conn.into_raw(), 42);
    }
}
