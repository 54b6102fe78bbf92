//! Live session registry and listening-state broadcast.
//!
//! [`SessionHub`] owns the process-wide [`ListeningState`] together with the
//! outbound handle of every live connection. Joining, toggling and fanning out
//! all happen under the same mutex, so:
//!
//! - a new session's connect-time snapshot reflects every toggle applied
//!   before it joined, and it receives every broadcast issued after;
//! - two racing toggles are serialized, last write wins.
//!
//! Fan-out never awaits while the lock is held: each session has a bounded
//! channel and delivery is a non-blocking `try_send`. A full or closed channel
//! means that peer misses the update; the rest still get it.

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::listening::{ListenerId, ListeningState, StatePush};
use crate::errors::session_error::SessionResult;

/// Identity of one transport-level connection.
pub type ConnectionId = Uuid;

/// Outcome of one fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub skipped: usize,
}

/// Registry of live sessions plus the shared listening state.
#[derive(Debug, Default)]
pub struct SessionHub {
    state: Mutex<ListeningState>,
    sessions: DashMap<ConnectionId, mpsc::Sender<StatePush>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and queue the current state as its first message.
    ///
    /// Returns the snapshot that was queued.
    pub fn join(&self, connection_id: ConnectionId, outbound: mpsc::Sender<StatePush>) -> StatePush {
        let state = self.state.lock();
        let snapshot = state.to_push();

        if let Err(e) = outbound.try_send(snapshot.clone()) {
            warn!(%connection_id, "Failed to queue initial state push: {}", e);
        }
        self.sessions.insert(connection_id, outbound);

        debug!(
            %connection_id,
            sessions = self.sessions.len(),
            "Session joined hub"
        );
        snapshot
    }

    /// Remove a session. Returns false if it was not registered.
    pub fn leave(&self, connection_id: &ConnectionId) -> bool {
        let removed = self.sessions.remove(connection_id).is_some();
        if removed {
            debug!(
                %connection_id,
                sessions = self.sessions.len(),
                "Session left hub"
            );
        }
        removed
    }

    /// Apply a `toggle-listen` and broadcast `{status, userId}` to every live
    /// session, the sender included.
    ///
    /// The broadcast echoes the values as received. Nothing is broadcast when
    /// the toggle is rejected.
    pub fn toggle(
        &self,
        status: &str,
        user_id: Option<ListenerId>,
    ) -> SessionResult<BroadcastReport> {
        let mut state = self.state.lock();
        state.apply_toggle(status, user_id.as_ref())?;

        info!(
            listening = state.is_listening(),
            listener = ?state.current_listener_id().map(ToString::to_string),
            "Listening state updated"
        );

        let push = StatePush {
            status: status.to_string(),
            user_id,
        };
        Ok(self.fan_out(&push))
    }

    fn fan_out(&self, push: &StatePush) -> BroadcastReport {
        // Collect first so no shard guard is held while sending.
        let targets: Vec<(ConnectionId, mpsc::Sender<StatePush>)> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut report = BroadcastReport::default();
        for (connection_id, outbound) in targets {
            match outbound.try_send(push.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(%connection_id, "Outbound queue full, dropping state push");
                    report.skipped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(%connection_id, "Session closing, skipping state push");
                    report.skipped += 1;
                }
            }
        }

        debug!(
            delivered = report.delivered,
            skipped = report.skipped,
            "State push broadcast"
        );
        report
    }

    /// Current listening state.
    pub fn snapshot(&self) -> ListeningState {
        self.state.lock().clone()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::listening::LISTENING_STATUS;
    use crate::errors::session_error::SessionError;

    fn id(raw: &str) -> ListenerId {
        ListenerId::from(raw)
    }

    fn session(hub: &SessionHub) -> (ConnectionId, mpsc::Receiver<StatePush>) {
        let (tx, rx) = mpsc::channel(8);
        let id = Uuid::new_v4();
        hub.join(id, tx);
        (id, rx)
    }

    #[tokio::test]
    async fn test_join_receives_default_snapshot() {
        let hub = SessionHub::new();
        let (_, mut rx) = session(&hub);

        let push = rx.recv().await.unwrap();
        assert_eq!(push.status, "");
        assert_eq!(push.user_id, None);
        assert_eq!(hub.session_count(), 1);
    }

    #[tokio::test]
    async fn test_join_after_toggle_sees_latest_state() {
        let hub = SessionHub::new();
        hub.toggle(LISTENING_STATUS, Some(id("u1"))).unwrap();
        hub.toggle(LISTENING_STATUS, Some(id("u2"))).unwrap();

        let (_, mut rx) = session(&hub);
        let push = rx.recv().await.unwrap();
        assert_eq!(push.status, LISTENING_STATUS);
        assert_eq!(push.user_id, Some(id("u2")));
    }

    #[tokio::test]
    async fn test_toggle_reaches_every_session() {
        let hub = SessionHub::new();
        let (_, mut a) = session(&hub);
        let (_, mut b) = session(&hub);
        a.recv().await.unwrap();
        b.recv().await.unwrap();

        let report = hub.toggle(LISTENING_STATUS, Some(id("u1"))).unwrap();
        assert_eq!(report, BroadcastReport { delivered: 2, skipped: 0 });

        for rx in [&mut a, &mut b] {
            let push = rx.recv().await.unwrap();
            assert_eq!(push.status, LISTENING_STATUS);
            assert_eq!(push.user_id, Some(id("u1")));
        }

        let state = hub.snapshot();
        assert!(state.is_listening());
        assert_eq!(state.current_listener_id(), Some(&id("u1")));
    }

    #[tokio::test]
    async fn test_toggle_off_echoes_user_id_but_clears_state() {
        let hub = SessionHub::new();
        let (_, mut rx) = session(&hub);
        rx.recv().await.unwrap();

        hub.toggle(LISTENING_STATUS, Some(id("u1"))).unwrap();
        hub.toggle("", Some(id("u1"))).unwrap();
        rx.recv().await.unwrap();

        let push = rx.recv().await.unwrap();
        assert_eq!(push.status, "");
        assert_eq!(push.user_id, Some(id("u1")));

        let state = hub.snapshot();
        assert!(!state.is_listening());
        assert_eq!(state.current_listener_id(), None);
    }

    #[tokio::test]
    async fn test_closed_peer_does_not_block_others() {
        let hub = SessionHub::new();
        let (_, dropped) = session(&hub);
        let (_, mut live) = session(&hub);
        drop(dropped);
        live.recv().await.unwrap();

        let report = hub.toggle(LISTENING_STATUS, Some(id("u1"))).unwrap();
        assert_eq!(report, BroadcastReport { delivered: 1, skipped: 1 });
        assert_eq!(live.recv().await.unwrap().user_id, Some(id("u1")));
    }

    #[tokio::test]
    async fn test_full_peer_is_skipped() {
        let hub = SessionHub::new();
        let (tx, _rx) = mpsc::channel(1);
        // Initial snapshot fills the only slot.
        hub.join(Uuid::new_v4(), tx);

        let report = hub.toggle(LISTENING_STATUS, Some(id("u1"))).unwrap();
        assert_eq!(report, BroadcastReport { delivered: 0, skipped: 1 });
        assert!(hub.snapshot().is_listening());
    }

    #[tokio::test]
    async fn test_rejected_toggle_broadcasts_nothing() {
        let hub = SessionHub::new();
        let (_, mut rx) = session(&hub);
        rx.recv().await.unwrap();

        let result = hub.toggle(LISTENING_STATUS, None);
        assert!(matches!(result, Err(SessionError::MissingListenerId)));
        assert!(rx.try_recv().is_err());
        assert!(!hub.snapshot().is_listening());
    }

    #[test]
    fn test_leave_unregisters_once() {
        let hub = SessionHub::new();
        let (id, _rx) = session(&hub);

        assert!(hub.leave(&id));
        assert!(!hub.leave(&id));
        assert_eq!(hub.session_count(), 0);
    }

    fn drain(rx: &mut mpsc::Receiver<StatePush>) -> Vec<StatePush> {
        let mut pushes = Vec::new();
        while let Ok(push) = rx.try_recv() {
            pushes.push(push);
        }
        pushes
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_see_snapshot_then_every_later_toggle() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        const TOGGLERS: usize = 4;
        const TOGGLES_EACH: usize = 50;
        const JOINERS: usize = 16;
        const QUEUE: usize = TOGGLERS * TOGGLES_EACH + 1;

        let hub = Arc::new(SessionHub::new());

        // Joined before any toggle: its queue records the applied order.
        let (observer_tx, mut observer_rx) = mpsc::channel(QUEUE);
        hub.join(Uuid::new_v4(), observer_tx);

        let running = Arc::new(AtomicBool::new(true));
        let checker = {
            let hub = hub.clone();
            let running = running.clone();
            tokio::spawn(async move {
                while running.load(Ordering::Acquire) {
                    let state = hub.snapshot();
                    assert_eq!(state.is_listening(), state.current_listener_id().is_some());
                    tokio::task::yield_now().await;
                }
            })
        };

        let togglers: Vec<_> = (0..TOGGLERS)
            .map(|t| {
                let hub = hub.clone();
                tokio::spawn(async move {
                    for i in 0..TOGGLES_EACH {
                        // Stops carry no userId so their echo equals a snapshot.
                        if i % 3 == 2 {
                            hub.toggle("", None).unwrap();
                        } else {
                            hub.toggle(LISTENING_STATUS, Some(id(&format!("u{t}-{i}"))))
                                .unwrap();
                        }
                        // Rejected toggles must never surface anywhere
                        assert!(hub.toggle(LISTENING_STATUS, None).is_err());
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        let joiners: Vec<_> = (0..JOINERS)
            .map(|j| {
                let hub = hub.clone();
                tokio::spawn(async move {
                    for _ in 0..j {
                        tokio::task::yield_now().await;
                    }
                    let (tx, rx) = mpsc::channel(QUEUE);
                    let snapshot = hub.join(Uuid::new_v4(), tx);
                    (snapshot, rx)
                })
            })
            .collect();

        for toggler in togglers {
            toggler.await.unwrap();
        }
        let mut joined = Vec::new();
        for joiner in joiners {
            joined.push(joiner.await.unwrap());
        }
        running.store(false, Ordering::Release);
        checker.await.unwrap();

        let applied = drain(&mut observer_rx);
        assert_eq!(applied[0], ListeningState::default().to_push());
        let applied = &applied[1..];
        assert_eq!(applied.len(), TOGGLERS * TOGGLES_EACH);
        assert_eq!(applied.last().cloned(), Some(hub.snapshot().to_push()));

        for (snapshot, mut rx) in joined {
            let received = drain(&mut rx);
            assert_eq!(received[0], snapshot);

            // Everything after the snapshot is an unbroken tail of the
            // applied sequence, and the snapshot is the state just before it.
            let later = &received[1..];
            assert!(applied.ends_with(later), "joiner missed a broadcast");
            let seen_before = applied.len() - later.len();
            let expected_snapshot = if seen_before == 0 {
                ListeningState::default().to_push()
            } else {
                applied[seen_before - 1].clone()
            };
            assert_eq!(snapshot, expected_snapshot);
        }
    }
}
