use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use uuid::Uuid;

/// Which inactivity reminder a timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderStage {
    First,
    Second,
}

#[derive(Default)]
struct SessionTimers {
    primary: Option<JoinHandle<()>>,
    escalation: Option<JoinHandle<()>>,
    delivered: HashSet<ReminderStage>,
}

impl SessionTimers {
    fn cancel(&mut self) {
        for handle in [self.primary.take(), self.escalation.take()].into_iter().flatten() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

/// Inactivity timers keyed by session record id. Arming the first stage
/// cancels whatever was pending and clears delivery state; the second
/// stage only arms while the session entry still exists, so a timer that
/// lost the race with `cancel_all` cannot resurrect it.
#[derive(Clone, Default)]
pub struct TimerCoordinator {
    inner: Arc<Mutex<HashMap<Uuid, SessionTimers>>>,
}

impl TimerCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F>(&self, session: Uuid, stage: ReminderStage, delay: Duration, callback: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let entry = match stage {
            ReminderStage::First => {
                let entry = map.entry(session).or_default();
                entry.cancel();
                entry.delivered.clear();
                entry
            }
            ReminderStage::Second => match map.get_mut(&session) {
                Some(entry) => entry,
                None => return,
            },
        };

        let coordinator = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if coordinator.mark_delivered(session, stage) {
                callback.await;
            }
        });
        match stage {
            ReminderStage::First => entry.primary = Some(handle),
            ReminderStage::Second => entry.escalation = Some(handle),
        }
    }

    /// Records delivery for a stage. Returns false when the session has
    /// been cancelled or the stage already fired, in which case the
    /// caller must not send anything.
    fn mark_delivered(&self, session: Uuid, stage: ReminderStage) -> bool {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match map.get_mut(&session) {
            Some(entry) => entry.delivered.insert(stage),
            None => false,
        }
    }

    /// Drops the session entry and aborts pending timers. Idempotent.
    pub fn cancel_all(&self, session: Uuid) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut entry) = map.remove(&session) {
            entry.cancel();
        }
    }

    #[cfg(test)]
    fn is_tracked(&self, session: Uuid) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn drain() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_stage_fires_after_delay() {
        let timers = TimerCoordinator::new();
        let session = Uuid::new_v4();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        timers.arm(session, ReminderStage::First, Duration::from_secs(120), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::advance(Duration::from_secs(119)).await;
        drain().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(1)).await;
        drain().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_cancels_the_pending_timer() {
        let timers = TimerCoordinator::new();
        let session = Uuid::new_v4();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        timers.arm(session, ReminderStage::First, Duration::from_secs(120), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::advance(Duration::from_secs(60)).await;
        drain().await;

        let counter = fired.clone();
        timers.arm(session, ReminderStage::First, Duration::from_secs(120), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // The original deadline passes without firing.
        tokio::time::advance(Duration::from_secs(61)).await;
        drain().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(59)).await;
        drain().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_suppresses_late_callbacks() {
        let timers = TimerCoordinator::new();
        let session = Uuid::new_v4();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        timers.arm(session, ReminderStage::First, Duration::from_secs(120), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        timers.cancel_all(session);

        tokio::time::advance(Duration::from_secs(200)).await;
        drain().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!timers.is_tracked(session));
    }

    #[tokio::test(start_paused = true)]
    async fn second_stage_does_not_arm_without_entry() {
        let timers = TimerCoordinator::new();
        let session = Uuid::new_v4();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        timers.arm(session, ReminderStage::Second, Duration::from_secs(1), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::advance(Duration::from_secs(5)).await;
        drain().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!timers.is_tracked(session));
    }

    #[tokio::test(start_paused = true)]
    async fn both_stages_fire_in_order() {
        let timers = TimerCoordinator::new();
        let session = Uuid::new_v4();
        let fired = Arc::new(AtomicUsize::new(0));

        let inner = timers.clone();
        let counter = fired.clone();
        timers.arm(session, ReminderStage::First, Duration::from_secs(120), async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let escalation = counter.clone();
            inner.arm(session, ReminderStage::Second, Duration::from_secs(3600), async move {
                escalation.fetch_add(10, Ordering::SeqCst);
            });
        });

        tokio::time::advance(Duration::from_secs(120)).await;
        drain().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3600)).await;
        drain().await;
        assert_eq!(fired.load(Ordering::SeqCst), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_is_idempotent() {
        let timers = TimerCoordinator::new();
        let session = Uuid::new_v4();
        timers.cancel_all(session);
        timers.arm(session, ReminderStage::First, Duration::from_secs(1), async {});
        timers.cancel_all(session);
        timers.cancel_all(session);
        assert!(!timers.is_tracked(session));
    }
}
