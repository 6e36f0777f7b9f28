//! Generation-tokened timers
//!
//! A timer is a task that sleeps and then posts [`Message::TimerFired`] back
//! to the controller. Rescheduling or cancelling aborts the task and bumps
//! the generation, so an expiry that was already queued is recognized as
//! stale and ignored.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::message::{Message, WeakMailbox};
use crate::voice::SessionTimer;

/// Every timer the controller runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Owned by the recognition session
    Session(SessionTimer),
    /// Delayed announcement after a route change
    PageAnnouncement,
    /// Delayed "you are on" summary after blind mode turns on
    ModeSummary,
}

#[derive(Debug)]
struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Pending timers, at most one per kind
#[derive(Debug)]
pub struct Timers {
    mailbox: WeakMailbox,
    next_generation: u64,
    pending: HashMap<TimerKind, Pending>,
}

impl Timers {
    pub fn new(mailbox: WeakMailbox) -> Self {
        Self {
            mailbox,
            next_generation: 0,
            pending: HashMap::new(),
        }
    }

    /// Schedule `timer`, replacing a pending one of the same kind
    pub fn schedule(&mut self, timer: TimerKind, delay: Duration) {
        self.cancel(timer);

        self.next_generation += 1;
        let generation = self.next_generation;
        let mailbox = self.mailbox.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            mailbox.send(Message::TimerFired { timer, generation });
        });

        tracing::trace!(?timer, generation, ?delay, "timer scheduled");
        self.pending.insert(timer, Pending { generation, handle });
    }

    /// Cancel `timer` if pending
    pub fn cancel(&mut self, timer: TimerKind) {
        if let Some(pending) = self.pending.remove(&timer) {
            pending.handle.abort();
            tracing::trace!(?timer, generation = pending.generation, "timer cancelled");
        }
    }

    /// Cancel the break, resume, and restart timers
    pub fn cancel_session_timers(&mut self) {
        for timer in [SessionTimer::Break, SessionTimer::Resume, SessionTimer::Restart] {
            self.cancel(TimerKind::Session(timer));
        }
    }

    /// Cancel everything
    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }

    /// Consume a fired timer if it is still the current one of its kind
    pub fn take_if_current(&mut self, timer: TimerKind, generation: u64) -> bool {
        match self.pending.get(&timer) {
            Some(pending) if pending.generation == generation => {
                self.pending.remove(&timer);
                true
            }
            _ => {
                tracing::trace!(?timer, generation, "stale timer ignored");
                false
            }
        }
    }

    #[cfg(test)]
    fn is_pending(&self, timer: TimerKind) -> bool {
        self.pending.contains_key(&timer)
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
