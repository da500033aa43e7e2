use crate::error::GateError;
use crate::ledger::ArrivalLedger;
use crate::permit::Permit;
use crate::RequesterId;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which waiters are woken when a unit frees up or the head of the ledger changes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WakePolicy {
    /// Wake every waiter, each one re-checks if it is the head.
    #[default]
    Broadcast,
    /// Wake only the arrival at the head of the ledger.
    HeadOnly,
}

struct GateState<R> {
    available: usize,
    next_grant: u64,
    ledger: ArrivalLedger<R>,
    holders: HashSet<R>,
}

impl<R: RequesterId> GateState<R> {
    #[inline(always)]
    fn can_grant(&self, id: &R) -> bool {
        self.available > 0 && self.ledger.is_head(id)
    }

    fn is_known(&self, id: &R) -> bool {
        self.holders.contains(id) || self.ledger.contains(id)
    }

    fn take_unit(&mut self, id: R) -> Grant {
        self.available -= 1;
        self.holders.insert(id);
        let seq = self.next_grant;
        self.next_grant += 1;
        Grant {
            seq,
            available: self.available,
        }
    }
}

/// A unit handed to a requester.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    /// Position of this grant in the grant sequence of the gate
    pub seq: u64,
    /// Units still free right after this grant
    pub available: usize,
}

/// Point in time copy of the gate counters and of the waiting line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateSnapshot<R> {
    pub capacity: usize,
    pub available: usize,
    pub holding: usize,
    /// Waiting requesters, head first
    pub queued: Vec<R>,
}

/// Counting semaphore that grants units strictly in arrival order.
///
/// A requester is granted only when it is at the head of the arrival ledger
/// and at least one unit is free. Every waiter re-checks both conditions each
/// time it wakes up, so spurious wakeups never produce a grant.
///
/// Grants are numbered from zero in the order they are issued, see [`Grant::seq`].
pub struct Gate<R: RequesterId> {
    capacity: usize,
    policy: WakePolicy,
    state: Mutex<GateState<R>>,
    condvar: Condvar,
}

impl<R: RequesterId> Gate<R> {
    pub fn new(capacity: usize) -> Result<Self, GateError> {
        Self::with_policy(capacity, WakePolicy::Broadcast)
    }

    pub fn with_policy(capacity: usize, policy: WakePolicy) -> Result<Self, GateError> {
        if capacity == 0 {
            return Err(GateError::ZeroCapacity);
        }

        Ok(Self {
            capacity,
            policy,
            state: Mutex::new(GateState {
                available: capacity,
                next_grant: 0,
                ledger: ArrivalLedger::new(),
                holders: HashSet::with_capacity(capacity),
            }),
            condvar: Condvar::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> WakePolicy {
        self.policy
    }

    pub fn available(&self) -> usize {
        self.state.lock().available
    }

    pub fn queued_len(&self) -> usize {
        self.state.lock().ledger.len()
    }

    pub fn is_queued(&self, id: &R) -> bool {
        self.state.lock().ledger.contains(id)
    }

    pub fn is_holding(&self, id: &R) -> bool {
        self.state.lock().holders.contains(id)
    }

    pub fn snapshot(&self) -> GateSnapshot<R> {
        let state = self.state.lock();
        GateSnapshot {
            capacity: self.capacity,
            available: state.available,
            holding: state.holders.len(),
            queued: state.ledger.ids().collect(),
        }
    }

    /// Waits until `id` is the oldest arrival and a unit is free, then takes the unit.
    pub fn acquire(&self, id: R) -> Result<Grant, GateError> {
        let mut state = self.state.lock();
        let wakeup = self.enqueue(&mut state, id)?;

        while !state.can_grant(&id) {
            self.wakeup_channel(&wakeup).wait(&mut state);
        }

        Ok(self.grant(&mut state, id))
    }

    /// Same as [`Gate::acquire`], but gives up after `timeout`.
    ///
    /// On expiry the arrival is removed from the ledger and
    /// [`GateError::TimedOut`] is returned. A grant that is possible when the
    /// deadline is hit is still taken.
    pub fn acquire_timeout(&self, id: R, timeout: Duration) -> Result<Grant, GateError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.acquire(id);
        };

        let mut state = self.state.lock();
        let wakeup = self.enqueue(&mut state, id)?;

        while !state.can_grant(&id) {
            let result = self.wakeup_channel(&wakeup).wait_until(&mut state, deadline);
            if result.timed_out() && !state.can_grant(&id) {
                state.ledger.remove(&id);
                // The head may have changed while a unit is free
                if state.available > 0 {
                    self.notify(&state);
                }
                return Err(GateError::timed_out(&id));
            }
        }

        Ok(self.grant(&mut state, id))
    }

    /// Takes a unit only if nobody is waiting and a unit is free, never queues.
    pub fn try_acquire(&self, id: R) -> Result<Option<Grant>, GateError> {
        let mut state = self.state.lock();
        if state.is_known(&id) {
            return Err(GateError::duplicate(&id));
        }
        if state.available == 0 || !state.ledger.is_empty() {
            return Ok(None);
        }
        Ok(Some(state.take_unit(id)))
    }

    /// [`Gate::acquire`] returning a guard that releases the unit when dropped.
    pub fn acquire_permit(&self, id: R) -> Result<Permit<'_, R>, GateError> {
        let grant = self.acquire(id)?;
        Ok(Permit::new(self, id, grant))
    }

    /// Gives back the unit held by `id` and wakes the waiters.
    /// Returns the units free right after the release.
    pub fn release(&self, id: R) -> Result<usize, GateError> {
        let mut state = self.state.lock();
        if !state.holders.contains(&id) {
            return Err(GateError::not_holding(&id));
        }
        if state.available >= self.capacity {
            return Err(GateError::CapacityOverflow {
                capacity: self.capacity,
            });
        }

        state.holders.remove(&id);
        state.available += 1;
        self.notify(&state);
        Ok(state.available)
    }

    fn enqueue(
        &self,
        state: &mut GateState<R>,
        id: R,
    ) -> Result<Option<Arc<Condvar>>, GateError> {
        if state.is_known(&id) {
            return Err(GateError::duplicate(&id));
        }

        let wakeup = match self.policy {
            WakePolicy::Broadcast => None,
            WakePolicy::HeadOnly => Some(Arc::new(Condvar::new())),
        };
        state.ledger.push_back(id, wakeup.clone());
        Ok(wakeup)
    }

    fn grant(&self, state: &mut MutexGuard<GateState<R>>, id: R) -> Grant {
        debug_assert!(state.ledger.is_head(&id));
        state.ledger.pop_head();
        let grant = state.take_unit(id);

        // Several units may have been freed at once, let the next arrival through
        if state.available > 0 && !state.ledger.is_empty() {
            self.notify(state);
        }
        grant
    }

    #[inline(always)]
    fn wakeup_channel<'a>(&'a self, wakeup: &'a Option<Arc<Condvar>>) -> &'a Condvar {
        wakeup.as_deref().unwrap_or(&self.condvar)
    }

    fn notify(&self, state: &GateState<R>) {
        match self.policy {
            WakePolicy::Broadcast => {
                self.condvar.notify_all();
            }
            WakePolicy::HeadOnly => {
                if let Some(wakeup) = state.ledger.head_wakeup() {
                    wakeup.notify_one();
                }
            }
        }
    }
}
