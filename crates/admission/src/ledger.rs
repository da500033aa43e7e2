use parking_lot::Condvar;
use std::collections::VecDeque;
use std::sync::Arc;

struct Arrival<R> {
    id: R,
    wakeup: Option<Arc<Condvar>>,
}

/// Requesters waiting for a unit, in arrival order.
///
/// The front of the ledger is the only arrival allowed to be granted.
pub struct ArrivalLedger<R> {
    arrivals: VecDeque<Arrival<R>>,
}

impl<R: Copy + PartialEq> ArrivalLedger<R> {
    pub fn new() -> Self {
        Self {
            arrivals: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arrivals: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends an arrival at the tail. The optional condvar is the private
    /// wakeup channel used when only the head has to be notified.
    pub fn push_back(&mut self, id: R, wakeup: Option<Arc<Condvar>>) {
        self.arrivals.push_back(Arrival { id, wakeup });
    }

    pub fn head(&self) -> Option<R> {
        self.arrivals.front().map(|arrival| arrival.id)
    }

    #[inline(always)]
    pub fn is_head(&self, id: &R) -> bool {
        self.arrivals
            .front()
            .map_or(false, |arrival| arrival.id == *id)
    }

    pub fn pop_head(&mut self) -> Option<R> {
        self.arrivals.pop_front().map(|arrival| arrival.id)
    }

    /// Drops the arrival of `id` wherever it is, keeping the order of the others.
    pub fn remove(&mut self, id: &R) -> bool {
        match self.arrivals.iter().position(|arrival| arrival.id == *id) {
            Some(index) => {
                self.arrivals.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &R) -> bool {
        self.arrivals.iter().any(|arrival| arrival.id == *id)
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = R> + '_ {
        self.arrivals.iter().map(|arrival| arrival.id)
    }

    pub(crate) fn head_wakeup(&self) -> Option<&Arc<Condvar>> {
        self.arrivals
            .front()
            .and_then(|arrival| arrival.wakeup.as_ref())
    }
}

impl<R: Copy + PartialEq> Default for ArrivalLedger<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ArrivalLedger;

    #[test]
    fn test_arrival_order() {
        let mut ledger = ArrivalLedger::new();
        for id in [4u32, 1, 7] {
            ledger.push_back(id, None);
        }

        assert_eq!(ledger.head(), Some(4));
        assert!(ledger.is_head(&4));
        assert!(!ledger.is_head(&1));
        assert_eq!(ledger.ids().collect::<Vec<_>>(), vec![4, 1, 7]);

        assert_eq!(ledger.pop_head(), Some(4));
        assert_eq!(ledger.pop_head(), Some(1));
        assert_eq!(ledger.pop_head(), Some(7));
        assert_eq!(ledger.pop_head(), None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut ledger = ArrivalLedger::with_capacity(4);
        for id in 1u32..=4 {
            ledger.push_back(id, None);
        }

        assert!(ledger.remove(&2));
        assert!(!ledger.remove(&2));
        assert!(!ledger.contains(&2));
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.ids().collect::<Vec<_>>(), vec![1, 3, 4]);

        assert!(ledger.remove(&1));
        assert_eq!(ledger.head(), Some(3));
    }
}
