//! Bounded ring buffer used both for per-UE packet queues and the HARQ
//! feedback ring (`harq::HarqRing`). Backed by a `VecDeque` sized once to a
//! fixed capacity: a deque gets `push_front`/`push_back` for free without
//! hand-rolled modular index/count arithmetic over a raw array.

use std::collections::VecDeque;

/// A `VecDeque` that refuses to grow past `capacity`.
///
/// `push_back` is used for ordinary FIFO arrivals; `push_front` is used for
/// HARQ retransmissions, which must be served ahead of newer traffic if they
/// still carry the earliest deadline. Both report failure (`false`) instead
/// of panicking or silently overwriting, so the caller can apply its own
/// drop/miss accounting.
pub struct RingQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push to the back. Returns `false` if the queue is already at capacity.
    pub fn push_back(&mut self, item: T) -> bool {
        if self.items.len() >= self.capacity {
            return false;
        }
        self.items.push_back(item);
        true
    }

    /// Push to the front. Returns `false` if the queue is full.
    pub fn push_front(&mut self, item: T) -> bool {
        if self.items.len() >= self.capacity {
            return false;
        }
        self.items.push_front(item);
        true
    }

    /// Borrow the head element without removing it.
    pub fn peek_front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Mutably borrow the head element without removing it.
    pub fn peek_front_mut(&mut self) -> Option<&mut T> {
        self.items.front_mut()
    }

    /// Remove and return the head element. No-op (`None`) when empty.
    pub fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_push_back_when_full() {
        let mut q = RingQueue::new(2);
        assert!(q.push_back(1));
        assert!(q.push_back(2));
        assert!(!q.push_back(3));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn rejects_push_front_when_full() {
        let mut q = RingQueue::new(1);
        assert!(q.push_back(1));
        assert!(!q.push_front(2));
    }

    #[test]
    fn push_back_preserves_fifo_order() {
        let mut q = RingQueue::new(4);
        q.push_back(1);
        q.push_back(2);
        q.push_back(3);
        assert_eq!(q.pop_front(), Some(1));
        assert_eq!(q.pop_front(), Some(2));
        assert_eq!(q.pop_front(), Some(3));
        assert_eq!(q.pop_front(), None);
    }

    #[test]
    fn push_front_inverts_order_for_the_reinjected_element() {
        let mut q = RingQueue::new(4);
        q.push_back(1);
        q.push_back(2);
        q.push_front(0);
        assert_eq!(q.pop_front(), Some(0));
        assert_eq!(q.pop_front(), Some(1));
        assert_eq!(q.pop_front(), Some(2));
    }

    #[test]
    fn peek_front_does_not_remove() {
        let mut q = RingQueue::new(4);
        q.push_back(10);
        assert_eq!(q.peek_front(), Some(&10));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn empty_queue_semantics() {
        let mut q: RingQueue<i32> = RingQueue::new(4);
        assert!(q.is_empty());
        assert_eq!(q.peek_front(), None);
        assert_eq!(q.pop_front(), None);
    }

    proptest::proptest! {
        #[test]
        fn count_never_exceeds_capacity(ops in proptest::collection::vec(0..3u8, 0..500)) {
            let cap = 16;
            let mut q = RingQueue::new(cap);
            for (i, op) in ops.into_iter().enumerate() {
                match op {
                    0 => { q.push_back(i); }
                    1 => { q.push_front(i); }
                    _ => { q.pop_front(); }
                }
                proptest::prop_assert!(q.len() <= cap);
            }
        }
    }
}
