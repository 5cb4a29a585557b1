//! Blocking handoff queue
//!
//! A mutex-guarded deque with a condition variable that wakes one blocked
//! receiver per send. Values are moved in by `send` and moved out by
//! `receive`, so ownership travels with the message.

use log::trace;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::types::{OverflowPolicy, ReceiveOrder};

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A thread-safe queue with blocking receive
///
/// Unbounded unless built with [`MessageQueue::with_capacity`]. The default
/// receive order is LIFO: the most recently sent value is received first.
pub struct MessageQueue<T> {
    state: Mutex<QueueState<T>>,
    /// Signalled on every insertion
    not_empty: Condvar,
    /// Signalled on every removal, only waited on under `OverflowPolicy::Block`
    not_full: Condvar,
    order: ReceiveOrder,
    capacity: Option<usize>,
    overflow: OverflowPolicy,
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MessageQueue<T> {
    /// Create an unbounded LIFO queue
    pub fn new() -> Self {
        Self::with_order(ReceiveOrder::Lifo)
    }

    /// Create an unbounded queue with the given receive order
    pub fn with_order(order: ReceiveOrder) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            order,
            capacity: None,
            overflow: OverflowPolicy::default(),
        }
    }

    /// Bound the queue to `capacity` values (at least one), applying
    /// `overflow` when a send finds it full
    pub fn with_capacity(mut self, capacity: usize, overflow: OverflowPolicy) -> Self {
        self.capacity = Some(capacity.max(1));
        self.overflow = overflow;
        self
    }

    pub fn order(&self) -> ReceiveOrder {
        self.order
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pop(&self, state: &mut QueueState<T>) -> Option<T> {
        match self.order {
            ReceiveOrder::Lifo => state.items.pop_back(),
            ReceiveOrder::Fifo => state.items.pop_front(),
        }
    }

    /// Move a value into the queue and wake one waiting receiver
    ///
    /// Returns false if the value was not enqueued: the queue is closed, or
    /// it is full under `OverflowPolicy::DropNewest`. Only blocks when the
    /// queue is full under `OverflowPolicy::Block`.
    pub fn send(&self, value: T) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }

        if let Some(capacity) = self.capacity {
            while state.items.len() >= capacity {
                match self.overflow {
                    OverflowPolicy::DropOldest => {
                        state.items.pop_front();
                        trace!("queue full, dropped oldest value");
                    }
                    OverflowPolicy::DropNewest => {
                        trace!("queue full, rejected new value");
                        return false;
                    }
                    OverflowPolicy::Block => {
                        state = self
                            .not_full
                            .wait(state)
                            .unwrap_or_else(PoisonError::into_inner);
                        if state.closed {
                            return false;
                        }
                    }
                }
            }
        }

        state.items.push_back(value);
        drop(state);
        self.not_empty.notify_one();
        true
    }

    /// Block until a value is available and take it
    ///
    /// Returns `None` only once the queue has been closed and drained.
    pub fn receive(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(value) = self.pop(&mut state) {
                drop(state);
                self.not_full.notify_one();
                return Some(value);
            }
            if state.closed {
                return None;
            }
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Take a value if one is buffered, without blocking
    pub fn try_receive(&self) -> Option<T> {
        let value = {
            let mut state = self.lock();
            self.pop(&mut state)
        };
        if value.is_some() {
            self.not_full.notify_one();
        }
        value
    }

    /// Reject further sends and wake every blocked sender and receiver
    ///
    /// Values already buffered can still be received.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}
