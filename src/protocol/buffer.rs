//! Received bytes, from the clock edge handler to the foreground.

use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Single-producer single-consumer ring of `N` slots, `N` a power of two.
///
/// `head` and `tail` are free-running counters: the edge handler is the
/// only writer of `head`, the foreground the only writer of `tail`.
/// There is no overflow signal. When the producer gets more than
/// `capacity()` bytes ahead, the consumer skips to the newest ones and the
/// oldest unread bytes are lost.
#[derive(Debug)]
pub struct ReceiveBuffer<const N: usize> {
    slots: [AtomicU8; N],
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl<const N: usize> ReceiveBuffer<N> {
    const VALID_SIZE: () = assert!(
        N >= 2 && N.is_power_of_two(),
        "receive buffer size must be a power of two, at least 2"
    );

    #[allow(clippy::declare_interior_mutable_const)]
    const EMPTY_SLOT: AtomicU8 = AtomicU8::new(0);

    #[allow(clippy::let_unit_value)]
    pub const fn new() -> Self {
        let () = Self::VALID_SIZE;

        Self {
            slots: [Self::EMPTY_SLOT; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// One slot stays between producer and consumer so the consumer never
    /// reads a slot that is being written.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Producer side. Never blocks, overwrites on wraparound.
    pub(crate) fn push(&self, byte: u8) {
        let head = self.head.load(Ordering::Relaxed);
        self.slots[head % N].store(byte, Ordering::Relaxed);
        self.head.store(head.wrapping_add(1), Ordering::Release);
    }

    pub fn available(&self) -> bool {
        self.head.load(Ordering::Acquire) != self.tail.load(Ordering::Relaxed)
    }

    /// Consumer side.
    pub(crate) fn pop(&self) -> Option<u8> {
        let mut tail = self.tail.load(Ordering::Relaxed);

        loop {
            let head = self.head.load(Ordering::Acquire);
            if head == tail {
                return None;
            }

            if head.wrapping_sub(tail) > self.capacity() {
                tail = head.wrapping_sub(self.capacity());
            }

            let byte = self.slots[tail % N].load(Ordering::Relaxed);

            // The producer may have lapped us while the slot was read.
            if self.head.load(Ordering::Acquire).wrapping_sub(tail) > self.capacity() {
                continue;
            }

            self.tail.store(tail.wrapping_add(1), Ordering::Release);
            return Some(byte);
        }
    }

    /// Only while the producer is stopped.
    pub(crate) fn clear(&self) {
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Release);
    }
}

impl<const N: usize> Default for ReceiveBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
