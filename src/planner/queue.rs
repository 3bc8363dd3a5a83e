//! Block ring buffer shared by the planner and the stepper interrupt.
//!
//! Only the [`Producer`] advances `head`, only the [`Consumer`] advances
//! `tail`. One slot is always left empty: the queue is full when
//! `tail == (head + 1) % N` and empty when `head == tail`.
//!
//! Slot ownership:
//! - the slot at `head` belongs to the producer alone until `head` is published;
//! - slots in `[tail, head)` are shared and are only touched inside
//!   [`CriticalSection::with`];
//! - the consumer copies a block out when it claims it, so a busy slot is
//!   never read again by the interrupt.

#![allow(unsafe_code)]

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::motor::StepCounters;

use super::block::Block;

/// Scoped exclusion against the stepper interrupt.
///
/// # Safety
///
/// While `f` runs, no other context may run code inside `with` on the same
/// instance. On a single core this is satisfied by masking the step timer
/// interrupt (the interrupt's own calls then nest harmlessly). On a host, a
/// mutex shared by both threads satisfies it.
pub unsafe trait CriticalSection {
    /// Run `f` with the stepper interrupt excluded.
    fn with<R>(&self, f: impl FnOnce() -> R) -> R;
}

/// Mutex-backed critical section for host simulation and tests.
#[cfg(feature = "std")]
#[derive(Debug, Default)]
pub struct StdCriticalSection {
    lock: std::sync::Mutex<()>,
}

#[cfg(feature = "std")]
impl StdCriticalSection {
    /// Create an unlocked critical section.
    pub fn new() -> Self {
        Self::default()
    }
}

// SAFETY: every `with` call holds the same mutex for the duration of `f`.
#[cfg(feature = "std")]
unsafe impl CriticalSection for StdCriticalSection {
    fn with<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f()
    }
}

/// Fixed-capacity block queue with one producer and one consumer.
pub struct BlockQueue<C, const N: usize> {
    slots: [UnsafeCell<Block>; N],
    head: AtomicUsize,
    tail: AtomicUsize,
    abort: AtomicBool,
    counters: StepCounters,
    last_activity: AtomicU32,
    cs: C,
}

// SAFETY: shared slots are only accessed inside `cs.with`, the head slot only
// by the unique producer, and indices are atomics. `Block` is plain data.
unsafe impl<C: CriticalSection + Sync, const N: usize> Sync for BlockQueue<C, N> {}

impl<C: CriticalSection, const N: usize> BlockQueue<C, N> {
    /// Create an empty queue.
    ///
    /// # Panics
    ///
    /// Panics if `N < 2`; one slot is always kept free.
    pub fn new(cs: C) -> Self {
        assert!(N >= 2, "block queue needs at least two slots");
        Self {
            slots: core::array::from_fn(|_| UnsafeCell::new(Block::EMPTY)),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            abort: AtomicBool::new(false),
            counters: StepCounters::new(),
            last_activity: AtomicU32::new(0),
            cs,
        }
    }

    /// Split into the planner half and the interrupt half.
    pub fn split(&mut self) -> (Producer<'_, C, N>, Consumer<'_, C, N>) {
        let queue: &Self = self;
        (Producer { queue }, Consumer { queue })
    }

    /// Usable capacity (`N - 1`).
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    #[inline]
    fn len_between(head: usize, tail: usize) -> usize {
        (head + N - tail) % N
    }

    #[inline]
    fn next(index: usize) -> usize {
        (index + 1) % N
    }

    /// True if `slot` lies in `[tail, head)`.
    #[inline]
    fn is_queued(slot: usize, head: usize, tail: usize) -> bool {
        slot < N && Self::len_between(slot, tail) < Self::len_between(head, tail)
    }
}

/// A queued block together with the slot it lives in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedBlock {
    /// Slot index, stable until the block retires.
    pub slot: usize,
    /// Copy of the block.
    pub block: Block,
}

/// Planner half of a [`BlockQueue`].
pub struct Producer<'a, C, const N: usize> {
    queue: &'a BlockQueue<C, N>,
}

impl<'a, C: CriticalSection, const N: usize> Producer<'a, C, N> {
    /// Usable capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Number of queued blocks, including one the interrupt is executing.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.queue.head.load(Ordering::Relaxed);
        let tail = self.queue.tail.load(Ordering::Acquire);
        BlockQueue::<C, N>::len_between(head, tail)
    }

    /// True when no block is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when a push would fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        let head = self.queue.head.load(Ordering::Relaxed);
        BlockQueue::<C, N>::next(head) == self.queue.tail.load(Ordering::Acquire)
    }

    /// Append a block, handing it back if the queue is full.
    pub fn push(&mut self, block: Block) -> Result<usize, Block> {
        if self.is_full() {
            return Err(block);
        }
        let head = self.queue.head.load(Ordering::Relaxed);
        // SAFETY: `head` is outside `[tail, head)`, so the consumer never
        // reads it, and `&mut self` makes this the only producer access.
        unsafe {
            *self.queue.slots[head].get() = block;
        }
        self.queue
            .head
            .store(BlockQueue::<C, N>::next(head), Ordering::Release);
        Ok(head)
    }

    /// Copy of every queued block, oldest first.
    pub fn snapshot(&self) -> heapless::Vec<QueuedBlock, N> {
        let mut out = heapless::Vec::new();
        let head = self.queue.head.load(Ordering::Relaxed);
        let mut slot = self.queue.tail.load(Ordering::Acquire);
        while slot != head {
            if let Some(block) = self.read(slot) {
                // Capacity is N and at most N - 1 blocks are queued.
                let _ = out.push(QueuedBlock { slot, block });
            }
            slot = BlockQueue::<C, N>::next(slot);
        }
        out
    }

    /// Copy of the block in `slot`, if it is still queued.
    pub fn read(&self, slot: usize) -> Option<Block> {
        let queue = self.queue;
        queue.cs.with(|| {
            let head = queue.head.load(Ordering::Relaxed);
            let tail = queue.tail.load(Ordering::Acquire);
            if !BlockQueue::<C, N>::is_queued(slot, head, tail) {
                return None;
            }
            // SAFETY: inside the critical section the consumer cannot touch
            // the slot, and the producer holds `&self` only.
            Some(unsafe { *queue.slots[slot].get() })
        })
    }

    /// Mutate a queued block unless the interrupt has claimed it.
    ///
    /// Returns `None` without calling `f` if the block is busy or retired.
    pub fn update<R>(&mut self, slot: usize, f: impl FnOnce(&mut Block) -> R) -> Option<R> {
        let queue = self.queue;
        queue.cs.with(|| {
            let head = queue.head.load(Ordering::Relaxed);
            let tail = queue.tail.load(Ordering::Acquire);
            if !BlockQueue::<C, N>::is_queued(slot, head, tail) {
                return None;
            }
            // SAFETY: inside the critical section the consumer cannot touch
            // the slot, and `&mut self` excludes other producer accesses.
            let block = unsafe { &mut *queue.slots[slot].get() };
            if block.busy {
                None
            } else {
                Some(f(block))
            }
        })
    }

    /// Drop every queued block.
    ///
    /// A block the interrupt is executing stays queued and is flagged for
    /// abort, so the interrupt retires it on its next tick. Returns true if
    /// such a block existed.
    pub fn clear(&mut self) -> bool {
        let queue = self.queue;
        queue.cs.with(|| {
            let head = queue.head.load(Ordering::Relaxed);
            let tail = queue.tail.load(Ordering::Acquire);
            // SAFETY: read inside the critical section; see `read`.
            let busy = head != tail && unsafe { (*queue.slots[tail].get()).busy };
            if busy {
                queue.head.store(BlockQueue::<C, N>::next(tail), Ordering::Release);
                queue.abort.store(true, Ordering::Release);
            } else {
                queue.head.store(tail, Ordering::Release);
            }
            busy
        })
    }

    /// Step counters maintained by the interrupt.
    #[inline]
    pub fn counters(&self) -> &'a StepCounters {
        &self.queue.counters
    }

    /// Wall-clock tick of the last step pulse.
    #[inline]
    pub fn last_activity(&self) -> u32 {
        self.queue.last_activity.load(Ordering::Relaxed)
    }
}

/// Interrupt half of a [`BlockQueue`].
pub struct Consumer<'a, C, const N: usize> {
    queue: &'a BlockQueue<C, N>,
}

impl<'a, C: CriticalSection, const N: usize> Consumer<'a, C, N> {
    /// True when nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.head.load(Ordering::Acquire) == self.queue.tail.load(Ordering::Relaxed)
    }

    /// Mark the oldest block busy and return a copy of it.
    ///
    /// Also clears an abort request left over from a block that retired on
    /// its own before seeing it.
    pub fn claim(&mut self) -> Option<Block> {
        let queue = self.queue;
        let tail = queue.tail.load(Ordering::Relaxed);
        if queue.head.load(Ordering::Acquire) == tail {
            return None;
        }
        queue.cs.with(|| {
            // The producer may have cleared the queue since the check above.
            if queue.head.load(Ordering::Acquire) == tail {
                return None;
            }
            queue.abort.store(false, Ordering::Relaxed);
            // SAFETY: inside the critical section the producer cannot touch
            // the slot; `tail` is in `[tail, head)`.
            let block = unsafe { &mut *queue.slots[tail].get() };
            block.busy = true;
            Some(*block)
        })
    }

    /// Release the oldest block back to the producer.
    pub fn retire(&mut self) {
        let tail = self.queue.tail.load(Ordering::Relaxed);
        self.queue
            .tail
            .store(BlockQueue::<C, N>::next(tail), Ordering::Release);
    }

    /// Consume a pending abort request.
    #[inline]
    pub fn take_abort(&mut self) -> bool {
        self.queue.abort.swap(false, Ordering::AcqRel)
    }

    /// Step counters maintained by the interrupt.
    #[inline]
    pub fn counters(&self) -> &'a StepCounters {
        &self.queue.counters
    }

    /// Record the wall-clock tick of a step pulse.
    #[inline]
    pub fn touch(&self, now: u32) {
        self.queue.last_activity.store(now, Ordering::Relaxed);
    }
}
