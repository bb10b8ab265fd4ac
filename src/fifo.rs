//! Lock-free SPSC FIFO over caller-owned storage.
//!
//! # Overview
//! - Single producer, single consumer; neither side ever blocks.
//! - Capacity is a power of two in `1..=128` and every slot is usable: a FIFO of
//!   capacity 4 really holds 4 elements.
//! - Read and write indices wrap modulo `2 * capacity`. Their difference is the
//!   occupancy, their low bits select the slot. Empty (`read == write`) and full
//!   (`write - read == capacity`) are therefore distinct without a separate counter.
//! - 8-bit indices: `2 * 128` still fits the index mask `0xff`.
//!
//! # Memory ordering
//! The producer writes the slot, then publishes the write index with `Release`.
//! The consumer loads the write index with `Acquire` before reading a slot, and
//! publishes the read index with `Release` only after the slot has been read. The
//! producer loads the read index with `Acquire` before reusing a slot. Each index
//! has exactly one writer, so plain atomic loads and stores suffice.
//!
//! # Handles
//! [`Fifo::split`] borrows the FIFO exclusively and returns one [`Producer`] and
//! one [`Consumer`]. While they live, nothing else can touch the FIFO, so `flush`
//! can never race an in-flight push or pop.

use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::atomic::{AtomicU8, Ordering, SlotAccess};
use crate::element::Element;
use crate::error::{Error, Result};

/// Largest capacity representable with 8-bit doubled indices.
pub const MAX_CAPACITY: usize = 128;

/// Fixed-capacity FIFO borrowing its slots from the caller.
pub struct Fifo<'a, T: Element> {
    slots: NonNull<T>,
    capacity: u8,
    /// `2 * capacity - 1`
    mask: u8,
    read: AtomicU8,
    write: AtomicU8,
    access: SlotAccess,
    _storage: PhantomData<&'a mut [T]>,
}

// SAFETY: the slots are exclusively borrowed for 'a. Shared access only allows
// reads; every mutation goes through `&mut Fifo` or one of the two split handles,
// and the SPSC index protocol keeps producer and consumer on disjoint slots.
unsafe impl<T: Element> Send for Fifo<'_, T> {}
unsafe impl<T: Element> Sync for Fifo<'_, T> {}

pub type Fifo8<'a> = Fifo<'a, u8>;
pub type Fifo16<'a> = Fifo<'a, u16>;
pub type Fifo32<'a> = Fifo<'a, u32>;

impl<'a, T: Element> Fifo<'a, T> {
    /// Build an empty FIFO of `capacity` slots on top of `storage`.
    ///
    /// Only the first `capacity` elements of `storage` are used.
    ///
    /// # Errors
    /// - [`Error::InvalidCapacity`] if `capacity` is not a power of two in `1..=128`.
    /// - [`Error::StorageTooSmall`] if `storage` is shorter than `capacity`.
    pub fn new(storage: &'a mut [T], capacity: usize) -> Result<Self> {
        if !capacity.is_power_of_two() || capacity > MAX_CAPACITY {
            log::debug!("rejecting fifo capacity {capacity}");
            return Err(Error::InvalidCapacity { capacity });
        }
        if storage.len() < capacity {
            log::debug!(
                "rejecting fifo storage: {} elements for capacity {capacity}",
                storage.len()
            );
            return Err(Error::StorageTooSmall {
                capacity,
                len: storage.len(),
            });
        }

        let mask = (2 * capacity - 1) as u8;
        log::trace!(
            "fifo ready: capacity={capacity} index_mask={mask:#04x} width={}",
            core::mem::size_of::<T>()
        );

        Ok(Self {
            slots: NonNull::from(storage).cast(),
            capacity: capacity as u8,
            mask,
            read: AtomicU8::new(0),
            write: AtomicU8::new(0),
            access: SlotAccess::new(capacity),
            _storage: PhantomData,
        })
    }

    /// Build a FIFO whose capacity is the full length of `storage`.
    pub fn from_storage(storage: &'a mut [T]) -> Result<Self> {
        let capacity = storage.len();
        Self::new(storage, capacity)
    }

    /// Number of usable slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        usize::from(self.capacity)
    }

    /// Number of queued elements, in `0..=capacity`.
    #[inline]
    pub fn used_count(&self) -> usize {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        usize::from(self.used_between(read, write))
    }

    /// Slots still available to `push`.
    #[inline]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.used_count()
    }

    /// True when nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read.load(Ordering::Acquire) == self.write.load(Ordering::Acquire)
    }

    /// True when every slot holds an unread element.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.used_count() == self.capacity()
    }

    /// Append `value`, or fail with [`Error::Overflow`] if every slot is taken.
    #[inline]
    pub fn push(&mut self, value: T) -> Result<()> {
        self.push_inner(value)
    }

    /// Append `value` without checking for space.
    ///
    /// # Safety
    /// The FIFO must not be full. Violating this overwrites the oldest unread
    /// element and corrupts the occupancy count.
    #[inline]
    pub unsafe fn push_unchecked(&mut self, value: T) {
        unsafe { self.push_unchecked_inner(value) }
    }

    /// Remove the oldest element, or fail with [`Error::Underflow`] if empty.
    #[inline]
    pub fn pop(&mut self) -> Result<T> {
        self.pop_inner()
    }

    /// Remove the oldest element without checking for one.
    ///
    /// # Safety
    /// The FIFO must not be empty. Violating this returns a stale slot value and
    /// corrupts the occupancy count.
    #[inline]
    pub unsafe fn pop_unchecked(&mut self) -> T {
        unsafe { self.pop_unchecked_inner() }
    }

    /// Oldest element without removing it, `None` if empty.
    #[inline]
    pub fn peek(&self) -> Option<T> {
        self.peek_inner()
    }

    /// Oldest element without removing it or checking for one.
    ///
    /// # Safety
    /// The FIFO must not be empty, otherwise the result is whatever the next
    /// slot to be written happens to hold.
    #[inline]
    pub unsafe fn peek_unchecked(&self) -> T {
        unsafe { self.peek_unchecked_inner() }
    }

    /// Discard every queued element.
    pub fn flush(&mut self) {
        let discarded = self.used_count();
        self.read.store(0, Ordering::Relaxed);
        self.write.store(0, Ordering::Relaxed);
        log::debug!("fifo flushed, {discarded} element(s) discarded");
    }

    /// Split into the producer and consumer halves.
    ///
    /// The halves may live in different preemption contexts (e.g. an interrupt
    /// handler and the main loop) or different threads.
    pub fn split(&mut self) -> (Producer<'_, T>, Consumer<'_, T>) {
        let fifo: &Fifo<'_, T> = self;
        (Producer { fifo }, Consumer { fifo })
    }

    #[inline(always)]
    fn used_between(&self, read: u8, write: u8) -> u8 {
        write.wrapping_sub(read) & self.mask
    }

    #[inline(always)]
    fn advance(&self, index: u8) -> u8 {
        index.wrapping_add(1) & self.mask
    }

    #[inline(always)]
    fn offset(&self, index: u8) -> usize {
        usize::from(index & (self.capacity - 1))
    }

    /// # Safety
    /// The slot at `index` must be owned by the calling side (producer).
    #[inline(always)]
    unsafe fn write_slot(&self, index: u8, value: T) {
        let offset = self.offset(index);
        // SAFETY: offset < capacity <= storage.len()
        self.access
            .write(offset, || unsafe { self.slots.as_ptr().add(offset).write(value) });
    }

    /// # Safety
    /// The slot at `index` must be owned by the calling side (consumer).
    #[inline(always)]
    unsafe fn read_slot(&self, index: u8) -> T {
        let offset = self.offset(index);
        // SAFETY: offset < capacity <= storage.len()
        self.access
            .read(offset, || unsafe { self.slots.as_ptr().add(offset).read() })
    }

    #[inline]
    fn push_inner(&self, value: T) -> Result<()> {
        let write = self.write.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Acquire);
        if self.used_between(read, write) == self.capacity {
            return Err(Error::Overflow);
        }
        // SAFETY: not full, so the slot at `write` is not visible to the consumer.
        unsafe { self.publish(write, value) };
        Ok(())
    }

    #[inline]
    unsafe fn push_unchecked_inner(&self, value: T) {
        let write = self.write.load(Ordering::Relaxed);
        debug_assert!(
            self.used_between(self.read.load(Ordering::Acquire), write) < self.capacity,
            "push_unchecked on a full fifo"
        );
        // SAFETY: caller guarantees the fifo is not full.
        unsafe { self.publish(write, value) };
    }

    /// Write the slot, then make it visible.
    ///
    /// # Safety
    /// The slot at `write` must not be readable by the consumer.
    #[inline(always)]
    unsafe fn publish(&self, write: u8, value: T) {
        unsafe { self.write_slot(write, value) };
        self.write.store(self.advance(write), Ordering::Release);
    }

    #[inline]
    fn pop_inner(&self) -> Result<T> {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Acquire);
        if read == write {
            return Err(Error::Underflow);
        }
        // SAFETY: not empty, so the slot at `read` has been published.
        Ok(unsafe { self.consume(read) })
    }

    #[inline]
    unsafe fn pop_unchecked_inner(&self) -> T {
        let read = self.read.load(Ordering::Relaxed);
        debug_assert!(
            read != self.write.load(Ordering::Acquire),
            "pop_unchecked on an empty fifo"
        );
        // SAFETY: caller guarantees the fifo is not empty.
        unsafe { self.consume(read) }
    }

    /// Read the slot, then hand it back to the producer.
    ///
    /// # Safety
    /// The slot at `read` must have been published and not yet consumed.
    #[inline(always)]
    unsafe fn consume(&self, read: u8) -> T {
        let value = unsafe { self.read_slot(read) };
        self.read.store(self.advance(read), Ordering::Release);
        value
    }

    #[inline]
    fn peek_inner(&self) -> Option<T> {
        let read = self.read.load(Ordering::Relaxed);
        if read == self.write.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: published and only the consumer side advances `read`.
        Some(unsafe { self.read_slot(read) })
    }

    #[inline]
    unsafe fn peek_unchecked_inner(&self) -> T {
        let read = self.read.load(Ordering::Relaxed);
        debug_assert!(
            read != self.write.load(Ordering::Acquire),
            "peek_unchecked on an empty fifo"
        );
        unsafe { self.read_slot(read) }
    }
}

impl<T: Element> core::fmt::Debug for Fifo<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Fifo")
            .field("capacity", &self.capacity())
            .field("used", &self.used_count())
            .finish_non_exhaustive()
    }
}

/// Writing half of a split [`Fifo`].
pub struct Producer<'f, T: Element> {
    fifo: &'f Fifo<'f, T>,
}

impl<T: Element> Producer<'_, T> {
    #[inline]
    pub fn push(&mut self, value: T) -> Result<()> {
        self.fifo.push_inner(value)
    }

    /// Append `value` without checking for space.
    ///
    /// # Safety
    /// The FIFO must not be full, and that knowledge must come from this
    /// producer's own earlier observation (e.g. [`Producer::free_count`]), so
    /// the consumer's release of the slot happens-before the write.
    #[inline]
    pub unsafe fn push_unchecked(&mut self, value: T) {
        unsafe { self.fifo.push_unchecked_inner(value) }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.fifo.capacity()
    }

    /// Occupancy as seen by the producer. May only shrink until the next push.
    #[inline]
    pub fn used_count(&self) -> usize {
        let write = self.fifo.write.load(Ordering::Relaxed);
        let read = self.fifo.read.load(Ordering::Acquire);
        usize::from(self.fifo.used_between(read, write))
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.used_count()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.used_count() == self.capacity()
    }
}

/// Reading half of a split [`Fifo`].
pub struct Consumer<'f, T: Element> {
    fifo: &'f Fifo<'f, T>,
}

impl<T: Element> Consumer<'_, T> {
    #[inline]
    pub fn pop(&mut self) -> Result<T> {
        self.fifo.pop_inner()
    }

    /// Remove the oldest element without checking for one.
    ///
    /// # Safety
    /// The FIFO must not be empty, as established by this consumer's own
    /// earlier observation (e.g. [`Consumer::used_count`]).
    #[inline]
    pub unsafe fn pop_unchecked(&mut self) -> T {
        unsafe { self.fifo.pop_unchecked_inner() }
    }

    #[inline]
    pub fn peek(&self) -> Option<T> {
        self.fifo.peek_inner()
    }

    /// Oldest element without removing it or checking for one.
    ///
    /// # Safety
    /// The FIFO must not be empty, as established by this consumer's own
    /// earlier observation.
    #[inline]
    pub unsafe fn peek_unchecked(&self) -> T {
        unsafe { self.fifo.peek_unchecked_inner() }
    }

    /// Pop up to `max` elements in order, handing each to `hook`.
    /// Returns how many were delivered.
    pub fn drain_up_to(&mut self, max: usize, mut hook: impl FnMut(T)) -> usize {
        let mut read = self.fifo.read.load(Ordering::Relaxed);
        let write = self.fifo.write.load(Ordering::Acquire);
        let ready = usize::from(self.fifo.used_between(read, write)).min(max);

        for _ in 0..ready {
            // SAFETY: `ready` slots starting at `read` were published.
            let value = unsafe { self.fifo.consume(read) };
            read = self.fifo.advance(read);
            hook(value);
        }
        ready
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.fifo.capacity()
    }

    /// Occupancy as seen by the consumer. May only grow until the next pop.
    #[inline]
    pub fn used_count(&self) -> usize {
        let read = self.fifo.read.load(Ordering::Relaxed);
        let write = self.fifo.write.load(Ordering::Acquire);
        usize::from(self.fifo.used_between(read, write))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used_count() == 0
    }
}
