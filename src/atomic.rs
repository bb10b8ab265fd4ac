//! Atomic index backend and slot access tracking.
//!
//! The FIFO only needs 8-bit atomic `load`/`store`, never compare-and-swap, so it
//! also runs on cores whose only atomics are plain byte accesses.
//!
//! - default: `core::sync::atomic`
//! - `portable-atomic`: the `portable-atomic` crate, for targets lacking native atomics
//! - `cfg(loom)`: `loom` atomics for model checking
//!
//! [`SlotAccess`] wraps every slot read and write. Outside loom it is zero-sized
//! and inlines away. Under loom each slot gets a `loom::cell::UnsafeCell`, so a
//! slot read that is not ordered after its write (or a reuse not ordered after
//! the read) fails the model.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU8, Ordering};

#[cfg(all(not(loom), feature = "portable-atomic"))]
pub(crate) use portable_atomic::{AtomicU8, Ordering};

#[cfg(all(not(loom), not(feature = "portable-atomic")))]
pub(crate) use core::sync::atomic::{AtomicU8, Ordering};

#[cfg(not(loom))]
pub(crate) struct SlotAccess;

#[cfg(not(loom))]
impl SlotAccess {
    #[inline(always)]
    pub(crate) fn new(_capacity: usize) -> Self {
        SlotAccess
    }

    #[inline(always)]
    pub(crate) fn write<R>(&self, _offset: usize, f: impl FnOnce() -> R) -> R {
        f()
    }

    #[inline(always)]
    pub(crate) fn read<R>(&self, _offset: usize, f: impl FnOnce() -> R) -> R {
        f()
    }
}

#[cfg(loom)]
pub(crate) struct SlotAccess {
    cells: std::vec::Vec<loom::cell::UnsafeCell<()>>,
}

// SAFETY: every access goes through loom's tracked cells, which report
// unsynchronized use instead of racing.
#[cfg(loom)]
unsafe impl Sync for SlotAccess {}
#[cfg(loom)]
unsafe impl Send for SlotAccess {}

#[cfg(loom)]
impl SlotAccess {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            cells: (0..capacity)
                .map(|_| loom::cell::UnsafeCell::new(()))
                .collect(),
        }
    }

    pub(crate) fn write<R>(&self, offset: usize, f: impl FnOnce() -> R) -> R {
        self.cells[offset].with_mut(|_| f())
    }

    pub(crate) fn read<R>(&self, offset: usize, f: impl FnOnce() -> R) -> R {
        self.cells[offset].with(|_| f())
    }
}

#[cfg(all(test, loom))]
mod loom_tests {
    use super::SlotAccess;
    use loom::sync::Arc;
    use loom::thread;

    /// A slot read with no happens-before edge to its write is reported.
    #[test]
    #[should_panic]
    fn unsynchronized_slot_access_fails_the_model() {
        loom::model(|| {
            let access = Arc::new(SlotAccess::new(1));
            let writer = access.clone();

            let handle = thread::spawn(move || writer.write(0, || ()));
            access.read(0, || ());
            handle.join().unwrap();
        });
    }
}
