//! Fixed-capacity FIFO for interrupt-driven, allocation-free targets.
//!
//! # Highlights
//! - Lock-free SPSC ring over caller-owned storage; no allocation, no locks.
//! - Every slot is usable: a FIFO of capacity `N` holds `N` elements.
//! - Capacity is a power of two up to 128; slots hold `u8`, `u16`, `u32` or `u64`.
//! - Only atomic byte loads/stores are needed, never compare-and-swap.
//!
//! # Quick start
//! ```
//! use ph_fifo::{Error, Fifo};
//!
//! let mut storage = [0u16; 8];
//! let mut fifo = Fifo::new(&mut storage, 8)?;
//!
//! fifo.push(42)?;
//! assert_eq!(fifo.peek(), Some(42));
//! assert_eq!(fifo.pop(), Ok(42));
//! assert_eq!(fifo.pop(), Err(Error::Underflow));
//!
//! let (mut producer, mut consumer) = fifo.split();
//! producer.push(7)?;
//! assert_eq!(consumer.pop(), Ok(7));
//! # Ok::<(), Error>(())
//! ```
//!
//! # No-std
//! The crate is `#![no_std]`. Tests require `std`.
//!
//! # Safety and concurrency
//! Exactly one producer and one consumer. [`Fifo::split`] borrows the FIFO
//! mutably, so the two handles are the only way in while they live, and
//! [`Fifo::flush`] cannot run concurrently with either side.
//! The `*_unchecked` operations are `unsafe`: skipping the full/empty check is
//! only sound when the caller already knows the precondition holds.
//!
//! # Semantics
//! - Checked operations either succeed and change state once, or fail with
//!   [`Error::Overflow`] / [`Error::Underflow`] and change nothing.
//! - `peek` reads the oldest element without consuming it.
//! - `flush` empties the FIFO.
//!
//! # Features
//! - `portable-atomic`: index atomics from the `portable-atomic` crate.
//! - `portable-atomic-unsafe-assume-single-core`, `portable-atomic-critical-section`:
//!   forwarded to `portable-atomic` for cores without native atomics.
#![no_std]

mod atomic;
pub mod element;
pub mod error;
pub mod fifo;

pub use element::Element;
pub use error::{Error, Result};
pub use fifo::{Consumer, Fifo, Fifo8, Fifo16, Fifo32, MAX_CAPACITY, Producer};

#[cfg(any(test, loom))]
extern crate std;

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
struct ReadmeDoctests;
