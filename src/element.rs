//! Slot element widths.
//!
//! The index arithmetic is identical for every width; only the slot size changes.
//! `Element` is sealed so slots only ever hold fixed-width unsigned integers.

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width unsigned integer that can live in a FIFO slot.
pub trait Element: sealed::Sealed + Copy + Send + 'static {}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}
            impl Element for $t {}
        )*
    };
}

impl_element!(u8, u16, u32, u64);
