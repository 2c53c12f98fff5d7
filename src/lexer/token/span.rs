use std::ops::{Add, Sub};

/// Declares a `u32` backed byte quantity that converts to and from `usize`.
macro_rules! byte_quantity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(u32);

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(u32::try_from(value).unwrap_or(u32::MAX))
            }
        }

        impl From<$name> for usize {
            fn from(value: $name) -> Self {
                value.0 as usize
            }
        }
    };
}

byte_quantity!(
    /// Byte offset into the source text.
    SpanIndex
);

byte_quantity!(
    /// Byte length of a token or node.
    SpanLength
);

impl Add<SpanLength> for SpanIndex {
    type Output = SpanIndex;

    fn add(self, rhs: SpanLength) -> SpanIndex {
        SpanIndex(self.0.saturating_add(rhs.0))
    }
}

impl Add<usize> for SpanIndex {
    type Output = SpanIndex;

    fn add(self, rhs: usize) -> SpanIndex {
        self + SpanLength::from(rhs)
    }
}

/// Distance between two offsets; clamps to zero when `rhs` lies past `self`.
impl Sub for SpanIndex {
    type Output = SpanLength;

    fn sub(self, rhs: SpanIndex) -> SpanLength {
        SpanLength(self.0.saturating_sub(rhs.0))
    }
}
