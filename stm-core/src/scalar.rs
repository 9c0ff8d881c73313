// Copyright 2026 epoch-stm Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

/// A value that fits into a single machine word.
///
/// Cells keep their content in one `AtomicU64`, so a `Scalar` must be able to
/// move in and out of 64 bits without loss. The set of implementations is
/// fixed: the integer types up to 64 bits, `bool`, `char`, `f32` and `f64`.
///
/// `from_bits(x.into_bits())` always returns `x`.
pub trait Scalar: Copy + Send + Sync + 'static {
    fn into_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
}

macro_rules! impl_scalar_int {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                #[inline]
                fn into_bits(self) -> u64 {
                    self as u64
                }

                // Truncation undoes the sign extension of `into_bits`.
                #[inline]
                fn from_bits(bits: u64) -> Self {
                    bits as $t
                }
            }
        )*
    }
}

impl_scalar_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl Scalar for bool {
    #[inline]
    fn into_bits(self) -> u64 {
        self as u64
    }

    #[inline]
    fn from_bits(bits: u64) -> Self {
        bits != 0
    }
}

impl Scalar for char {
    #[inline]
    fn into_bits(self) -> u64 {
        self as u64
    }

    #[inline]
    fn from_bits(bits: u64) -> Self {
        // Only bits produced by `into_bits` are ever stored.
        char::from_u32(bits as u32).unwrap_or_default()
    }
}

impl Scalar for f32 {
    #[inline]
    fn into_bits(self) -> u64 {
        self.to_bits() as u64
    }

    #[inline]
    fn from_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
}

impl Scalar for f64 {
    #[inline]
    fn into_bits(self) -> u64 {
        self.to_bits()
    }

    #[inline]
    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
}
