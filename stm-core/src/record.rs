// Copyright 2026 epoch-stm Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use super::result::*;
use super::tcell::TCell;
use super::transaction::Transaction;

/// A type with a transactional counterpart.
///
/// Scalars map to a single `TCell`. Records deriving `Transactional` map to a
/// generated struct with the same fields in the same order, each of them the
/// transactional counterpart of the original field type. Two transactions
/// writing different fields of one record therefore never conflict.
///
/// ```
/// # use epoch_stm_core::*;
/// let stm = Stm::new();
/// let cell: TVal<u32> = 5u32.new_cells();
///
/// stm.write_tx(|tx| u32::store(&cell, tx, 6));
/// assert_eq!(stm.read_tx(|tx| u32::load(&cell, tx)), 6);
/// ```
pub trait Transactional: Sized {
    /// The transactional form of `Self`.
    type Cells: Send + Sync;

    /// Field names in declaration order, empty for scalars.
    const FIELD_NAMES: &'static [&'static str];

    fn new_cells(self) -> Self::Cells;

    /// Read every field inside `tx`.
    fn load<'a>(cells: &'a Self::Cells, tx: &mut Transaction<'a>) -> StmResult<Self>;

    /// Write every field inside `tx`.
    fn store<'a>(cells: &'a Self::Cells, tx: &mut Transaction<'a>, value: Self) -> StmResult<()>;
}

/// The transactional form of `T`.
pub type TVal<T> = <T as Transactional>::Cells;

macro_rules! impl_transactional_scalar {
    ($($t:ty),*) => {
        $(
            impl Transactional for $t {
                type Cells = TCell<$t>;

                const FIELD_NAMES: &'static [&'static str] = &[];

                fn new_cells(self) -> TCell<$t> {
                    TCell::new(self)
                }

                fn load<'a>(cells: &'a TCell<$t>, tx: &mut Transaction<'a>) -> StmResult<$t> {
                    cells.get(tx)
                }

                fn store<'a>(
                    cells: &'a TCell<$t>,
                    tx: &mut Transaction<'a>,
                    value: $t,
                ) -> StmResult<()> {
                    cells.set(tx, value)
                }
            }
        )*
    }
}

impl_transactional_scalar!(
    u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, bool, char, f32, f64
);
