// Copyright 2026 epoch-stm Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use super::result::*;
use super::scalar::Scalar;
use super::transaction::{Transaction, TxMode};

/// `RawCell` is the untyped storage of a `TCell`.
///
/// Pending writes refer to it directly, so the write set of a transaction can
/// hold cells of different value types in one container.
pub(crate) struct RawCell {
    /// Encoded value, see `Scalar`.
    value: AtomicU64,

    /// Epoch of the commit that stored `value`.
    ///
    /// Only written while the commit lock is held exclusively, and always
    /// before the value it stamps.
    version: AtomicU64,
}

impl RawCell {
    pub(crate) fn new(bits: u64) -> RawCell {
        RawCell {
            value: AtomicU64::new(bits),
            version: AtomicU64::new(0),
        }
    }

    /// Load the value and check that it is not newer than `start_epoch`.
    ///
    /// The value is loaded first. If it belongs to a commit after the
    /// snapshot, the acquire load makes that commit's version stamp visible
    /// and the check fails.
    pub(crate) fn load(&self, start_epoch: u64) -> StmResult<u64> {
        let bits = self.value.load(Ordering::Acquire);
        let version = self.version.load(Ordering::Relaxed);
        if version > start_epoch {
            return Err(StmError::Stale);
        }
        Ok(bits)
    }

    /// True if nobody committed into this cell after `start_epoch`.
    pub(crate) fn can_commit(&self, start_epoch: u64) -> bool {
        self.version.load(Ordering::Relaxed) <= start_epoch
    }

    /// Store `bits` as the value of commit `commit_epoch`.
    ///
    /// Must only be called while holding the commit lock exclusively.
    pub(crate) fn commit(&self, commit_epoch: u64, bits: u64) {
        self.version.store(commit_epoch, Ordering::Relaxed);
        self.value.store(bits, Ordering::Release);
    }

    pub(crate) fn version_stamp(&self) -> &AtomicU64 {
        &self.version
    }

    pub(crate) fn address(&self) -> usize {
        self as *const RawCell as usize
    }
}

impl PartialEq for RawCell {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for RawCell {}

/// A variable that can be used in a transaction.
///
/// A `TCell` holds one `Scalar` and the epoch at which it was last committed.
/// It never allocates; embed it wherever the shared state lives.
pub struct TCell<T> {
    raw: RawCell,

    /// This marker is needed so that the cell can be used in a typesafe
    /// manner.
    _marker: PhantomData<T>,
}

impl<T: Scalar> TCell<T> {
    /// Create a new `TCell` with version stamp 0.
    pub fn new(value: T) -> TCell<T> {
        TCell {
            raw: RawCell::new(value.into_bits()),
            _marker: PhantomData,
        }
    }

    /// Read the cell inside a transaction.
    ///
    /// In a write transaction a previous `set` of the same cell is returned
    /// without touching shared memory. Otherwise the stamp is recorded for
    /// commit-time validation and the value is checked against the
    /// transaction's snapshot right away.
    ///
    /// Returns `Err(StmError::Stale)` if a newer commit is visible. Pass it
    /// on with `?`.
    pub fn get<'a>(&'a self, tx: &mut Transaction<'a>) -> StmResult<T> {
        if tx.mode() == TxMode::Write {
            if let Some(bits) = tx.pending(&self.raw) {
                return Ok(T::from_bits(bits));
            }
            tx.record_read(self.raw.version_stamp());
        }
        match self.raw.load(tx.start_epoch()) {
            Ok(bits) => Ok(T::from_bits(bits)),
            Err(e) => {
                tx.mark_stale();
                Err(e)
            }
        }
    }

    /// Write the cell inside a write transaction.
    ///
    /// The value stays private to the transaction until it commits.
    ///
    /// # Panics
    ///
    /// Panics if `tx` is a read transaction.
    pub fn set<'a>(&'a self, tx: &mut Transaction<'a>, value: T) -> StmResult<()> {
        assert!(
            tx.mode() == TxMode::Write,
            "STM: TCell::set called in a read transaction"
        );
        tx.stage_write(&self.raw, value.into_bits());
        Ok(())
    }

    /// Modify the content of a `TCell` with the function f.
    ///
    /// ```
    /// # use epoch_stm_core::*;
    /// let stm = Stm::new();
    /// let cell = TCell::new(21);
    ///
    /// stm.write_tx(|tx| cell.modify(tx, |x| x * 2));
    ///
    /// assert_eq!(cell.read_atomic(), 42);
    /// ```
    pub fn modify<'a, F>(&'a self, tx: &mut Transaction<'a>, f: F) -> StmResult<()>
    where
        F: FnOnce(T) -> T,
    {
        let old = self.get(tx)?;
        self.set(tx, f(old))
    }

    /// Replaces the value of a `TCell` with a new one, returning
    /// the old one.
    pub fn replace<'a>(&'a self, tx: &mut Transaction<'a>, value: T) -> StmResult<T> {
        let old = self.get(tx)?;
        self.set(tx, value)?;
        Ok(old)
    }

    /// `read_atomic` loads the current value without a transaction.
    ///
    /// The load itself is atomic, but reading two cells this way gives no
    /// consistency guarantee between them. Use it for single cells or once
    /// all writers are done.
    pub fn read_atomic(&self) -> T {
        T::from_bits(self.raw.value.load(Ordering::Acquire))
    }

    /// The epoch of the last commit that wrote this cell, 0 if never written.
    pub fn version(&self) -> u64 {
        self.raw.version.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> &RawCell {
        &self.raw
    }

    /// Check if two `TCell`s are the same cell.
    pub fn ref_eq(this: &TCell<T>, other: &TCell<T>) -> bool {
        this.raw == other.raw
    }
}

impl<T: Scalar + Default> Default for TCell<T> {
    fn default() -> TCell<T> {
        TCell::new(T::default())
    }
}

/// Debug output a cell.
///
/// Note that this does not run a transaction. Printing several cells does not
/// give a consistent view.
impl<T> Debug for TCell<T>
where
    T: Scalar + Debug,
{
    #[inline(never)]
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.debug_struct("TCell")
            .field("value", &self.read_atomic())
            .field("version", &self.version())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Stm;

    #[test]
    fn test_read_atomic() {
        let cell = TCell::new(42);

        assert_eq!(42, cell.read_atomic());
        assert_eq!(0, cell.version());
    }

    #[test]
    fn stale_stamp_is_rejected() {
        let raw = RawCell::new(7);
        raw.commit(5, 8);

        assert_eq!(raw.load(4), Err(StmError::Stale));
        assert_eq!(raw.load(5), Ok(8));
        assert!(!raw.can_commit(4));
        assert!(raw.can_commit(5));
    }

    #[test]
    fn commit_stamps_current_epoch() {
        let stm = Stm::new();
        let a = TCell::new(0u32);
        let b = TCell::new(0u32);

        stm.write_tx(|tx| a.set(tx, 1));
        stm.write_tx(|tx| b.set(tx, 2));

        assert_eq!(a.version(), 1);
        assert_eq!(b.version(), 2);
        assert_eq!(stm.epoch(), 2);
    }

    #[test]
    fn replace_returns_old() {
        let stm = Stm::new();
        let cell = TCell::new('a');

        let old = stm.write_tx(|tx| cell.replace(tx, 'b'));

        assert_eq!(old, 'a');
        assert_eq!(cell.read_atomic(), 'b');
    }

    #[test]
    fn ref_eq_is_identity() {
        let a = TCell::new(1i64);
        let b = TCell::new(1i64);

        assert!(TCell::ref_eq(&a, &a));
        assert!(!TCell::ref_eq(&a, &b));
    }

    #[test]
    fn debug_shows_value_and_version() {
        let cell = TCell::new(3u8);
        assert_eq!(format!("{:?}", cell), "TCell { value: 3, version: 0 }");
    }

    #[test]
    #[should_panic(expected = "read transaction")]
    fn set_in_read_tx_panics() {
        let stm = Stm::new();
        let cell = TCell::new(0);

        stm.read_tx(|tx| cell.set(tx, 1));
    }
}
