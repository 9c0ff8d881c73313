// Copyright 2026 epoch-stm Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod pending;

use std::cell::Cell;
use std::cmp;
use std::collections::btree_map::Entry::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use self::pending::PendingWrite;
use super::stm::Stm;
use super::tcell::RawCell;

thread_local!(static TRANSACTION_RUNNING: Cell<bool> = const { Cell::new(false) });

/// `TransactionGuard` checks against nested STM calls.
///
/// Use guard, so that it correctly marks the Transaction as finished.
pub(crate) struct TransactionGuard;

impl TransactionGuard {
    pub fn new() -> TransactionGuard {
        TRANSACTION_RUNNING.with(|t| {
            assert!(!t.get(), "STM: Nested Transaction");
            t.set(true);
        });
        TransactionGuard
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        TRANSACTION_RUNNING.with(|t| {
            t.set(false);
        });
    }
}

/// Whether a transaction may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    Read,
    Write,
}

/// Which run of the body is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// The first run. No lock is held and any access may report a stale
    /// snapshot.
    Optimistic,

    /// The retry after a failed optimistic run. The commit lock is held, so
    /// no commit can interleave and the run always completes.
    Guaranteed,
}

/// Address-ordered reference to a cell's version stamp.
#[derive(Clone, Copy)]
struct VersionRef<'a>(&'a AtomicU64);

impl<'a> VersionRef<'a> {
    fn address(&self) -> usize {
        self.0 as *const AtomicU64 as usize
    }
}

impl<'a> PartialEq for VersionRef<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl<'a> Eq for VersionRef<'a> {}

impl<'a> Ord for VersionRef<'a> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.address().cmp(&other.address())
    }
}

impl<'a> PartialOrd for VersionRef<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Transaction tracks all the read and written cells.
///
/// It only exists as the argument of a body passed to `Stm::read_tx` or
/// `Stm::write_tx`, so cells can not be accessed outside of a transaction.
pub struct Transaction<'a> {
    stm: &'a Stm,
    mode: TxMode,
    attempt: Attempt,

    /// Epoch at which the current attempt started.
    epoch: u64,

    /// Set once any read of the current attempt saw a newer commit.
    stale: bool,

    /// Version stamps observed by a write transaction.
    reads: BTreeSet<VersionRef<'a>>,

    /// Staged values, keyed by the address of the target cell.
    writes: BTreeMap<usize, PendingWrite<'a>>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(stm: &'a Stm, mode: TxMode, epoch: u64) -> Transaction<'a> {
        Transaction {
            stm,
            mode,
            attempt: Attempt::Optimistic,
            epoch,
            stale: false,
            reads: BTreeSet::new(),
            writes: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> TxMode {
        self.mode
    }

    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// The snapshot epoch every read is validated against.
    pub fn start_epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of distinct cells read so far in a write transaction.
    pub fn read_set_len(&self) -> usize {
        self.reads.len()
    }

    /// Number of distinct cells written so far.
    pub fn write_set_len(&self) -> usize {
        self.writes.len()
    }

    /// Throw away everything the failed attempt recorded and start the
    /// guaranteed run at `epoch`.
    pub(crate) fn restart(&mut self, epoch: u64) {
        self.clear();
        self.attempt = Attempt::Guaranteed;
        self.epoch = epoch;
        self.stale = false;
    }

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// True if a read of this attempt was rejected, even if the body
    /// ignored the error.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub(crate) fn pending(&self, cell: &RawCell) -> Option<u64> {
        self.writes.get(&cell.address()).map(PendingWrite::bits)
    }

    pub(crate) fn record_read(&mut self, version: &'a AtomicU64) {
        self.reads.insert(VersionRef(version));
    }

    pub(crate) fn stage_write(&mut self, cell: &'a RawCell, bits: u64) {
        match self.writes.entry(cell.address()) {
            Occupied(mut entry) => entry.get_mut().replace(bits),
            Vacant(entry) => {
                entry.insert(PendingWrite::new(cell, bits));
            }
        }
    }

    /// Check that no cell in the read or write set has been committed since
    /// the attempt started.
    ///
    /// Only meaningful while holding the commit lock exclusively.
    pub(crate) fn validate(&self) -> bool {
        let reads_ok = self
            .reads
            .iter()
            .all(|v| v.0.load(Ordering::Relaxed) <= self.epoch);

        reads_ok && self.writes.values().all(|w| w.can_commit(self.epoch))
    }

    /// Stamp and publish every staged write, then advance the global epoch.
    ///
    /// Must only be called while holding the commit lock exclusively.
    /// Returns the commit epoch.
    pub(crate) fn commit(&mut self) -> u64 {
        let commit_epoch = self.stm.epoch.load(Ordering::Relaxed) + 1;
        for write in self.writes.values() {
            write.commit(commit_epoch);
        }
        self.stm.epoch.store(commit_epoch, Ordering::Release);

        tracing::trace!(
            epoch = commit_epoch,
            writes = self.writes.len(),
            reads = self.reads.len(),
            attempt = ?self.attempt,
            "write transaction committed"
        );
        commit_epoch
    }

    /// Clear the log's data.
    fn clear(&mut self) {
        self.reads.clear();
        self.writes.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{abort, StmResult, TCell};

    #[test]
    fn write_read() {
        let stm = Stm::new();
        let cell = TCell::new(1);

        let (seen, before) = stm.write_tx(|tx| {
            cell.set(tx, 4)?;
            // Consecutive reads get the updated version.
            Ok((cell.get(tx)?, cell.read_atomic()))
        });

        assert_eq!(seen, 4);
        // The original value is preserved until commit.
        assert_eq!(before, 1);
        assert_eq!(cell.read_atomic(), 4);
    }

    #[test]
    fn own_writes_are_not_read_set_entries() {
        let stm = Stm::new();
        let a = TCell::new(0);
        let b = TCell::new(0);

        let (reads, writes) = stm.write_tx(|tx| {
            a.set(tx, 1)?;
            a.get(tx)?;
            b.get(tx)?;
            b.get(tx)?;
            Ok((tx.read_set_len(), tx.write_set_len()))
        });

        assert_eq!(reads, 1);
        assert_eq!(writes, 1);
    }

    #[test]
    fn read_tx_keeps_no_read_set() {
        let stm = Stm::new();
        let a = TCell::new(0);

        let reads = stm.read_tx(|tx| {
            a.get(tx)?;
            Ok(tx.read_set_len())
        });

        assert_eq!(reads, 0);
    }

    #[test]
    fn restart_clears_sets() {
        let stm = Stm::new();
        let a = TCell::new(0);

        let seen = stm.write_tx(|tx| {
            if tx.attempt() == Attempt::Optimistic {
                a.set(tx, 99)?;
                return abort();
            }
            // The staged 99 from the first run must be gone.
            Ok((a.get(tx)?, tx.write_set_len()))
        });

        assert_eq!(seen, (0, 0));
        assert_eq!(a.read_atomic(), 0);
    }

    #[test]
    fn validate_detects_foreign_commit() {
        let stm = Stm::new();
        let a = TCell::new(0);
        let b = TCell::new(0);

        let mut tx = Transaction::new(&stm, TxMode::Write, 0);
        assert_eq!(a.get(&mut tx), Ok(0));
        b.set(&mut tx, 1).unwrap();
        assert!(tx.validate());

        drop(tx);
        stm.write_tx(|t| a.set(t, 5));

        let mut tx = Transaction::new(&stm, TxMode::Write, 0);
        b.set(&mut tx, 1).unwrap();
        assert!(tx.validate());
        tx.record_read(a.raw().version_stamp());
        assert!(!tx.validate());
    }

    #[test]
    fn stale_flag_survives_ignored_error() {
        let stm = Stm::new();
        let a = TCell::new(0);
        stm.write_tx(|t| a.set(t, 1));

        let mut tx = Transaction::new(&stm, TxMode::Read, 0);
        assert!(!tx.is_stale());
        assert!(a.get(&mut tx).is_err());
        assert!(tx.is_stale());

        tx.restart(stm.epoch());
        assert!(!tx.is_stale());
        assert_eq!(a.get(&mut tx), Ok(1));
    }

    #[test]
    fn modes_are_reported() {
        let stm = Stm::new();

        assert_eq!(stm.read_tx(|tx| Ok(tx.mode())), TxMode::Read);
        assert_eq!(stm.write_tx(|tx| Ok(tx.mode())), TxMode::Write);
        assert_eq!(stm.write_tx(|tx| Ok(tx.attempt())), Attempt::Optimistic);
    }

    /// Test if nested transactions are correctly detected.
    #[test]
    #[should_panic(expected = "Nested Transaction")]
    fn transaction_nested_fail() {
        let stm = Stm::new();
        stm.write_tx(|_| {
            stm.read_tx(|_| Ok(42));
            Ok(1)
        });
    }

    #[test]
    #[should_panic(expected = "Nested Transaction")]
    fn nesting_across_controllers_fails() {
        let outer = Stm::new();
        let inner = Stm::new();
        outer.read_tx(|_| {
            inner.write_tx(|_| Ok(()));
            Ok(())
        });
    }

    #[test]
    fn guard_is_released_after_panic() {
        let stm = Stm::new();
        let cell = TCell::new(0);

        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            stm.write_tx(|tx| -> StmResult<()> {
                cell.set(tx, 1)?;
                panic!("boom")
            })
        }));
        assert!(res.is_err());

        // Nothing was committed and a new transaction can start.
        assert_eq!(stm.read_tx(|tx| cell.get(tx)), 0);
        assert_eq!(stm.epoch(), 0);
    }
}
