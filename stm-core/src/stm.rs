// Copyright 2026 epoch-stm Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::result::*;
use super::transaction::{Transaction, TransactionGuard, TxMode};

/// The controller owning the global version counter and the commit lock.
///
/// Cells are not bound to a controller, but every transaction touching a
/// given set of cells must go through the same `Stm`.
pub struct Stm {
    /// Global version counter. Advanced by one per committed write
    /// transaction, only while `lock` is held exclusively.
    pub(crate) epoch: AtomicU64,

    /// Shared by read transactions retrying after a stale read, exclusive
    /// for commits and for write transactions retrying after a conflict.
    lock: RwLock<()>,

    read_retries: AtomicU64,
    write_retries: AtomicU64,
}

/// Counters of a `Stm`, loaded one after another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StmStats {
    pub epoch: u64,
    pub read_retries: u64,
    pub write_retries: u64,
}

impl Stm {
    pub const fn new() -> Stm {
        Stm {
            epoch: AtomicU64::new(0),
            lock: RwLock::new(()),
            read_retries: AtomicU64::new(0),
            write_retries: AtomicU64::new(0),
        }
    }

    /// Run `f` as a read transaction.
    ///
    /// `f` first runs without any lock. If one of its reads sees a value
    /// committed after the transaction started, the run is abandoned and `f`
    /// runs a second time while holding the commit lock in shared mode, which
    /// keeps all commits out and therefore always succeeds.
    ///
    /// The value returned by the last run of `f` is returned.
    ///
    /// # Panics
    ///
    /// Panics when called inside another transaction, or when `f` reports a
    /// stale snapshot on the guaranteed run.
    ///
    /// ```
    /// # use epoch_stm_core::*;
    /// let stm = Stm::new();
    /// let x = TCell::new(1);
    /// let y = TCell::new(2);
    ///
    /// let sum = stm.read_tx(|tx| Ok(x.get(tx)? + y.get(tx)?));
    /// assert_eq!(sum, 3);
    /// ```
    pub fn read_tx<'a, T, F>(&'a self, f: F) -> T
    where
        F: Fn(&mut Transaction<'a>) -> StmResult<T>,
    {
        let _guard = TransactionGuard::new();

        let mut tx = Transaction::new(self, TxMode::Read, self.epoch.load(Ordering::Acquire));
        if let Ok(t) = f(&mut tx) {
            // A swallowed `Stale` still voids the attempt.
            if !tx.is_stale() {
                return t;
            }
        }

        self.read_retries.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(epoch = tx.start_epoch(), "read transaction falling back to lock");

        let _lock = self.lock.read();
        tx.restart(self.epoch.load(Ordering::Acquire));
        match f(&mut tx) {
            Ok(t) => t,
            Err(e) => panic!("STM: read transaction failed while holding the lock: {}", e),
        }
    }

    /// Run `f` as a write transaction.
    ///
    /// `f` first runs without any lock; its writes are staged inside the
    /// transaction. The commit lock is then taken exclusively, every read and
    /// written cell is validated against the start epoch and, if nobody got
    /// in between, the staged writes are published under a new epoch.
    ///
    /// If a read was stale or validation fails, `f` runs a second time while
    /// holding the lock exclusively. That run can not conflict with anyone
    /// and commits unconditionally.
    ///
    /// # Panics
    ///
    /// Panics when called inside another transaction, or when `f` reports a
    /// stale snapshot on the guaranteed run.
    ///
    /// ```
    /// # use epoch_stm_core::*;
    /// let stm = Stm::new();
    /// let from = TCell::new(10);
    /// let to = TCell::new(0);
    ///
    /// stm.write_tx(|tx| {
    ///     let amount = from.get(tx)?;
    ///     from.set(tx, 0)?;
    ///     to.modify(tx, |x| x + amount)
    /// });
    ///
    /// assert_eq!(to.read_atomic(), 10);
    /// assert_eq!(stm.epoch(), 1);
    /// ```
    pub fn write_tx<'a, T, F>(&'a self, f: F) -> T
    where
        F: Fn(&mut Transaction<'a>) -> StmResult<T>,
    {
        let _guard = TransactionGuard::new();

        // Acquire, so every cell committed up to the snapshot is visible to
        // the reads below. Validation only compares stamps.
        let mut tx = Transaction::new(self, TxMode::Write, self.epoch.load(Ordering::Acquire));
        if let Ok(t) = f(&mut tx) {
            if !tx.is_stale() {
                let _lock = self.lock.write();
                if tx.validate() {
                    tx.commit();
                    return t;
                }
            }
        }

        self.write_retries.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(epoch = tx.start_epoch(), "write transaction falling back to lock");

        let _lock = self.lock.write();
        tx.restart(self.epoch.load(Ordering::Relaxed));
        let t = match f(&mut tx) {
            Ok(t) => t,
            Err(e) => panic!("STM: write transaction failed while holding the lock: {}", e),
        };
        tx.commit();
        t
    }

    /// Number of read transactions that had to retry under the lock.
    pub fn read_retries(&self) -> u64 {
        self.read_retries.load(Ordering::Relaxed)
    }

    /// Number of write transactions that had to retry under the lock.
    pub fn write_retries(&self) -> u64 {
        self.write_retries.load(Ordering::Relaxed)
    }

    /// The epoch of the last committed write transaction.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StmStats {
        StmStats {
            epoch: self.epoch(),
            read_retries: self.read_retries(),
            write_retries: self.write_retries(),
        }
    }
}

impl Default for Stm {
    fn default() -> Self {
        Self::new()
    }
}
