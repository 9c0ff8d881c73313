// Copyright 2026 epoch-stm Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! This library implements
//! [software transactional memory](https://en.wikipedia.org/wiki/Software_transactional_memory),
//! often abbreviated with STM, around a single global version counter.
//!
//! Every `TCell` carries the epoch of the commit that last wrote it. A
//! transaction snapshots the counter when it starts and validates each read
//! against that snapshot, so a read that would mix two commits is noticed
//! immediately instead of at the end.
//!
//! Readers never take a lock on the fast path. Writers run their body without
//! a lock too, staging writes privately, and only take the commit lock to
//! validate and publish. When an optimistic run can not be validated, the
//! body runs once more while holding the lock, which always succeeds. There
//! is no unbounded retry loop; under heavy writer contention the writes
//! simply serialize.
//!
//! ```
//! # use epoch_stm_core::*;
//! let stm = Stm::new();
//! let x = TCell::new(0);
//! let y = TCell::new(0);
//!
//! stm.write_tx(|tx| {
//!     x.set(tx, 1)?;
//!     y.set(tx, 1)
//! });
//!
//! let (a, b) = stm.read_tx(|tx| Ok((x.get(tx)?, y.get(tx)?)));
//! assert_eq!(a, b);
//! ```
//!
//! # Transaction safety
//!
//! * A body may run twice: once optimistically and once under the lock.
//! Don't run code with side effects outside of cells, especially no IO-code.
//! * Use `?` on every `StmResult`. Don't handle it yourself.
//! * Don't run a transaction inside of another. Nested calls are detected at
//! runtime and handled with panicking, even across different `Stm`s.
//! * Don't block inside a body. The second run holds the commit lock, and
//! everything else waits for it.
//!
//! Panicking in a transaction is transaction-safe. The transaction aborts and
//! all staged writes are discarded. The lock is not poisoned.

mod record;
mod result;
mod scalar;
mod stm;
mod tcell;
mod transaction;


pub use record::{TVal, Transactional};
pub use result::*;
pub use scalar::Scalar;
pub use stm::{Stm, StmStats};
pub use tcell::TCell;
pub use transaction::{Attempt, Transaction, TxMode};

#[inline]
/// Give up the optimistic run of a transaction.
///
/// The transaction then runs again under the commit lock. Calling `abort`
/// on that second run is a bug and panics.
///
/// ```
/// # use epoch_stm_core::*;
/// let stm = Stm::new();
/// let runs = std::cell::Cell::new(0);
///
/// stm.write_tx(|tx| {
///     runs.set(runs.get() + 1);
///     match tx.attempt() {
///         Attempt::Optimistic => abort(),
///         Attempt::Guaranteed => Ok(()),
///     }
/// });
///
/// assert_eq!(runs.get(), 2);
/// assert_eq!(stm.write_retries(), 1);
/// ```
pub fn abort<T>() -> StmResult<T> {
    Err(StmError::Stale)
}
