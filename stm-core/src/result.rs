// Copyright 2026 epoch-stm Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

#[derive(Error, Eq, PartialEq, Clone, Copy, Debug)]
pub enum StmError {
    /// A cell has been committed by another transaction after this one
    /// took its snapshot, so the current attempt cannot be validated.
    ///
    /// This never reaches the caller of `read_tx` or `write_tx`. It is
    /// turned into a retry under the lock.
    #[error("transaction observed a stale snapshot")]
    Stale,
}

/// StmResult is a result of a single step of a STM calculation.
///
/// It informs of success or of a stale snapshot. Normally you should not
/// inspect it directly, but pass it on with `?`. Swallowing a `Stale` lets
/// the body continue on inconsistent data. The transaction remembers the
/// rejected read, so the attempt is thrown away and rerun under the lock
/// anyway, but the body may do useless work in the meantime.
pub type StmResult<T> = Result<T, StmError>;
