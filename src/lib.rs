// Copyright 2026 epoch-stm Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! This library implements [software transactional memory]
//! (https://en.wikipedia.org/wiki/Software_transactional_memory),
//! often abbreviated with STM.
//!
//! Shared state lives in `TCell`s. A `Stm` runs read and write transactions
//! over them: reads are optimistic and validated against a global version
//! counter, writes are staged and published under a short exclusive lock.
//! A transaction that can not be validated runs once more while holding the
//! lock, so every transaction finishes after at most two runs.
//!
//! # Usage
//!
//! Plain records get one cell per field with `#[derive(Transactional)]`:
//!
//! ```
//! use epoch_stm::{Stm, Transactional};
//!
//! #[derive(Transactional)]
//! struct Pair {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let stm = Stm::new();
//! let pair = Pair { x: 0, y: 0 }.new_cells();
//!
//! stm.write_tx(|tx| {
//!     pair.x.set(tx, 1)?;
//!     pair.y.set(tx, 1)
//! });
//!
//! let (x, y) = stm.read_tx(|tx| Ok((pair.x.get(tx)?, pair.y.get(tx)?)));
//! assert_eq!(x, y);
//! ```
//!
//! Whole records can be read and written in one go:
//!
//! ```
//! # use epoch_stm::{Stm, Transactional, TVal};
//! #[derive(Transactional, Debug, PartialEq)]
//! struct Pair {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let stm = Stm::new();
//! let pair: TVal<Pair> = Pair { x: 1, y: 2 }.new_cells();
//!
//! stm.write_tx(|tx| Pair::store(&pair, tx, Pair { x: 3, y: 4 }));
//! assert_eq!(stm.read_tx(|tx| Pair::load(&pair, tx)), Pair { x: 3, y: 4 });
//! ```
//!
//! The derive only accepts plain structs with named fields. Everything else
//! is rejected at compile time:
//!
//! ```compile_fail
//! #[derive(epoch_stm::Transactional)]
//! struct Wrapper<T> {
//!     inner: T,
//! }
//! ```
//!
//! ```compile_fail
//! #[derive(epoch_stm::Transactional)]
//! struct Pair(i32, i32);
//! ```
//!
//! ```compile_fail
//! #[derive(epoch_stm::Transactional)]
//! struct Marker;
//! ```
//!
//! ```compile_fail
//! #[derive(epoch_stm::Transactional)]
//! enum Light {
//!     Red,
//!     Green,
//! }
//! ```
//!
//! ```compile_fail
//! #[derive(epoch_stm::Transactional)]
//! union Bits {
//!     int: u32,
//!     float: f32,
//! }
//! ```
//!
//! ```compile_fail
//! #[derive(epoch_stm::Transactional)]
//! #[transactional(path = "epoch_stm")]
//! struct Pair {
//!     x: i32,
//! }
//! ```
//!
//! The generated code refers to this crate as `::epoch_stm`. A renamed
//! dependency is named explicitly:
//!
//! ```
//! extern crate epoch_stm as stm;
//!
//! #[derive(stm::Transactional)]
//! #[transactional(crate = "stm")]
//! struct Pair {
//!     x: i32,
//! }
//!
//! let pair = stm::Transactional::new_cells(Pair { x: 7 });
//! assert_eq!(pair.x.read_atomic(), 7);
//! ```
//!
//! # STM safety
//!
//! * Bodies run up to twice. Don't run code with side effects outside of
//! cells, especially no IO-code.
//! * Use `?` on every `StmResult` and never swallow `StmError::Stale`.
//! * Don't start a transaction inside of another. Your thread will
//! immediately panic.
//! * Don't mix locks and STM. The second run of a body holds the commit
//! lock, so blocking inside it stalls every other transaction.

pub use epoch_stm_core::*;
pub use epoch_stm_macro::Transactional;
