//! Writers set a two-field record to `(i, i)`, readers check they never see
//! the fields disagree, and the retry fractions are printed at the end.
//!
//! ```text
//! cargo run --release --example retry_fraction -- --iterations 1000000
//! ```

use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use epoch_stm::{Stm, TVal, Transactional};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Measure how often transactions fall back to the lock")]
struct Args {
    /// Transactions per thread.
    #[arg(long, default_value_t = 10_000_000)]
    iterations: u64,

    /// Busy-loop length between the two field accesses.
    #[arg(long, default_value_t = 100)]
    work: u32,

    #[arg(long, default_value_t = 1)]
    readers: usize,

    #[arg(long, default_value_t = 1)]
    writers: usize,
}

#[derive(Transactional)]
struct S {
    x: u64,
    y: u64,
}

fn do_work(n: u32) {
    for i in 0..n {
        black_box(i);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    info!(?args, "starting");

    let stm = Arc::new(Stm::new());
    let val: Arc<TVal<S>> = Arc::new(S { x: 0, y: 0 }.new_cells());

    let mut handles = Vec::new();
    for _ in 0..args.writers {
        let (stm, val) = (stm.clone(), val.clone());
        let (iterations, work) = (args.iterations, args.work);
        handles.push(thread::spawn(move || {
            for i in 0..iterations {
                stm.write_tx(|tx| {
                    val.x.set(tx, i)?;
                    do_work(work);
                    val.y.set(tx, i)
                });
            }
        }));
    }
    for _ in 0..args.readers {
        let (stm, val) = (stm.clone(), val.clone());
        let (iterations, work) = (args.iterations, args.work);
        handles.push(thread::spawn(move || {
            for _ in 0..iterations {
                stm.read_tx(|tx| {
                    let x = val.x.get(tx)?;
                    do_work(work);
                    let y = val.y.get(tx)?;
                    assert_eq!(x, y, "torn read");
                    Ok(())
                });
            }
        }));
    }

    for h in handles {
        if h.join().is_err() {
            eprintln!("a worker thread panicked");
            std::process::exit(1);
        }
    }

    let stats = stm.stats();
    let reads = (args.iterations * args.readers as u64).max(1) as f64;
    let writes = (args.iterations * args.writers as u64).max(1) as f64;
    println!("Read retry fraction: {}", stats.read_retries as f64 / reads);
    println!("Write retry fraction: {}", stats.write_retries as f64 / writes);
    info!(epoch = stats.epoch, "done");
}
