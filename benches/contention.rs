use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use epoch_stm::{Stm, TVal, Transactional};

#[derive(Transactional, Clone, Copy)]
struct Pair {
    x: i64,
    y: i64,
}

fn bench_uncontended(c: &mut Criterion) {
    let stm = Stm::new();
    let pair: TVal<Pair> = Pair { x: 0, y: 0 }.new_cells();

    c.bench_function("read_tx/two_fields", |b| {
        b.iter(|| black_box(stm.read_tx(|tx| Ok(pair.x.get(tx)? + pair.y.get(tx)?))))
    });

    c.bench_function("write_tx/two_fields", |b| {
        b.iter(|| {
            stm.write_tx(|tx| {
                pair.x.modify(tx, |x| x + 1)?;
                pair.y.modify(tx, |y| y + 1)
            })
        })
    });
}

fn bench_read_while_writing(c: &mut Criterion) {
    let stm = Arc::new(Stm::new());
    let pair = Arc::new(Pair { x: 0, y: 0 }.new_cells());
    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let (stm, pair, stop) = (stm.clone(), pair.clone(), stop.clone());
        thread::spawn(move || {
            let mut i = 0;
            while !stop.load(Ordering::Relaxed) {
                stm.write_tx(|tx| Pair::store(&pair, tx, Pair { x: i, y: i }));
                i += 1;
            }
        })
    };

    c.bench_function("read_tx/against_writer", |b| {
        b.iter(|| black_box(stm.read_tx(|tx| Ok(pair.x.get(tx)? - pair.y.get(tx)?))))
    });

    stop.store(true, Ordering::Relaxed);
    let _ = writer.join();
}

criterion_group!(benches, bench_uncontended, bench_read_while_writing);
criterion_main!(benches);
