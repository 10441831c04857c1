#[macro_use]
extern crate criterion;
extern crate searchlist;
extern crate crossbeam;
extern crate rand;

use criterion::Criterion;
use searchlist::structures::SearcherList;

use rand::{thread_rng, Rng};
use std::sync::{Arc, RwLock};
use std::thread;
use std::thread::JoinHandle;

fn bench_searcher_list_mixed(num_threads: usize) {
    let list: Arc<SearcherList<u32>> = Arc::new(SearcherList::new());
    for i in 0..1000 {
        list.insert(i);
    }

    let mut wait_vec: Vec<JoinHandle<()>> = Vec::new();
    for _ in 0..num_threads / 2 {
        let l = list.clone();
        wait_vec.push(thread::spawn(move || {
            for _ in 0..1000 {
                let val = thread_rng().gen_range(0, 2000);
                l.search(&val);
            }
        }));
    }
    for _ in 0..num_threads / 4 {
        let l = list.clone();
        wait_vec.push(thread::spawn(move || {
            for n in 0..1000 {
                l.insert(n + 2000);
            }
        }));
    }
    for _ in 0..num_threads / 4 {
        let l = list.clone();
        wait_vec.push(thread::spawn(move || {
            for n in 0..1000 {
                l.remove(&n);
            }
        }));
    }

    for handle in wait_vec {
        handle.join().unwrap();
    }
}

fn bench_rwlock_vec_mixed(num_threads: usize) {
    let list: Arc<RwLock<Vec<u32>>> = Arc::new(RwLock::new((0..1000).collect()));

    let mut wait_vec: Vec<JoinHandle<()>> = Vec::new();
    for _ in 0..num_threads / 2 {
        let l = list.clone();
        wait_vec.push(thread::spawn(move || {
            for _ in 0..1000 {
                let val = thread_rng().gen_range(0, 2000);
                l.read().unwrap().iter().any(|v| *v == val);
            }
        }));
    }
    for _ in 0..num_threads / 4 {
        let l = list.clone();
        wait_vec.push(thread::spawn(move || {
            for n in 0..1000 {
                l.write().unwrap().push(n + 2000);
            }
        }));
    }
    for _ in 0..num_threads / 4 {
        let l = list.clone();
        wait_vec.push(thread::spawn(move || {
            for n in 0..1000 {
                let mut guard = l.write().unwrap();
                if let Some(pos) = guard.iter().position(|v| *v == n) {
                    guard.remove(pos);
                }
            }
        }));
    }

    for handle in wait_vec {
        handle.join().unwrap();
    }
}

fn bench_searcher_list_search_heavy(num_threads: usize) {
    let list: SearcherList<u32> = SearcherList::new();
    for i in 0..1000 {
        list.insert(i);
    }

    crossbeam::scope(|scope| {
        for _ in 0..num_threads {
            scope.spawn(|| {
                for _ in 0..1000 {
                    let val = thread_rng().gen_range(0, 2000);
                    list.search(&val);
                }
            });
        }
    });
}

fn bench_rwlock_vec_search_heavy(num_threads: usize) {
    let list: RwLock<Vec<u32>> = RwLock::new((0..1000).collect());

    crossbeam::scope(|scope| {
        for _ in 0..num_threads {
            scope.spawn(|| {
                for _ in 0..1000 {
                    let val = thread_rng().gen_range(0, 2000);
                    list.read().unwrap().iter().any(|v| *v == val);
                }
            });
        }
    });
}

fn bench_list_mixed_low(c: &mut Criterion) {
    c.bench_function("list_mixed_low", |b| b.iter(|| bench_searcher_list_mixed(4)));
}

fn bench_list_mixed_lock_low(c: &mut Criterion) {
    c.bench_function("list_mixed_lock_low", |b| b.iter(|| bench_rwlock_vec_mixed(4)));
}

fn bench_list_mixed_high(c: &mut Criterion) {
    c.bench_function("list_mixed_high", |b| b.iter(|| bench_searcher_list_mixed(16)));
}

fn bench_list_mixed_lock_high(c: &mut Criterion) {
    c.bench_function("list_mixed_lock_high", |b| b.iter(|| bench_rwlock_vec_mixed(16)));
}

fn bench_list_search_heavy(c: &mut Criterion) {
    c.bench_function("list_search_heavy", |b| b.iter(|| bench_searcher_list_search_heavy(8)));
}

fn bench_list_search_heavy_lock(c: &mut Criterion) {
    c.bench_function("list_search_heavy_lock", |b| b.iter(|| bench_rwlock_vec_search_heavy(8)));
}

criterion_group!(benches, bench_list_mixed_high, bench_list_mixed_lock_high,
                 bench_list_search_heavy, bench_list_search_heavy_lock);
criterion_main!(benches);
