extern crate rayon;

use std::cell::UnsafeCell;
use thread_local::CachedThreadLocal;
use time;

use structures::SearcherList;
use super::op_record::{OpClass, OpRecord};

/// Drives a workload of searches, inserts and removes against a
/// [`SearcherList`] from a pool of threads, then checks the class-exclusion
/// contract against what the list's gauge observed.
///
/// Each worker thread logs its operations into thread-local storage, so the
/// logging itself adds no cross-thread synchronisation that could mask a
/// protocol bug.
pub struct ExclusionTester<T: Send + Sync + PartialEq> {
    num_threads: usize,
    iterations: usize,
    list: SearcherList<T>,
    records: CachedThreadLocal<UnsafeCell<Vec<OpRecord>>>
}

/// Per-worker view handed to the workload closure. Operations performed
/// through the handle are timed and recorded.
pub struct WorkloadHandle<'a, T: 'a + Send + Sync + PartialEq> {
    list: &'a SearcherList<T>,
    iterations: usize,
    records: &'a CachedThreadLocal<UnsafeCell<Vec<OpRecord>>>
}

/// Aggregate view of one tester run.
#[derive(Debug)]
pub struct ExclusionReport {
    pub searches: usize,
    pub inserts: usize,
    pub removes: usize,
    pub search_hits: usize,
    pub remove_hits: usize,
    pub longest_remove_ns: u64,
    pub peak_searchers: usize,
    pub overlapped_inserts: usize,
    pub violations: usize
}

#[derive(Debug)]
pub enum ExclusionResult {
    Success,
    Violation(usize)
}

impl ExclusionReport {
    pub fn result(&self) -> ExclusionResult {
        if self.violations == 0 {
            ExclusionResult::Success
        } else {
            ExclusionResult::Violation(self.violations)
        }
    }
}

impl<T: Send + Sync + PartialEq> ExclusionTester<T> {
    pub fn new(num_threads: usize, iterations: usize, list: SearcherList<T>) -> Self {
        ExclusionTester {
            num_threads,
            iterations,
            list,
            records: CachedThreadLocal::new()
        }
    }

    /// Run `worker` once per pool thread and aggregate the results. The
    /// worker decides its own operation mix; `handle.iterations()` tells it
    /// how many operations the tester was configured for.
    pub fn run<F>(&mut self, worker: F) -> ExclusionReport
        where F: Fn(usize, &WorkloadHandle<T>) + Sync
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .unwrap();

        {
            let list = &self.list;
            let records = &self.records;
            let iterations = self.iterations;
            let worker = &worker;
            let num_threads = self.num_threads;
            pool.install(|| {
                rayon::scope(|scope| {
                    for id in 0..num_threads {
                        scope.spawn(move |_| {
                            let handle = WorkloadHandle {
                                list,
                                iterations,
                                records
                            };
                            worker(id, &handle);
                        });
                    }
                });
            });
        }

        self.report()
    }

    /// The list under test, for follow-up assertions after a run.
    pub fn list(&self) -> &SearcherList<T> {
        &self.list
    }

    fn report(&mut self) -> ExclusionReport {
        let mut all: Vec<OpRecord> = Vec::new();
        for cell in self.records.iter_mut() {
            let records = unsafe { &mut *cell.get() };
            all.append(records);
        }
        all.sort();

        let mut report = ExclusionReport {
            searches: 0,
            inserts: 0,
            removes: 0,
            search_hits: 0,
            remove_hits: 0,
            longest_remove_ns: 0,
            peak_searchers: self.list.gauge().peak_searchers(),
            overlapped_inserts: self.list.gauge().overlapped_inserts(),
            violations: self.list.gauge().violations()
        };

        for record in &all {
            match record.class {
                OpClass::Search => {
                    report.searches += 1;
                    if record.hit {
                        report.search_hits += 1;
                    }
                },
                OpClass::Insert => {
                    report.inserts += 1;
                },
                OpClass::Remove => {
                    report.removes += 1;
                    if record.hit {
                        report.remove_hits += 1;
                    }
                    if record.elapsed_ns() > report.longest_remove_ns {
                        report.longest_remove_ns = record.elapsed_ns();
                    }
                }
            }
        }

        report
    }
}

impl<'a, T: 'a + Send + Sync + PartialEq> WorkloadHandle<'a, T> {
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn search(&self, item: &T) -> bool {
        let invoked_ns = time::precise_time_ns();
        let hit = self.list.search(item);
        self.record(OpClass::Search, invoked_ns, hit);
        hit
    }

    pub fn insert(&self, item: T) {
        let invoked_ns = time::precise_time_ns();
        self.list.insert(item);
        self.record(OpClass::Insert, invoked_ns, true);
    }

    pub fn remove(&self, item: &T) -> bool {
        let invoked_ns = time::precise_time_ns();
        let hit = self.list.remove(item);
        self.record(OpClass::Remove, invoked_ns, hit);
        hit
    }

    fn record(&self, class: OpClass, invoked_ns: u64, hit: bool) {
        let cell = self.records.get_or(|| Box::new(UnsafeCell::new(Vec::new())));
        unsafe {
            (*cell.get()).push(OpRecord {
                class,
                invoked_ns,
                returned_ns: time::precise_time_ns(),
                hit
            });
        }
    }
}

mod tests {
    #![allow(unused_imports)]
    use super::{ExclusionResult, ExclusionTester};
    use structures::SearcherList;
    use rand::{thread_rng, Rng};

    #[test]
    fn test_mixed_workload_respects_exclusion() {
        let list: SearcherList<usize> = SearcherList::new();
        let mut tester: ExclusionTester<usize> = ExclusionTester::new(8, 2000, list);

        let report = tester.run(|id, handle| {
            for i in 0..handle.iterations() {
                let rand = thread_rng().gen_range(0, 101);
                if rand < 30 {
                    handle.insert(id * 100_000 + i);
                } else if rand < 85 {
                    let val = thread_rng().gen_range(0, 100_000);
                    handle.search(&val);
                } else {
                    let val = thread_rng().gen_range(0, 100_000);
                    handle.remove(&val);
                }
            }
        });

        println!("{:?}", report);

        assert_eq!(report.searches + report.inserts + report.removes, 8 * 2000);
        match report.result() {
            ExclusionResult::Success => assert!(true),
            _ => assert!(false)
        }
    }

    #[test]
    fn test_report_reflects_results() {
        let list: SearcherList<usize> = SearcherList::new();
        list.insert(1);
        list.insert(2);
        let mut tester: ExclusionTester<usize> = ExclusionTester::new(2, 1, list);

        let report = tester.run(|id, handle| {
            if id == 0 {
                handle.search(&1);
            } else {
                handle.remove(&7);
            }
        });

        assert_eq!(report.searches, 1);
        assert_eq!(report.search_hits, 1);
        assert_eq!(report.removes, 1);
        assert_eq!(report.remove_hits, 0);
        assert!(tester.list().search(&2));
    }
}
