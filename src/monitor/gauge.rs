use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts the threads of each class currently inside the list phase of an
/// operation, outside the coordination lock.
///
/// The gauge is the runtime check on the admission protocol: every entry
/// point records how many threads of the other classes it found already in
/// the list, and any combination the protocol forbids bumps the violation
/// counter. A correct execution always reads zero violations, however the
/// operations interleave.
#[derive(Debug, Default)]
pub struct ActivityGauge {
    searchers: AtomicUsize,
    inserters: AtomicUsize,
    removers: AtomicUsize,
    peak_searchers: AtomicUsize,
    overlapped_inserts: AtomicUsize,
    violations: AtomicUsize
}

impl ActivityGauge {
    pub fn new() -> Self {
        ActivityGauge::default()
    }

    pub fn enter_search(&self) {
        let now = self.searchers.fetch_add(1, Ordering::SeqCst) + 1;
        self.track_peak(now);
        if self.removers.load(Ordering::SeqCst) > 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn exit_search(&self) {
        self.searchers.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn enter_insert(&self) {
        if self.inserters.fetch_add(1, Ordering::SeqCst) > 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        if self.removers.load(Ordering::SeqCst) > 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        if self.searchers.load(Ordering::SeqCst) > 0 {
            // Legal, and the interesting part of the design: an insert
            // running alongside live searchers.
            self.overlapped_inserts.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn exit_insert(&self) {
        self.inserters.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn enter_remove(&self) {
        if self.removers.fetch_add(1, Ordering::SeqCst) > 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        if self.searchers.load(Ordering::SeqCst) > 0
                || self.inserters.load(Ordering::SeqCst) > 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn exit_remove(&self) {
        self.removers.fetch_sub(1, Ordering::SeqCst);
    }

    /// High-water mark of concurrently active searchers.
    pub fn peak_searchers(&self) -> usize {
        self.peak_searchers.load(Ordering::SeqCst)
    }

    /// How many inserts ran while at least one searcher was active.
    pub fn overlapped_inserts(&self) -> usize {
        self.overlapped_inserts.load(Ordering::SeqCst)
    }

    /// Observed breaches of the class-exclusion contract. Always zero for
    /// a correct admission protocol.
    pub fn violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    fn track_peak(&self, seen: usize) {
        let mut current = self.peak_searchers.load(Ordering::Relaxed);
        while seen > current {
            match self.peak_searchers.compare_exchange(current, seen,
                                                       Ordering::Relaxed,
                                                       Ordering::Relaxed) {
                Ok(_) => break,
                Err(actual) => current = actual
            }
        }
    }
}

mod tests {
    #![allow(unused_imports)]
    use super::ActivityGauge;

    #[test]
    fn test_counts_and_peak() {
        let gauge = ActivityGauge::new();
        gauge.enter_search();
        gauge.enter_search();
        gauge.enter_search();
        gauge.exit_search();
        gauge.enter_search();
        assert_eq!(gauge.peak_searchers(), 3);
        assert_eq!(gauge.violations(), 0);
    }

    #[test]
    fn test_insert_overlap_is_legal() {
        let gauge = ActivityGauge::new();
        gauge.enter_search();
        gauge.enter_insert();
        assert_eq!(gauge.overlapped_inserts(), 1);
        assert_eq!(gauge.violations(), 0);
        gauge.exit_insert();
        gauge.exit_search();
    }

    #[test]
    fn test_forbidden_overlaps_are_flagged() {
        let gauge = ActivityGauge::new();
        gauge.enter_insert();
        gauge.enter_insert();
        assert_eq!(gauge.violations(), 1);
        gauge.exit_insert();

        gauge.enter_remove();
        // An inserter is still inside, so the remover entry is flagged too.
        assert_eq!(gauge.violations(), 2);
        gauge.enter_search();
        assert_eq!(gauge.violations(), 3);
    }
}
