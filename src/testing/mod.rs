//! Utilities for checking the class-exclusion contract of the searcher
//! list under concurrent load. This should be done by using the
//! `ExclusionTester`, which drives a caller-supplied workload from a
//! thread pool and reads the list's activity gauge afterwards.
//!
//! # Example
//! This runs a small mixed workload over four threads and asserts that no
//! forbidden overlap between operation classes was ever observed.
//! ```
//! use searchlist::structures::SearcherList;
//! use searchlist::testing::{ExclusionResult, ExclusionTester};
//!
//! let list: SearcherList<usize> = SearcherList::new();
//! let mut tester: ExclusionTester<usize> = ExclusionTester::new(4, 100, list);
//!
//! let report = tester.run(|id, handle| {
//!     for i in 0..handle.iterations() {
//!         if i % 3 == 0 {
//!             handle.insert(id * 1000 + i);
//!         } else if i % 3 == 1 {
//!             handle.search(&(id * 1000 + i - 1));
//!         } else {
//!             handle.remove(&(id * 1000 + i - 2));
//!         }
//!     }
//! });
//!
//! match report.result() {
//!     ExclusionResult::Success => {},
//!     ExclusionResult::Violation(count) => panic!("{} violations", count)
//! }
//! ```

pub use self::exclusion_tester::{ExclusionReport, ExclusionResult, ExclusionTester, WorkloadHandle};
pub use self::op_record::{OpClass, OpRecord};

pub mod exclusion_tester;
mod op_record;
