#![allow(dead_code)]
//! A condition-synchronised concurrent searcher list for Rust.
//!
//! This crate provides a singly-linked list shared by three classes of
//! threads with different exclusion needs: any number of searchers traverse
//! it together, one inserter may prepend concurrently with the searchers,
//! and removers run alone. The admission protocol hands the list over
//! between the classes without starving any of them, and the crate ships
//! the instrumentation and workload tooling to check that claim against
//! real executions.

extern crate time;
extern crate rand;
extern crate thread_local;

pub mod structures;
pub mod monitor;
pub mod testing;

mod tests {

}
