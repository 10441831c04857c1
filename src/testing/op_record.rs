use std::cmp::Ordering;

/// The three operation classes the admission protocol arbitrates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpClass {
    Search,
    Insert,
    Remove
}

/// One completed operation, stamped with wall-clock nanoseconds at
/// invocation and return. The elapsed time of a remove includes its wait
/// for admission, which makes it the starvation metric for the class.
#[derive(Debug)]
pub struct OpRecord {
    pub class: OpClass,
    pub invoked_ns: u64,
    pub returned_ns: u64,
    pub hit: bool
}

impl OpRecord {
    pub fn elapsed_ns(&self) -> u64 {
        self.returned_ns - self.invoked_ns
    }
}

impl Ord for OpRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.invoked_ns.cmp(&other.invoked_ns)
    }
}

impl PartialOrd for OpRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.invoked_ns.partial_cmp(&other.invoked_ns)
    }
}

impl PartialEq for OpRecord {
    fn eq(&self, other: &Self) -> bool {
        self.invoked_ns == other.invoked_ns
    }
}

impl Eq for OpRecord {}
