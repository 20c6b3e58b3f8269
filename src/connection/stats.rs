//! I/O statistics

use std::iter::Sum;
use std::ops::Add;

/// Cumulative I/O statistics for a connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Stats {
    /// Read and write calls made on the socket
    pub syscalls: u64,
}

impl Stats {
    /// Field-by-field sum
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: Stats) -> Stats {
        Stats {
            syscalls: self.syscalls + other.syscalls,
        }
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(self, other: Stats) -> Stats {
        Stats::add(self, other)
    }
}

impl Sum for Stats {
    fn sum<I: Iterator<Item = Stats>>(iter: I) -> Stats {
        iter.fold(Stats::default(), Stats::add)
    }
}
