// SPDX-License-Identifier: MIT

//! Listening-port bookkeeping for static and dynamic instances.

use numdrassl_config::PortAllocation;
use parking_lot::Mutex;
use std::collections::BTreeSet;

/// Single taken-set over two declared ranges.
///
/// A port stays taken from acquisition until explicit release, even if
/// the acquiring transaction later fails; releasing is the
/// transaction's responsibility.
#[derive(Debug)]
pub struct PortAllocator {
    taken: Mutex<BTreeSet<u16>>,
    static_range: (u16, u16),
    dynamic_range: (u16, u16),
}

impl PortAllocator {
    pub fn new(ranges: &PortAllocation) -> Self {
        Self {
            taken: Mutex::new(BTreeSet::new()),
            static_range: (ranges.static_range_start, ranges.static_range_end),
            dynamic_range: (ranges.dynamic_range_start, ranges.dynamic_range_end),
        }
    }

    pub fn static_range(&self) -> (u16, u16) {
        self.static_range
    }

    pub fn dynamic_range(&self) -> (u16, u16) {
        self.dynamic_range
    }

    /// Take the smallest free port in `[lo, hi]`, atomically.
    pub fn acquire_in_range(&self, lo: u16, hi: u16) -> Option<u16> {
        let mut taken = self.taken.lock();
        let port = (lo..=hi).find(|port| !taken.contains(port))?;
        taken.insert(port);
        Some(port)
    }

    /// Take a fixed port; false when already taken.
    pub fn acquire_specific(&self, port: u16) -> bool {
        self.taken.lock().insert(port)
    }

    /// Idempotent.
    pub fn release(&self, port: u16) {
        self.taken.lock().remove(&port);
    }

    pub fn is_taken(&self, port: u16) -> bool {
        self.taken.lock().contains(&port)
    }

    /// Free ports remaining in `[lo, hi]`.
    pub fn available_in_range(&self, lo: u16, hi: u16) -> u32 {
        let taken = self.taken.lock();
        (lo..=hi).filter(|port| !taken.contains(port)).count() as u32
    }

    pub fn taken_count(&self) -> usize {
        self.taken.lock().len()
    }
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
