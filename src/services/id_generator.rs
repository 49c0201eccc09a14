use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

pub trait IdGenerator: Send + Sync {
    fn next_id(&self, prefix: &str) -> String;
}

/// Millisecond timestamp plus a process-wide sequence, so two ids minted in
/// the same millisecond still differ.
#[derive(Default)]
pub struct TimeBasedIdGenerator {
    sequence: AtomicU64,
}

impl TimeBasedIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for TimeBasedIdGenerator {
    fn next_id(&self, prefix: &str) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), sequence)
    }
}

/// Deterministic ids (`prefix-1`, `prefix-2`, ...).
#[derive(Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, prefix: &str) -> String {
        let value = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", prefix, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_time_based_ids_never_collide_in_a_burst() {
        let generator = TimeBasedIdGenerator::new();
        let ids: HashSet<String> = (0..1000).map(|_| generator.next_id("custom")).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_sequential_ids_are_predictable() {
        let generator = SequentialIdGenerator::new();
        assert_eq!(generator.next_id("entry"), "entry-1");
        assert_eq!(generator.next_id("entry"), "entry-2");
    }
}
