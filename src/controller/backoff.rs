//! # Fibonacci Backoff
//!
//! Progressive retry delays for failed reconciliations. The sequence runs
//! `min, min, 2*min, 3*min, 5*min, ...` and stays at `max` once reached.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_secs: u64,
    max_secs: u64,
    previous: u64,
    current: u64,
}

impl FibonacciBackoff {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        let min_secs = min_secs.max(1);
        Self {
            min_secs,
            max_secs: max_secs.max(min_secs),
            previous: 0,
            current: min_secs,
        }
    }

    /// Returns the next delay and advances the sequence.
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let delay = self.current.min(self.max_secs);
        let next = self.previous.saturating_add(self.current);
        self.previous = self.current;
        self.current = next;
        delay
    }

    pub fn reset(&mut self) {
        self.previous = 0;
        self.current = self.min_secs;
    }

    /// Delay for the `error_count`-th consecutive error (0-indexed).
    pub fn calculate_for_error_count(error_count: u32, min_secs: u64, max_secs: u64) -> Duration {
        let mut backoff = Self::new(min_secs, max_secs);
        let mut delay = backoff.next_backoff_seconds();
        for _ in 0..error_count {
            delay = backoff.next_backoff_seconds();
            if delay >= backoff.max_secs {
                break;
            }
        }
        Duration::from_secs(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_fibonacci_and_capped() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        let delays: Vec<u64> = (0..8).map(|_| backoff.next_backoff_seconds()).collect();
        assert_eq!(delays, vec![1, 1, 2, 3, 5, 8, 10, 10]);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut backoff = FibonacciBackoff::new(2, 100);
        backoff.next_backoff_seconds();
        backoff.next_backoff_seconds();
        backoff.next_backoff_seconds();
        backoff.reset();
        assert_eq!(backoff.next_backoff_seconds(), 2);
    }

    #[test]
    fn test_calculate_for_error_count() {
        assert_eq!(FibonacciBackoff::calculate_for_error_count(0, 1, 60), Duration::from_secs(1));
        assert_eq!(FibonacciBackoff::calculate_for_error_count(4, 1, 60), Duration::from_secs(5));
        assert_eq!(FibonacciBackoff::calculate_for_error_count(50, 1, 60), Duration::from_secs(60));
    }
}
