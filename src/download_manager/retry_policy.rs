//! Retry policy for failed queue items.
//!
//! A failed item is not retried on the same candidate. It switches to one of
//! its untried alternatives, preferring the one whose duration is closest to
//! the primary candidate's.

use crate::config::QueueSettings;

use super::models::QueueItem;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of alternative switches before permanent failure.
    pub max_retries: u32,
    /// Duration distance under which the closest alternative is accepted.
    pub duration_tolerance_secs: f64,
}

impl RetryPolicy {
    pub fn new(settings: &QueueSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            duration_tolerance_secs: settings.duration_tolerance_secs,
        }
    }

    /// Check if a failed item may switch to another alternative.
    pub fn should_retry(&self, item: &QueueItem) -> bool {
        item.retry_count < self.max_retries && item.has_untried_alternatives()
    }

    /// Absolute index of the alternative to try next, if any remain.
    ///
    /// The closest duration match wins when it is within tolerance. Otherwise,
    /// or when durations are unknown, the next untried alternative in order is
    /// used.
    pub fn select_alternative(&self, item: &QueueItem) -> Option<usize> {
        let start = item.current_alternative_index;
        let untried = item.untried_alternatives();
        if untried.is_empty() {
            return None;
        }

        let closest = item.primary_candidate.duration_seconds.and_then(|target| {
            untried
                .iter()
                .enumerate()
                .filter_map(|(i, c)| c.duration_seconds.map(|d| (i, (d - target).abs())))
                .fold(None, |best: Option<(usize, f64)>, (i, diff)| match best {
                    Some((_, best_diff)) if best_diff <= diff => best,
                    _ => Some((i, diff)),
                })
        });

        match closest {
            Some((offset, diff)) if diff <= self.duration_tolerance_secs => Some(start + offset),
            _ => Some(start),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            duration_tolerance_secs: 30.0,
        }
    }
}
