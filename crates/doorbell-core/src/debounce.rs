//! Sensor debouncing policy.
//!
//! A reed switch chatters while the door moves. The [`Debouncer`] only
//! reports a reading once it has been seen on `threshold` consecutive ticks,
//! and reports each confirmed value once until a different value is
//! confirmed.
//!
//! By default nothing has been reported yet, so the first confirmed value is
//! always emitted. [`Debouncer::seeded`] starts from a known value instead,
//! so confirming that value again emits nothing.
//!
//! The policy is pure: it never reads the sensor or sleeps. A failed read is
//! represented by not calling [`Debouncer::observe`] for that tick, which
//! leaves the counters untouched.

/// Counts consecutive identical samples and emits confirmed transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    threshold: u32,
    candidate: Option<bool>,
    match_count: u32,
    last_reported: Option<bool>,
}

impl Debouncer {
    /// Create a debouncer requiring `threshold` matching samples.
    ///
    /// A threshold of zero is treated as one.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            candidate: None,
            match_count: 0,
            last_reported: None,
        }
    }

    /// Treat `stable` as already reported.
    ///
    /// Only a confirmed value different from `stable` is emitted.
    #[must_use]
    pub const fn seeded(mut self, stable: bool) -> Self {
        self.last_reported = Some(stable);
        self
    }

    /// Feed one sample (`true` = locked).
    ///
    /// Returns `Some(value)` exactly on the tick a value different from the
    /// last reported one reaches the threshold. Unless seeded, the first
    /// confirmed value after construction is always reported.
    pub fn observe(&mut self, sample: bool) -> Option<bool> {
        if self.candidate == Some(sample) {
            self.match_count = self.match_count.saturating_add(1);
        } else {
            self.candidate = Some(sample);
            self.match_count = 1;
        }

        if self.match_count >= self.threshold && self.last_reported != Some(sample) {
            self.last_reported = Some(sample);
            return Some(sample);
        }
        None
    }

    /// Samples required to confirm a value.
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// The value currently being counted.
    pub const fn candidate(&self) -> Option<bool> {
        self.candidate
    }

    /// Consecutive ticks the candidate has been seen.
    pub const fn match_count(&self) -> u32 {
        self.match_count
    }

    /// The last value emitted, if any.
    pub const fn last_reported(&self) -> Option<bool> {
        self.last_reported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: bool = true;
    const B: bool = false;

    fn emissions(threshold: u32, samples: &[bool]) -> Vec<(usize, bool)> {
        let mut debouncer = Debouncer::new(threshold);
        samples
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| debouncer.observe(s).map(|v| (i, v)))
            .collect()
    }

    #[test]
    fn glitch_restarts_the_count() {
        assert_eq!(emissions(3, &[A, A, B, A, A, A]), vec![(5, A)]);
    }

    #[test]
    fn no_duplicate_emission_while_stable() {
        assert_eq!(emissions(2, &[A, A, A, A, A, A]), vec![(1, A)]);
    }

    #[test]
    fn each_confirmed_change_is_emitted_once() {
        assert_eq!(
            emissions(2, &[A, A, B, B, B, A, A]),
            vec![(1, A), (3, B), (6, A)]
        );
    }

    #[test]
    fn unconfirmed_flicker_emits_nothing() {
        assert!(emissions(3, &[A, B, A, B, A, B]).is_empty());
    }

    #[test]
    fn returning_to_reported_value_is_silent() {
        // A is reported, B never reaches the threshold, A again is not new.
        assert_eq!(emissions(3, &[A, A, A, B, B, A, A, A]), vec![(2, A)]);
    }

    #[test]
    fn zero_threshold_behaves_like_one() {
        let debouncer = Debouncer::new(0);
        assert_eq!(debouncer.threshold(), 1);
        assert_eq!(emissions(0, &[B, A]), vec![(0, B), (1, A)]);
    }

    #[test]
    fn seeded_value_is_not_reported_again() {
        let mut debouncer = Debouncer::new(2).seeded(A);
        assert_eq!(debouncer.last_reported(), Some(A));
        assert_eq!(debouncer.observe(A), None);
        assert_eq!(debouncer.observe(A), None);
        assert_eq!(debouncer.observe(A), None);
        assert_eq!(debouncer.observe(B), None);
        assert_eq!(debouncer.observe(B), Some(B));
    }

    #[test]
    fn skipped_tick_leaves_counters_untouched() {
        let mut debouncer = Debouncer::new(3);
        assert_eq!(debouncer.observe(A), None);
        assert_eq!(debouncer.observe(A), None);
        // A failed read simply does not call observe.
        assert_eq!(debouncer.match_count(), 2);
        assert_eq!(debouncer.candidate(), Some(A));
        assert_eq!(debouncer.observe(A), Some(A));
        assert_eq!(debouncer.last_reported(), Some(A));
    }
}
