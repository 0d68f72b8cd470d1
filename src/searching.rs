use std::time::Duration;
use crate::clock::{StepClock, WaitOutcome};
use crate::core::Error;

/// Event surface for the array-search animators. Much smaller than the
/// engine's: one probe per visited index, then a terminal signal.
pub trait ProbeObserver {
    fn on_probe(&mut self, index: usize, value: i64, step: usize) {
        let _ = (index, value, step);
    }
    fn on_found(&mut self, index: usize, probes: usize) {
        let _ = (index, probes);
    }
    fn on_missing(&mut self, probes: usize) {
        let _ = probes;
    }
    fn on_cancelled(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found { index: usize, probes: usize },
    Missing { probes: usize },
    Cancelled { probes: usize },
}

/// Passive probe counters, the searching twin of SearchStats.
#[derive(Debug, Default)]
pub struct ProbeStats {
    probes: usize,
    outcome: Option<ProbeOutcome>,
}

impl ProbeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probes(&self) -> usize {
        self.probes
    }

    pub fn outcome(&self) -> Option<ProbeOutcome> {
        self.outcome
    }

    pub fn reset(&mut self) {
        self.probes = 0;
        self.outcome = None;
    }
}

impl ProbeObserver for ProbeStats {
    fn on_probe(&mut self, _index: usize, _value: i64, step: usize) {
        self.probes = step;
    }
    fn on_found(&mut self, index: usize, probes: usize) {
        self.outcome = Some(ProbeOutcome::Found { index, probes });
    }
    fn on_missing(&mut self, probes: usize) {
        self.outcome = Some(ProbeOutcome::Missing { probes });
    }
    fn on_cancelled(&mut self) {
        self.outcome = Some(ProbeOutcome::Cancelled {
            probes: self.probes,
        });
    }
}

/// Front-to-back scan. Emits a probe, pauses on the clock, then compares --
/// the same announce/wait/decide rhythm as the engine, minus backtracking.
pub struct LinearScan<'a> {
    items: &'a [i64],
    target: i64,
}

impl<'a> LinearScan<'a> {
    pub fn new(items: &'a [i64], target: i64) -> Self {
        LinearScan { items, target }
    }

    pub fn run(
        &self,
        clock: &StepClock,
        delay: Duration,
        observer: &mut dyn ProbeObserver,
    ) -> ProbeOutcome {
        let mut probes = 0;
        for (i, &v) in self.items.iter().enumerate() {
            probes += 1;
            observer.on_probe(i, v, probes);
            if let WaitOutcome::Cancelled = clock.wait(delay) {
                observer.on_cancelled();
                return ProbeOutcome::Cancelled { probes };
            }
            if v == self.target {
                observer.on_found(i, probes);
                return ProbeOutcome::Found { index: i, probes };
            }
        }
        observer.on_missing(probes);
        ProbeOutcome::Missing { probes }
    }
}

/// Halving search over a sorted slice, probing mid = (lo + hi) / 2 with
/// inclusive bounds. Construction fails on unsorted input rather than
/// letting the search report nonsense.
pub struct BinaryChop<'a> {
    items: &'a [i64],
    target: i64,
}

impl<'a> BinaryChop<'a> {
    pub fn new(items: &'a [i64], target: i64) -> Result<Self, Error> {
        if items.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::new_const("Binary search requires a sorted slice"));
        }
        Ok(BinaryChop { items, target })
    }

    pub fn run(
        &self,
        clock: &StepClock,
        delay: Duration,
        observer: &mut dyn ProbeObserver,
    ) -> ProbeOutcome {
        let mut probes = 0;
        if !self.items.is_empty() {
            let mut lo = 0usize;
            let mut hi = self.items.len() - 1;
            while lo <= hi {
                let mid = (lo + hi) / 2;
                let v = self.items[mid];
                probes += 1;
                observer.on_probe(mid, v, probes);
                if let WaitOutcome::Cancelled = clock.wait(delay) {
                    observer.on_cancelled();
                    return ProbeOutcome::Cancelled { probes };
                }
                if v == self.target {
                    observer.on_found(mid, probes);
                    return ProbeOutcome::Found { index: mid, probes };
                } else if v < self.target {
                    lo = mid + 1;
                } else {
                    if mid == 0 {
                        break;
                    }
                    hi = mid - 1;
                }
            }
        }
        observer.on_missing(probes);
        ProbeOutcome::Missing { probes }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::CancelToken;

    struct Trace {
        visits: Vec<(usize, i64)>,
        cancel_after: Option<(usize, CancelToken)>,
    }

    impl Trace {
        fn new() -> Self {
            Trace {
                visits: Vec::new(),
                cancel_after: None,
            }
        }
    }

    impl ProbeObserver for Trace {
        fn on_probe(&mut self, index: usize, value: i64, step: usize) {
            self.visits.push((index, value));
            if let Some((n, token)) = &self.cancel_after {
                if step >= *n {
                    token.cancel();
                }
            }
        }
    }

    #[test]
    fn test_linear_scan_visits_in_order() {
        let clock = StepClock::new();
        let mut trace = Trace::new();
        let outcome = LinearScan::new(&[2, 7, 11, 15], 7).run(&clock, Duration::ZERO, &mut trace);
        assert_eq!(
            outcome,
            ProbeOutcome::Found {
                index: 1,
                probes: 2
            }
        );
        assert_eq!(trace.visits, vec![(0, 2), (1, 7)]);
    }

    #[test]
    fn test_linear_scan_missing() {
        let clock = StepClock::new();
        let mut stats = ProbeStats::new();
        let outcome = LinearScan::new(&[2, 7, 11, 15], 9).run(&clock, Duration::ZERO, &mut stats);
        assert_eq!(outcome, ProbeOutcome::Missing { probes: 4 });
        assert_eq!(stats.outcome(), Some(outcome));
        assert_eq!(stats.probes(), 4);
    }

    #[test]
    fn test_binary_chop_two_probes() {
        let clock = StepClock::new();
        let mut trace = Trace::new();
        let chop = BinaryChop::new(&[-1, 0, 3, 5, 9, 12], 9).unwrap();
        let outcome = chop.run(&clock, Duration::ZERO, &mut trace);
        assert_eq!(
            outcome,
            ProbeOutcome::Found {
                index: 4,
                probes: 2
            }
        );
        // First probe lands mid at value 3 and goes right; second finds 9.
        assert_eq!(trace.visits, vec![(2, 3), (4, 9)]);
    }

    #[test]
    fn test_binary_chop_missing_and_edges() {
        let clock = StepClock::new();
        let chop = BinaryChop::new(&[-1, 0, 3, 5, 9, 12], 2).unwrap();
        let mut stats = ProbeStats::new();
        assert!(matches!(
            chop.run(&clock, Duration::ZERO, &mut stats),
            ProbeOutcome::Missing { .. }
        ));
        let chop = BinaryChop::new(&[3], -10).unwrap();
        assert!(matches!(
            chop.run(&clock, Duration::ZERO, &mut ProbeStats::new()),
            ProbeOutcome::Missing { probes: 1 }
        ));
        let chop = BinaryChop::new(&[], 1).unwrap();
        assert!(matches!(
            chop.run(&clock, Duration::ZERO, &mut ProbeStats::new()),
            ProbeOutcome::Missing { probes: 0 }
        ));
    }

    #[test]
    fn test_binary_chop_rejects_unsorted() {
        assert!(BinaryChop::new(&[3, 1, 2], 2).is_err());
    }

    #[test]
    fn test_cancellation_stops_probing() {
        let clock = StepClock::new();
        let mut trace = Trace::new();
        trace.cancel_after = Some((2, clock.token()));
        let outcome = LinearScan::new(&[1, 2, 3, 4, 5], 99).run(&clock, Duration::ZERO, &mut trace);
        assert_eq!(outcome, ProbeOutcome::Cancelled { probes: 2 });
        assert_eq!(trace.visits.len(), 2, "no probe after cancellation");
    }
}
