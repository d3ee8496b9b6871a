//! Nearest-neighbour identity matching.
//!
//! The default [`LinearScan`] strategy compares the query against every
//! enrolled descriptor, so each login costs O(n) in the enrolled population.
//! There is no index; that ceiling is accepted while populations stay small.
//! A different search can be plugged in through [`NearestNeighbor`] without
//! changing the threshold decision made by [`Matcher`].

use super::Descriptor;
use crate::store::EnrollmentRecord;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Maximum accepted distance. Lower is stricter.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    pub identity: Uuid,
    pub distance: f64,
}

/// A candidate that could not be scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    LengthMismatch {
        identity: Uuid,
        expected: usize,
        found: usize,
    },
}

/// Raw result of one scan, before the threshold is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scan {
    pub nearest: Option<Nearest>,
    pub scored: usize,
    pub anomalies: Vec<Anomaly>,
}

pub trait NearestNeighbor: Send + Sync {
    fn nearest(&self, query: &Descriptor, candidates: &[EnrollmentRecord]) -> Scan;
}

/// Exhaustive scan in candidate order. On exact ties the earlier candidate wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScan;

impl NearestNeighbor for LinearScan {
    fn nearest(&self, query: &Descriptor, candidates: &[EnrollmentRecord]) -> Scan {
        let mut scan = Scan::default();

        for candidate in candidates {
            let distance = match query.distance(&candidate.descriptor) {
                Ok(distance) => distance,
                Err(_) => {
                    warn!(
                        identity = %candidate.identity,
                        expected = query.len(),
                        found = candidate.descriptor.len(),
                        "skipping candidate with mismatched descriptor length"
                    );
                    scan.anomalies.push(Anomaly::LengthMismatch {
                        identity: candidate.identity,
                        expected: query.len(),
                        found: candidate.descriptor.len(),
                    });
                    continue;
                }
            };

            debug!(identity = %candidate.identity, distance, "scored candidate");
            scan.scored += 1;

            // strict `<` keeps the first-seen candidate on ties
            if scan.nearest.map_or(true, |best| distance < best.distance) {
                scan.nearest = Some(Nearest {
                    identity: candidate.identity,
                    distance,
                });
            }
        }

        scan
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Nothing is enrolled at all.
    NotEnrolled,
    /// Candidates exist but none is within the threshold. `best` is `None`
    /// when no candidate could be scored.
    NoMatch { best: Option<Nearest> },
    Matched(Nearest),
}

#[derive(Clone)]
pub struct Matcher {
    threshold: f64,
    strategy: Arc<dyn NearestNeighbor>,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl Matcher {
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            strategy: Arc::new(LinearScan),
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn NearestNeighbor>) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score `query` against `candidates` and apply the threshold
    /// (`distance <= threshold` matches).
    #[must_use]
    pub fn decide(&self, query: &Descriptor, candidates: &[EnrollmentRecord]) -> MatchOutcome {
        if candidates.is_empty() {
            return MatchOutcome::NotEnrolled;
        }

        let scan = self.strategy.nearest(query, candidates);

        info!(
            best_distance = ?scan.nearest.map(|best| best.distance),
            threshold = self.threshold,
            scored = scan.scored,
            anomalies = scan.anomalies.len(),
            "face match scan complete"
        );

        match scan.nearest {
            Some(best) if best.distance <= self.threshold => MatchOutcome::Matched(best),
            best => MatchOutcome::NoMatch { best },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(values: Vec<f64>) -> EnrollmentRecord {
        EnrollmentRecord {
            identity: Uuid::new_v4(),
            descriptor: Descriptor::new(values).unwrap(),
        }
    }

    fn query(values: Vec<f64>) -> Descriptor {
        Descriptor::new(values).unwrap()
    }

    #[test]
    fn empty_population_is_not_enrolled() {
        let outcome = Matcher::default().decide(&query(vec![0.0, 0.0]), &[]);
        assert_eq!(outcome, MatchOutcome::NotEnrolled);
    }

    #[test]
    fn exact_descriptor_matches_with_zero_distance() {
        let other = record(vec![1.0, 1.0, 1.0]);
        let target = record(vec![0.1, 0.2, 0.3]);
        let outcome =
            Matcher::default().decide(&target.descriptor, &[other, target.clone()]);

        assert_eq!(
            outcome,
            MatchOutcome::Matched(Nearest {
                identity: target.identity,
                distance: 0.0
            })
        );
    }

    #[test]
    fn closest_candidate_under_threshold_wins() {
        let near = record(vec![0.3, 0.0]);
        let far = record(vec![0.7, 0.0]);
        let outcome = Matcher::default().decide(&query(vec![0.0, 0.0]), &[far, near.clone()]);

        match outcome {
            MatchOutcome::Matched(best) => {
                assert_eq!(best.identity, near.identity);
                assert!((best.distance - 0.3).abs() < 1e-12);
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn closest_candidate_over_threshold_is_no_match() {
        let candidate = record(vec![0.61, 0.0]);
        let outcome = Matcher::default().decide(&query(vec![0.0, 0.0]), &[candidate.clone()]);

        match outcome {
            MatchOutcome::NoMatch { best: Some(best) } => {
                assert_eq!(best.identity, candidate.identity);
                assert!(best.distance > DEFAULT_MATCH_THRESHOLD);
            }
            other => panic!("expected no match, got {other:?}"),
        }
    }

    #[test]
    fn distance_equal_to_threshold_matches() {
        let candidate = record(vec![0.5]);
        let matcher = Matcher::new(0.5);
        assert!(matches!(
            matcher.decide(&query(vec![0.0]), &[candidate]),
            MatchOutcome::Matched(_)
        ));
    }

    #[test]
    fn ties_resolve_to_first_candidate() {
        let first = record(vec![0.1, 0.0]);
        let second = record(vec![-0.1, 0.0]);
        let scan = LinearScan.nearest(&query(vec![0.0, 0.0]), &[first.clone(), second]);

        assert_eq!(scan.nearest.map(|n| n.identity), Some(first.identity));
    }

    #[test]
    fn mismatched_length_is_skipped_and_recorded() {
        let short = record(vec![0.0]);
        let good = record(vec![0.1, 0.1]);
        let scan = LinearScan.nearest(&query(vec![0.0, 0.0]), &[short.clone(), good.clone()]);

        assert_eq!(scan.scored, 1);
        assert_eq!(scan.nearest.map(|n| n.identity), Some(good.identity));
        assert_eq!(
            scan.anomalies,
            vec![Anomaly::LengthMismatch {
                identity: short.identity,
                expected: 2,
                found: 1
            }]
        );
    }

    #[test]
    fn only_mismatched_candidates_is_no_match() {
        let short = record(vec![0.0]);
        let outcome = Matcher::default().decide(&query(vec![0.0, 0.0]), &[short]);
        assert_eq!(outcome, MatchOutcome::NoMatch { best: None });
    }

    struct AlwaysFirst;

    impl NearestNeighbor for AlwaysFirst {
        fn nearest(&self, _query: &Descriptor, candidates: &[EnrollmentRecord]) -> Scan {
            Scan {
                nearest: candidates.first().map(|c| Nearest {
                    identity: c.identity,
                    distance: 0.0,
                }),
                scored: candidates.len(),
                anomalies: Vec::new(),
            }
        }
    }

    #[test]
    fn custom_strategy_keeps_threshold_decision() {
        let first = record(vec![9.0, 9.0]);
        let matcher = Matcher::default().with_strategy(Arc::new(AlwaysFirst));
        assert_eq!(
            matcher.decide(&query(vec![0.0, 0.0]), &[first.clone()]),
            MatchOutcome::Matched(Nearest {
                identity: first.identity,
                distance: 0.0
            })
        );
    }
}
