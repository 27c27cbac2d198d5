//! Rolling admission window for the coincidence filter.
//!
//! The scheduler commits events one step ahead of the admission decision:
//! a candidate is judged only once the event after it is known, so both a
//! backward and a forward neighbor are on hand. The window is a small value
//! object; `advance` consumes the current state and returns the next one
//! together with the verdict for the candidate that just rolled out.

use contracts::{CutConfig, Position};
use nalgebra::Vector3;

/// One scheduled event awaiting its admission decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Global clock value the event was scheduled at (seconds).
    pub time: f64,
    /// Index of the owning stream within the engine.
    pub stream: usize,
    /// Source file the payload will be fetched from.
    pub file_index: usize,
    /// Event index within that file.
    pub evt_index: usize,
    /// Sampled position used for the proximity cut.
    pub position: Position,
    /// Whether the coincidence cut applies (single-class streams only).
    pub single: bool,
}

/// A candidate that passed the filter, ready for the admission table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmittedEvent {
    pub time: f64,
    pub stream: usize,
    pub file_index: usize,
    pub evt_index: usize,
}

/// Three-deep rolling state: the pending candidate plus the time and
/// position of the candidate judged one step earlier.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionWindow {
    pending: Option<Candidate>,
    prev_time: Option<f64>,
    prev_pos: Option<Position>,
}

impl AdmissionWindow {
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Commit `chosen` and judge the previously pending candidate.
    ///
    /// The pending candidate is admitted when it sits inside both cut
    /// windows of at least one neighbor, or unconditionally when its
    /// stream is multi-class. The very first candidate of a run has no
    /// backward neighbor and the last one is never judged at all; both
    /// edge effects follow from the one-step lag of the scheduler.
    pub fn advance(self, chosen: Candidate, cuts: &CutConfig) -> (Self, Option<AdmittedEvent>) {
        let verdict = self.pending.and_then(|pending| {
            self.qualifies(&pending, &chosen, cuts).then(|| AdmittedEvent {
                time: pending.time,
                stream: pending.stream,
                file_index: pending.file_index,
                evt_index: pending.evt_index,
            })
        });

        // The judged candidate becomes the backward neighbor whether or
        // not it was admitted.
        let next = Self {
            pending: Some(chosen),
            prev_time: self.pending.map(|p| p.time),
            prev_pos: self.pending.map(|p| p.position),
        };
        (next, verdict)
    }

    fn qualifies(&self, pending: &Candidate, chosen: &Candidate, cuts: &CutConfig) -> bool {
        if !pending.single {
            return true;
        }

        let backward = match (self.prev_time, self.prev_pos) {
            (Some(prev_time), Some(prev_pos)) => {
                let lookback = pending.time - prev_time;
                lookback < cuts.time_window
                    && euclidean_distance(pending.position, prev_pos) < cuts.pos_window
            }
            _ => false,
        };

        let lookforward = chosen.time - pending.time;
        let forward = lookforward < cuts.time_window
            && euclidean_distance(pending.position, chosen.position) < cuts.pos_window;

        backward || forward
    }
}

/// Straight-line distance between two sampled positions.
pub fn euclidean_distance(a: Position, b: Position) -> f64 {
    (Vector3::new(a.x, a.y, a.z) - Vector3::new(b.x, b.y, b.z)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cuts(time_window: f64, pos_window: f64) -> CutConfig {
        CutConfig {
            time_window,
            pos_window,
        }
    }

    fn candidate(time: f64, x: f64, single: bool) -> Candidate {
        Candidate {
            time,
            stream: 0,
            file_index: 0,
            evt_index: 0,
            position: Position::new(x, 0.0, 0.0),
            single,
        }
    }

    #[test]
    fn first_candidate_produces_no_verdict() {
        let window = AdmissionWindow::default();
        assert!(!window.has_pending());

        let (window, verdict) = window.advance(candidate(1.0, 0.0, true), &cuts(50.0, 100.0));
        assert!(verdict.is_none());
        assert!(window.has_pending());
    }

    #[test]
    fn forward_neighbor_admits_inside_both_windows() {
        let c = cuts(50.0, 100.0);
        let (window, _) = AdmissionWindow::default().advance(candidate(10.0, 0.0, true), &c);
        let (_, verdict) = window.advance(candidate(20.0, 30.0, true), &c);

        let admitted = verdict.unwrap();
        assert_eq!(admitted.time, 10.0);
    }

    #[test]
    fn backward_neighbor_admits_inside_both_windows() {
        let c = cuts(50.0, 100.0);
        let (window, _) = AdmissionWindow::default().advance(candidate(10.0, 0.0, true), &c);
        let (window, _) = window.advance(candidate(20.0, 10.0, true), &c);

        // Forward neighbor is far away in both time and space; only the
        // backward leg can admit the candidate at t=20.
        let (_, verdict) = window.advance(candidate(1000.0, 5000.0, true), &c);
        let admitted = verdict.unwrap();
        assert_eq!(admitted.time, 20.0);
    }

    #[test]
    fn isolated_candidate_is_discarded() {
        let c = cuts(50.0, 100.0);
        let (window, _) = AdmissionWindow::default().advance(candidate(0.0, 0.0, true), &c);
        let (window, _) = window.advance(candidate(500.0, 0.0, true), &c);

        // Positions coincide, but both temporal gaps exceed the window.
        let (_, verdict) = window.advance(candidate(1000.0, 0.0, true), &c);
        assert!(verdict.is_none());
    }

    #[test]
    fn multi_class_bypasses_the_cut() {
        let c = cuts(50.0, 100.0);
        let (window, _) = AdmissionWindow::default().advance(candidate(0.0, 0.0, false), &c);
        let (window, verdict) = window.advance(candidate(500.0, 9000.0, false), &c);
        assert!(verdict.is_some());

        let (_, verdict) = window.advance(candidate(1000.0, 0.0, false), &c);
        assert_eq!(verdict.unwrap().time, 500.0);
    }

    #[test]
    fn time_window_boundary_is_exclusive() {
        let c = cuts(50.0, 100.0);

        let (window, _) = AdmissionWindow::default().advance(candidate(0.0, 0.0, true), &c);
        let (_, verdict) = window.advance(candidate(50.0, 0.0, true), &c);
        assert!(verdict.is_none(), "a gap equal to the window must not admit");

        let (window, _) = AdmissionWindow::default().advance(candidate(0.0, 0.0, true), &c);
        let (_, verdict) = window.advance(candidate(49.9, 0.0, true), &c);
        assert!(verdict.is_some());
    }

    #[test]
    fn proximity_gate_applies_with_the_time_gate() {
        let c = cuts(50.0, 100.0);
        let (window, _) = AdmissionWindow::default().advance(candidate(0.0, 0.0, true), &c);

        // Close in time, far in space: not a coincidence.
        let (_, verdict) = window.advance(candidate(10.0, 500.0, true), &c);
        assert!(verdict.is_none());
    }

    #[test]
    fn lookback_follows_the_rolling_candidate() {
        let c = cuts(50.0, 100.0);
        let (window, _) = AdmissionWindow::default().advance(candidate(0.0, 0.0, true), &c);
        let (window, _) = window.advance(candidate(500.0, 1000.0, true), &c);
        let (window, _) = window.advance(candidate(510.0, 1005.0, true), &c);

        // The candidate at t=510 must be judged against t=500, not t=0.
        let (_, verdict) = window.advance(candidate(9999.0, 0.0, true), &c);
        assert_eq!(verdict.unwrap().time, 510.0);
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::new(4.0, 6.0, 3.0);
        assert!((euclidean_distance(a, b) - 5.0).abs() < 1e-12);
        assert_eq!(euclidean_distance(a, a), 0.0);
    }
}
