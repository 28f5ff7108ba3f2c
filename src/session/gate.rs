use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Guards a form against double submission and stale responses.
///
/// Only one submission may be outstanding at a time. Each submission
/// remembers the generation it started in; `invalidate` moves the gate to a
/// new generation (the user navigated away), after which responses belonging
/// to older submissions must be discarded.
#[derive(Debug, Default)]
pub struct SubmissionGate {
    submitting: AtomicBool,
    generation: AtomicU64,
}

impl SubmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a submission, or `None` if one is already in flight.
    pub fn try_begin(self: &Arc<Self>) -> Option<Submission> {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        Some(Submission {
            gate: Arc::clone(self),
            generation: self.generation.load(Ordering::Acquire),
        })
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Mark every outstanding submission as stale
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// An in-flight submission. Dropping it re-opens the gate.
#[derive(Debug)]
pub struct Submission {
    gate: Arc<SubmissionGate>,
    generation: u64,
}

impl Submission {
    /// Whether the response to this submission may still be applied
    pub fn is_current(&self) -> bool {
        self.gate.generation() == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Submission {
    fn drop(&mut self) {
        self.gate.submitting.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_submission_is_refused() {
        let gate = Arc::new(SubmissionGate::new());
        let first = gate.try_begin();
        assert!(first.is_some());
        assert!(gate.is_submitting());
        assert!(gate.try_begin().is_none());
    }

    #[test]
    fn test_drop_reopens_gate() {
        let gate = Arc::new(SubmissionGate::new());
        {
            let _submission = gate.try_begin().unwrap();
        }
        assert!(!gate.is_submitting());
        assert!(gate.try_begin().is_some());
    }

    #[test]
    fn test_invalidate_makes_submission_stale() {
        let gate = Arc::new(SubmissionGate::new());
        let submission = gate.try_begin().unwrap();
        assert!(submission.is_current());

        gate.invalidate();
        assert!(!submission.is_current());
    }

    #[test]
    fn test_new_submission_after_invalidate_is_current() {
        let gate = Arc::new(SubmissionGate::new());
        gate.invalidate();
        let submission = gate.try_begin().unwrap();
        assert_eq!(submission.generation(), 1);
        assert!(submission.is_current());
    }
}
