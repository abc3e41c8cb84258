//! Ordered candidate list with per-candidate vote counters.
//!
//! The sequence is fixed at construction: never resized, reordered, or
//! renamed. Counters only ever go up.

use crate::error::ElectionError;
use tally_types::{Candidate, CandidateIndex};

#[derive(Clone, Debug)]
pub struct CandidateRegistry {
    candidates: Vec<Candidate>,
}

impl CandidateRegistry {
    /// Build a registry from candidate names, in index order.
    pub fn new<I, S>(names: I) -> Result<Self, ElectionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates: Vec<Candidate> = names.into_iter().map(Candidate::new).collect();
        Self::from_candidates(candidates)
    }

    /// Rebuild a registry with existing counts (snapshot restore).
    pub(crate) fn from_candidates(candidates: Vec<Candidate>) -> Result<Self, ElectionError> {
        if candidates.is_empty() {
            return Err(ElectionError::NoCandidates);
        }
        Ok(Self { candidates })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false for a constructed registry; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn contains(&self, index: CandidateIndex) -> bool {
        index < self.candidates.len()
    }

    pub fn get(&self, index: CandidateIndex) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Snapshot of every candidate in index order.
    pub fn list(&self) -> Vec<Candidate> {
        self.candidates.clone()
    }

    /// Borrowed view for scans that should not clone.
    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Reject an index outside `[0, len)` with [`ElectionError::InvalidCandidate`].
    pub fn ensure_exists(&self, index: CandidateIndex) -> Result<(), ElectionError> {
        if self.contains(index) {
            Ok(())
        } else {
            Err(ElectionError::InvalidCandidate {
                index,
                count: self.candidates.len(),
            })
        }
    }

    /// Add one vote to `index` and return its new count.
    ///
    /// Fails without touching any counter if the index is out of range or
    /// the counter would overflow.
    pub fn increment(&mut self, index: CandidateIndex) -> Result<u64, ElectionError> {
        let count = self.candidates.len();
        let candidate = self
            .candidates
            .get_mut(index)
            .ok_or(ElectionError::InvalidCandidate { index, count })?;
        let next = candidate
            .vote_count
            .checked_add(1)
            .ok_or(ElectionError::TallyOverflow)?;
        candidate.vote_count = next;
        Ok(next)
    }

    /// Check that `index` could be incremented right now.
    pub(crate) fn ensure_incrementable(&self, index: CandidateIndex) -> Result<(), ElectionError> {
        self.ensure_exists(index)?;
        match self.candidates[index].vote_count.checked_add(1) {
            Some(_) => Ok(()),
            None => Err(ElectionError::TallyOverflow),
        }
    }

    /// Sum of all counters.
    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.vote_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CandidateRegistry {
        CandidateRegistry::new(["Alice", "Bob", "Carol"]).unwrap()
    }

    #[test]
    fn preserves_construction_order() {
        let names: Vec<String> = registry().list().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn empty_registry_rejected() {
        let names: Vec<String> = Vec::new();
        assert_eq!(
            CandidateRegistry::new(names).unwrap_err(),
            ElectionError::NoCandidates
        );
    }

    #[test]
    fn increment_touches_only_target() {
        let mut reg = registry();
        assert_eq!(reg.increment(1).unwrap(), 1);
        assert_eq!(reg.increment(1).unwrap(), 2);
        let counts: Vec<u64> = reg.list().iter().map(|c| c.vote_count).collect();
        assert_eq!(counts, vec![0, 2, 0]);
        assert_eq!(reg.total_votes(), 2);
    }

    #[test]
    fn out_of_range_increment_leaves_state() {
        let mut reg = registry();
        reg.increment(0).unwrap();
        let before = reg.list();
        assert_eq!(
            reg.increment(3),
            Err(ElectionError::InvalidCandidate { index: 3, count: 3 })
        );
        assert_eq!(reg.list(), before);
    }

    #[test]
    fn overflow_is_rejected_before_mutation() {
        let mut reg = CandidateRegistry::from_candidates(vec![Candidate {
            name: "Max".into(),
            vote_count: u64::MAX,
        }])
        .unwrap();
        assert_eq!(reg.ensure_incrementable(0), Err(ElectionError::TallyOverflow));
        assert_eq!(reg.increment(0), Err(ElectionError::TallyOverflow));
        assert_eq!(reg.get(0).unwrap().vote_count, u64::MAX);
    }

    #[test]
    fn contains_bounds() {
        let reg = registry();
        assert!(reg.contains(0));
        assert!(reg.contains(2));
        assert!(!reg.contains(3));
        assert!(!reg.is_empty());
        assert_eq!(reg.len(), 3);
    }
}
