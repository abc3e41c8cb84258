//! Leader scan over the candidate sequence.

use tally_types::{Candidate, Winner};

/// Derives the leading candidate on demand. Reads only.
pub struct WinnerCalculator;

impl WinnerCalculator {
    /// Scan in index order, replacing the leader only on a strictly greater
    /// count. Ties therefore go to the lowest index. `None` only for an
    /// empty slice, which a constructed registry never is.
    pub fn leader(candidates: &[Candidate]) -> Option<Winner> {
        let mut iter = candidates.iter().enumerate();
        let (first_index, first) = iter.next()?;
        let (index, best) = iter.fold((first_index, first), |(li, lead), (i, c)| {
            if c.vote_count > lead.vote_count {
                (i, c)
            } else {
                (li, lead)
            }
        });
        Some(Winner {
            index,
            name: best.name.clone(),
            votes: best.vote_count,
        })
    }
}
