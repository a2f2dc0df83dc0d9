use std::cmp::Reverse;

use itertools::Itertools;

use crate::data::{AssignmentId, LectureId};
use crate::state::SearchState;

impl SearchState<'_> {
    /// Minimum-remaining-values variable choice: the unassigned lecture
    /// with the fewest candidates left. Ties go to the lowest lecture
    /// index (original input order) so runs are reproducible.
    pub(crate) fn select_most_constrained(&self) -> Option<LectureId> {
        (0..self.domains.len())
            .filter(|&l| self.is_unassigned(l))
            .min_by_key(|&l| (self.domains[l].len(), l))
    }

    /// Least-constraining-value ordering for `lecture`'s candidates.
    ///
    /// Each candidate is tentatively fixed and propagated on the trail;
    /// its score is the candidate total left across the other lectures,
    /// and the trial is then undone. Candidates are returned in
    /// descending score order with candidate index as the stable
    /// tie-break. A candidate whose trial propagation fails scores zero
    /// and sinks to the back, but is never dropped; keeping dead ends in
    /// the ordering keeps the search complete.
    pub(crate) fn order_least_constraining(&mut self, lecture: LectureId) -> Vec<AssignmentId> {
        let candidates: Vec<AssignmentId> =
            self.domains[lecture].iter().copied().sorted().collect();

        let mut scored: Vec<(AssignmentId, usize)> = candidates
            .into_iter()
            .map(|candidate| {
                let mark = self.mark();
                let score = match self.fix_and_propagate(lecture, candidate) {
                    Ok(()) => self.remaining_values(lecture),
                    Err(_) => 0,
                };
                self.undo_to(mark);
                (candidate, score)
            })
            .collect();

        scored.sort_by_key(|&(_, score)| Reverse(score));
        scored.into_iter().map(|(candidate, _)| candidate).collect()
    }
}
