use fnv::FnvHashSet;

use crate::data::{AssignmentId, InstructorId, LectureId};
use crate::domain::TimetableProblem;

/// One reversible mutation of the search state.
#[derive(Debug, Clone, Copy)]
enum TrailEntry {
    /// `assignment` was pruned from `lecture`'s domain.
    Removed {
        lecture: LectureId,
        assignment: AssignmentId,
    },
    /// `lecture` was fixed to its current assignment.
    Fixed { lecture: LectureId },
}

/// Position in the trail; [`SearchState::undo_to`] reverses everything
/// recorded after it.
pub(crate) type TrailMark = usize;

/// Mutable search state over a [`TimetableProblem`].
///
/// Domains are sets of indices into the problem's assignment universe.
/// Every mutation goes through the trail, so a failed branch is reversed
/// exactly and leaves no trace in the domains its siblings see.
pub(crate) struct SearchState<'p> {
    pub(crate) problem: &'p TimetableProblem,
    pub(crate) domains: Vec<FnvHashSet<AssignmentId>>,
    pub(crate) fixed: Vec<Option<AssignmentId>>,
    /// Fixed-assignment count per instructor.
    load: Vec<u32>,
    unassigned: usize,
    trail: Vec<TrailEntry>,
    strict_load_cap: bool,
}

impl<'p> SearchState<'p> {
    pub(crate) fn new(problem: &'p TimetableProblem, strict_load_cap: bool) -> Self {
        SearchState {
            domains: problem.initial_domains.clone(),
            fixed: vec![None; problem.lectures.len()],
            load: vec![0; problem.instructors.len()],
            unassigned: problem.lectures.len(),
            trail: Vec::new(),
            strict_load_cap,
            problem,
        }
    }

    /// No lecture is left with a set-valued domain.
    pub(crate) fn is_complete(&self) -> bool {
        self.unassigned == 0
    }

    pub(crate) fn is_unassigned(&self, lecture: LectureId) -> bool {
        self.fixed[lecture].is_none()
    }

    /// Fixes `lecture` to `assignment`, recording the step on the trail.
    pub(crate) fn fix(&mut self, lecture: LectureId, assignment: AssignmentId) {
        debug_assert!(self.fixed[lecture].is_none());
        self.fixed[lecture] = Some(assignment);
        self.load[self.problem.universe[assignment].instructor] += 1;
        self.unassigned -= 1;
        self.trail.push(TrailEntry::Fixed { lecture });
    }

    /// Prunes `assignment` from `lecture`'s domain, recording the removal.
    pub(crate) fn remove(&mut self, lecture: LectureId, assignment: AssignmentId) {
        if self.domains[lecture].remove(&assignment) {
            self.trail.push(TrailEntry::Removed { lecture, assignment });
        }
    }

    /// Whether the instructor may take no further lectures in the current
    /// partial schedule. Under the strict cap reading an instructor at the
    /// cap is full; under the lenient reading only one already past it.
    pub(crate) fn instructor_busy(&self, instructor: InstructorId) -> bool {
        let cap = self.problem.max_lectures_per_instructor;
        if self.strict_load_cap {
            self.load[instructor] >= cap
        } else {
            self.load[instructor] > cap
        }
    }

    pub(crate) fn mark(&self) -> TrailMark {
        self.trail.len()
    }

    /// Reverses every mutation recorded after `mark`.
    pub(crate) fn undo_to(&mut self, mark: TrailMark) {
        while self.trail.len() > mark {
            match self.trail.pop().unwrap() {
                TrailEntry::Removed { lecture, assignment } => {
                    let restored = self.domains[lecture].insert(assignment);
                    debug_assert!(restored);
                }
                TrailEntry::Fixed { lecture } => {
                    let assignment = self.fixed[lecture].take().unwrap();
                    self.load[self.problem.universe[assignment].instructor] -= 1;
                    self.unassigned += 1;
                }
            }
        }
    }

    /// Total candidate count across every lecture except `except`. A fixed
    /// lecture's domain is its single assignment, so it contributes one.
    pub(crate) fn remaining_values(&self, except: LectureId) -> usize {
        (0..self.domains.len())
            .filter(|&l| l != except)
            .map(|l| {
                if self.fixed[l].is_some() {
                    1
                } else {
                    self.domains[l].len()
                }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{InstructorSpec, RoomSpec, SchedulingInput};

    fn two_lecture_problem() -> TimetableProblem {
        TimetableProblem::build(&SchedulingInput {
            lectures: vec!["A".to_string(), "B".to_string()],
            instructors: vec![InstructorSpec {
                name: "X".to_string(),
                lectures: vec!["A".to_string(), "B".to_string()],
                days: vec!["Mon".to_string()],
                times: vec![],
            }],
            rooms: vec![RoomSpec {
                number: 1,
                lectures: vec!["A".to_string(), "B".to_string()],
                days: vec!["Mon".to_string()],
                times: vec![],
            }],
            timeslots: vec!["Mon 10-12".to_string(), "Mon 12-14".to_string()],
            max_lectures_per_instructor: 2,
        })
        .unwrap()
    }

    #[test]
    fn fix_updates_load_and_progress() {
        let problem = two_lecture_problem();
        let mut state = SearchState::new(&problem, true);
        assert!(!state.is_complete());
        assert_eq!(state.load[0], 0);

        state.fix(0, 0);
        assert!(!state.is_unassigned(0));
        assert!(state.is_unassigned(1));
        assert_eq!(state.load[0], 1);

        state.fix(1, 1);
        assert!(state.is_complete());
        assert_eq!(state.load[0], 2);
    }

    #[test]
    fn undo_restores_exactly_to_mark() {
        let problem = two_lecture_problem();
        let mut state = SearchState::new(&problem, true);
        let before: Vec<usize> = state.domains.iter().map(|d| d.len()).collect();

        let outer = state.mark();
        state.fix(0, 0);
        state.remove(1, 0);
        let inner = state.mark();
        state.remove(1, 1);

        state.undo_to(inner);
        assert!(state.domains[1].contains(&1));
        assert!(!state.domains[1].contains(&0));

        state.undo_to(outer);
        assert!(state.is_unassigned(0));
        assert_eq!(state.load[0], 0);
        let after: Vec<usize> = state.domains.iter().map(|d| d.len()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn removing_an_absent_candidate_leaves_no_trail() {
        let problem = two_lecture_problem();
        let mut state = SearchState::new(&problem, true);
        let mark = state.mark();
        state.remove(0, 0);
        state.remove(0, 0);
        state.undo_to(mark);
        assert!(state.domains[0].contains(&0));
    }

    #[test]
    fn busy_boundary_depends_on_cap_reading() {
        let problem = two_lecture_problem();

        let mut strict = SearchState::new(&problem, true);
        assert!(!strict.instructor_busy(0));
        strict.fix(0, 0);
        strict.fix(1, 1);
        // At the cap of 2: full under the strict reading.
        assert!(strict.instructor_busy(0));

        let mut lenient = SearchState::new(&problem, false);
        lenient.fix(0, 0);
        lenient.fix(1, 1);
        // At the cap: still open under the lenient reading.
        assert!(!lenient.instructor_busy(0));
    }

    #[test]
    fn remaining_values_counts_fixed_lectures_as_one() {
        let problem = two_lecture_problem();
        let mut state = SearchState::new(&problem, true);
        // Both domains hold 2 candidates (one room, two slots).
        assert_eq!(state.remaining_values(0), 2);

        state.fix(1, 1);
        assert_eq!(state.remaining_values(0), 1);
    }
}
