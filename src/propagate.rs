use crate::data::{AssignmentId, LectureId};
use crate::state::SearchState;

/// Why a branch cannot be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fail {
    /// Forward checking emptied the lecture's domain.
    Collapsed(LectureId),
    /// Every candidate for the lecture was tried without success.
    Exhausted(LectureId),
    /// The deadline expired. Propagates uncaught to the root; a parent
    /// frame must not treat it as an ordinary candidate failure.
    Deadline,
}

impl SearchState<'_> {
    /// Fixes `lecture := assignment` and propagates to fixpoint.
    ///
    /// Forward checking prunes every other unassigned domain against the
    /// new fix; any domain reduced to a single candidate is fixed in turn
    /// and re-propagated until no singleton remains. Returns the first
    /// collapse without attempting repair; the caller undoes to its trail
    /// mark and moves on.
    pub(crate) fn fix_and_propagate(
        &mut self,
        lecture: LectureId,
        assignment: AssignmentId,
    ) -> Result<(), Fail> {
        self.fix(lecture, assignment);
        let mut pending = vec![lecture];
        loop {
            while let Some(source) = pending.pop() {
                self.forward_check(source)?;
            }
            match self.take_singleton() {
                Some((forced, sole)) => {
                    self.fix(forced, sole);
                    pending.push(forced);
                }
                None => return Ok(()),
            }
        }
    }

    /// Prunes every other unassigned domain against `source`'s fixed
    /// assignment: the assignment itself (one physical triple serves one
    /// lecture), anything conflicting with it on instructor or room, and
    /// anything whose instructor is busy.
    fn forward_check(&mut self, source: LectureId) -> Result<(), Fail> {
        let fixed_id = self.fixed[source].unwrap();
        let fixed = self.problem.universe[fixed_id];

        for lecture in 0..self.domains.len() {
            if lecture == source || !self.is_unassigned(lecture) {
                continue;
            }
            let doomed: Vec<AssignmentId> = self.domains[lecture]
                .iter()
                .copied()
                .filter(|&id| {
                    let candidate = self.problem.universe[id];
                    id == fixed_id
                        || candidate.conflicts_on_instructor(&fixed)
                        || candidate.conflicts_on_room(&fixed)
                        || self.instructor_busy(candidate.instructor)
                })
                .collect();
            for id in doomed {
                self.remove(lecture, id);
            }
            if self.domains[lecture].is_empty() {
                return Err(Fail::Collapsed(lecture));
            }
        }
        Ok(())
    }

    /// First unassigned lecture whose domain holds exactly one candidate.
    fn take_singleton(&self) -> Option<(LectureId, AssignmentId)> {
        (0..self.domains.len())
            .filter(|&l| self.is_unassigned(l))
            .find(|&l| self.domains[l].len() == 1)
            .map(|l| (l, *self.domains[l].iter().next().unwrap()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{InstructorSpec, RoomSpec, SchedulingInput};
    use crate::domain::TimetableProblem;

    fn instructor(name: &str, lectures: &[&str]) -> InstructorSpec {
        InstructorSpec {
            name: name.to_string(),
            lectures: lectures.iter().map(|s| s.to_string()).collect(),
            days: vec![],
            times: vec![],
        }
    }

    fn room(number: u32, lectures: &[&str]) -> RoomSpec {
        RoomSpec {
            number,
            lectures: lectures.iter().map(|s| s.to_string()).collect(),
            days: vec![],
            times: vec![],
        }
    }

    fn build(
        lectures: &[&str],
        instructors: Vec<InstructorSpec>,
        rooms: Vec<RoomSpec>,
        timeslots: &[&str],
        cap: u32,
    ) -> TimetableProblem {
        TimetableProblem::build(&SchedulingInput {
            lectures: lectures.iter().map(|s| s.to_string()).collect(),
            instructors,
            rooms,
            timeslots: timeslots.iter().map(|s| s.to_string()).collect(),
            max_lectures_per_instructor: cap,
        })
        .unwrap()
    }

    fn find(problem: &TimetableProblem, instructor: &str, room: u32, slot: &str) -> AssignmentId {
        problem
            .universe
            .iter()
            .position(|a| {
                problem.instructors[a.instructor].name == instructor
                    && problem.rooms[a.room].number == room
                    && problem.timeslots[a.timeslot].to_string() == slot
            })
            .unwrap()
    }

    #[test]
    fn prunes_conflicts_and_cascades_singletons() {
        // Two instructors, two rooms, one shared slot. Fixing lecture A to
        // (X, 1) leaves lecture B exactly (Y, 2), which the fixpoint fixes.
        let problem = build(
            &["A", "B"],
            vec![instructor("X", &["A", "B"]), instructor("Y", &["A", "B"])],
            vec![room(1, &["A", "B"]), room(2, &["A", "B"])],
            &["Mon 10-12"],
            5,
        );
        let mut state = SearchState::new(&problem, true);

        let a = find(&problem, "X", 1, "Mon 10-12");
        state.fix_and_propagate(0, a).unwrap();

        assert!(state.is_complete());
        let b = state.fixed[1].unwrap();
        assert_eq!(problem.instructors[problem.universe[b].instructor].name, "Y");
        assert_eq!(problem.rooms[problem.universe[b].room].number, 2);
    }

    #[test]
    fn collapse_is_reported_and_undo_restores() {
        // One instructor, one room, one slot: fixing A starves B.
        let problem = build(
            &["A", "B"],
            vec![instructor("X", &["A", "B"])],
            vec![room(1, &["A", "B"])],
            &["Mon 10-12"],
            5,
        );
        let mut state = SearchState::new(&problem, true);
        let mark = state.mark();

        let result = state.fix_and_propagate(0, 0);
        assert_eq!(result, Err(Fail::Collapsed(1)));

        state.undo_to(mark);
        assert!(state.is_unassigned(0));
        assert_eq!(state.domains[0].len(), 1);
        assert_eq!(state.domains[1].len(), 1);
    }

    #[test]
    fn strict_cap_prunes_instructor_at_the_cap() {
        // Cap 1, single instructor, two slots. Fixing A makes X busy under
        // the strict reading, so B loses its other slot too and collapses.
        let problem = build(
            &["A", "B"],
            vec![instructor("X", &["A", "B"])],
            vec![room(1, &["A", "B"])],
            &["Mon 10-12", "Mon 12-14"],
            1,
        );
        let mut state = SearchState::new(&problem, true);

        let a = find(&problem, "X", 1, "Mon 10-12");
        assert_eq!(state.fix_and_propagate(0, a), Err(Fail::Collapsed(1)));
    }

    #[test]
    fn lenient_cap_lets_an_instructor_reach_one_past() {
        // Same instance, lenient reading: X is not busy at load 1, so B is
        // forced onto the remaining slot and X ends up one past the cap.
        let problem = build(
            &["A", "B"],
            vec![instructor("X", &["A", "B"])],
            vec![room(1, &["A", "B"])],
            &["Mon 10-12", "Mon 12-14"],
            1,
        );
        let mut state = SearchState::new(&problem, false);

        let a = find(&problem, "X", 1, "Mon 10-12");
        state.fix_and_propagate(0, a).unwrap();

        assert!(state.is_complete());
        let b = state.fixed[1].unwrap();
        assert_eq!(
            problem.timeslots[problem.universe[b].timeslot].to_string(),
            "Mon 12-14"
        );
    }

    #[test]
    fn busy_instructor_is_pruned_from_unrelated_domains() {
        // Y can only cover B; X covers A and B. Under a strict cap of 1,
        // fixing A on X must drop X's candidates from B's domain while
        // keeping Y's, which do not conflict with the fix.
        let problem = build(
            &["A", "B"],
            vec![instructor("X", &["A", "B"]), instructor("Y", &["B"])],
            vec![room(1, &["A", "B"])],
            &["Mon 10-12", "Mon 12-14"],
            1,
        );
        let mut state = SearchState::new(&problem, true);

        let a = find(&problem, "X", 1, "Mon 10-12");
        state.fix_and_propagate(0, a).unwrap();

        let b = state.fixed[1].unwrap();
        assert_eq!(problem.instructors[problem.universe[b].instructor].name, "Y");
    }
}
