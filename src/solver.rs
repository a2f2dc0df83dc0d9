use std::time::Instant;

use log::{info, trace};

use crate::data::{Assignment, LectureId, ScheduledLecture, SchedulingOutput, SolveStats};
use crate::domain::TimetableProblem;
use crate::error::ScheduleError;
use crate::propagate::Fail;
use crate::state::SearchState;


/// Knobs for one solve run.
#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    /// When true (the default), the lecture cap is an inclusive limit: an
    /// instructor whose fixed count has reached the cap takes no further
    /// lectures. When false, an instructor is only blocked once already
    /// past the cap, so it can end up exactly one lecture over.
    pub strict_load_cap: bool,
    /// Abort the whole solve once this instant has passed. Checked at
    /// every branch entry.
    pub deadline: Option<Instant>,
    /// Invoke the progress observer every this many branches.
    pub progress_every: Option<u64>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            strict_load_cap: true,
            deadline: None,
            progress_every: None,
        }
    }
}

/// Snapshot handed to a progress observer.
#[derive(Debug, Clone)]
pub struct Progress {
    pub branches: u64,
    pub backtracks: u64,
    /// Lectures fixed so far, as (lecture index, assignment) pairs.
    pub partial: Vec<(LectureId, Assignment)>,
    pub total_lectures: usize,
}

/// Searches for the first feasible schedule. Progress snapshots, if
/// enabled via [`SolveOptions::progress_every`], go to the trace log.
pub fn solve(
    problem: &TimetableProblem,
    options: &SolveOptions,
) -> Result<SchedulingOutput, ScheduleError> {
    solve_with_observer(problem, options, &mut |progress: &Progress| {
        trace!(
            "{}/{} lectures fixed after {} branches ({} backtracked)",
            progress.partial.len(),
            progress.total_lectures,
            progress.branches,
            progress.backtracks
        );
    })
}

/// Like [`solve`], with an injectable observer receiving periodic
/// snapshots of the partial assignment. The observer is a debug side
/// channel; it cannot influence the search.
pub fn solve_with_observer<F>(
    problem: &TimetableProblem,
    options: &SolveOptions,
    observer: &mut F,
) -> Result<SchedulingOutput, ScheduleError>
where
    F: FnMut(&Progress),
{
    let start_time = Instant::now();
    info!(
        "searching a schedule for {} lectures over {} instructors, {} rooms and {} timeslots ({} candidate assignments)",
        problem.lectures.len(),
        problem.instructors.len(),
        problem.rooms.len(),
        problem.timeslots.len(),
        problem.universe.len()
    );

    let mut search = Search {
        state: SearchState::new(problem, options.strict_load_cap),
        deadline: options.deadline,
        progress_every: options.progress_every,
        branches: 0,
        backtracks: 0,
    };

    match search.run(observer) {
        Ok(()) => {
            let duration = start_time.elapsed();
            info!(
                "schedule found in {:.2?} after {} branches ({} backtracked)",
                duration, search.branches, search.backtracks
            );
            let assignments = problem
                .lectures
                .iter()
                .enumerate()
                .map(|(lecture, name)| {
                    let a = problem.universe[search.state.fixed[lecture].unwrap()];
                    ScheduledLecture {
                        lecture: name.clone(),
                        timeslot: problem.timeslots[a.timeslot].to_string(),
                        instructor: problem.instructors[a.instructor].name.clone(),
                        room: problem.rooms[a.room].number,
                    }
                })
                .collect();
            Ok(SchedulingOutput {
                assignments,
                stats: SolveStats {
                    branches: search.branches,
                    backtracks: search.backtracks,
                    solve_time_ms: duration.as_millis() as u64,
                },
            })
        }
        Err(Fail::Deadline) => Err(ScheduleError::DeadlineExceeded),
        Err(Fail::Collapsed(lecture)) | Err(Fail::Exhausted(lecture)) => {
            Err(ScheduleError::Infeasible(format!(
                "unable to find a schedule without violating constraints (stuck on lecture '{}')",
                problem.lectures[lecture]
            )))
        }
    }
}

/// Depth-first backtracking driver over a [`SearchState`].
struct Search<'p> {
    state: SearchState<'p>,
    deadline: Option<Instant>,
    progress_every: Option<u64>,
    branches: u64,
    backtracks: u64,
}

impl Search<'_> {
    /// One recursive step: pick the most constrained lecture, try its
    /// candidates least-constraining first, propagate each tentative fix
    /// to fixpoint, and recurse. A failed candidate is undone from the
    /// trail before the next one is tried, so sibling branches always see
    /// the same domains.
    fn run<F: FnMut(&Progress)>(&mut self, observer: &mut F) -> Result<(), Fail> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Fail::Deadline);
            }
        }
        if self.state.is_complete() {
            return Ok(());
        }
        let Some(lecture) = self.state.select_most_constrained() else {
            return Ok(());
        };

        for candidate in self.state.order_least_constraining(lecture) {
            let instructor = self.state.problem.universe[candidate].instructor;
            if self.state.instructor_busy(instructor) {
                continue;
            }

            self.branches += 1;
            self.tick(observer);
            trace!("lecture {lecture} := assignment {candidate}");

            let mark = self.state.mark();
            let attempt = self
                .state
                .fix_and_propagate(lecture, candidate)
                .and_then(|()| self.run(observer));
            match attempt {
                Ok(()) => return Ok(()),
                Err(Fail::Deadline) => return Err(Fail::Deadline),
                Err(fail) => {
                    trace!("lecture {lecture} := assignment {candidate} failed: {fail:?}");
                    self.backtracks += 1;
                    self.state.undo_to(mark);
                }
            }
        }
        Err(Fail::Exhausted(lecture))
    }

    fn tick<F: FnMut(&Progress)>(&mut self, observer: &mut F) {
        let Some(every) = self.progress_every else {
            return;
        };
        if every == 0 || self.branches % every != 0 {
            return;
        }
        let partial = self
            .state
            .fixed
            .iter()
            .enumerate()
            .filter_map(|(lecture, fixed)| {
                fixed.map(|id| (lecture, self.state.problem.universe[id]))
            })
            .collect();
        observer(&Progress {
            branches: self.branches,
            backtracks: self.backtracks,
            partial,
            total_lectures: self.state.problem.lectures.len(),
        });
    }
}
