use std::collections::HashSet;

use fnv::FnvHashSet;
use itertools::iproduct;
use log::{trace, warn};

use crate::data::{
    Assignment, AssignmentId, Instructor, LectureId, Room, SchedulingInput, Timeslot,
};
use crate::error::ScheduleError;

/// Days used when a spec leaves its day restriction empty.
const ALL_DAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

/// Time ranges used when a spec leaves its time restriction empty.
const ALL_TIMES: [&str; 3] = ["10-12", "12-14", "14-16"];

/// A fully constructed timetabling problem: interned entities, the
/// assignment universe, and each lecture's initial candidate domain.
///
/// Entities are immutable once built; solving never touches this struct.
#[derive(Debug, Clone)]
pub struct TimetableProblem {
    pub lectures: Vec<String>,
    pub instructors: Vec<Instructor>,
    pub rooms: Vec<Room>,
    pub timeslots: Vec<Timeslot>,
    /// Every (instructor, room, timeslot) triple where both parties are
    /// available at the timeslot, independent of any lecture.
    pub universe: Vec<Assignment>,
    /// Per lecture, the universe members satisfying its capability
    /// constraints. Never empty: construction fails instead.
    pub initial_domains: Vec<FnvHashSet<AssignmentId>>,
    pub max_lectures_per_instructor: u32,
}

impl TimetableProblem {
    /// Builds the problem from input records.
    ///
    /// Fails with [`ScheduleError::Infeasible`] if some lecture has no
    /// candidate assignment at all, so a hopeless instance is rejected
    /// before any search step runs.
    pub fn build(input: &SchedulingInput) -> Result<Self, ScheduleError> {
        let lectures = dedup_lectures(&input.lectures);

        let timeslots = input
            .timeslots
            .iter()
            .map(|spec| parse_timeslot(spec))
            .collect::<Result<Vec<_>, _>>()?;

        let known: HashSet<&str> = lectures.iter().map(String::as_str).collect();

        let mut instructors = Vec::with_capacity(input.instructors.len());
        for spec in &input.instructors {
            warn_unknown_lectures(&format!("instructor '{}'", spec.name), &spec.lectures, &known);
            instructors.push(Instructor::new(
                spec.name.clone(),
                spec.lectures.iter().cloned().collect(),
                expand_availability(&spec.days, &spec.times)?,
            ));
        }

        let mut rooms = Vec::with_capacity(input.rooms.len());
        for spec in &input.rooms {
            warn_unknown_lectures(&format!("room {}", spec.number), &spec.lectures, &known);
            rooms.push(Room::new(
                spec.number,
                spec.lectures.iter().cloned().collect(),
                expand_availability(&spec.days, &spec.times)?,
            ));
        }

        let universe: Vec<Assignment> =
            iproduct!(0..instructors.len(), 0..rooms.len(), 0..timeslots.len())
                .filter(|&(i, r, t)| {
                    instructors[i].can_teach_at(&timeslots[t]) && rooms[r].can_use_at(&timeslots[t])
                })
                .map(|(instructor, room, timeslot)| Assignment {
                    instructor,
                    room,
                    timeslot,
                })
                .collect();
        trace!(
            "assignment universe holds {} of {} possible (instructor, room, timeslot) triples",
            universe.len(),
            instructors.len() * rooms.len() * timeslots.len()
        );

        let mut problem = TimetableProblem {
            lectures,
            instructors,
            rooms,
            timeslots,
            universe,
            initial_domains: Vec::new(),
            max_lectures_per_instructor: input.max_lectures_per_instructor,
        };

        let mut initial_domains = Vec::with_capacity(problem.lectures.len());
        for lecture in 0..problem.lectures.len() {
            let domain: FnvHashSet<AssignmentId> = (0..problem.universe.len())
                .filter(|&id| problem.satisfies(id, lecture))
                .collect();
            if domain.is_empty() {
                return Err(ScheduleError::Infeasible(format!(
                    "lecture '{}' has no possible (instructor, room, timeslot) assignment",
                    problem.lectures[lecture]
                )));
            }
            initial_domains.push(domain);
        }
        problem.initial_domains = initial_domains;

        Ok(problem)
    }

    /// Whether the assignment's instructor can teach and its room can host
    /// the lecture.
    pub fn satisfies(&self, assignment: AssignmentId, lecture: LectureId) -> bool {
        let a = &self.universe[assignment];
        let name = &self.lectures[lecture];
        self.instructors[a.instructor].can_teach(name) && self.rooms[a.room].can_host(name)
    }
}

/// Deduplicates lecture names, keeping first occurrences in input order.
fn dedup_lectures(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut lectures = Vec::with_capacity(names.len());
    for name in names {
        if seen.insert(name.as_str()) {
            lectures.push(name.clone());
        } else {
            warn!("lecture '{name}' specified more than once, ignoring the repeat");
        }
    }
    lectures
}

fn warn_unknown_lectures(owner: &str, listed: &[String], known: &HashSet<&str>) {
    for name in listed {
        if !known.contains(name.as_str()) {
            warn!("{owner} lists unknown lecture '{name}'");
        }
    }
}

/// Parses a global timeslot spec of the form `"Mon 10-12"`.
fn parse_timeslot(spec: &str) -> Result<Timeslot, ScheduleError> {
    let malformed = || ScheduleError::InvalidTimeslot(spec.to_string());
    let (day, range) = spec.trim().split_once(' ').ok_or_else(malformed)?;
    let (start, end) = range.split_once('-').ok_or_else(malformed)?;
    if day.is_empty() || start.is_empty() || end.is_empty() {
        return Err(malformed());
    }
    Ok(Timeslot {
        day: day.to_string(),
        start: start.to_string(),
        end: end.to_string(),
    })
}

/// Materializes an availability set from day and time restriction lists.
///
/// An empty list means "no restriction" and expands to the canonical
/// weekday/time grid. The grid is independent of the global timeslot list:
/// a defaulted entity is only ever available on the canonical slots, even
/// when the global list names others.
fn expand_availability(days: &[String], times: &[String]) -> Result<HashSet<Timeslot>, ScheduleError> {
    let days: Vec<&str> = if days.is_empty() {
        ALL_DAYS.to_vec()
    } else {
        days.iter().map(String::as_str).collect()
    };
    let times: Vec<&str> = if times.is_empty() {
        ALL_TIMES.to_vec()
    } else {
        times.iter().map(String::as_str).collect()
    };

    iproduct!(days.iter(), times.iter())
        .map(|(day, range)| {
            let (start, end) = range
                .split_once('-')
                .ok_or_else(|| ScheduleError::InvalidTimeRange(range.to_string()))?;
            Ok(Timeslot {
                day: day.to_string(),
                start: start.to_string(),
                end: end.to_string(),
            })
        })
        .collect()
}
