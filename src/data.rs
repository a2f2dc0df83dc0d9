use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// Type aliases for clarity. All are indices into the tables held by
// `TimetableProblem`; `AssignmentId` indexes the assignment universe.
pub type LectureId = usize;
pub type InstructorId = usize;
pub type RoomId = usize;
pub type TimeslotId = usize;
pub type AssignmentId = usize;

/// A timeslot a lecture can be held at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timeslot {
    pub day: String,
    pub start: String,
    pub end: String,
}

impl fmt::Display for Timeslot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.day, self.start, self.end)
    }
}

/// An instructor, able to give certain lectures at certain times.
#[derive(Debug, Clone)]
pub struct Instructor {
    pub name: String,
    teachable: HashSet<String>,
    available: HashSet<Timeslot>,
}

impl Instructor {
    pub fn new(name: String, teachable: HashSet<String>, available: HashSet<Timeslot>) -> Self {
        Instructor {
            name,
            teachable,
            available,
        }
    }

    /// Is the instructor qualified to give the lecture?
    pub fn can_teach(&self, lecture: &str) -> bool {
        self.teachable.contains(lecture)
    }

    /// Is the instructor available at the timeslot?
    pub fn can_teach_at(&self, timeslot: &Timeslot) -> bool {
        self.available.contains(timeslot)
    }
}

/// A room to give lectures in.
#[derive(Debug, Clone)]
pub struct Room {
    pub number: u32,
    hostable: HashSet<String>,
    available: HashSet<Timeslot>,
}

impl Room {
    pub fn new(number: u32, hostable: HashSet<String>, available: HashSet<Timeslot>) -> Self {
        Room {
            number,
            hostable,
            available,
        }
    }

    /// Can the lecture be given in the room?
    pub fn can_host(&self, lecture: &str) -> bool {
        self.hostable.contains(lecture)
    }

    /// Can the room be used at the timeslot?
    pub fn can_use_at(&self, timeslot: &Timeslot) -> bool {
        self.available.contains(timeslot)
    }
}

/// A candidate label for a lecture: who teaches it, where, and when.
///
/// Only triples whose instructor and room are both available at the
/// timeslot ever enter the assignment universe, so timeslot
/// compatibility needs no re-checking here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Assignment {
    pub instructor: InstructorId,
    pub room: RoomId,
    pub timeslot: TimeslotId,
}

impl Assignment {
    /// Whether both assignments occupy the same instructor at the same time.
    pub fn conflicts_on_instructor(&self, other: &Assignment) -> bool {
        self.instructor == other.instructor && self.timeslot == other.timeslot
    }

    /// Whether both assignments occupy the same room at the same time.
    pub fn conflicts_on_room(&self, other: &Assignment) -> bool {
        self.room == other.room && self.timeslot == other.timeslot
    }
}

/// Availability and capability specification for an instructor.
///
/// An empty `days` or `times` list means "no restriction" and is expanded
/// to the canonical weekday/time grid during problem construction.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstructorSpec {
    pub name: String,
    pub lectures: Vec<String>,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub times: Vec<String>,
}

/// Availability and capability specification for a room.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoomSpec {
    pub number: u32,
    pub lectures: Vec<String>,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub times: Vec<String>,
}

/// The complete input for the timetabling problem.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingInput {
    pub lectures: Vec<String>,
    pub instructors: Vec<InstructorSpec>,
    pub rooms: Vec<RoomSpec>,
    /// Global timeslots as `"Day Start-End"` strings, e.g. `"Mon 10-12"`.
    pub timeslots: Vec<String>,
    pub max_lectures_per_instructor: u32,
}

/// One scheduled lecture in the final output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledLecture {
    pub lecture: String,
    pub timeslot: String,
    pub instructor: String,
    pub room: u32,
}

/// Counters from one solve run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStats {
    pub branches: u64,
    pub backtracks: u64,
    pub solve_time_ms: u64,
}

/// The final output of the solver.
///
/// Assignments are listed in lecture input order; sorting for display is
/// left to the consumer.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulingOutput {
    pub assignments: Vec<ScheduledLecture>,
    pub stats: SolveStats,
}
