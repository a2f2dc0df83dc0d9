use thiserror::Error;

/// Errors surfaced by problem construction and solving.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A global timeslot spec did not match the `"Day Start-End"` grammar.
    #[error("invalid timeslot spec '{0}': expected \"Day Start-End\"")]
    InvalidTimeslot(String),

    /// A restriction time range did not match the `"Start-End"` grammar.
    #[error("invalid time range '{0}': expected \"Start-End\"")]
    InvalidTimeRange(String),

    /// No assignment can satisfy the constraints. Raised before search when
    /// a lecture starts with an empty candidate domain, or at the root once
    /// every branch has been exhausted.
    #[error("{0}")]
    Infeasible(String),

    /// The configured deadline expired before a schedule was found.
    #[error("solve aborted: deadline exceeded")]
    DeadlineExceeded,
}
