#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    UnknownSchedule,
    UnknownTask,
    UnknownIntervalTask,
    UnknownEntry,
    UnknownUser,
    AlreadyCompleted,
    NotCompleted,
    ScheduleLinked,
    /// A second open occurrence was about to be created for one schedule.
    /// This is a bug in the calling sequence, not a user-facing condition.
    OpenOccurrenceExists,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UnknownSchedule => write!(f, "unknown schedule"),
            Self::UnknownTask => write!(f, "unknown task"),
            Self::UnknownIntervalTask => write!(f, "unknown interval task"),
            Self::UnknownEntry => write!(f, "unknown daily schedule entry"),
            Self::UnknownUser => write!(f, "unknown user"),
            Self::AlreadyCompleted => write!(f, "task is already completed"),
            Self::NotCompleted => write!(f, "task is not completed"),
            Self::ScheduleLinked => {
                write!(f, "schedule-linked occurrences are removed via their schedule")
            }
            Self::OpenOccurrenceExists => {
                write!(f, "schedule already has an open occurrence")
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
