pub mod job;
pub mod recurrence;
pub mod regenerator;

pub use job::{RecurrenceJob, TriggerSchedule};
pub use recurrence::next_occurrence;
pub use regenerator::{RegenerationOutcome, RegenerationReport, TaskRegenerator};
