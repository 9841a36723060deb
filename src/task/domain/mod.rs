//! Domain model for task lifecycle management.
//!
//! The task domain owns the status state machine, the audit trail entries
//! it produces, and the reassignment approval workflow, keeping all
//! infrastructure concerns outside of the domain boundary.

mod error;
mod ids;
mod reassignment;
mod status;
mod status_log;
mod task;

pub use error::{
    ParsePriorityError, ParseReassignmentStatusError, ParseTaskStatusError, TaskDomainError,
};
pub use ids::{ReassignmentId, StatusLogId, TaskId};
pub use reassignment::{
    NewReassignmentRequest, PersistedReassignmentData, ReassignmentDecision, ReassignmentRequest,
    ReassignmentStatus,
};
pub use status::{TaskStatus, TransitionAuthority};
pub use status_log::{AssignmentChange, NewStatusLogEntry, StatusLogEntry};
pub use task::{
    MAX_TITLE_LEN, PersistedTaskData, Priority, Task, TaskDraft, TransitionDetails,
};
