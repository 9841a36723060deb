//! Application services for task lifecycle orchestration.

mod error;
mod notices;
mod reassignment;
mod transition;

pub use error::{TaskServiceError, TaskServiceResult};
pub use reassignment::ReassignmentWorkflow;
pub use transition::{CreateTaskRequest, StatusTransitionEngine};
