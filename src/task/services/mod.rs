//! Application services for task creation and lookup.

mod creation;
mod query;
mod response;

pub use creation::{
    CreateTaskRequest, CreatedTask, TaskCreationError, TaskCreationResult, TaskCreationService,
};
pub use query::TaskQueryService;
pub use response::{CreateTaskResponse, STATUS_CREATED, STATUS_UNPROCESSABLE};
