pub mod api_types;
pub mod client;
pub mod error;
pub mod types;

pub use client::TaskClient;
pub use error::ApiError;
pub use types::{Page, Priority, Task, TaskFormData, TaskId, TaskPatch};
