//! 上传队列：顺序批量上传、扫描单飞、任务生命周期管理

mod backend;
mod errors;
mod queue;
mod queue_worker;
mod task;
pub mod types;

pub use backend::UploadBackend;
pub use errors::{Result, UploadError};
pub use queue::{UploadQueue, UploadQueueHandle};
pub use task::{TaskId, TaskStatus, UploadSpec, UploadTask};
pub use types::QueueEvent;
