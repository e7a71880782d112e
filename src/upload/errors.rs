use thiserror::Error;
use crate::api::ApiError;
use super::task::TaskId;

#[derive(Debug, Error)]
pub enum UploadError {
    /// 队列里不存在这个任务
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// 队列已经关闭，命令无法投递
    #[error("Upload queue shut down")]
    QueueClosed,

    /// 后端请求失败
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl UploadError {
    pub fn internal_error(message: impl Into<String>) -> Self {
        UploadError::InternalError(message.into())
    }
}

pub type Result<T, E = UploadError> = std::result::Result<T, E>;
