use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TaskStatus {
    /// 等待上传
    Pending,
    /// 上传中
    Uploading,
    /// 上传成功
    Success,
    /// 上传失败，可手动重试
    Error,
}

impl TaskStatus {
    /// 是否允许发起（或重新发起）传输
    pub fn is_startable(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Error)
    }
}

/// 待入列文件的描述
#[derive(Debug, Clone)]
pub struct UploadSpec {
    pub file_path: PathBuf,
    /// 目标主机 id，None 交给服务端按后缀识别
    pub console: Option<String>,
    /// 展示标题，None 由服务端按文件名生成
    pub title: Option<String>,
}

impl UploadSpec {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            console: None,
            title: None,
        }
    }

    pub fn with_console(mut self, console: impl Into<String>) -> Self {
        self.console = Some(console.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadTask {
    pub id: TaskId,
    pub file_path: PathBuf,
    pub file_name: String,
    pub file_size: u64,
    pub console: Option<String>,
    pub title: Option<String>,
    pub status: TaskStatus,
    pub bytes_uploaded: u64,
    /// 百分比进度，0..=100
    pub progress: u8,
    /// 最近一次结果消息，成功和失败都会写
    pub message: Option<String>,
    /// 上传成功后服务端登记的游戏 id
    pub game_id: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl UploadTask {
    /// 按已传字节数刷新进度
    ///
    /// 字节数取较大值，百分比只增不减，封顶 100
    pub fn update_progress(&mut self, bytes_uploaded: u64) {
        self.bytes_uploaded = self.bytes_uploaded.max(bytes_uploaded);

        let percentage = if self.file_size == 0 {
            100
        } else {
            (self.bytes_uploaded.saturating_mul(100) / self.file_size).min(100) as u8
        };
        if percentage > self.progress {
            self.progress = percentage;
        }
    }
}
