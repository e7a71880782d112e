use tokio::sync::oneshot;
use crate::api::types::ScanResult;
use super::errors::Result;
use super::task::{TaskId, TaskStatus, UploadSpec, UploadTask};

/// 队列命令
pub enum QueueCommand {
    /// 批量入列，每个文件一条任务
    AddFiles {
        specs: Vec<UploadSpec>,
        reply: oneshot::Sender<Vec<TaskId>>,
    },

    /// 上传单个任务，Success / Uploading 状态下不做任何事
    UploadOne {
        task_id: TaskId,
        reply: oneshot::Sender<Result<()>>,
    },

    /// 把当前 Pending / Error 的任务按队列顺序逐个上传
    ///
    /// 返回本轮圈定的任务数；已有批次在跑时返回 0
    UploadAll {
        reply: oneshot::Sender<usize>,
    },

    /// 删除任务，任何状态都可删，传输中的请求不会被中断
    RemoveTask {
        task_id: TaskId,
        reply: oneshot::Sender<Result<()>>,
    },

    /// 删除所有 Success 状态的任务，返回删除数量
    ClearCompleted {
        reply: oneshot::Sender<usize>,
    },

    /// 触发服务端扫描，返回是否真的发起了请求
    ///
    /// 扫描在途时重复调用不会发第二个请求
    Scan {
        reply: oneshot::Sender<bool>,
    },

    /// 获取单个任务快照
    GetTask {
        task_id: TaskId,
        reply: oneshot::Sender<Option<UploadTask>>,
    },

    /// 获取所有任务快照
    GetAllTasks {
        reply: oneshot::Sender<Vec<UploadTask>>,
    },

    /// 最近一次扫描结果
    LastScan {
        reply: oneshot::Sender<Option<ScanResult>>,
    },
}

/// 队列事件
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// 新任务入列
    TaskAdded {
        task_id: TaskId,
    },

    /// 任务状态变更
    StatusChanged {
        task_id: TaskId,
        old_status: TaskStatus,
        new_status: TaskStatus,
    },

    /// 传输进度
    Progress {
        task_id: TaskId,
        uploaded: u64,
        total: u64,
        percentage: u8,
    },

    /// 任务上传成功
    TaskCompleted {
        task_id: TaskId,
        message: String,
    },

    /// 任务上传失败
    TaskFailed {
        task_id: TaskId,
        error: String,
    },

    /// 扫描结束，失败时 outcome 带一条错误、计数全零
    ScanFinished {
        outcome: ScanResult,
    },

    /// 一轮批量上传结束
    AllCompleted {
        total: usize,
        succeeded: usize,
        failed: usize,
    },
}
