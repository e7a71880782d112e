use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use crate::api::types::ScanResult;
use super::backend::UploadBackend;
use super::errors::{Result, UploadError};
use super::queue_worker::QueueWorker;
use super::task::{TaskId, UploadSpec, UploadTask};
use super::types::{QueueCommand, QueueEvent};

#[derive(Clone)]
pub struct UploadQueue {
    command_tx: mpsc::Sender<QueueCommand>,
    event_tx: broadcast::Sender<QueueEvent>,
}

/// 上传队列句柄，持有队列和工作协程
pub struct UploadQueueHandle {
    pub queue: UploadQueue,
    pub worker_handle: JoinHandle<()>,
}

impl UploadQueueHandle {
    /// 释放所有命令发送端并等工作协程收尾
    pub async fn shutdown(self) -> Result<()> {
        drop(self.queue);
        self.worker_handle
            .await
            .map_err(|err| UploadError::internal_error(format!("Worker panic: {}", err)))
    }
}

impl UploadQueue {
    pub fn new<B: UploadBackend>(backend: B) -> UploadQueueHandle {
        let (command_tx, command_rx) = mpsc::channel(100);
        // 最大缓存 256 个事件
        let (event_tx, _) = broadcast::channel(256);

        let worker_handle = tokio::spawn(QueueWorker::run(backend, command_rx, event_tx.clone()));

        let queue = Self {
            command_tx,
            event_tx,
        };

        UploadQueueHandle {
            queue,
            worker_handle,
        }
    }

    /// 批量入列，返回新任务的 id，顺序与入参一致
    pub async fn add_files(&self, specs: Vec<UploadSpec>) -> Result<Vec<TaskId>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::AddFiles {
                specs,
                reply: reply_tx,
            })
            .await
            .map_err(|_| UploadError::QueueClosed)?;

        reply_rx
            .await
            .map_err(|err| UploadError::internal_error(err.to_string()))
    }

    /// 上传单个任务
    pub async fn upload_one(&self, task_id: TaskId) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::UploadOne {
                task_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| UploadError::QueueClosed)?;

        reply_rx
            .await
            .map_err(|err| UploadError::internal_error(err.to_string()))?
    }

    /// 顺序上传当前所有 Pending / Error 任务，返回圈定的任务数
    pub async fn upload_all(&self) -> Result<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::UploadAll { reply: reply_tx })
            .await
            .map_err(|_| UploadError::QueueClosed)?;

        reply_rx
            .await
            .map_err(|err| UploadError::internal_error(err.to_string()))
    }

    /// 删除任务
    pub async fn remove_task(&self, task_id: TaskId) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::RemoveTask {
                task_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| UploadError::QueueClosed)?;

        reply_rx
            .await
            .map_err(|err| UploadError::internal_error(err.to_string()))?
    }

    /// 清掉所有已成功的任务，返回删除数量
    pub async fn clear_completed(&self) -> Result<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::ClearCompleted { reply: reply_tx })
            .await
            .map_err(|_| UploadError::QueueClosed)?;

        reply_rx
            .await
            .map_err(|err| UploadError::internal_error(err.to_string()))
    }

    /// 触发服务端扫描，返回是否真的发起了请求
    pub async fn scan(&self) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::Scan { reply: reply_tx })
            .await
            .map_err(|_| UploadError::QueueClosed)?;

        reply_rx
            .await
            .map_err(|err| UploadError::internal_error(err.to_string()))
    }

    /// 单个任务快照
    pub async fn task(&self, task_id: TaskId) -> Result<Option<UploadTask>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::GetTask {
                task_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| UploadError::QueueClosed)?;

        reply_rx
            .await
            .map_err(|err| UploadError::internal_error(err.to_string()))
    }

    /// 所有任务快照，按入列顺序
    pub async fn tasks(&self) -> Result<Vec<UploadTask>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::GetAllTasks { reply: reply_tx })
            .await
            .map_err(|_| UploadError::QueueClosed)?;

        reply_rx
            .await
            .map_err(|err| UploadError::internal_error(err.to_string()))
    }

    /// 最近一次扫描结果
    pub async fn last_scan(&self) -> Result<Option<ScanResult>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::LastScan { reply: reply_tx })
            .await
            .map_err(|_| UploadError::QueueClosed)?;

        reply_rx
            .await
            .map_err(|err| UploadError::internal_error(err.to_string()))
    }

    /// 订阅队列事件
    ///
    /// 消费太慢会丢事件（lagged error），每个订阅者各收一份完整副本
    pub fn subscribe_events(&self) -> broadcast::Receiver<QueueEvent> {
        self.event_tx.subscribe()
    }
}
