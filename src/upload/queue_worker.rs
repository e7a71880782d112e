use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use crate::api::types::{ScanResult, UploadResult};
use crate::api::ApiError;
use super::backend::UploadBackend;
use super::errors::{Result, UploadError};
use super::task::{TaskId, TaskStatus, UploadSpec, UploadTask};
use super::types::{QueueCommand, QueueEvent};

/// 传输协程发回主循环的信号
enum QueueSignal {
    Progress {
        task_id: TaskId,
        bytes_uploaded: u64,
    },
    TransferDone {
        task_id: TaskId,
        outcome: crate::api::Result<UploadResult>,
    },
    ScanDone {
        outcome: crate::api::Result<ScanResult>,
    },
}

pub struct QueueWorker<B> {
    backend: Arc<B>,
    /// 按入列顺序存放，删除和清理都要保序
    tasks: Vec<UploadTask>,
    /// upload_all 圈定的待传任务，发起时拍快照
    batch: VecDeque<TaskId>,
    /// 批次里正在传输的任务
    active_batch_task: Option<TaskId>,
    batch_total: usize,
    batch_succeeded: usize,
    batch_failed: usize,
    /// 扫描单飞标记
    scanning: bool,
    last_scan: Option<ScanResult>,

    event_tx: broadcast::Sender<QueueEvent>,
    signal_tx: mpsc::UnboundedSender<QueueSignal>,
    signal_rx: mpsc::UnboundedReceiver<QueueSignal>,
}

impl<B: UploadBackend> QueueWorker<B> {
    pub(crate) async fn run(
        backend: B,
        mut command_rx: mpsc::Receiver<QueueCommand>,
        event_tx: broadcast::Sender<QueueEvent>,
    ) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let mut worker = Self {
            backend: Arc::new(backend),
            tasks: Vec::new(),
            batch: VecDeque::new(),
            active_batch_task: None,
            batch_total: 0,
            batch_succeeded: 0,
            batch_failed: 0,
            scanning: false,
            last_scan: None,
            event_tx,
            signal_tx,
            signal_rx,
        };

        // 主事件循环，命令通道关闭即退出
        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    match command {
                        Some(command) => worker.handle_command(command).await,
                        None => break,
                    }
                }
                Some(signal) = worker.signal_rx.recv() => {
                    worker.handle_signal(signal);
                }
            }
        }
    }

    async fn handle_command(&mut self, command: QueueCommand) {
        match command {
            QueueCommand::AddFiles { specs, reply } => {
                let task_ids = self.add_files(specs).await;
                let _ = reply.send(task_ids);
            }
            QueueCommand::UploadOne { task_id, reply } => {
                let result = self.upload_one(task_id);
                let _ = reply.send(result);
            }
            QueueCommand::UploadAll { reply } => {
                let captured = self.upload_all();
                let _ = reply.send(captured);
            }
            QueueCommand::RemoveTask { task_id, reply } => {
                let result = self.remove_task(task_id);
                let _ = reply.send(result);
            }
            QueueCommand::ClearCompleted { reply } => {
                let removed = self.clear_completed();
                let _ = reply.send(removed);
            }
            QueueCommand::Scan { reply } => {
                let started = self.scan();
                let _ = reply.send(started);
            }
            QueueCommand::GetTask { task_id, reply } => {
                let task = self
                    .task_index(task_id)
                    .map(|index| self.tasks[index].clone());
                let _ = reply.send(task);
            }
            QueueCommand::GetAllTasks { reply } => {
                let _ = reply.send(self.tasks.clone());
            }
            QueueCommand::LastScan { reply } => {
                let _ = reply.send(self.last_scan.clone());
            }
        }
    }

    fn handle_signal(&mut self, signal: QueueSignal) {
        match signal {
            QueueSignal::Progress {
                task_id,
                bytes_uploaded,
            } => self.handle_progress(task_id, bytes_uploaded),
            QueueSignal::TransferDone { task_id, outcome } => {
                self.handle_transfer_done(task_id, outcome)
            }
            QueueSignal::ScanDone { outcome } => self.handle_scan_done(outcome),
        }
    }

    async fn add_files(&mut self, specs: Vec<UploadSpec>) -> Vec<TaskId> {
        let mut task_ids = Vec::with_capacity(specs.len());

        for spec in specs {
            // 大小只用于展示和进度换算，取不到就记 0，校验交给服务端
            let file_size = tokio::fs::metadata(&spec.file_path)
                .await
                .map(|metadata| metadata.len())
                .unwrap_or(0);
            let file_name = spec
                .file_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| spec.file_path.display().to_string());

            let task_id = TaskId::new();
            let task = UploadTask {
                id: task_id,
                file_path: spec.file_path,
                file_name,
                file_size,
                console: spec.console,
                title: spec.title,
                status: TaskStatus::Pending,
                bytes_uploaded: 0,
                progress: 0,
                message: None,
                game_id: None,
                created_at: chrono::Utc::now(),
                completed_at: None,
            };

            self.tasks.push(task);
            self.emit(QueueEvent::TaskAdded { task_id });
            task_ids.push(task_id);
        }

        task_ids
    }

    fn upload_one(&mut self, task_id: TaskId) -> Result<()> {
        let index = self
            .task_index(task_id)
            .ok_or(UploadError::TaskNotFound(task_id))?;

        // Success 是终态，Uploading 不重复发起
        if !self.tasks[index].status.is_startable() {
            return Ok(());
        }

        self.start_transfer(index);
        Ok(())
    }

    fn upload_all(&mut self) -> usize {
        if self.active_batch_task.is_some() || !self.batch.is_empty() {
            tracing::debug!("upload_all ignored, a batch is already running");
            return 0;
        }

        let selected: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|task| task.status.is_startable())
            .map(|task| task.id)
            .collect();
        if selected.is_empty() {
            return 0;
        }

        let captured = selected.len();
        self.batch = selected.into_iter().collect();
        self.batch_total = captured;
        self.batch_succeeded = 0;
        self.batch_failed = 0;
        self.advance_batch();

        captured
    }

    fn remove_task(&mut self, task_id: TaskId) -> Result<()> {
        let index = self
            .task_index(task_id)
            .ok_or(UploadError::TaskNotFound(task_id))?;

        // 传输中的请求不中断，完成信号会因为任务不在而被忽略
        self.tasks.remove(index);
        Ok(())
    }

    fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.status != TaskStatus::Success);

        before - self.tasks.len()
    }

    fn scan(&mut self) -> bool {
        if self.scanning {
            tracing::debug!("Scan already in flight");
            return false;
        }

        self.scanning = true;

        let backend = Arc::clone(&self.backend);
        let signal_tx = self.signal_tx.clone();
        let scan_task = tokio::spawn(async move { backend.scan().await });
        tokio::spawn(async move {
            // 扫描协程 panic 也要折算成失败信号，不然单飞标记永远清不掉
            let outcome = match scan_task.await {
                Ok(outcome) => outcome,
                Err(err) => Err(ApiError::internal_error(format!("Scan task panicked: {}", err))),
            };
            let _ = signal_tx.send(QueueSignal::ScanDone { outcome });
        });

        true
    }

    /// 发起一次传输并把任务置为 Uploading
    ///
    /// 重试会清掉上次的进度和消息
    fn start_transfer(&mut self, index: usize) {
        let (task_id, old_status, file_path, console, title) = {
            let task = &mut self.tasks[index];
            let old_status = task.status;
            task.status = TaskStatus::Uploading;
            task.bytes_uploaded = 0;
            task.progress = 0;
            task.message = None;

            (
                task.id,
                old_status,
                task.file_path.clone(),
                task.console.clone(),
                task.title.clone(),
            )
        };

        self.emit_status_change(task_id, old_status, TaskStatus::Uploading);

        let backend = Arc::clone(&self.backend);
        let signal_tx = self.signal_tx.clone();
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();

        let progress_forward = tokio::spawn({
            let signal_tx = signal_tx.clone();
            async move {
                while let Some(bytes_uploaded) = progress_rx.recv().await {
                    let _ = signal_tx.send(QueueSignal::Progress {
                        task_id,
                        bytes_uploaded,
                    });
                }
            }
        });

        let transfer = tokio::spawn(async move {
            backend
                .upload(&file_path, console.as_deref(), title.as_deref(), progress_tx)
                .await
        });

        tokio::spawn(async move {
            // 上传协程 panic 按失败结算，批次才能照常推进
            let outcome = match transfer.await {
                Ok(outcome) => outcome,
                Err(err) => Err(ApiError::internal_error(format!("Upload task panicked: {}", err))),
            };
            // 上传协程结束后进度发送端已全部释放，等转发协程把剩余进度清空
            // 再发完成信号，保证进度事件都排在完成事件前面
            let _ = progress_forward.await;

            let _ = signal_tx.send(QueueSignal::TransferDone { task_id, outcome });
        });
    }

    fn handle_progress(&mut self, task_id: TaskId, bytes_uploaded: u64) {
        let Some(index) = self.task_index(task_id) else {
            return;
        };

        let (uploaded, total, percentage) = {
            let task = &mut self.tasks[index];
            // 迟到的进度信号不碰已定型的任务
            if task.status != TaskStatus::Uploading {
                return;
            }

            task.update_progress(bytes_uploaded);
            (task.bytes_uploaded, task.file_size, task.progress)
        };

        self.emit(QueueEvent::Progress {
            task_id,
            uploaded,
            total,
            percentage,
        });
    }

    fn handle_transfer_done(&mut self, task_id: TaskId, outcome: crate::api::Result<UploadResult>) {
        let succeeded = matches!(&outcome, Ok(result) if result.success);

        if let Some(index) = self.task_index(task_id) {
            let old_status = self.tasks[index].status;
            match outcome {
                Ok(result) if result.success => {
                    {
                        let task = &mut self.tasks[index];
                        task.status = TaskStatus::Success;
                        task.bytes_uploaded = task.file_size;
                        task.progress = 100;
                        task.message = Some(result.message.clone());
                        task.game_id = result.game_id;
                        task.completed_at = Some(chrono::Utc::now());
                    }
                    self.emit_status_change(task_id, old_status, TaskStatus::Success);
                    self.emit(QueueEvent::TaskCompleted {
                        task_id,
                        message: result.message,
                    });
                }
                Ok(result) => {
                    // 2xx 但服务端标记失败，按失败处理
                    self.tasks[index].status = TaskStatus::Error;
                    self.tasks[index].message = Some(result.message.clone());
                    self.emit_status_change(task_id, old_status, TaskStatus::Error);
                    self.emit(QueueEvent::TaskFailed {
                        task_id,
                        error: result.message,
                    });
                }
                Err(err) => {
                    let error = err.to_string();
                    self.tasks[index].status = TaskStatus::Error;
                    self.tasks[index].message = Some(error.clone());
                    self.emit_status_change(task_id, old_status, TaskStatus::Error);
                    self.emit(QueueEvent::TaskFailed { task_id, error });
                }
            }
        } else {
            tracing::debug!("Transfer finished for removed task {}", task_id);
        }

        if self.active_batch_task == Some(task_id) {
            self.active_batch_task = None;
            if succeeded {
                self.batch_succeeded += 1;
            } else {
                self.batch_failed += 1;
            }
            self.advance_batch();
        }
    }

    fn handle_scan_done(&mut self, outcome: crate::api::Result<ScanResult>) {
        self.scanning = false;

        let outcome = match outcome {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("Scan failed: {}", err);
                ScanResult {
                    total_found: 0,
                    newly_added: 0,
                    already_exists: 0,
                    errors: vec![err.to_string()],
                }
            }
        };

        self.last_scan = Some(outcome.clone());
        self.emit(QueueEvent::ScanFinished { outcome });
    }

    /// 推进批量上传，一次只保持一个传输在途
    fn advance_batch(&mut self) {
        if self.active_batch_task.is_some() {
            return;
        }

        while let Some(task_id) = self.batch.pop_front() {
            if let Some(index) = self.task_index(task_id) {
                // 轮到时已不是 Pending / Error 的任务直接跳过
                if self.tasks[index].status.is_startable() {
                    self.active_batch_task = Some(task_id);
                    self.start_transfer(index);
                    return;
                }
            }
        }

        if self.batch_total > 0 {
            self.emit(QueueEvent::AllCompleted {
                total: self.batch_total,
                succeeded: self.batch_succeeded,
                failed: self.batch_failed,
            });
            self.batch_total = 0;
        }
    }

    fn task_index(&self, task_id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == task_id)
    }

    fn emit(&self, event: QueueEvent) {
        let _ = self.event_tx.send(event);
    }

    fn emit_status_change(&self, task_id: TaskId, old_status: TaskStatus, new_status: TaskStatus) {
        self.emit(QueueEvent::StatusChanged {
            task_id,
            old_status,
            new_status,
        });
    }
}
