use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;
use cabinet::api::types::{ScanResult, UploadResult};
use cabinet::{
    ApiError, QueueEvent, TaskStatus, UploadBackend, UploadError, UploadQueue, UploadSpec,
};

/// 模拟上传后端 - 用于测试
///
/// 记录调用次数、发起顺序和同一时刻的在途数，按文件名脚本化失败
struct MockBackend {
    delay: Duration,
    scan_delay: Duration,
    fail_scan: bool,
    panic_scan: bool,
    /// 永远传输失败的文件名
    fail_names: HashSet<String>,
    /// 只在第一次尝试时失败的文件名
    fail_once_names: HashSet<String>,
    /// 返回 2xx 但 success=false 的文件名
    reject_names: HashSet<String>,
    /// 传输协程直接 panic 的文件名
    panic_names: HashSet<String>,

    uploads_started: AtomicU32,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
    scans: AtomicU32,
    upload_order: Mutex<Vec<String>>,
    attempts: Mutex<HashMap<String, u32>>,
}

impl MockBackend {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            scan_delay: Duration::from_millis(50),
            fail_scan: false,
            panic_scan: false,
            fail_names: HashSet::new(),
            fail_once_names: HashSet::new(),
            reject_names: HashSet::new(),
            panic_names: HashSet::new(),
            uploads_started: AtomicU32::new(0),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
            scans: AtomicU32::new(0),
            upload_order: Mutex::new(Vec::new()),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    fn failing(mut self, name: &str) -> Self {
        self.fail_names.insert(name.to_string());
        self
    }

    fn failing_once(mut self, name: &str) -> Self {
        self.fail_once_names.insert(name.to_string());
        self
    }

    fn rejecting(mut self, name: &str) -> Self {
        self.reject_names.insert(name.to_string());
        self
    }

    fn panicking(mut self, name: &str) -> Self {
        self.panic_names.insert(name.to_string());
        self
    }

    fn failing_scan(mut self) -> Self {
        self.fail_scan = true;
        self
    }

    fn panicking_scan(mut self) -> Self {
        self.panic_scan = true;
        self
    }

    fn order(&self) -> Vec<String> {
        self.upload_order.lock().unwrap().clone()
    }

    fn started(&self) -> u32 {
        self.uploads_started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UploadBackend for MockBackend {
    async fn upload(
        &self,
        file_path: &Path,
        _console: Option<&str>,
        _title: Option<&str>,
        _progress_tx: mpsc::UnboundedSender<u64>,
    ) -> cabinet::api::Result<UploadResult> {
        let name = file_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        self.uploads_started.fetch_add(1, Ordering::SeqCst);
        self.upload_order.lock().unwrap().push(name.clone());
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let entry = attempts.entry(name.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        if self.panic_names.contains(&name) {
            panic!("Upload crashed on {}", name);
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_names.contains(&name) || (attempt == 1 && self.fail_once_names.contains(&name))
        {
            return Err(ApiError::internal_error(format!(
                "Connection reset uploading {}",
                name
            )));
        }
        if self.reject_names.contains(&name) {
            return Ok(UploadResult {
                success: false,
                message: format!("Unsupported file type: {}", name),
                game_id: None,
                file_path: None,
            });
        }

        Ok(UploadResult {
            success: true,
            message: "Upload successful".to_string(),
            game_id: None,
            file_path: Some(format!("/roms/{}", name)),
        })
    }

    async fn scan(&self) -> cabinet::api::Result<ScanResult> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if self.panic_scan {
            panic!("Scan crashed");
        }
        tokio::time::sleep(self.scan_delay).await;

        if self.fail_scan {
            return Err(ApiError::internal_error("Scan endpoint unreachable"));
        }
        Ok(ScanResult {
            total_found: 5,
            newly_added: 2,
            already_exists: 3,
            errors: vec![],
        })
    }
}

fn specs(names: &[&str]) -> Vec<UploadSpec> {
    names
        .iter()
        .map(|name| UploadSpec::new(format!("/queue-test/{}", name)))
        .collect()
}

/// 一直收事件直到谓词命中，5 秒收不到就算失败
async fn wait_for<F>(events: &mut broadcast::Receiver<QueueEvent>, what: F) -> QueueEvent
where
    F: Fn(&QueueEvent) -> bool,
{
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for queue event")
            .expect("event channel closed");
        if what(&event) {
            return event;
        }
    }
}

async fn wait_for_all_completed(
    events: &mut broadcast::Receiver<QueueEvent>,
) -> (usize, usize, usize) {
    let event = wait_for(events, |event| {
        matches!(event, QueueEvent::AllCompleted { .. })
    })
    .await;
    match event {
        QueueEvent::AllCompleted {
            total,
            succeeded,
            failed,
        } => (total, succeeded, failed),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_upload_all_runs_sequentially_in_queue_order() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(20)));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    queue
        .add_files(specs(&["zeta.gba", "alpha.iso", "mike.nds"]))
        .await
        .unwrap();

    let captured = queue.upload_all().await.unwrap();
    assert_eq!(captured, 3);

    let counts = wait_for_all_completed(&mut events).await;
    assert_eq!(counts, (3, 3, 0));

    // 入列顺序，不是文件名顺序
    assert_eq!(backend.order(), vec!["zeta.gba", "alpha.iso", "mike.nds"]);
    assert_eq!(backend.started(), 3);
    assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);

    for task in queue.tasks().await.unwrap() {
        assert_eq!(task.status, TaskStatus::Success);
        assert_eq!(task.progress, 100);
    }

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_upload_all_excludes_tasks_added_after_the_call() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(30)));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    queue
        .add_files(specs(&["first.gba", "second.gba"]))
        .await
        .unwrap();
    let captured = queue.upload_all().await.unwrap();
    assert_eq!(captured, 2);

    // 批次开始后再入列的任务不属于本轮
    let late_ids = queue.add_files(specs(&["late.gba"])).await.unwrap();

    let counts = wait_for_all_completed(&mut events).await;
    assert_eq!(counts, (2, 2, 0));
    assert_eq!(backend.started(), 2);

    let late = queue.task(late_ids[0]).await.unwrap().unwrap();
    assert_eq!(late.status, TaskStatus::Pending);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_upload_all_skips_tasks_removed_before_their_turn() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(40)));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    let task_ids = queue
        .add_files(specs(&["a.gba", "b.gba", "c.gba"]))
        .await
        .unwrap();
    assert_eq!(queue.upload_all().await.unwrap(), 3);

    // 第一个还在传，把第二个删掉
    queue.remove_task(task_ids[1]).await.unwrap();

    let counts = wait_for_all_completed(&mut events).await;
    assert_eq!(counts, (3, 2, 0));
    assert_eq!(backend.order(), vec!["a.gba", "c.gba"]);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_task_does_not_abort_the_batch() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(10)).failing("b.gba"));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    let task_ids = queue
        .add_files(specs(&["a.gba", "b.gba", "c.gba"]))
        .await
        .unwrap();
    assert_eq!(queue.upload_all().await.unwrap(), 3);

    let counts = wait_for_all_completed(&mut events).await;
    assert_eq!(counts, (3, 2, 1));
    assert_eq!(backend.order(), vec!["a.gba", "b.gba", "c.gba"]);

    let failed = queue.task(task_ids[1]).await.unwrap().unwrap();
    assert_eq!(failed.status, TaskStatus::Error);
    assert!(failed.message.unwrap().contains("Connection reset"));

    let last = queue.task(task_ids[2]).await.unwrap().unwrap();
    assert_eq!(last.status, TaskStatus::Success);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_server_rejected_upload_marks_task_error() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(10)).rejecting("weird.xyz"));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    let task_ids = queue.add_files(specs(&["weird.xyz"])).await.unwrap();
    queue.upload_one(task_ids[0]).await.unwrap();

    let event = wait_for(&mut events, |event| {
        matches!(event, QueueEvent::TaskFailed { .. })
    })
    .await;
    match event {
        QueueEvent::TaskFailed { task_id, error } => {
            assert_eq!(task_id, task_ids[0]);
            assert_eq!(error, "Unsupported file type: weird.xyz");
        }
        _ => unreachable!(),
    }

    let task = queue.task(task_ids[0]).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Error);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_second_upload_all_while_batch_running_is_ignored() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(50)));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    queue
        .add_files(specs(&["a.gba", "b.gba", "c.gba"]))
        .await
        .unwrap();
    assert_eq!(queue.upload_all().await.unwrap(), 3);
    assert_eq!(queue.upload_all().await.unwrap(), 0);

    let counts = wait_for_all_completed(&mut events).await;
    assert_eq!(counts, (3, 3, 0));
    assert_eq!(backend.started(), 3);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_upload_one_is_noop_while_uploading_and_after_success() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(50)));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    let task_ids = queue.add_files(specs(&["solo.gba"])).await.unwrap();
    let task_id = task_ids[0];

    queue.upload_one(task_id).await.unwrap();
    // 传输中再点一次不会发第二个请求
    queue.upload_one(task_id).await.unwrap();

    wait_for(&mut events, |event| {
        matches!(event, QueueEvent::TaskCompleted { .. })
    })
    .await;
    assert_eq!(backend.started(), 1);

    // Success 是终态，除了删除之外不会再变
    queue.upload_one(task_id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(backend.started(), 1);

    let task = queue.task(task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Success);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_error_task_can_be_retried() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(10)).failing_once("flaky.gba"));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    let task_ids = queue.add_files(specs(&["flaky.gba"])).await.unwrap();
    let task_id = task_ids[0];

    queue.upload_one(task_id).await.unwrap();
    wait_for(&mut events, |event| {
        matches!(event, QueueEvent::TaskFailed { .. })
    })
    .await;

    let task = queue.task(task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Error);
    assert!(task.message.is_some());

    // 失败后手动重试，第二次成功
    queue.upload_one(task_id).await.unwrap();
    wait_for(&mut events, |event| {
        matches!(event, QueueEvent::TaskCompleted { .. })
    })
    .await;

    let task = queue.task(task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Success);
    assert_eq!(backend.started(), 2);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_second_upload_all_captures_only_error_tasks() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(10)).failing_once("flaky.gba"));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    let task_ids = queue
        .add_files(specs(&["solid.gba", "flaky.gba"]))
        .await
        .unwrap();
    assert_eq!(queue.upload_all().await.unwrap(), 2);
    let counts = wait_for_all_completed(&mut events).await;
    assert_eq!(counts, (2, 1, 1));

    // 第二轮只圈定 Error 态的任务，Success 的不重传
    assert_eq!(queue.upload_all().await.unwrap(), 1);
    let counts = wait_for_all_completed(&mut events).await;
    assert_eq!(counts, (1, 1, 0));

    assert_eq!(backend.started(), 3);
    assert_eq!(
        backend.order(),
        vec!["solid.gba", "flaky.gba", "flaky.gba"]
    );

    let retried = queue.task(task_ids[1]).await.unwrap().unwrap();
    assert_eq!(retried.status, TaskStatus::Success);
    let untouched = queue.task(task_ids[0]).await.unwrap().unwrap();
    assert_eq!(untouched.status, TaskStatus::Success);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_clear_completed_keeps_survivors_in_order() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(10)).failing("bad.gba"));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    queue
        .add_files(specs(&["ok1.gba", "bad.gba", "ok2.gba"]))
        .await
        .unwrap();
    queue.upload_all().await.unwrap();
    wait_for_all_completed(&mut events).await;

    // 再补一个没传过的
    queue.add_files(specs(&["pending.gba"])).await.unwrap();

    let removed = queue.clear_completed().await.unwrap();
    assert_eq!(removed, 2);

    let names: Vec<String> = queue
        .tasks()
        .await
        .unwrap()
        .into_iter()
        .map(|task| task.file_name)
        .collect();
    assert_eq!(names, vec!["bad.gba", "pending.gba"]);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_remove_mid_upload_discards_late_completion() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(50)));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    let task_ids = queue.add_files(specs(&["doomed.gba"])).await.unwrap();
    queue.upload_one(task_ids[0]).await.unwrap();

    // 请求还在途就删掉任务
    queue.remove_task(task_ids[0]).await.unwrap();
    assert!(queue.tasks().await.unwrap().is_empty());

    // 等传输结束，完成信号应该被悄悄丢弃
    tokio::time::sleep(Duration::from_millis(120)).await;
    let mut saw_terminal = false;
    while let Ok(event) = events.try_recv() {
        if matches!(
            event,
            QueueEvent::TaskCompleted { .. } | QueueEvent::TaskFailed { .. }
        ) {
            saw_terminal = true;
        }
    }
    assert!(!saw_terminal);
    assert!(queue.tasks().await.unwrap().is_empty());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scan_is_single_flight() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(10)));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    assert!(queue.scan().await.unwrap());
    // 在途期间的第二次调用不发请求
    assert!(!queue.scan().await.unwrap());

    let event = wait_for(&mut events, |event| {
        matches!(event, QueueEvent::ScanFinished { .. })
    })
    .await;
    match event {
        QueueEvent::ScanFinished { outcome } => {
            assert_eq!(outcome.total_found, 5);
            assert_eq!(outcome.newly_added, 2);
        }
        _ => unreachable!(),
    }

    assert_eq!(backend.scans.load(Ordering::SeqCst), 1);
    let last = queue.last_scan().await.unwrap().unwrap();
    assert_eq!(last.total_found, 5);

    // 结束后可以再次扫描
    assert!(queue.scan().await.unwrap());
    wait_for(&mut events, |event| {
        matches!(event, QueueEvent::ScanFinished { .. })
    })
    .await;
    assert_eq!(backend.scans.load(Ordering::SeqCst), 2);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scan_failure_produces_synthetic_outcome() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(10)).failing_scan());
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    assert!(queue.scan().await.unwrap());
    let event = wait_for(&mut events, |event| {
        matches!(event, QueueEvent::ScanFinished { .. })
    })
    .await;

    match event {
        QueueEvent::ScanFinished { outcome } => {
            assert_eq!(outcome.total_found, 0);
            assert_eq!(outcome.newly_added, 0);
            assert_eq!(outcome.already_exists, 0);
            assert_eq!(outcome.errors.len(), 1);
            assert!(outcome.errors[0].contains("Scan endpoint unreachable"));
        }
        _ => unreachable!(),
    }

    let last = queue.last_scan().await.unwrap().unwrap();
    assert_eq!(last.errors.len(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_panicking_upload_settles_as_error_and_batch_continues() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(10)).panicking("boom.gba"));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    let task_ids = queue
        .add_files(specs(&["boom.gba", "after.gba"]))
        .await
        .unwrap();
    assert_eq!(queue.upload_all().await.unwrap(), 2);

    // 崩掉的传输按失败计入批次，后面的任务照常轮到
    let counts = wait_for_all_completed(&mut events).await;
    assert_eq!(counts, (2, 1, 1));
    assert_eq!(backend.order(), vec!["boom.gba", "after.gba"]);

    let crashed = queue.task(task_ids[0]).await.unwrap().unwrap();
    assert_eq!(crashed.status, TaskStatus::Error);
    assert!(crashed.message.unwrap().contains("panicked"));

    let survivor = queue.task(task_ids[1]).await.unwrap().unwrap();
    assert_eq!(survivor.status, TaskStatus::Success);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_panicking_scan_clears_the_single_flight_guard() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(10)).panicking_scan());
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    assert!(queue.scan().await.unwrap());
    let event = wait_for(&mut events, |event| {
        matches!(event, QueueEvent::ScanFinished { .. })
    })
    .await;
    match event {
        QueueEvent::ScanFinished { outcome } => {
            assert_eq!(outcome.total_found, 0);
            assert_eq!(outcome.errors.len(), 1);
            assert!(outcome.errors[0].contains("panicked"));
        }
        _ => unreachable!(),
    }

    // 单飞标记已清掉，下一次扫描能发出去
    assert!(queue.scan().await.unwrap());
    wait_for(&mut events, |event| {
        matches!(event, QueueEvent::ScanFinished { .. })
    })
    .await;
    assert_eq!(backend.scans.load(Ordering::SeqCst), 2);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_queue_length_tracks_adds_and_removes() {
    let backend = Arc::new(MockBackend::new(Duration::from_millis(10)));
    let handle = UploadQueue::new(Arc::clone(&backend));
    let queue = &handle.queue;

    let task_ids = queue
        .add_files(specs(&["a.gba", "b.gba", "c.gba"]))
        .await
        .unwrap();
    assert_eq!(queue.tasks().await.unwrap().len(), 3);

    queue.remove_task(task_ids[0]).await.unwrap();
    assert_eq!(queue.tasks().await.unwrap().len(), 2);

    queue.add_files(specs(&["d.gba", "e.gba"])).await.unwrap();
    assert_eq!(queue.tasks().await.unwrap().len(), 4);

    // 不存在的任务
    let missing = cabinet::TaskId::new();
    assert!(matches!(
        queue.remove_task(missing).await,
        Err(UploadError::TaskNotFound(_))
    ));
    assert!(matches!(
        queue.upload_one(missing).await,
        Err(UploadError::TaskNotFound(_))
    ));

    handle.shutdown().await.unwrap();
}

/// 按脚本发进度的桩后端
struct ProgressBackend {
    script: Vec<u64>,
}

#[async_trait]
impl UploadBackend for ProgressBackend {
    async fn upload(
        &self,
        _file_path: &Path,
        _console: Option<&str>,
        _title: Option<&str>,
        progress_tx: mpsc::UnboundedSender<u64>,
    ) -> cabinet::api::Result<UploadResult> {
        for bytes in &self.script {
            let _ = progress_tx.send(*bytes);
            tokio::task::yield_now().await;
        }

        Ok(UploadResult {
            success: true,
            message: "Upload successful".to_string(),
            game_id: Some(1),
            file_path: None,
        })
    }

    async fn scan(&self) -> cabinet::api::Result<ScanResult> {
        Ok(ScanResult {
            total_found: 0,
            newly_added: 0,
            already_exists: 0,
            errors: vec![],
        })
    }
}

#[tokio::test]
async fn test_progress_hits_exact_percentages_then_success() {
    let file_path = std::env::temp_dir().join(format!("cabinet-progress-{}.bin", Uuid::new_v4()));
    tokio::fs::write(&file_path, vec![0u8; 10]).await.unwrap();

    let handle = UploadQueue::new(ProgressBackend {
        script: vec![0, 5, 10],
    });
    let queue = &handle.queue;
    let mut events = queue.subscribe_events();

    let task_ids = queue
        .add_files(vec![UploadSpec::new(&file_path)])
        .await
        .unwrap();
    queue.upload_one(task_ids[0]).await.unwrap();

    let mut percentages = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for queue event")
            .expect("event channel closed");
        match event {
            QueueEvent::Progress { percentage, .. } => percentages.push(percentage),
            QueueEvent::TaskCompleted { .. } => break,
            _ => {}
        }
    }

    assert_eq!(percentages, vec![0, 50, 100]);

    let task = queue.task(task_ids[0]).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Success);
    assert_eq!(task.progress, 100);

    let _ = tokio::fs::remove_file(&file_path).await;
    handle.shutdown().await.unwrap();
}
