//! 登录后的会话：心跳上报、在线名单轮询与展示

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use crate::api::types::ConnectedUser;
use crate::api::{ApiClient, Result};
use crate::utils::format_last_seen;

/// 心跳上报周期
pub const LIVENESS_PERIOD: Duration = Duration::from_secs(30);
/// 在线名单轮询周期
pub const PRESENCE_PERIOD: Duration = Duration::from_secs(5);

/// 会话依赖的后端出口，测试时用桩实现替换
#[async_trait]
pub trait SessionBackend: Send + Sync + 'static {
    /// 上报当前用户在线
    async fn register(&self, username: &str) -> Result<()>;

    /// 拉取在线用户名单
    async fn roster(&self) -> Result<Vec<ConnectedUser>>;
}

#[async_trait]
impl SessionBackend for ApiClient {
    async fn register(&self, username: &str) -> Result<()> {
        self.register_session(username).await
    }

    async fn roster(&self) -> Result<Vec<ConnectedUser>> {
        Ok(self.connected_users().await?.users)
    }
}

/// 登录成功后启动，持有两个轮询循环
///
/// 两个循环互相独立、周期固定，失败只记日志不停摆；
/// stop 之外没有任何途径让它们退出
pub struct Session {
    username: String,
    cancel_token: CancellationToken,
    roster_rx: watch::Receiver<Vec<ConnectedUser>>,
    liveness_handle: JoinHandle<()>,
    presence_handle: JoinHandle<()>,
}

impl Session {
    pub fn start<B: SessionBackend>(backend: Arc<B>, username: impl Into<String>) -> Self {
        let username = username.into();
        let cancel_token = CancellationToken::new();
        let (roster_tx, roster_rx) = watch::channel(Vec::new());

        let liveness_handle = tokio::spawn(liveness_loop(
            Arc::clone(&backend),
            username.clone(),
            cancel_token.clone(),
        ));
        let presence_handle = tokio::spawn(presence_loop(
            backend,
            roster_tx,
            cancel_token.clone(),
        ));

        Self {
            username,
            cancel_token,
            roster_rx,
            liveness_handle,
            presence_handle,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// 当前名单快照
    pub fn roster(&self) -> Vec<ConnectedUser> {
        self.roster_rx.borrow().clone()
    }

    /// 名单变更通知
    pub fn subscribe_roster(&self) -> watch::Receiver<Vec<ConnectedUser>> {
        self.roster_rx.clone()
    }

    /// 停止两个循环并等它们收尾
    ///
    /// 在途请求不中断，等它自然结束
    pub async fn stop(self) {
        self.cancel_token.cancel();
        let _ = self.liveness_handle.await;
        let _ = self.presence_handle.await;
    }
}

/// 先上报再休眠，登录后立即有一次心跳
async fn liveness_loop<B: SessionBackend>(
    backend: Arc<B>,
    username: String,
    cancel_token: CancellationToken,
) {
    loop {
        if let Err(err) = backend.register(&username).await {
            tracing::warn!("Session register failed: {}", err);
        }

        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(LIVENESS_PERIOD) => {}
        }
    }
}

/// 每轮把名单整体替换，失败时保留上一次的名单
async fn presence_loop<B: SessionBackend>(
    backend: Arc<B>,
    roster_tx: watch::Sender<Vec<ConnectedUser>>,
    cancel_token: CancellationToken,
) {
    loop {
        match backend.roster().await {
            Ok(users) => {
                let _ = roster_tx.send(users);
            }
            Err(err) => tracing::warn!("Presence poll failed: {}", err),
        }

        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(PRESENCE_PERIOD) => {}
        }
    }
}

/// 名单标题，单复数按人数走
pub fn roster_header(count: usize) -> String {
    if count == 1 {
        "1 user online".to_string()
    } else {
        format!("{} users online", count)
    }
}

/// 渲染名单为文本行，空名单给占位行
pub fn render_roster(users: &[ConnectedUser]) -> Vec<String> {
    if users.is_empty() {
        return vec!["No users connected".to_string()];
    }

    users
        .iter()
        .map(|user| {
            format!(
                "{} ({}) {}",
                user.username,
                user.ip_address,
                format_last_seen(&user.last_seen)
            )
        })
        .collect()
}
