use std::path::Path;
use async_trait::async_trait;
use tokio::sync::mpsc;
use crate::api::types::{ScanResult, UploadResult};
use crate::api::{ApiClient, Result};

/// 队列访问网络的出口，测试时用桩实现替换
#[async_trait]
pub trait UploadBackend: Send + Sync + 'static {
    /// 上传单个文件，累计已传字节数写入 progress_tx
    async fn upload(
        &self,
        file_path: &Path,
        console: Option<&str>,
        title: Option<&str>,
        progress_tx: mpsc::UnboundedSender<u64>,
    ) -> Result<UploadResult>;

    /// 触发服务端目录扫描
    async fn scan(&self) -> Result<ScanResult>;
}

#[async_trait]
impl<B: UploadBackend> UploadBackend for std::sync::Arc<B> {
    async fn upload(
        &self,
        file_path: &Path,
        console: Option<&str>,
        title: Option<&str>,
        progress_tx: mpsc::UnboundedSender<u64>,
    ) -> Result<UploadResult> {
        (**self).upload(file_path, console, title, progress_tx).await
    }

    async fn scan(&self) -> Result<ScanResult> {
        (**self).scan().await
    }
}

#[async_trait]
impl UploadBackend for ApiClient {
    async fn upload(
        &self,
        file_path: &Path,
        console: Option<&str>,
        title: Option<&str>,
        progress_tx: mpsc::UnboundedSender<u64>,
    ) -> Result<UploadResult> {
        self.upload_rom(file_path, console, title, Some(progress_tx))
            .await
    }

    async fn scan(&self) -> Result<ScanResult> {
        self.scan_roms().await
    }
}
