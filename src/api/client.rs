use std::path::Path;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Body, Client, multipart};
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use url::Url;
use crate::config::AppConfig;
use super::errors::{ApiError, Result};
use super::progress::CountingStream;
use super::types::{
    ConnectedUsersResponse, ConsoleInfo, DeleteAccountRequest, DeleteAccountResponse, EmulatorInfo,
    Game, GameEntry, LoginRequest, LoginResponse, NewGame, PreviousUsernamesResponse, ScanResult,
    SessionRequest, UploadResult,
};

/// 上传流的读缓冲大小
const UPLOAD_BUFFER_SIZE: usize = 64 * 1024;

/// 游戏库后端的 HTTP 客户端
///
/// 目录和 ROM 接口带 bearer token；登录、会话接口按服务端约定不带认证
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|_| ApiError::validation(format!("Invalid base url: {}", base_url)))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            token: token.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.base_url, &config.api_token)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|_| ApiError::validation(format!("Invalid url path: {}", path)))
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))?,
        );

        Ok(headers)
    }

    /// 非 2xx 响应统一转成带消息的 ServerError，消息优先取响应体里的 message 字段
    async fn check_response(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|message| message.as_str())
                    .map(String::from)
            })
            .unwrap_or_else(|| format!("{} failed with status {}", context, status));

        Err(ApiError::server_error(status.as_u16(), message))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = response.text().await?;
        let value = serde_json::from_str(&body)?;

        Ok(value)
    }
}

impl ApiClient {
    /// 游戏列表
    pub async fn games(&self) -> Result<Vec<GameEntry>> {
        let url = self.endpoint("/api/games")?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response, "Fetch games").await?;

        Self::decode(response).await
    }

    /// 单个游戏
    pub async fn game(&self, id: i32) -> Result<GameEntry> {
        let url = self.endpoint(&format!("/api/games/{}", id))?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response, "Fetch game").await?;

        Self::decode(response).await
    }

    /// 手动登记一条游戏记录
    pub async fn add_game(&self, game: &NewGame) -> Result<Game> {
        let url = self.endpoint("/api/games")?;
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .headers(self.auth_headers()?)
            .json(game)
            .send()
            .await?;
        let response = Self::check_response(response, "Add game").await?;

        Self::decode(response).await
    }

    /// 模拟器列表
    pub async fn emulators(&self) -> Result<Vec<EmulatorInfo>> {
        let url = self.endpoint("/api/emulators")?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response, "Fetch emulators").await?;

        Self::decode(response).await
    }

    /// 上传目标主机列表（含支持的文件后缀）
    pub async fn consoles(&self) -> Result<Vec<ConsoleInfo>> {
        let url = self.endpoint("/api/roms/consoles")?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response, "Fetch consoles").await?;

        Self::decode(response).await
    }

    /// 触发服务端目录扫描
    pub async fn scan_roms(&self) -> Result<ScanResult> {
        let url = self.endpoint("/api/roms/scan")?;
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response, "Scan").await?;

        Self::decode(response).await
    }

    /// 上传一个 ROM 文件
    ///
    /// multipart 字段：file 必填，console / title 可选；
    /// 文件流经过 CountingStream，把累计字节数发到 progress_tx
    pub async fn upload_rom(
        &self,
        file_path: &Path,
        console: Option<&str>,
        title: Option<&str>,
        progress_tx: Option<mpsc::UnboundedSender<u64>>,
    ) -> Result<UploadResult> {
        let file_name = file_path
            .file_name()
            .and_then(|name| name.to_str())
            .map(String::from)
            .ok_or_else(|| {
                ApiError::validation(format!("Invalid file name: {}", file_path.display()))
            })?;

        let file = File::open(file_path).await?;
        let file_size = file.metadata().await?.len();

        let reader_stream = ReaderStream::with_capacity(file, UPLOAD_BUFFER_SIZE);
        let counting_stream = CountingStream::new(reader_stream, progress_tx);

        let part = multipart::Part::stream_with_length(
            Body::wrap_stream(counting_stream),
            file_size,
        )
        .file_name(file_name)
        .mime_str("application/octet-stream")?;

        let mut form = multipart::Form::new().part("file", part);
        if let Some(console) = console {
            form = form.text("console", console.to_string());
        }
        if let Some(title) = title {
            form = form.text("title", title.to_string());
        }

        let url = self.endpoint("/api/roms/upload")?;
        tracing::debug!("POST {} ({} bytes)", url, file_size);

        let response = self
            .client
            .post(url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await?;
        let response = Self::check_response(response, "Upload").await?;

        Self::decode(response).await
    }

    /// 登录，客户端校验在 auth 模块，这里只发请求
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let url = self.endpoint("/api/auth/login")?;
        tracing::debug!("POST {}", url);

        let response = self.client.post(url).json(request).send().await?;
        let response = Self::check_response(response, "Login").await?;

        Self::decode(response).await
    }

    /// 历史用户名，用于登录页的快捷选择
    pub async fn previous_usernames(&self) -> Result<PreviousUsernamesResponse> {
        let url = self.endpoint("/api/auth/previous-usernames")?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::check_response(response, "Fetch previous usernames").await?;

        Self::decode(response).await
    }

    pub async fn delete_account(
        &self,
        request: &DeleteAccountRequest,
    ) -> Result<DeleteAccountResponse> {
        let url = self.endpoint("/api/auth/delete-account")?;
        tracing::debug!("POST {}", url);

        let response = self.client.post(url).json(request).send().await?;
        let response = Self::check_response(response, "Delete account").await?;

        Self::decode(response).await
    }

    /// 会话心跳，告诉服务端当前用户仍在线
    pub async fn register_session(&self, username: &str) -> Result<()> {
        let url = self.endpoint("/api/sessions/register")?;
        tracing::debug!("POST {}", url);

        let request = SessionRequest {
            username: username.to_string(),
        };
        let response = self.client.post(url).json(&request).send().await?;
        Self::check_response(response, "Register session").await?;

        Ok(())
    }

    /// 在线用户全量列表
    pub async fn connected_users(&self) -> Result<ConnectedUsersResponse> {
        let url = self.endpoint("/api/sessions/connected")?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::check_response(response, "Fetch connected users").await?;

        Self::decode(response).await
    }
}
