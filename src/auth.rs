//! 登录与账号操作，发请求之前先过本地校验

use crate::api::types::{DeleteAccountRequest, LoginRequest};
use crate::api::{ApiClient, ApiError, Result};
use crate::config::AppConfig;

/// 登录表单
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// 本地校验，任何网络请求之前调用
    ///
    /// 用户名忽略首尾空白，密码必须非空但保留原样
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(ApiError::validation("Please enter a username"));
        }
        if self.password.is_empty() {
            return Err(ApiError::validation("Please enter a password"));
        }

        Ok(())
    }

    fn to_request(&self) -> LoginRequest {
        LoginRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

/// 登录，成功返回服务端确认的用户名并写进配置
///
/// success=false 或响应缺用户名都按失败处理，错误文案优先用服务端消息
pub async fn login(
    client: &ApiClient,
    config: &mut AppConfig,
    credentials: &Credentials,
) -> Result<String> {
    credentials.validate()?;

    let response = client.login(&credentials.to_request()).await?;
    match (response.success, response.username) {
        (true, Some(username)) => {
            if let Err(err) = config.set_last_username(Some(username.clone())) {
                tracing::warn!("Failed to persist username: {}", err);
            }
            Ok(username)
        }
        _ => {
            let message = if response.message.is_empty() {
                "Login failed".to_string()
            } else {
                response.message
            };
            Err(ApiError::validation(message))
        }
    }
}

/// 历史用户名，登录页用来快速选择
pub async fn previous_usernames(client: &ApiClient) -> Result<Vec<String>> {
    Ok(client.previous_usernames().await?.usernames)
}

/// 删除账号，返回服务端的确认消息
pub async fn delete_account(client: &ApiClient, credentials: &Credentials) -> Result<String> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(ApiError::validation(
            "Please enter username and password to delete account",
        ));
    }

    let request = DeleteAccountRequest {
        username: credentials.username.trim().to_string(),
        password: credentials.password.clone(),
    };
    let response = client.delete_account(&request).await?;
    if response.success {
        Ok(response.message)
    } else {
        let message = if response.message.is_empty() {
            "Failed to delete account".to_string()
        } else {
            response.message
        };
        Err(ApiError::validation(message))
    }
}

/// 登出，清掉持久化的用户名
pub fn logout(config: &mut AppConfig) {
    if let Err(err) = config.set_last_username(None) {
        tracing::warn!("Failed to clear persisted username: {}", err);
    }
}
